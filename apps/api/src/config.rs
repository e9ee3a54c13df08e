use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::asset_client::DEFAULT_API_URL;

/// Application configuration loaded from environment variables.
/// Every setting has a default; malformed numbers fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub demo_dir: PathBuf,
    pub export_dir: PathBuf,
    pub bind_addr: String,
    pub port: u16,
    pub proofsnap_api_url: String,
    pub proofsnap_timeout_secs: u64,
    /// First backoff delay between ProofSnap attempts; doubles per retry.
    pub proofsnap_retry_base_ms: u64,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let data_dir = PathBuf::from(or("IMAGEPROOF_DATA_DIR", "./data"));
        let export_dir = get("IMAGEPROOF_EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("exports"));

        Ok(Config {
            demo_dir: PathBuf::from(or("IMAGEPROOF_DEMO_DIR", "./public/demo-images")),
            export_dir,
            data_dir,
            bind_addr: or("BIND_ADDR", "127.0.0.1"),
            port: or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            proofsnap_api_url: or("PROOFSNAP_API_URL", DEFAULT_API_URL),
            proofsnap_timeout_secs: or("PROOFSNAP_TIMEOUT_SECS", "15")
                .parse::<u64>()
                .context("PROOFSNAP_TIMEOUT_SECS must be a whole number of seconds")?,
            proofsnap_retry_base_ms: or("PROOFSNAP_RETRY_BASE_MS", "500")
                .parse::<u64>()
                .context("PROOFSNAP_RETRY_BASE_MS must be a whole number of milliseconds")?,
            rust_log: or("RUST_LOG", "info"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let c = load(&[]).unwrap();
        assert_eq!(c.data_dir, PathBuf::from("./data"));
        assert_eq!(c.export_dir, PathBuf::from("./data").join("exports"));
        assert_eq!(c.bind_addr, "127.0.0.1");
        assert_eq!(c.port, 8080);
        assert_eq!(c.proofsnap_timeout_secs, 15);
        assert_eq!(c.proofsnap_retry_base_ms, 500);
        assert_eq!(c.proofsnap_api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_export_dir_follows_data_dir() {
        let c = load(&[("IMAGEPROOF_DATA_DIR", "/srv/ip")]).unwrap();
        assert_eq!(c.export_dir, PathBuf::from("/srv/ip/exports"));
    }

    #[test]
    fn test_bad_port_is_an_error() {
        let err = load(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_bad_retry_base_is_an_error() {
        let err = load(&[("PROOFSNAP_RETRY_BASE_MS", "-5")]).unwrap_err();
        assert!(err.to_string().contains("PROOFSNAP_RETRY_BASE_MS"));
    }
}
