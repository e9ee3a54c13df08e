use serde::{Deserialize, Serialize};

pub const DEFAULT_INVESTIGATOR: &str = "Anonymous Investigator";

/// Investigator preferences kept in the settings slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture_token: Option<String>,
}

impl AppSettings {
    /// Trims both fields and drops blanks so "unset" has a single representation.
    pub fn normalized(self) -> Self {
        fn clean(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }
        Self {
            display_name: clean(self.display_name),
            capture_token: clean(self.capture_token),
        }
    }

    pub fn investigator_name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(DEFAULT_INVESTIGATOR)
    }
}
