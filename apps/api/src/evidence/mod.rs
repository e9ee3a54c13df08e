//! Evidence handling: tier derivation, upload validation and storage, and
//! resolution of supporting-evidence blobs into decoded images for reports.

pub mod handlers;
pub mod resolve;
pub mod tier;
pub mod upload;
