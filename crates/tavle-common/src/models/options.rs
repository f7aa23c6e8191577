use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Preference key holding the serialized column layout.
pub const WORKSPACE_KEY: &str = "workspace";

/// Other preference keys the report screen persists.
pub const PAGE_SIZE_KEY: &str = "pageSize";
pub const TOGGLE_DENSITY_KEY: &str = "toggleDensity";
pub const SHOW_SMA_BUTTONS_KEY: &str = "showSMAButtons";

/// Body of POST `/api/options/` -- a full-replace write of one key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetOptionRequest {
    pub key: String,
    pub value: Value,
}

/// Body of GET `/api/options/?key=<name>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionResponse {
    pub value: Value,
}
