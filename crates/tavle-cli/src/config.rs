use anyhow::{Context, Result};
use serde::Deserialize;

/// Optional YAML config file; every field may be absent, and command-line
/// flags win over file values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default)]
    pub state_dir: Option<String>,
    #[serde(default)]
    pub csrf_token: Option<String>,
}

pub fn load_config(path: &str) -> Result<CliConfig> {
    let content =
        std::fs::read_to_string(path).context(format!("Failed to read config file: {}", path))?;
    let config: CliConfig = serde_yml::from_str(&content).context("Failed to parse config YAML")?;
    Ok(config)
}
