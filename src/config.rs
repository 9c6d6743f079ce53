use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub enable_tracing: bool,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "tokenbridge.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            enable_tracing: true,
            ledger: LedgerConfig::default(),
        }
    }
}

/// Remote ledger connection settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LedgerConfig {
    pub base_url: String,
    /// Bearer token attached to every ledger call.
    pub api_token: String,
    /// Fixed request timeout; a timed-out call is a remote error, not a
    /// hang.
    pub timeout_secs: u64,
    /// Simulation mode: mutations return synthetic receipts and touch no
    /// network. Coordination logic runs identically.
    pub simulate: bool,
    /// Ordered balance field paths tried before the generic scan. The
    /// remote schema varies by deployment, so this is configuration, not a
    /// contract.
    pub balance_paths: Vec<String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api/v1".to_string(),
            api_token: String::new(),
            timeout_secs: 15,
            simulate: false,
            balance_paths: default_balance_paths(),
        }
    }
}

pub fn default_balance_paths() -> Vec<String> {
    [
        "tokens",
        "balance",
        "token_balance",
        "stats.tokens",
        "stats.balance",
        "wallet.balance",
        "wallet.tokens",
        "economy.balance",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl AppConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {path}"))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse config yaml: {path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.ledger.timeout_secs, 15);
        assert!(!config.ledger.simulate);
        assert!(config.ledger.balance_paths.contains(&"tokens".to_string()));
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
log_level: debug
ledger:
  base_url: "https://ledger.example.com/api"
  api_token: "secret"
  simulate: true
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.ledger.base_url, "https://ledger.example.com/api");
        assert!(config.ledger.simulate);
        // Unset fields fall back to defaults
        assert_eq!(config.ledger.timeout_secs, 15);
        assert_eq!(config.rotation, "daily");
        assert_eq!(config.ledger.balance_paths, default_balance_paths());
    }

    #[test]
    fn test_balance_paths_override() {
        let yaml = r#"
ledger:
  balance_paths: ["custom.path"]
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.ledger.balance_paths, vec!["custom.path".to_string()]);
    }
}
