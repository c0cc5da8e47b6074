use crate::region::Region;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub estimator: EstimatorConfig,
}

/// Pricing API connection settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout. Unset means requests may wait indefinitely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub default_region: Region,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "text" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct EstimatorConfig {
    /// Attribute names offered in addition to the built-in priority list
    #[serde(default)]
    pub extra_priority_attributes: Vec<String>,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

/// Load configuration from an optional TOML file layered with
/// `COST_ESTIMATOR__*` environment variables
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("COST_ESTIMATOR").separator("__"))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.api.base_url.trim().is_empty() {
        anyhow::bail!("api.base_url cannot be empty");
    }

    if let Err(e) = reqwest::Url::parse(&cfg.api.base_url) {
        anyhow::bail!("api.base_url '{}' is not a valid URL: {}", cfg.api.base_url, e);
    }

    if cfg.api.timeout_seconds == Some(0) {
        anyhow::bail!("api.timeout_seconds must be positive when set");
    }

    match cfg.logging.format.as_str() {
        "text" | "json" => {}
        other => anyhow::bail!("logging.format must be 'text' or 'json', got '{}'", other),
    }

    for name in &cfg.estimator.extra_priority_attributes {
        if name.trim().is_empty() {
            anyhow::bail!("estimator.extra_priority_attributes cannot contain empty names");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = Config::default();
        assert!(validate_config(&cfg).is_ok());
        assert_eq!(cfg.api.base_url, "http://localhost:5000");
        assert_eq!(cfg.session.default_region, Region::UsEast1);
        assert!(cfg.api.timeout_seconds.is_none());
    }

    #[test]
    fn test_validate_config_rejects_bad_url() {
        let mut cfg = Config::default();
        cfg.api.base_url = "not a url".to_string();

        let result = validate_config(&cfg);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not a valid URL"));
    }

    #[test]
    fn test_validate_config_rejects_zero_timeout() {
        let mut cfg = Config::default();
        cfg.api.timeout_seconds = Some(0);
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_config_rejects_unknown_log_format() {
        let mut cfg = Config::default();
        cfg.logging.format = "xml".to_string();
        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[api]
base_url = "http://pricing.internal:8080"
timeout_seconds = 15

[session]
default_region = "eu-central-1"
account_id = "123456789012"

[estimator]
extra_priority_attributes = ["usagetype"]
"#
        )
        .unwrap();

        let cfg = load_config(file.path()).unwrap();
        assert_eq!(cfg.api.base_url, "http://pricing.internal:8080");
        assert_eq!(cfg.api.timeout_seconds, Some(15));
        assert_eq!(cfg.session.default_region, Region::EuCentral1);
        assert_eq!(cfg.session.account_id.as_deref(), Some("123456789012"));
        assert_eq!(cfg.estimator.extra_priority_attributes, vec!["usagetype"]);
        assert_eq!(cfg.logging.format, "text");
    }

    #[test]
    fn test_load_config_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.api.base_url, "http://localhost:5000");
    }

    #[test]
    fn test_load_config_rejects_unknown_region() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[session]\ndefault_region = \"mars-north-1\"").unwrap();
        assert!(load_config(file.path()).is_err());
    }
}
