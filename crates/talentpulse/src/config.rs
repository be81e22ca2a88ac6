//! Application configuration: directories, worker bounds, evaluator
//! settings. Loaded from JSON with serde defaults for every field, so
//! an empty object is a valid config.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::evaluator::{Evaluator, GeminiEvaluator, KeywordEvaluator, DEFAULT_MODEL};

/// Hard ceiling on the worker pool size.
pub const MAX_WORKER_COUNT: usize = 8;

/// Environment variable consulted when the config carries no API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_upload_directory")]
    pub upload_directory: PathBuf,
    #[serde(default = "default_results_directory")]
    pub results_directory: PathBuf,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    #[serde(default)]
    pub evaluator: EvaluatorConfig,
}

fn default_upload_directory() -> PathBuf {
    home_base().join("uploads")
}

fn default_results_directory() -> PathBuf {
    home_base().join("results")
}

fn default_database_path() -> PathBuf {
    crate::db::default_database_path().unwrap_or_else(|| PathBuf::from("talentpulse.db"))
}

fn default_worker_count() -> usize {
    num_cpus::get().min(MAX_WORKER_COUNT)
}

fn home_base() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".talentpulse")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            upload_directory: default_upload_directory(),
            results_directory: default_results_directory(),
            database_path: default_database_path(),
            worker_count: default_worker_count(),
            evaluator: EvaluatorConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    /// `"gemini"` for the hosted model, `"keyword"` for the offline scorer.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// API key override; the environment is consulted when absent.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Per-job evaluation budget in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    validate_worker_count(config.worker_count)?;

    match config.evaluator.provider.as_str() {
        "gemini" | "keyword" => {}
        other => return Err(ConfigError::UnknownProvider(other.to_string())),
    }

    if config.evaluator.timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "evaluator.timeout_secs must be greater than zero".to_string(),
        });
    }

    Ok(())
}

/// Rejects pool sizes outside `1..=MAX_WORKER_COUNT`.
pub fn validate_worker_count(requested: usize) -> Result<(), ConfigError> {
    if requested == 0 || requested > MAX_WORKER_COUNT {
        return Err(ConfigError::InvalidWorkerCount {
            requested,
            max: MAX_WORKER_COUNT,
        });
    }
    Ok(())
}

/// Builds the evaluator selected by `evaluator.provider`.
///
/// `"gemini"` needs an API key, from the config or from `GEMINI_API_KEY`;
/// `"keyword"` runs entirely offline.
pub fn build_evaluator(config: &AppConfig) -> crate::error::Result<Arc<dyn Evaluator>> {
    match config.evaluator.provider.as_str() {
        "gemini" => {
            let api_key = match &config.evaluator.api_key {
                Some(key) => key.clone(),
                None => {
                    std::env::var(API_KEY_ENV).map_err(|_| ConfigError::MissingApiKey {
                        env_var: API_KEY_ENV.to_string(),
                    })?
                }
            };
            let evaluator = GeminiEvaluator::new(
                SecretString::from(api_key),
                &config.evaluator.model,
                Duration::from_secs(config.evaluator.timeout_secs),
            )?;
            Ok(Arc::new(evaluator))
        }
        "keyword" => Ok(Arc::new(KeywordEvaluator::new())),
        other => Err(ConfigError::UnknownProvider(other.to_string()).into()),
    }
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;

    #[test]
    fn test_empty_object_loads_defaults() {
        let config = load_config_from_str("{}").unwrap();

        assert!(config.worker_count >= 1 && config.worker_count <= MAX_WORKER_COUNT);
        assert_eq!(config.evaluator.provider, "gemini");
        assert_eq!(config.evaluator.model, DEFAULT_MODEL);
        assert!(config.evaluator.api_key.is_none());
        assert_eq!(config.evaluator.timeout_secs, 300);
        assert!(config
            .upload_directory
            .to_string_lossy()
            .contains(".talentpulse"));
    }

    #[test]
    fn test_full_config_parses() {
        let content = r#"{
            "upload_directory": "/srv/talentpulse/uploads",
            "results_directory": "/srv/talentpulse/results",
            "database_path": "/srv/talentpulse/talentpulse.db",
            "worker_count": 4,
            "evaluator": {
                "provider": "keyword",
                "timeout_secs": 60
            }
        }"#;

        let config = load_config_from_str(content).unwrap();
        assert_eq!(
            config.upload_directory,
            PathBuf::from("/srv/talentpulse/uploads")
        );
        assert_eq!(config.worker_count, 4);
        assert_eq!(config.evaluator.provider, "keyword");
        assert_eq!(config.evaluator.model, DEFAULT_MODEL);
        assert_eq!(config.evaluator.timeout_secs, 60);
    }

    #[test]
    fn test_invalid_json_rejected() {
        assert!(matches!(
            load_config_from_str("not json"),
            Err(ConfigError::ParseJson(_))
        ));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let content = r#"{ "evaluator": { "provider": "oracle9000" } }"#;
        assert!(matches!(
            load_config_from_str(content),
            Err(ConfigError::UnknownProvider(p)) if p == "oracle9000"
        ));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let content = r#"{ "evaluator": { "timeout_secs": 0 } }"#;
        assert!(matches!(
            load_config_from_str(content),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn test_validate_worker_count_bounds() {
        assert!(validate_worker_count(0).is_err());
        assert!(validate_worker_count(1).is_ok());
        assert!(validate_worker_count(MAX_WORKER_COUNT).is_ok());

        let err = validate_worker_count(MAX_WORKER_COUNT + 1).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidWorkerCount {
                requested: 9,
                max: 8
            }
        ));
    }

    #[test]
    fn test_build_keyword_evaluator_needs_no_key() {
        let mut config = AppConfig::default();
        config.evaluator.provider = "keyword".to_string();

        assert!(build_evaluator(&config).is_ok());
    }

    #[test]
    #[serial]
    fn test_build_gemini_evaluator_from_config_key() {
        std::env::remove_var(API_KEY_ENV);
        let mut config = AppConfig::default();
        config.evaluator.api_key = Some("test-key".to_string());

        assert!(build_evaluator(&config).is_ok());
    }

    #[test]
    #[serial]
    fn test_build_gemini_evaluator_without_any_key_fails() {
        std::env::remove_var(API_KEY_ENV);
        let config = AppConfig::default();

        let err = build_evaluator(&config).unwrap_err();
        assert!(err.to_string().contains(API_KEY_ENV));
    }

    #[test]
    #[serial]
    fn test_build_gemini_evaluator_from_env_key() {
        std::env::set_var(API_KEY_ENV, "env-key");
        let config = AppConfig::default();

        assert!(build_evaluator(&config).is_ok());
        std::env::remove_var(API_KEY_ENV);
    }
}
