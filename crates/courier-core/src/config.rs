//! Worker configuration.
//!
//! 全フィールドにデフォルトがあるので、TOML は必要な項目だけ書けばよい。
//!
//! ```toml
//! request_timeout_secs = 30
//! workers = 4
//!
//! [notify]
//! worker_name = "HTTPRequestWorker"
//! failed_title = "HTTPRequestWorker Failed"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Whole-request timeout for the single HTTP attempt.
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Number of worker tasks sharing one transport.
    pub workers: usize,
    pub user_agent: String,
    /// How long one `receive` waits before returning empty.
    pub receive_timeout_ms: u64,
    /// Pause after a transport receive error before trying again.
    pub error_pause_ms: u64,
    pub notify: NotifyConfig,
}

/// Text of operator notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Name used in the success message ("<name> successfully executed Get. See logs.").
    pub worker_name: String,
    pub completed_title: String,
    pub failed_title: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            worker_name: "HTTPRequestWorker".to_string(),
            completed_title: "HTTPRequestWorker Executed Successfully".to_string(),
            failed_title: "HTTPRequestWorker Failed".to_string(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            workers: 1,
            user_agent: concat!("courier/", env!("CARGO_PKG_VERSION")).to_string(),
            receive_timeout_ms: 500,
            error_pause_ms: 1000,
            notify: NotifyConfig::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl WorkerConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&s)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "connect_timeout_secs must be greater than 0".into(),
            ));
        }
        if self.receive_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "receive_timeout_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn receive_timeout(&self) -> Duration {
        Duration::from_millis(self.receive_timeout_ms)
    }

    pub fn error_pause(&self) -> Duration {
        Duration::from_millis(self.error_pause_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = WorkerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.workers, 1);
        assert!(config.user_agent.starts_with("courier/"));
        assert_eq!(config.error_pause(), Duration::from_secs(1));
        assert_eq!(config.notify.failed_title, "HTTPRequestWorker Failed");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = WorkerConfig::from_toml_str(
            "workers = 4\nerror_pause_ms = 250\n\n[notify]\nfailed_title = \"courier down\"\n",
        )
        .unwrap();
        assert_eq!(config.workers, 4);
        assert_eq!(config.error_pause(), Duration::from_millis(250));
        assert_eq!(config.notify.failed_title, "courier down");
        assert_eq!(
            config.notify.completed_title,
            "HTTPRequestWorker Executed Successfully"
        );
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn zero_workers_is_rejected() {
        let err = WorkerConfig::from_toml_str("workers = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = WorkerConfig::from_toml_str("request_timeout_secs = 0").unwrap_err();
        assert!(err.to_string().contains("request_timeout_secs"));
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let err = WorkerConfig::from_toml_str("workers = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = WorkerConfig::load(Path::new("/nonexistent/courier.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
