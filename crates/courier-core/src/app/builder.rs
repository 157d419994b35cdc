//! WorkerBuilder - ワーカーの構築とワイヤリング
//!
//! # Fail-fast 設計
//! - transport は必須。未設定なら `BuildError::MissingTransport`
//! - config は build 時に検証する
//! - http client 未設定なら config から `ReqwestClient` を作る

use std::sync::Arc;

use crate::app::dispatcher::Dispatcher;
use crate::app::executor::Executor;
use crate::app::reporter::Reporter;
use crate::app::worker_loop::WorkerLoop;
use crate::config::{ConfigError, WorkerConfig};
use crate::impls::ReqwestClient;
use crate::ports::{HttpClient, Transport};

/// # 使用例
/// ```ignore
/// let worker = WorkerBuilder::new()
///     .transport(transport)
///     .config(config)
///     .build()?;
/// ```
pub struct WorkerBuilder {
    transport: Option<Arc<dyn Transport>>,
    http_client: Option<Arc<dyn HttpClient>>,
    config: WorkerConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no transport configured")]
    MissingTransport,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl WorkerBuilder {
    pub fn new() -> Self {
        Self {
            transport: None,
            http_client: None,
            config: WorkerConfig::default(),
        }
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn config(mut self, config: WorkerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> Result<WorkerLoop, BuildError> {
        self.config.validate()?;
        let transport = self.transport.ok_or(BuildError::MissingTransport)?;

        let http_client: Arc<dyn HttpClient> = match self.http_client {
            Some(client) => client,
            None => Arc::new(
                ReqwestClient::from_config(&self.config)
                    .map_err(|e| BuildError::HttpClient(e.to_string()))?,
            ),
        };

        Ok(WorkerLoop::new(
            transport.clone(),
            Dispatcher::new(Executor::new(http_client)),
            Reporter::new(transport, self.config.notify.clone()),
            self.config.error_pause(),
        ))
    }
}

impl Default for WorkerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
