//! Executor - HttpCommand を 1 回だけ実行する
//!
//! 動詞ごとのリクエスト組み立てはここの match に集約。リトライはしない。

use std::sync::Arc;

use tracing::debug;

use crate::domain::{ConnectivityError, HttpCommand, Verb};
use crate::ports::{HttpClient, HttpRequest};

#[derive(Clone)]
pub struct Executor {
    client: Arc<dyn HttpClient>,
}

impl Executor {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self { client }
    }

    /// Perform the request and return the raw status code.
    ///
    /// Any HTTP status, 2xx or not, is `Ok`.
    pub async fn execute(&self, command: &HttpCommand) -> Result<u16, ConnectivityError> {
        let request = match command {
            HttpCommand::Get { url } => HttpRequest::new(Verb::Get, url.as_str()),
            HttpCommand::Delete { url } => HttpRequest::new(Verb::Delete, url.as_str()),
            HttpCommand::Put { url, body } => {
                HttpRequest::new(Verb::Put, url.as_str()).with_body(body.clone())
            }
            HttpCommand::Post { url, body } => {
                HttpRequest::new(Verb::Post, url.as_str()).with_body(body.clone())
            }
        };

        debug!(command = %command, "executing");
        self.client.send(request).await
    }
}
