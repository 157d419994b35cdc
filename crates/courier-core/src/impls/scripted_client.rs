//! ScriptedHttpClient - ネットワークに出ない HttpClient
//!
//! 決まったステータス（または接続エラー）を返し、受け取ったリクエストを記録する。
//! テストと CLI の `--simulate-status` で使う。

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::ConnectivityError;
use crate::ports::{HttpClient, HttpRequest};

#[derive(Debug, Clone)]
enum Script {
    Status(u16),
    Unreachable(ConnectivityError),
}

#[derive(Debug)]
pub struct ScriptedHttpClient {
    script: Script,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedHttpClient {
    /// Every request returns `status`.
    pub fn with_status(status: u16) -> Self {
        Self::new(Script::Status(status))
    }

    /// Every request fails as if the host could not be reached.
    pub fn unreachable() -> Self {
        Self::new(Script::Unreachable(ConnectivityError::Connect(
            "connection refused".to_string(),
        )))
    }

    pub fn failing_with(err: ConnectivityError) -> Self {
        Self::new(Script::Unreachable(err))
    }

    fn new(script: Script) -> Self {
        Self {
            script,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests seen so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn send(&self, request: HttpRequest) -> Result<u16, ConnectivityError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        match &self.script {
            Script::Status(status) => Ok(*status),
            Script::Unreachable(err) => Err(err.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Verb;

    #[tokio::test]
    async fn records_requests_and_returns_status() {
        let client = ScriptedHttpClient::with_status(418);
        let status = client
            .send(HttpRequest::new(Verb::Get, "http://x"))
            .await
            .unwrap();
        assert_eq!(status, 418);
        assert_eq!(client.calls(), 1);
        assert_eq!(client.requests()[0].url, "http://x");
    }

    #[tokio::test]
    async fn unreachable_returns_connectivity_error() {
        let client = ScriptedHttpClient::unreachable();
        let err = client
            .send(HttpRequest::new(Verb::Delete, "http://x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectivityError::Connect(_)));
        assert_eq!(client.calls(), 1);
    }
}
