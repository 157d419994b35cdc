//! HttpClient port - 外向き HTTP 呼び出しの抽象化
//!
//! リクエストは plain data として渡し、結果はステータスコードだけを返す。
//! HTTP のエラーステータスは「成功した通信」であり、`Err` になるのは
//! ステータスが得られなかった場合だけ。

use async_trait::async_trait;

use crate::domain::{ConnectivityError, RequestBody, Verb};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub verb: Verb,
    pub url: String,
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    pub fn new(verb: Verb, url: impl Into<String>) -> Self {
        Self {
            verb,
            url: url.into(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }
}

/// Performs exactly one attempt per call. No retries.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<u16, ConnectivityError>;
}
