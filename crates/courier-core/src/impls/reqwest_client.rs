//! ReqwestClient - 本番用の HttpClient
//!
//! 1 回の呼び出しにつき 1 回だけ送る。リトライはしない。
//! レスポンス本文は読まずに捨て、ステータスコードだけを返す。

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

use crate::config::WorkerConfig;
use crate::domain::{ConnectivityError, Verb};
use crate::ports::{HttpClient, HttpRequest};

#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn from_config(config: &WorkerConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn method(verb: Verb) -> Method {
    match verb {
        Verb::Get => Method::GET,
        Verb::Put => Method::PUT,
        Verb::Post => Method::POST,
        Verb::Delete => Method::DELETE,
    }
}

fn classify(err: reqwest::Error) -> ConnectivityError {
    if err.is_timeout() {
        ConnectivityError::Timeout(err.to_string())
    } else if err.is_connect() {
        ConnectivityError::Connect(err.to_string())
    } else if err.is_builder() {
        ConnectivityError::InvalidRequest(err.to_string())
    } else {
        ConnectivityError::Other(err.to_string())
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn send(&self, request: HttpRequest) -> Result<u16, ConnectivityError> {
        let mut builder = self.client.request(method(request.verb), request.url.as_str());
        if let Some(body) = request.body {
            builder = builder
                .header(CONTENT_TYPE, body.content_type)
                .body(body.bytes);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status().as_u16();
        debug!(verb = %request.verb, url = %request.url, status, "http request finished");
        Ok(status)
    }
}
