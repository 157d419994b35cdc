//! Errors - エラー型と分類
//!
//! - `DispatchError`: タスク単位の失敗。すべて `failed` report に畳み込まれる
//! - `ConnectivityError`: DNS / 接続 / タイムアウトなど、HTTP ステータスが得られなかった失敗
//! - `ValidationError`: ステータスコードの比較・変換の失敗
//! - `TransportError`: バス側（receive / ack / reply / notify）の失敗

use thiserror::Error;

use super::ids::DeliveryId;

/// ErrorKind は失敗の運用分類（ログ用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 呼び出し側の入力が不正
    Input,
    /// 通信は成功したが期待と違う結果
    Validation,
    /// ステータスが得られなかった
    Connectivity,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Input => "input",
            ErrorKind::Validation => "validation",
            ErrorKind::Connectivity => "connectivity",
        }
    }
}

/// Network level failure: no HTTP status was observed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectivityError {
    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request could not be built: {0}")]
    InvalidRequest(String),

    #[error("request failed: {0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Expected status {expected} but got {observed}")]
    UnexpectedStatus { expected: u16, observed: u16 },

    #[error("invalid status code {0}")]
    InvalidCode(String),
}

/// Task level failure. Every variant ends in exactly one `failed` report.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("No valid subcommand given. Nothing to do!")]
    NoSubcommand,

    #[error("Missing input {0}")]
    MissingInput(&'static str),

    #[error("invalid content encoding: {0}")]
    InvalidEncoding(String),

    #[error("Invalid expected status code {0}")]
    InvalidExpectedCode(String),

    #[error("Malformed task message: {0}")]
    MalformedMessage(String),

    #[error("Could not connect to the requested URL.")]
    Connectivity(#[from] ConnectivityError),

    #[error("Expected status {expected} but got {observed}")]
    UnexpectedStatus { expected: u16, observed: u16 },
}

impl DispatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::NoSubcommand
            | DispatchError::MissingInput(_)
            | DispatchError::InvalidEncoding(_)
            | DispatchError::InvalidExpectedCode(_)
            | DispatchError::MalformedMessage(_) => ErrorKind::Input,
            DispatchError::UnexpectedStatus { .. } => ErrorKind::Validation,
            DispatchError::Connectivity(_) => ErrorKind::Connectivity,
        }
    }
}

impl From<ValidationError> for DispatchError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::UnexpectedStatus { expected, observed } => {
                DispatchError::UnexpectedStatus { expected, observed }
            }
            ValidationError::InvalidCode(value) => DispatchError::InvalidExpectedCode(value),
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    /// No more deliveries will arrive.
    #[error("transport closed")]
    Closed,

    #[error("unknown delivery {0}")]
    UnknownDelivery(DeliveryId),

    #[error("{0}")]
    Other(String),
}
