//! Report - reply destination に返すステータスと、運用向けの通知
//!
//! # ワイヤ形式
//! - `{"status": "started"}`
//! - `{"status": "completed", "data": "<summary>"}`
//! - `{"status": "failed"}`

use serde::{Deserialize, Serialize};

use super::ids::CorrelationId;

/// Lifecycle message sent to the task's reply destination.
///
/// Exactly one `Started` and one terminal (`Completed` / `Failed`) per task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StatusReport {
    Started,
    Completed { data: String },
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyOutcome {
    Completed,
    Failed,
}

/// Side-channel message for operators, independent of the reply destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub outcome: NotifyOutcome,
    pub correlation_id: CorrelationId,
}
