//! Delivery - transport から受け取った 1 件のメッセージ
//!
//! body は未解釈のバイト列のまま持つ。解釈は worker 側（`TaskMessage::from_slice`）。

use super::errors::DispatchError;
use super::ids::{CorrelationId, DeliveryId};
use super::task::TaskMessage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    id: DeliveryId,
    correlation_id: CorrelationId,
    reply_to: String,
    body: Vec<u8>,
}

impl Delivery {
    pub fn new(
        id: DeliveryId,
        correlation_id: CorrelationId,
        reply_to: impl Into<String>,
        body: Vec<u8>,
    ) -> Self {
        Self {
            id,
            correlation_id,
            reply_to: reply_to.into(),
            body,
        }
    }

    pub fn id(&self) -> DeliveryId {
        self.id
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.correlation_id
    }

    /// Reply destination for status reports.
    pub fn reply_to(&self) -> &str {
        &self.reply_to
    }

    pub fn message(&self) -> Result<TaskMessage, DispatchError> {
        TaskMessage::from_slice(&self.body)
    }
}
