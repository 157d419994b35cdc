//! Transport port - メッセージバスの抽象化
//!
//! 接続・チャネル管理・ack のタイミングなどバス固有の話は実装側に閉じ込める。
//! worker はこの trait だけを見る。
//!
//! # 実装
//! - `InMemoryTransport`（開発・テスト用）

use async_trait::async_trait;

use crate::domain::{CorrelationId, Delivery, Notification, StatusReport, TransportError};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Wait for the next delivery.
    ///
    /// - `Ok(None)`: nothing arrived within the transport's wait window
    /// - `Err(TransportError::Closed)`: no more deliveries will ever arrive
    async fn receive(&self) -> Result<Option<Delivery>, TransportError>;

    async fn acknowledge(&self, delivery: &Delivery) -> Result<(), TransportError>;

    /// Send a status report to `destination`, keyed by `correlation_id`.
    async fn reply(
        &self,
        destination: &str,
        correlation_id: &CorrelationId,
        report: &StatusReport,
    ) -> Result<(), TransportError>;

    /// Send an operator-facing notification.
    async fn notify(&self, notification: &Notification) -> Result<(), TransportError>;
}
