//! InMemoryTransport - 開発・テスト用の Transport
//!
//! # 実装詳細
//! - `VecDeque<Delivery>` を受信キューとして使う
//! - tokio の Mutex で排他制御、Notify で push / close を通知
//! - reply / notify / ack はすべて記録して後から確認できる
//!
//! # 使用例
//! ```ignore
//! let transport = InMemoryTransport::new(Duration::from_millis(100));
//! transport.push("corr-1", "replies", br#"{"subcommand":"Get","url":"http://x"}"#.to_vec()).await;
//! transport.close().await;
//! ```

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::{Mutex, Notify};

use crate::domain::{
    CorrelationId, Delivery, DeliveryId, Notification, StatusReport, TransportError,
};
use crate::ports::Transport;

/// A report as it was handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SentReply {
    pub destination: String,
    pub correlation_id: CorrelationId,
    pub report: StatusReport,
}

#[derive(Default)]
struct State {
    pending: VecDeque<Delivery>,
    /// received but not yet acknowledged
    in_flight: HashSet<DeliveryId>,
    acknowledged: Vec<DeliveryId>,
    replies: Vec<SentReply>,
    notifications: Vec<Notification>,
    closed: bool,
}

pub struct InMemoryTransport {
    state: Mutex<State>,
    notify: Notify,
    receive_timeout: Duration,
}

impl InMemoryTransport {
    pub fn new(receive_timeout: Duration) -> Self {
        Self {
            state: Mutex::new(State::default()),
            notify: Notify::new(),
            receive_timeout,
        }
    }

    /// Enqueue a raw task body.
    pub async fn push(
        &self,
        correlation_id: impl Into<CorrelationId>,
        reply_to: impl Into<String>,
        body: Vec<u8>,
    ) -> DeliveryId {
        let id = DeliveryId::generate();
        let delivery = Delivery::new(id, correlation_id.into(), reply_to, body);
        self.state.lock().await.pending.push_back(delivery);
        self.notify.notify_one();
        id
    }

    /// Stop accepting deliveries. Already queued ones are still handed out;
    /// after that `receive` returns `TransportError::Closed`.
    pub async fn close(&self) {
        self.state.lock().await.closed = true;
        self.notify.notify_waiters();
    }

    pub async fn replies(&self) -> Vec<SentReply> {
        self.state.lock().await.replies.clone()
    }

    /// Reports sent for one correlation id, in order.
    pub async fn reports_for(&self, correlation_id: &CorrelationId) -> Vec<StatusReport> {
        self.state
            .lock()
            .await
            .replies
            .iter()
            .filter(|r| &r.correlation_id == correlation_id)
            .map(|r| r.report.clone())
            .collect()
    }

    pub async fn notifications(&self) -> Vec<Notification> {
        self.state.lock().await.notifications.clone()
    }

    pub async fn acknowledged(&self) -> Vec<DeliveryId> {
        self.state.lock().await.acknowledged.clone()
    }

    #[cfg(test)]
    pub(crate) async fn pending_len(&self) -> usize {
        self.state.lock().await.pending.len()
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn receive(&self) -> Result<Option<Delivery>, TransportError> {
        let deadline = tokio::time::Instant::now() + self.receive_timeout;
        loop {
            // 先に Notified を作っておくと、ロック解放後の notify も取りこぼさない
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock().await;
                if let Some(delivery) = state.pending.pop_front() {
                    state.in_flight.insert(delivery.id());
                    return Ok(Some(delivery));
                }
                if state.closed {
                    return Err(TransportError::Closed);
                }
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn acknowledge(&self, delivery: &Delivery) -> Result<(), TransportError> {
        let mut state = self.state.lock().await;
        if !state.in_flight.remove(&delivery.id()) {
            return Err(TransportError::UnknownDelivery(delivery.id()));
        }
        state.acknowledged.push(delivery.id());
        Ok(())
    }

    async fn reply(
        &self,
        destination: &str,
        correlation_id: &CorrelationId,
        report: &StatusReport,
    ) -> Result<(), TransportError> {
        self.state.lock().await.replies.push(SentReply {
            destination: destination.to_string(),
            correlation_id: correlation_id.clone(),
            report: report.clone(),
        });
        Ok(())
    }

    async fn notify(&self, notification: &Notification) -> Result<(), TransportError> {
        self.state
            .lock()
            .await
            .notifications
            .push(notification.clone());
        Ok(())
    }
}
