//! WorkerLoop - タスク実行ループ
//!
//! # フロー（1 件あたり）
//! 1. `Transport::receive()` で Delivery を取得
//! 2. `started` を送信
//! 3. body を TaskMessage に解釈 → Dispatcher 実行
//! 4. `completed` / `failed` のどちらか 1 つを送信 + 通知
//! 5. `Transport::acknowledge()`
//!
//! 失敗はすべてこの境界で受け止める。ワーカー自体は落ちない。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::dispatcher::Dispatcher;
use crate::app::reporter::Reporter;
use crate::domain::{Delivery, DispatchError, RequestOutcome, TransportError};
use crate::observability::{WorkerCounters, WorkerCounts};
use crate::ports::Transport;

pub struct WorkerLoop {
    transport: Arc<dyn Transport>,
    dispatcher: Dispatcher,
    reporter: Reporter,
    counters: Arc<WorkerCounters>,
    // pause after a transport error before receiving again
    error_pause: Duration,
}

impl WorkerLoop {
    pub fn new(
        transport: Arc<dyn Transport>,
        dispatcher: Dispatcher,
        reporter: Reporter,
        error_pause: Duration,
    ) -> Self {
        Self {
            transport,
            dispatcher,
            reporter,
            counters: Arc::new(WorkerCounters::new()),
            error_pause,
        }
    }

    pub fn counts(&self) -> WorkerCounts {
        self.counters.snapshot()
    }

    #[cfg(test)]
    pub(crate) fn error_pause(&self) -> Duration {
        self.error_pause
    }

    /// Process one delivery end to end.
    ///
    /// Exactly one `started` and one terminal report are sent, whatever the
    /// result. The dispatch error is returned to the caller after reporting.
    pub async fn process(&self, delivery: Delivery) -> Result<RequestOutcome, DispatchError> {
        self.counters.record_received();
        debug!(
            correlation_id = %delivery.correlation_id(),
            delivery_id = %delivery.id(),
            "received"
        );
        self.reporter.started(&delivery).await;

        let result = match delivery.message() {
            Ok(message) => self.dispatcher.dispatch(&message).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(outcome) => {
                self.counters.record_completed();
                self.reporter.completed(&delivery, outcome).await;
            }
            Err(err) => {
                self.counters.record_failed();
                self.reporter.failed(&delivery, err).await;
            }
        }

        if let Err(e) = self.transport.acknowledge(&delivery).await {
            warn!(delivery_id = %delivery.id(), "ack failed: {e}");
        }

        result
    }

    /// Receive and process until shutdown is requested or the transport closes.
    pub async fn run(&self, worker_id: usize, shutdown_rx: &mut watch::Receiver<bool>) {
        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            // receive は待つ可能性があるので shutdown と競合させる
            let received = tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() {
                        // sender が drop された
                        break;
                    }
                    continue;
                }
                received = self.transport.receive() => received,
            };

            match received {
                Ok(Some(delivery)) => {
                    // in-flight のタスクは shutdown でも最後まで実行する
                    if let Err(e) = self.process(delivery).await {
                        debug!(worker_id, "task failed: {e}");
                    }
                }
                Ok(None) => continue,
                Err(TransportError::Closed) => {
                    info!(worker_id, "transport closed");
                    break;
                }
                Err(e) => {
                    warn!(worker_id, "receive failed: {e}");
                    tokio::time::sleep(self.error_pause).await;
                }
            }
        }
        debug!(worker_id, "worker stopped");
    }
}

/// Worker group handle.
/// - `request_shutdown()` で新しいタスクの受信を止める（実行中のものは止めない）
/// - `join()` で全ワーカーの終了を待てる
pub struct WorkerGroup {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
    worker: Arc<WorkerLoop>,
}

impl WorkerGroup {
    /// Spawn `n` workers sharing one `WorkerLoop`.
    pub fn spawn(n: usize, worker: Arc<WorkerLoop>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut joins = Vec::with_capacity(n);
        for worker_id in 0..n {
            let w = Arc::clone(&worker);
            let mut rx = shutdown_rx.clone();
            joins.push(tokio::spawn(async move {
                w.run(worker_id, &mut rx).await;
            }));
        }

        Self {
            shutdown_tx,
            joins,
            worker,
        }
    }

    pub fn request_shutdown(&self) {
        // ignore send error: receivers may already be dropped
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for every worker to stop on its own (e.g. transport closed).
    pub async fn join(self) -> WorkerCounts {
        let Self {
            shutdown_tx,
            joins,
            worker,
        } = self;
        for j in joins {
            if let Err(e) = j.await {
                warn!("worker task ended abnormally: {e}");
            }
        }
        drop(shutdown_tx);
        worker.counts()
    }

    pub async fn shutdown_and_join(self) -> WorkerCounts {
        self.request_shutdown();
        self.join().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::executor::Executor;
    use crate::config::NotifyConfig;
    use crate::domain::{CorrelationId, Notification, NotifyOutcome, StatusReport};
    use crate::impls::{InMemoryTransport, ScriptedHttpClient};
    use async_trait::async_trait;
    use serde_json::json;

    fn worker(
        transport: Arc<dyn Transport>,
        client: Arc<ScriptedHttpClient>,
    ) -> Arc<WorkerLoop> {
        Arc::new(WorkerLoop::new(
            transport.clone(),
            Dispatcher::new(Executor::new(client)),
            Reporter::new(transport, NotifyConfig::default()),
            Duration::from_millis(10),
        ))
    }

    fn body(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[tokio::test]
    async fn get_success_sequence() {
        let transport = Arc::new(InMemoryTransport::new(Duration::from_millis(50)));
        let client = Arc::new(ScriptedHttpClient::with_status(200));
        let worker = worker(transport.clone(), client);

        transport
            .push(
                "c-1",
                "replies",
                body(json!({
                    "parameters": {
                        "command": "httprequest",
                        "subcommand": "Get",
                        "url": "http://x",
                        "code": 200
                    }
                })),
            )
            .await;
        let delivery = transport.receive().await.unwrap().unwrap();
        let outcome = worker.process(delivery).await.unwrap();

        assert_eq!(outcome.summary, "URL returned 200 as expected.");
        assert_eq!(
            transport.reports_for(&CorrelationId::from("c-1")).await,
            vec![
                StatusReport::Started,
                StatusReport::Completed {
                    data: "URL returned 200 as expected.".into()
                }
            ]
        );
        assert_eq!(transport.acknowledged().await.len(), 1);
        assert_eq!(worker.counts().completed, 1);
        assert_eq!(
            transport.notifications().await[0].message,
            "HTTPRequestWorker successfully executed Get. See logs."
        );
    }

    #[tokio::test]
    async fn put_mismatch_sequence() {
        let transport = Arc::new(InMemoryTransport::new(Duration::from_millis(50)));
        let client = Arc::new(ScriptedHttpClient::with_status(400));
        let worker = worker(transport.clone(), client);

        transport
            .push(
                "c-2",
                "replies",
                body(json!({
                    "parameters": {
                        "command": "httprequest",
                        "subcommand": "Put",
                        "url": "http://x",
                        "contenttype": "application/json",
                        "content": "{}",
                        "code": 201
                    }
                })),
            )
            .await;
        let delivery = transport.receive().await.unwrap().unwrap();
        let err = worker.process(delivery).await.unwrap_err();

        assert_eq!(err.to_string(), "Expected status 201 but got 400");
        assert_eq!(
            transport.reports_for(&CorrelationId::from("c-2")).await,
            vec![StatusReport::Started, StatusReport::Failed]
        );
        let notifications = transport.notifications().await;
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].outcome, NotifyOutcome::Failed);
        assert_eq!(notifications[0].title, "HTTPRequestWorker Failed");
        assert_eq!(notifications[0].message, "Expected status 201 but got 400");
    }

    #[tokio::test]
    async fn malformed_body_still_gets_both_reports() {
        let transport = Arc::new(InMemoryTransport::new(Duration::from_millis(50)));
        let client = Arc::new(ScriptedHttpClient::with_status(200));
        let worker = worker(transport.clone(), client.clone());

        transport.push("c-3", "replies", b"garbage".to_vec()).await;
        let delivery = transport.receive().await.unwrap().unwrap();
        assert!(worker.process(delivery).await.is_err());

        assert_eq!(
            transport.reports_for(&CorrelationId::from("c-3")).await,
            vec![StatusReport::Started, StatusReport::Failed]
        );
        assert_eq!(client.calls(), 0);
    }

    /// Transport whose outbound side always fails.
    struct BrokenOutbound {
        inner: InMemoryTransport,
    }

    #[async_trait]
    impl Transport for BrokenOutbound {
        async fn receive(&self) -> Result<Option<Delivery>, TransportError> {
            self.inner.receive().await
        }

        async fn acknowledge(&self, delivery: &Delivery) -> Result<(), TransportError> {
            self.inner.acknowledge(delivery).await
        }

        async fn reply(
            &self,
            _destination: &str,
            _correlation_id: &CorrelationId,
            _report: &StatusReport,
        ) -> Result<(), TransportError> {
            Err(TransportError::Other("channel down".into()))
        }

        async fn notify(&self, _notification: &Notification) -> Result<(), TransportError> {
            Err(TransportError::Other("channel down".into()))
        }
    }

    #[tokio::test]
    async fn reporting_failures_do_not_change_the_result() {
        let transport = Arc::new(BrokenOutbound {
            inner: InMemoryTransport::new(Duration::from_millis(50)),
        });
        let client = Arc::new(ScriptedHttpClient::with_status(200));
        let worker = worker(transport.clone(), client);

        transport
            .inner
            .push(
                "c-4",
                "replies",
                body(json!({"subcommand": "Delete", "url": "http://x"})),
            )
            .await;
        let delivery = transport.receive().await.unwrap().unwrap();
        let outcome = worker.process(delivery).await.unwrap();

        assert_eq!(outcome.observed_status_code, 200);
        assert_eq!(transport.inner.acknowledged().await.len(), 1);
    }

    #[tokio::test]
    async fn group_drains_closed_transport() {
        let transport = Arc::new(InMemoryTransport::new(Duration::from_millis(50)));
        let client = Arc::new(ScriptedHttpClient::with_status(200));
        let worker = worker(transport.clone(), client.clone());

        for i in 0..5 {
            transport
                .push(
                    format!("c-{i}"),
                    "replies",
                    body(json!({"parameters": {"subcommand": "Get", "url": "http://x"}})),
                )
                .await;
        }
        transport.push("bad", "replies", body(json!({}))).await;
        transport.close().await;

        let counts = WorkerGroup::spawn(3, worker).join().await;

        assert_eq!(counts.received, 6);
        assert_eq!(counts.completed, 5);
        assert_eq!(counts.failed, 1);
        assert_eq!(client.calls(), 5);
        assert_eq!(transport.acknowledged().await.len(), 6);
        // started + terminal for each delivery
        assert_eq!(transport.replies().await.len(), 12);
    }

    #[tokio::test]
    async fn shutdown_stops_idle_workers() {
        let transport = Arc::new(InMemoryTransport::new(Duration::from_secs(5)));
        let client = Arc::new(ScriptedHttpClient::with_status(200));
        let group = WorkerGroup::spawn(2, worker(transport, client));

        tokio::time::sleep(Duration::from_millis(50)).await;
        let counts = tokio::time::timeout(Duration::from_secs(1), group.shutdown_and_join())
            .await
            .expect("workers should stop promptly");
        assert_eq!(counts.received, 0);
    }
}
