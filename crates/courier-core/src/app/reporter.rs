//! Reporter - started / completed / failed の送信と運用通知
//!
//! 送信は fire-and-forget。transport のエラーは warn に残すだけで、
//! リトライもしないし、別の terminal report にすり替えることもしない。
//!
//! 通知の文面:
//! - completed: `completed_title` / "<worker_name> successfully executed <Verb>. See logs."
//! - failed: `failed_title` / エラー文字列

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::NotifyConfig;
use crate::domain::{
    Delivery, DispatchError, Notification, NotifyOutcome, RequestOutcome, StatusReport,
};
use crate::ports::Transport;

#[derive(Clone)]
pub struct Reporter {
    transport: Arc<dyn Transport>,
    text: NotifyConfig,
}

impl Reporter {
    pub fn new(transport: Arc<dyn Transport>, text: NotifyConfig) -> Self {
        Self { transport, text }
    }

    /// Sent on receipt, before dispatch starts.
    pub async fn started(&self, delivery: &Delivery) {
        self.reply(delivery, &StatusReport::Started).await;
    }

    pub async fn completed(&self, delivery: &Delivery, outcome: &RequestOutcome) {
        self.reply(
            delivery,
            &StatusReport::Completed {
                data: outcome.summary.clone(),
            },
        )
        .await;
        info!(
            correlation_id = %delivery.correlation_id(),
            delivery_id = %delivery.id(),
            subcommand = %outcome.verb,
            status = outcome.observed_status_code,
            "{}",
            outcome.summary
        );
        let message = format!(
            "{} successfully executed {}. See logs.",
            self.text.worker_name, outcome.verb
        );
        self.notify(
            delivery,
            &self.text.completed_title,
            &message,
            NotifyOutcome::Completed,
        )
        .await;
    }

    pub async fn failed(&self, delivery: &Delivery, err: &DispatchError) {
        error!(
            correlation_id = %delivery.correlation_id(),
            delivery_id = %delivery.id(),
            kind = err.kind().as_str(),
            error = ?err,
            "{err}"
        );
        self.reply(delivery, &StatusReport::Failed).await;
        self.notify(
            delivery,
            &self.text.failed_title,
            &err.to_string(),
            NotifyOutcome::Failed,
        )
        .await;
    }

    async fn reply(&self, delivery: &Delivery, report: &StatusReport) {
        if let Err(e) = self
            .transport
            .reply(delivery.reply_to(), delivery.correlation_id(), report)
            .await
        {
            warn!(
                correlation_id = %delivery.correlation_id(),
                ?report,
                "reply failed: {e}"
            );
        }
    }

    async fn notify(
        &self,
        delivery: &Delivery,
        title: &str,
        message: &str,
        outcome: NotifyOutcome,
    ) {
        let notification = Notification {
            title: title.to_string(),
            message: message.to_string(),
            outcome,
            correlation_id: delivery.correlation_id().clone(),
        };
        if let Err(e) = self.transport.notify(&notification).await {
            warn!(correlation_id = %delivery.correlation_id(), "notify failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NotifyConfig;
    use crate::domain::{CorrelationId, DeliveryId, Verb};
    use crate::impls::InMemoryTransport;
    use std::time::Duration;

    fn delivery() -> Delivery {
        Delivery::new(
            DeliveryId::generate(),
            CorrelationId::from("c-1"),
            "replies",
            b"{}".to_vec(),
        )
    }

    #[tokio::test]
    async fn completed_sends_report_then_notification() {
        let transport = Arc::new(InMemoryTransport::new(Duration::from_millis(10)));
        let reporter = Reporter::new(transport.clone(), NotifyConfig::default());
        let delivery = delivery();

        reporter.started(&delivery).await;
        reporter
            .completed(&delivery, &RequestOutcome::as_expected(Verb::Get, 200))
            .await;

        assert_eq!(
            transport.reports_for(delivery.correlation_id()).await,
            vec![
                StatusReport::Started,
                StatusReport::Completed {
                    data: "URL returned 200 as expected.".into()
                }
            ]
        );
        let replies = transport.replies().await;
        assert!(replies.iter().all(|r| r.destination == "replies"));

        let notifications = transport.notifications().await;
        assert_eq!(
            notifications,
            vec![Notification {
                title: "HTTPRequestWorker Executed Successfully".into(),
                message: "HTTPRequestWorker successfully executed Get. See logs.".into(),
                outcome: NotifyOutcome::Completed,
                correlation_id: CorrelationId::from("c-1"),
            }]
        );
    }

    #[tokio::test]
    async fn failed_report_carries_no_error_text() {
        let transport = Arc::new(InMemoryTransport::new(Duration::from_millis(10)));
        let reporter = Reporter::new(transport.clone(), NotifyConfig::default());
        let delivery = delivery();

        reporter
            .failed(&delivery, &DispatchError::MissingInput("url"))
            .await;

        assert_eq!(
            transport.reports_for(delivery.correlation_id()).await,
            vec![StatusReport::Failed]
        );
        let notifications = transport.notifications().await;
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].outcome, NotifyOutcome::Failed);
        assert_eq!(notifications[0].title, "HTTPRequestWorker Failed");
        assert_eq!(notifications[0].message, "Missing input url");
    }

    #[tokio::test]
    async fn notification_text_is_configurable() {
        let transport = Arc::new(InMemoryTransport::new(Duration::from_millis(10)));
        let text = NotifyConfig {
            worker_name: "courier".into(),
            completed_title: "courier ok".into(),
            failed_title: "courier down".into(),
        };
        let reporter = Reporter::new(transport.clone(), text);
        let delivery = delivery();

        reporter
            .completed(&delivery, &RequestOutcome::as_expected(Verb::Post, 201))
            .await;
        reporter
            .failed(&delivery, &DispatchError::NoSubcommand)
            .await;

        let notifications = transport.notifications().await;
        assert_eq!(notifications[0].title, "courier ok");
        assert_eq!(
            notifications[0].message,
            "courier successfully executed Post. See logs."
        );
        assert_eq!(notifications[1].title, "courier down");
        assert_eq!(
            notifications[1].message,
            "No valid subcommand given. Nothing to do!"
        );
    }
}
