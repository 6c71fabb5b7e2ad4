//! Outbound notification dispatch.
//!
//! Transport and template rendering live outside this crate; the lifecycle
//! manager only sees [`MailDispatch`]. Deliveries are fire-and-forget: the
//! [`Notifier`] spawns each one and logs failures instead of returning them.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

/// A templated notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    /// Template identifier understood by the transport, e.g. `password`.
    pub template: String,
    /// Values substituted into the template.
    pub context: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport error: {0}")]
    Transport(String),
}

/// Delivers one notification.
#[async_trait]
pub trait MailDispatch: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError>;
}

/// Dispatcher that only records the notification in the log.
///
/// Context values are not logged: they carry temporary secrets and reset links.
#[derive(Clone, Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl MailDispatch for LogMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            template = %message.template,
            "notification logged"
        );
        Ok(())
    }
}

/// Dispatcher that keeps every message in memory.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<MailMessage>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages delivered so far, oldest first.
    pub fn messages(&self) -> Vec<MailMessage> {
        self.sent.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<MailMessage> {
        self.messages().pop()
    }
}

#[async_trait]
impl MailDispatch for RecordingMailer {
    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        self.sent
            .lock()
            .map_err(|e| MailError::Transport(format!("recorder poisoned: {e}")))?
            .push(message.clone());
        Ok(())
    }
}

/// Fire-and-forget front for a [`MailDispatch`].
#[derive(Clone)]
pub struct Notifier {
    dispatch: Arc<dyn MailDispatch>,
    tracker: TaskTracker,
    flushing: Arc<tokio::sync::Mutex<()>>,
}

impl Notifier {
    pub fn new(dispatch: Arc<dyn MailDispatch>) -> Self {
        Self {
            dispatch,
            tracker: TaskTracker::new(),
            flushing: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Spawn delivery of `message`. Must be called from within a tokio runtime.
    pub fn dispatch(&self, message: MailMessage) {
        let dispatch = self.dispatch.clone();
        self.tracker.spawn(async move {
            match dispatch.send(&message).await {
                Ok(()) => debug!(to = %message.to, template = %message.template, "notification delivered"),
                Err(e) => error!(
                    to = %message.to,
                    template = %message.template,
                    error = %e,
                    "notification delivery failed"
                ),
            }
        });
    }

    /// Number of deliveries still in flight.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Wait for every delivery spawned so far to finish.
    ///
    /// Concurrent flushes take turns; the tracker is only reopened once the
    /// current waiter has seen it drain.
    pub async fn flush(&self) {
        let _turn = self.flushing.lock().await;
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

impl std::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifier")
            .field("pending", &self.tracker.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    struct FailingMailer;

    #[async_trait]
    impl MailDispatch for FailingMailer {
        async fn send(&self, _message: &MailMessage) -> Result<(), MailError> {
            Err(MailError::Transport("smtp down".into()))
        }
    }

    fn message() -> MailMessage {
        MailMessage {
            to: "alice@example.com".into(),
            subject: "hello".into(),
            template: "password".into(),
            context: serde_json::json!({ "username": "Alice" }),
        }
    }

    #[tokio::test]
    async fn flush_waits_for_delivery() {
        let recorder = Arc::new(RecordingMailer::new());
        let notifier = Notifier::new(recorder.clone());

        notifier.dispatch(message());
        notifier.dispatch(message());
        notifier.flush().await;

        assert_eq!(recorder.messages().len(), 2);
        assert_eq!(notifier.pending(), 0);
    }

    #[tokio::test]
    async fn failed_delivery_is_swallowed() {
        let notifier = Notifier::new(Arc::new(FailingMailer));
        notifier.dispatch(message());
        notifier.flush().await;
        assert_eq!(notifier.pending(), 0);
    }

    struct SlowMailer(Duration);

    #[async_trait]
    impl MailDispatch for SlowMailer {
        async fn send(&self, _message: &MailMessage) -> Result<(), MailError> {
            tokio::time::sleep(self.0).await;
            Ok(())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_flushes_all_complete() {
        let notifier = Notifier::new(Arc::new(SlowMailer(Duration::from_millis(20))));
        for _ in 0..4 {
            notifier.dispatch(message());
        }

        let flushes = async {
            tokio::join!(notifier.flush(), notifier.flush(), notifier.flush());
        };
        tokio::time::timeout(Duration::from_secs(5), flushes)
            .await
            .expect("flushes finished");
        assert_eq!(notifier.pending(), 0);
    }

    #[tokio::test]
    async fn notifier_is_reusable_after_flush() {
        let recorder = Arc::new(RecordingMailer::new());
        let notifier = Notifier::new(recorder.clone());

        notifier.dispatch(message());
        notifier.flush().await;
        notifier.dispatch(message());
        notifier.flush().await;

        assert_eq!(recorder.messages().len(), 2);
    }
}
