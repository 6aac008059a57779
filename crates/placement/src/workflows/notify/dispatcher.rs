use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::{Notification, Notifier};

enum Command {
    Send(Box<Notification>),
    Flush(oneshot::Sender<()>),
}

#[derive(Debug, Default)]
struct Counters {
    attempted: AtomicU64,
    failed: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DispatchStats {
    pub attempted: u64,
    pub failed: u64,
}

/// Fire-and-forget queue in front of a [`Notifier`]. Commands are processed in
/// order by a single worker task, so `flush` observes every notification
/// dispatched before it.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sender: mpsc::UnboundedSender<Command>,
    counters: Arc<Counters>,
}

impl NotificationDispatcher {
    /// Starts the delivery worker on the current tokio runtime. The worker
    /// exits once every dispatcher handle has been dropped.
    pub fn spawn(notifier: Arc<dyn Notifier>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Command>();
        let counters = Arc::new(Counters::default());
        let worker_counters = Arc::clone(&counters);

        tokio::spawn(async move {
            while let Some(command) = receiver.recv().await {
                match command {
                    Command::Send(notification) => {
                        worker_counters.attempted.fetch_add(1, Ordering::Relaxed);
                        match notifier.send(&notification).await {
                            Ok(()) => debug!(
                                kind = notification.kind.label(),
                                recipients = notification.recipients.len(),
                                "notification delivered"
                            ),
                            Err(err) => {
                                worker_counters.failed.fetch_add(1, Ordering::Relaxed);
                                warn!(
                                    kind = notification.kind.label(),
                                    subject = %notification.subject,
                                    error = %err,
                                    "notification delivery failed"
                                );
                            }
                        }
                    }
                    Command::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            debug!("notification worker stopped");
        });

        Self { sender, counters }
    }

    pub fn dispatch(&self, notification: Notification) {
        let kind = notification.kind;
        if self
            .sender
            .send(Command::Send(Box::new(notification)))
            .is_err()
        {
            self.counters.failed.fetch_add(1, Ordering::Relaxed);
            warn!(
                kind = kind.label(),
                "notification worker is gone; dropping notification"
            );
        }
    }

    /// Resolves after every notification queued before this call was attempted.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.sender.send(Command::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            attempted: self.counters.attempted.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for NotificationDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationDispatcher")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
