//! Outbound notifications. Workflows render a [`Notification`] and hand it to
//! the [`NotificationDispatcher`]; delivery happens on a background worker and
//! never fails the operation that triggered it.

mod dispatcher;
pub mod templates;

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

pub use dispatcher::{DispatchStats, NotificationDispatcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    TestPosted,
    InterviewScheduled,
    InterviewCancelled,
    OfferExtended,
    ResultDraftReady,
}

impl NotificationKind {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationKind::TestPosted => "test_posted",
            NotificationKind::InterviewScheduled => "interview_scheduled",
            NotificationKind::InterviewCancelled => "interview_cancelled",
            NotificationKind::OfferExtended => "offer_extended",
            NotificationKind::ResultDraftReady => "result_draft_ready",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub file_name: String,
    pub content_type: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub subject: String,
    pub html_body: String,
    pub recipients: Vec<String>,
    pub attachment: Option<Attachment>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification has no recipients")]
    NoRecipients,
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Delivery backend (SMTP relay, transactional mail API, ...).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes each notification to the log instead of delivering it. Used when no
/// mail relay is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        if notification.recipients.is_empty() {
            return Err(NotifyError::NoRecipients);
        }
        info!(
            kind = notification.kind.label(),
            subject = %notification.subject,
            recipients = notification.recipients.len(),
            attachment = ?notification
                .attachment
                .as_ref()
                .map(|attachment| attachment.file_name.as_str()),
            "notification logged (no relay configured)"
        );
        Ok(())
    }
}
