use std::collections::BTreeSet;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::cache::ResourceCache;
use super::domain::{FormId, ResponderLink};
use super::provider::{FormProvider, ProviderError};
use crate::workflows::error::{WorkflowError, WorkflowResult};

pub const FORM_NOT_SHARED: &str = "Form not shared with email address.";

/// Resolves a responder link to the provider's form id. The cache is the
/// fast path; on a miss one change-feed poll warms the cache for every form
/// that changed since the checkpoint. Forms whose metadata lookup failed
/// are retried on the next miss, since the feed will not report them again.
#[derive(Clone)]
pub struct FormResolver {
    cache: Arc<dyn ResourceCache>,
    provider: Arc<dyn FormProvider>,
    deadline: Duration,
    retry: Arc<Mutex<BTreeSet<String>>>,
}

impl FormResolver {
    pub fn new(
        cache: Arc<dyn ResourceCache>,
        provider: Arc<dyn FormProvider>,
        deadline: Duration,
    ) -> Self {
        Self {
            cache,
            provider,
            deadline,
            retry: Arc::default(),
        }
    }

    pub async fn resolve(&self, responder_link: &str) -> WorkflowResult<FormId> {
        let link = ResponderLink::normalize(responder_link);
        if link.as_str().is_empty() {
            return Err(WorkflowError::invalid_input("responder link is empty"));
        }

        if let Some(form_id) = self.cache.get(link.as_str()).await? {
            debug!(link = %link, form_id = %form_id, "responder link served from cache");
            return Ok(FormId(form_id));
        }

        let warm = self.warm_from_change_feed().await?;
        info!(link = %link, warmed = warm.warmed, skipped = warm.skipped, "change feed processed after cache miss");

        match (self.cache.get(link.as_str()).await?, warm.first_failure) {
            (Some(form_id), _) => Ok(FormId(form_id)),
            // the unresolved link may belong to a form whose metadata failed
            (None, Some(err)) => Err(err),
            (None, None) => {
                warn!(link = %link, "responder link unresolved; form not shared yet");
                Err(WorkflowError::IncompleteAction(FORM_NOT_SHARED.to_string()))
            }
        }
    }

    /// Caches every live form in the current change-feed page, not only the
    /// requested one, plus any form left over from an earlier failed lookup.
    /// A failed lookup is skipped so the rest of the batch still lands.
    async fn warm_from_change_feed(&self) -> WorkflowResult<WarmOutcome> {
        let changes =
            with_deadline(self.deadline, self.provider.list_changes_since_checkpoint()).await?;

        let mut pending = self.take_retries()?;
        for change in &changes {
            if change.is_live_form() {
                pending.insert(change.resource_id.clone());
            } else {
                pending.remove(&change.resource_id);
            }
        }

        let mut outcome = WarmOutcome::default();
        let mut failed = BTreeSet::new();
        for resource_id in pending {
            match self.warm_one(&resource_id).await {
                Ok(()) => outcome.warmed += 1,
                Err(err) => {
                    warn!(resource_id = %resource_id, error = %err, "form not cached; will retry");
                    outcome.first_failure.get_or_insert(err);
                    failed.insert(resource_id);
                }
            }
        }

        outcome.skipped = failed.len();
        self.retry_later(failed)?;
        Ok(outcome)
    }

    async fn warm_one(&self, resource_id: &str) -> WorkflowResult<()> {
        let metadata = with_deadline(self.deadline, self.provider.metadata(resource_id)).await?;
        let key = ResponderLink::normalize(&metadata.responder_uri);
        self.cache.put(key.as_str(), &metadata.form_id.0).await?;
        Ok(())
    }

    fn take_retries(&self) -> WorkflowResult<BTreeSet<String>> {
        self.retry
            .lock()
            .map(|mut retry| std::mem::take(&mut *retry))
            .map_err(|_| WorkflowError::internal("form retry list poisoned"))
    }

    fn retry_later(&self, failed: BTreeSet<String>) -> WorkflowResult<()> {
        self.retry
            .lock()
            .map(|mut retry| retry.extend(failed))
            .map_err(|_| WorkflowError::internal("form retry list poisoned"))
    }
}

#[derive(Debug, Default)]
struct WarmOutcome {
    warmed: usize,
    skipped: usize,
    first_failure: Option<WorkflowError>,
}

impl std::fmt::Debug for FormResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormResolver")
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

/// Bounds a provider call; expiry and provider failures both surface as `Internal`.
pub(crate) async fn with_deadline<T, F>(deadline: Duration, call: F) -> WorkflowResult<T>
where
    F: Future<Output = Result<T, ProviderError>>,
{
    match tokio::time::timeout(deadline, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(err.into()),
        Err(_) => Err(WorkflowError::internal(format!(
            "form provider call exceeded {}s deadline",
            deadline.as_secs_f64()
        ))),
    }
}
