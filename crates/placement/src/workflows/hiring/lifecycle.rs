use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    ApplicationContext, ApplicationStatus, Interview, InterviewRequest, InterviewStatus,
    NewInterview, OfferLetterUpload, SubmittedFile, TransitionOutcome,
};
use super::funnel::ApplicantFunnel;
use super::letters::OfferLetterStore;
use super::repository::{ApplicationRepository, InterviewRepository, JobRepository};
use crate::workflows::error::{WorkflowError, WorkflowResult};
use crate::workflows::ids::{ApplicationId, JobId, UserId};
use crate::workflows::notify::{templates, NotificationDispatcher};

/// Applicant document resolved for a company reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmittedFileView {
    pub application_id: ApplicationId,
    pub kind: SubmittedFile,
    pub path: PathBuf,
    /// Outcome of the implicit Applied -> UnderReview move.
    pub review: TransitionOutcome,
}

/// Owner-checked status transitions for applications and their interviews.
/// Every status write is a compare-and-set against the status observed
/// when the action started; a lost race reports [`TransitionOutcome::Stale`].
#[derive(Clone)]
pub struct ApplicationLifecycle {
    applications: Arc<dyn ApplicationRepository>,
    interviews: Arc<dyn InterviewRepository>,
    jobs: Arc<dyn JobRepository>,
    letters: OfferLetterStore,
    notifications: NotificationDispatcher,
}

impl ApplicationLifecycle {
    pub fn new<S>(
        store: Arc<S>,
        letters: OfferLetterStore,
        notifications: NotificationDispatcher,
    ) -> Self
    where
        S: ApplicationRepository + InterviewRepository + JobRepository + 'static,
    {
        Self {
            applications: store.clone(),
            interviews: store.clone(),
            jobs: store,
            letters,
            notifications,
        }
    }

    pub fn shortlist(
        &self,
        actor: UserId,
        application_id: ApplicationId,
    ) -> WorkflowResult<TransitionOutcome> {
        let context = self.authorize(actor, application_id)?;
        self.transition(
            &context,
            ApplicationStatus::UnderReview,
            ApplicationStatus::ShortListed,
        )
    }

    /// Rejects from UnderReview or ShortListed, then closes any open
    /// interview. The two writes are not atomic.
    pub fn reject(
        &self,
        actor: UserId,
        application_id: ApplicationId,
    ) -> WorkflowResult<TransitionOutcome> {
        let context = self.authorize(actor, application_id)?;
        let current = context.application.status;
        let outcome = self.transition(&context, current, ApplicationStatus::Rejected)?;

        if outcome.is_applied() {
            let closed = self
                .interviews
                .close_for_application(application_id, InterviewStatus::Completed)?;
            info!(application_id = %application_id, closed, "interviews closed on rejection");
        }
        Ok(outcome)
    }

    pub fn schedule_interview(
        &self,
        actor: UserId,
        application_id: ApplicationId,
        request: InterviewRequest,
    ) -> WorkflowResult<Interview> {
        let context = self.authorize(actor, application_id)?;
        let status = context.application.status;
        if status.is_terminal() {
            return Err(WorkflowError::invalid_input(format!(
                "application {application_id} is {}; interviews cannot be scheduled",
                status.label()
            )));
        }
        if request.location.trim().is_empty() {
            return Err(WorkflowError::invalid_input("interview location is required"));
        }

        let interview = self.interviews.insert(NewInterview {
            application_id,
            scheduled_by: actor,
            scheduled_at: request.scheduled_at(),
            mode: request.mode,
            notes: request.notes,
            location: request.location.trim().to_string(),
        })?;
        info!(
            application_id = %application_id,
            interview_id = %interview.id,
            scheduled_at = %interview.scheduled_at,
            "interview scheduled"
        );

        self.notifications
            .dispatch(templates::interview_scheduled(&context, &interview));
        Ok(interview)
    }

    /// Marks the scheduled interview as cancelled; the row is kept.
    pub fn cancel_interview(
        &self,
        actor: UserId,
        application_id: ApplicationId,
    ) -> WorkflowResult<Interview> {
        let context = self.authorize(actor, application_id)?;
        let mut interview = self
            .interviews
            .active_for_application(application_id)?
            .filter(|interview| interview.status == InterviewStatus::Scheduled)
            .ok_or_else(|| {
                WorkflowError::not_found(format!(
                    "scheduled interview for application {application_id}"
                ))
            })?;

        if !self
            .interviews
            .update_status(interview.id, InterviewStatus::Cancelled)?
        {
            return Err(WorkflowError::not_found(format!("interview {}", interview.id)));
        }
        interview.status = InterviewStatus::Cancelled;
        info!(
            application_id = %application_id,
            interview_id = %interview.id,
            "interview cancelled"
        );

        self.notifications
            .dispatch(templates::interview_cancelled(&context, &interview));
        Ok(interview)
    }

    /// Stores the uploaded letter, completes the interview, then moves
    /// ShortListed -> Offered. The interview is completed before the status
    /// write, so a stale offer still leaves it Completed. The stored letter is
    /// attached to the applicant notification.
    pub fn offer(
        &self,
        actor: UserId,
        application_id: ApplicationId,
        upload: OfferLetterUpload,
    ) -> WorkflowResult<TransitionOutcome> {
        let context = self.authorize(actor, application_id)?;
        require_status(&context, ApplicationStatus::ShortListed, ApplicationStatus::Offered)?;
        let document = self.letters.store(application_id, &upload)?;

        self.interviews
            .close_for_application(application_id, InterviewStatus::Completed)?;
        let outcome = self.transition(
            &context,
            ApplicationStatus::ShortListed,
            ApplicationStatus::Offered,
        )?;

        if outcome.is_applied() {
            self.notifications
                .dispatch(templates::offer_extended(&context, &document));
        }
        Ok(outcome)
    }

    pub fn hire(
        &self,
        actor: UserId,
        application_id: ApplicationId,
    ) -> WorkflowResult<TransitionOutcome> {
        let context = self.authorize(actor, application_id)?;
        self.transition(&context, ApplicationStatus::Offered, ApplicationStatus::Hired)
    }

    /// Resolves the resume or result document. Opening it moves a fresh
    /// application to UnderReview; losing that race is not an error.
    pub fn view_submitted_file(
        &self,
        actor: UserId,
        application_id: ApplicationId,
        kind: SubmittedFile,
    ) -> WorkflowResult<SubmittedFileView> {
        let context = self.authorize(actor, application_id)?;
        let stored = match kind {
            SubmittedFile::Resume => context.student.resume_path.as_deref(),
            SubmittedFile::Result => context.student.result_path.as_deref(),
        };
        let path = stored
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from)
            .filter(|path| path.is_file())
            .ok_or_else(|| {
                WorkflowError::not_found(format!(
                    "{kind:?} file for application {application_id}"
                ))
            })?;

        let review = TransitionOutcome::from_rows_affected(
            self.applications.compare_and_set_status(
                application_id,
                ApplicationStatus::Applied,
                ApplicationStatus::UnderReview,
            )?,
        );
        if review.is_applied() {
            info!(application_id = %application_id, "application moved to review on file view");
        }

        Ok(SubmittedFileView {
            application_id,
            kind,
            path,
            review,
        })
    }

    pub fn applicant_funnel(
        &self,
        actor: UserId,
        job_id: JobId,
    ) -> WorkflowResult<ApplicantFunnel> {
        let job = self
            .jobs
            .fetch(job_id)?
            .ok_or_else(|| WorkflowError::not_found(format!("job {job_id}")))?;
        if job.owner != actor {
            warn!(job_id = %job_id, actor = %actor, "funnel requested by non-owner");
            return Err(WorkflowError::Unauthorized { actor: actor.0 });
        }
        let applications = self.applications.for_job(job_id)?;
        Ok(ApplicantFunnel::from_statuses(
            job_id,
            applications.iter().map(|application| application.status),
        ))
    }

    fn authorize(
        &self,
        actor: UserId,
        application_id: ApplicationId,
    ) -> WorkflowResult<ApplicationContext> {
        let context = self
            .applications
            .context(application_id)?
            .ok_or_else(|| WorkflowError::not_found(format!("application {application_id}")))?;
        if context.owner() != actor {
            warn!(
                application_id = %application_id,
                actor = %actor,
                "lifecycle action by non-owner refused"
            );
            return Err(WorkflowError::Unauthorized { actor: actor.0 });
        }
        Ok(context)
    }

    fn transition(
        &self,
        context: &ApplicationContext,
        expected: ApplicationStatus,
        next: ApplicationStatus,
    ) -> WorkflowResult<TransitionOutcome> {
        require_status(context, expected, next)?;
        let application_id = context.application.id;
        let outcome = TransitionOutcome::from_rows_affected(
            self.applications
                .compare_and_set_status(application_id, expected, next)?,
        );
        match outcome {
            TransitionOutcome::Applied => info!(
                application_id = %application_id,
                from = expected.label(),
                to = next.label(),
                "application status changed"
            ),
            TransitionOutcome::Stale => warn!(
                application_id = %application_id,
                from = expected.label(),
                to = next.label(),
                "status changed concurrently; transition skipped"
            ),
        }
        Ok(outcome)
    }
}

impl std::fmt::Debug for ApplicationLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationLifecycle")
            .field("notifications", &self.notifications)
            .finish_non_exhaustive()
    }
}

/// The observed status must be `expected` and the edge to `next` must exist.
fn require_status(
    context: &ApplicationContext,
    expected: ApplicationStatus,
    next: ApplicationStatus,
) -> WorkflowResult<()> {
    let current = context.application.status;
    if current != expected || !current.can_transition_to(next) {
        return Err(WorkflowError::InvalidTransition {
            from: current.label(),
            to: next.label(),
        });
    }
    Ok(())
}
