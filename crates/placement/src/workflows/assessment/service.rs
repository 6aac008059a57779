use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::cache::ResourceCache;
use super::domain::{NewTest, Test, TestSubmission, UploadMethod};
use super::evaluation::{AnswerKeyExtractor, Scorer};
use super::provider::FormProvider;
use super::report::{ReportAggregator, ReportRenderer, TestReport};
use super::repository::{EvaluationStore, TestRepository};
use super::resolver::FormResolver;
use crate::workflows::error::{WorkflowError, WorkflowResult};
use crate::workflows::hiring::domain::JobPosting;
use crate::workflows::hiring::repository::JobRepository;
use crate::workflows::ids::{JobId, TestId, UserId};
use crate::workflows::notify::{templates, NotificationDispatcher};

/// Outcome of one evaluation run.
#[derive(Debug, Clone, Serialize)]
pub struct ResultDraft {
    pub test_id: TestId,
    pub total_points: i64,
    pub staged_questions: usize,
    pub report: TestReport,
    pub artifact: PathBuf,
}

/// Test intake and the evaluation pipeline (stage key, score, aggregate,
/// render, notify).
#[derive(Clone)]
pub struct AssessmentService {
    tests: Arc<dyn TestRepository>,
    jobs: Arc<dyn JobRepository>,
    resolver: FormResolver,
    extractor: AnswerKeyExtractor,
    scorer: Scorer,
    aggregator: ReportAggregator,
    renderer: Arc<dyn ReportRenderer>,
    notifications: NotificationDispatcher,
}

impl AssessmentService {
    pub fn new<S>(
        store: Arc<S>,
        cache: Arc<dyn ResourceCache>,
        provider: Arc<dyn FormProvider>,
        renderer: Arc<dyn ReportRenderer>,
        notifications: NotificationDispatcher,
        deadline: Duration,
    ) -> Self
    where
        S: TestRepository + JobRepository + EvaluationStore + 'static,
    {
        let evaluation: Arc<dyn EvaluationStore> = store.clone();
        Self {
            tests: store.clone(),
            jobs: store,
            resolver: FormResolver::new(cache, Arc::clone(&provider), deadline),
            extractor: AnswerKeyExtractor::new(provider, Arc::clone(&evaluation), deadline),
            scorer: Scorer::new(Arc::clone(&evaluation)),
            aggregator: ReportAggregator::new(evaluation),
            renderer,
            notifications,
        }
    }

    pub fn resolver(&self) -> &FormResolver {
        &self.resolver
    }

    /// Validates and stores a new test, resolving its form first when it is
    /// backed by Google Forms. Applicants of the bound job are notified.
    pub async fn submit_test(
        &self,
        actor: UserId,
        submission: TestSubmission,
    ) -> WorkflowResult<Test> {
        if submission.name.trim().is_empty() {
            return Err(WorkflowError::invalid_input("test name is required"));
        }
        if submission.threshold > 100 {
            return Err(WorkflowError::invalid_input(format!(
                "threshold must be between 0 and 100, got {}",
                submission.threshold
            )));
        }

        let job = self.owned_job(actor, submission.job_id)?;

        let form_id = match submission.upload_method {
            UploadMethod::GForms => {
                let link = submission
                    .responder_link
                    .as_deref()
                    .filter(|link| !link.trim().is_empty())
                    .ok_or_else(|| {
                        WorkflowError::invalid_input("responder link is required for GForms tests")
                    })?;
                Some(self.resolver.resolve(link).await?)
            }
            UploadMethod::CsvJson | UploadMethod::Manual => None,
        };

        let test = self.tests.insert(NewTest {
            name: submission.name.trim().to_string(),
            description: submission.description,
            duration_minutes: submission.duration_minutes,
            question_count: submission.question_count,
            end_time: submission.end_time,
            grading: submission.grading,
            upload_method: submission.upload_method,
            job_id: job.id,
            owner: actor,
            form_id,
            threshold: submission.threshold,
        })?;
        info!(test_id = %test.id, job_id = %job.id, actor = %actor, "test created");

        self.notify_applicants(&job, &test);
        Ok(test)
    }

    /// Owner-checked trigger for a background result draft.
    pub fn request_result_draft(
        &self,
        actor: UserId,
        test_id: TestId,
    ) -> WorkflowResult<JoinHandle<()>> {
        let test = self.fetch_test(test_id)?;
        if test.owner != actor {
            return Err(WorkflowError::Unauthorized { actor: actor.0 });
        }
        Ok(self.spawn_result_draft(test_id))
    }

    pub async fn generate_result_draft(&self, test_id: TestId) -> WorkflowResult<ResultDraft> {
        let test = self.fetch_test(test_id)?;
        let form_id = test.form_id.clone().ok_or_else(|| {
            WorkflowError::IncompleteAction(format!("test {test_id} has no resolved form"))
        })?;

        let staged_questions = self.extractor.extract_and_stage(test.id, &form_id).await?;
        let total_points = self.scorer.evaluate(test.id)?;
        let report = self
            .aggregator
            .aggregate(test.id, total_points, test.threshold)?;
        let artifact = self.renderer.render(&test, &report)?;
        self.tests
            .set_result_artifact(test.id, &artifact.to_string_lossy())?;

        match self.jobs.fetch(test.job_id) {
            Ok(Some(job)) => self.notifications.dispatch(templates::result_draft_ready(
                &job, &test, &report, &artifact,
            )),
            Ok(None) => warn!(
                test_id = %test.id,
                job_id = %test.job_id,
                "job missing; result draft not sent"
            ),
            Err(err) => warn!(
                test_id = %test.id,
                error = %err,
                "unable to load job for result draft"
            ),
        }

        info!(
            test_id = %test.id,
            total_points,
            artifact = %artifact.display(),
            "result draft generated"
        );
        Ok(ResultDraft {
            test_id: test.id,
            total_points,
            staged_questions,
            report,
            artifact,
        })
    }

    /// Runs [`Self::generate_result_draft`] on a detached task. Failures are
    /// logged, never returned.
    pub fn spawn_result_draft(&self, test_id: TestId) -> JoinHandle<()> {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(err) = service.generate_result_draft(test_id).await {
                error!(test_id = %test_id, kind = err.kind(), error = %err, "result draft failed");
            }
        })
    }

    fn fetch_test(&self, test_id: TestId) -> WorkflowResult<Test> {
        self.tests
            .fetch(test_id)?
            .ok_or_else(|| WorkflowError::not_found(format!("test {test_id}")))
    }

    fn owned_job(&self, actor: UserId, job_id: JobId) -> WorkflowResult<JobPosting> {
        let job = self
            .jobs
            .fetch(job_id)?
            .ok_or_else(|| WorkflowError::not_found(format!("job {job_id}")))?;
        if job.owner != actor {
            warn!(job_id = %job_id, actor = %actor, "test submission by non-owner refused");
            return Err(WorkflowError::Unauthorized { actor: actor.0 });
        }
        Ok(job)
    }

    fn notify_applicants(&self, job: &JobPosting, test: &Test) {
        match self.jobs.applicant_emails(job.id) {
            Ok(recipients) if recipients.is_empty() => {
                debug!(job_id = %job.id, "no applicants to notify about new test");
            }
            Ok(recipients) => self
                .notifications
                .dispatch(templates::test_posted(job, test, recipients)),
            Err(err) => warn!(
                job_id = %job.id,
                test_id = %test.id,
                error = %err,
                "unable to load applicant emails; test notification skipped"
            ),
        }
    }
}

impl std::fmt::Debug for AssessmentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssessmentService")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}
