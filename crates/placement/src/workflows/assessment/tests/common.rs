use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::workflows::assessment::cache::InMemoryResourceCache;
use crate::workflows::assessment::domain::{
    FormId, GradingType, SubmissionResponse, TestResult, TestSubmission, UploadMethod,
};
use crate::workflows::assessment::provider::{
    ChangedResource, FormDefinition, FormItem, FormMetadata, FormProvider, FormQuestion, Grading,
    ProviderError, FORM_MIME_TYPE,
};
use crate::workflows::assessment::report::HtmlReportRenderer;
use crate::workflows::assessment::AssessmentService;
use crate::workflows::hiring::domain::{
    Application, ApplicationStatus, JobPosting, StudentProfile,
};
use crate::workflows::ids::{ApplicationId, JobId, ResultId, StudentId, TestId, UserId};
use crate::workflows::notify::{Notification, NotificationDispatcher, Notifier, NotifyError};
use crate::workflows::store::InMemoryStore;

pub(super) const OWNER: UserId = UserId(100);
pub(super) const JOB: JobId = JobId(10);
pub(super) const FORM_LINK: &str = "https://docs.google.com/forms/d/e/abc/viewform";

/// Scripted provider: each poll returns the configured changes; metadata and
/// definitions come from lookup tables.
#[derive(Default)]
pub(super) struct FakeFormProvider {
    pub changes: Mutex<Vec<ChangedResource>>,
    pub metadata: Mutex<HashMap<String, FormMetadata>>,
    pub definitions: Mutex<HashMap<String, FormDefinition>>,
    pub change_polls: AtomicUsize,
    pub metadata_calls: AtomicUsize,
    pub fail_changes: bool,
    pub stall: Option<Duration>,
}

impl FakeFormProvider {
    pub fn with_form(resource_id: &str, responder_uri: &str, form_id: &str) -> Self {
        let provider = Self::default();
        provider.add_form(resource_id, responder_uri, form_id);
        provider
    }

    pub fn add_form(&self, resource_id: &str, responder_uri: &str, form_id: &str) {
        self.changes.lock().expect("lock").push(ChangedResource {
            resource_id: resource_id.to_string(),
            mime_type: Some(FORM_MIME_TYPE.to_string()),
            removed: false,
        });
        self.metadata.lock().expect("lock").insert(
            resource_id.to_string(),
            FormMetadata {
                form_id: FormId(form_id.to_string()),
                responder_uri: responder_uri.to_string(),
            },
        );
    }

    pub fn set_definition(&self, form_id: &str, definition: FormDefinition) {
        self.definitions
            .lock()
            .expect("lock")
            .insert(form_id.to_string(), definition);
    }

    pub fn polls(&self) -> usize {
        self.change_polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FormProvider for FakeFormProvider {
    async fn list_changes_since_checkpoint(&self) -> Result<Vec<ChangedResource>, ProviderError> {
        self.change_polls.fetch_add(1, Ordering::SeqCst);
        if let Some(stall) = self.stall {
            tokio::time::sleep(stall).await;
        }
        if self.fail_changes {
            return Err(ProviderError::Transport("connection reset".to_string()));
        }
        Ok(self.changes.lock().expect("lock").clone())
    }

    async fn metadata(&self, resource_id: &str) -> Result<FormMetadata, ProviderError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.metadata
            .lock()
            .expect("lock")
            .get(resource_id)
            .cloned()
            .ok_or_else(|| ProviderError::Api {
                status: 404,
                message: format!("no form {resource_id}"),
            })
    }

    async fn form_definition(&self, form_id: &FormId) -> Result<FormDefinition, ProviderError> {
        self.definitions
            .lock()
            .expect("lock")
            .get(&form_id.0)
            .cloned()
            .ok_or_else(|| ProviderError::Api {
                status: 404,
                message: format!("no form {form_id}"),
            })
    }
}

#[derive(Default)]
pub(super) struct RecordingNotifier {
    pub sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("lock").clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent.lock().expect("lock").push(notification.clone());
        Ok(())
    }
}

pub(super) struct Harness {
    pub service: AssessmentService,
    pub store: Arc<InMemoryStore>,
    pub cache: Arc<InMemoryResourceCache>,
    pub provider: Arc<FakeFormProvider>,
    pub notifier: Arc<RecordingNotifier>,
    pub dispatcher: NotificationDispatcher,
    pub results_dir: tempfile::TempDir,
}

pub(super) fn harness(provider: FakeFormProvider) -> Harness {
    harness_with_deadline(provider, Duration::from_secs(5))
}

pub(super) fn harness_with_deadline(provider: FakeFormProvider, deadline: Duration) -> Harness {
    let store = Arc::new(InMemoryStore::default());
    seed_job(&store);
    let cache = Arc::new(InMemoryResourceCache::default());
    let provider = Arc::new(provider);
    let notifier = Arc::new(RecordingNotifier::default());
    let dispatcher = NotificationDispatcher::spawn(notifier.clone());
    let results_dir = tempfile::tempdir().expect("tempdir");

    let service = AssessmentService::new(
        store.clone(),
        cache.clone(),
        provider.clone(),
        Arc::new(HtmlReportRenderer::new(results_dir.path())),
        dispatcher.clone(),
        deadline,
    );

    Harness {
        service,
        store,
        cache,
        provider,
        notifier,
        dispatcher,
        results_dir,
    }
}

fn seed_job(store: &InMemoryStore) {
    store
        .insert_job(JobPosting {
            id: JOB,
            owner: OWNER,
            title: "Graduate Engineer".to_string(),
            company_name: "Northwind".to_string(),
            representative_name: "Nadia".to_string(),
            representative_email: "nadia@northwind.test".to_string(),
        })
        .expect("seed job");
    for (id, email) in [(1, "ada@uni.test"), (2, "linus@uni.test")] {
        store
            .insert_student(StudentProfile {
                id: StudentId(id),
                name: format!("Student {id}"),
                email: email.to_string(),
                resume_path: None,
                result_path: None,
            })
            .expect("seed student");
        store
            .insert_application(Application {
                id: ApplicationId(id),
                job_id: JOB,
                student_id: StudentId(id),
                status: ApplicationStatus::Applied,
            })
            .expect("seed application");
    }
}

pub(super) fn gforms_submission(link: &str) -> TestSubmission {
    TestSubmission {
        name: "Aptitude".to_string(),
        description: Some("Logic and arithmetic".to_string()),
        duration_minutes: 45,
        question_count: 3,
        end_time: Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap(),
        grading: GradingType::Automatic,
        upload_method: UploadMethod::GForms,
        responder_link: Some(link.to_string()),
        job_id: JOB,
        threshold: 60,
    }
}

pub(super) fn graded(item_id: &str, answers: &[&str], points: i64) -> FormItem {
    FormItem {
        item_id: item_id.to_string(),
        question: Some(FormQuestion {
            question_id: format!("q-{item_id}"),
            grading: Some(Grading {
                point_value: points,
                correct_answers: answers.iter().map(|a| a.to_string()).collect(),
            }),
        }),
    }
}

pub(super) fn seed_result(store: &InMemoryStore, test_id: TestId, result: i64, student: i64) {
    store
        .insert_result(TestResult {
            id: ResultId(result),
            test_id,
            participant: StudentId(student),
            started_at: None,
            finished_at: None,
            score: None,
        })
        .expect("seed result");
}

pub(super) fn seed_answer(store: &InMemoryStore, result: i64, question: &str, values: &[&str]) {
    store
        .insert_response(SubmissionResponse {
            result_id: ResultId(result),
            question_id: question.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
            time_taken_secs: Some(30),
        })
        .expect("seed response");
}
