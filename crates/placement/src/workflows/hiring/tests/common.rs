use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::Engine;
use chrono::{NaiveDate, NaiveTime};

use crate::workflows::hiring::domain::{
    Application, ApplicationStatus, InterviewMode, InterviewRequest, JobPosting,
    OfferLetterUpload, StudentProfile,
};
use crate::workflows::hiring::{ApplicationLifecycle, OfferLetterStore};
use crate::workflows::ids::{ApplicationId, JobId, StudentId, UserId};
use crate::workflows::notify::{Notification, NotificationDispatcher, Notifier, NotifyError};
use crate::workflows::store::InMemoryStore;

pub(super) const OWNER: UserId = UserId(100);
pub(super) const STRANGER: UserId = UserId(200);
pub(super) const JOB: JobId = JobId(10);

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
    pub lifecycle: ApplicationLifecycle,
    pub store: Arc<InMemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub dispatcher: NotificationDispatcher,
    pub files: tempfile::TempDir,
}

impl Harness {
    /// Adds an applicant with a resume on disk and an application in `status`.
    pub fn applicant(&self, id: i64, status: ApplicationStatus) -> ApplicationId {
        let resume = self.files.path().join(format!("resume-{id}.pdf"));
        std::fs::write(&resume, b"%PDF-1.4 resume").unwrap();
        self.store
            .insert_student(StudentProfile {
                id: StudentId(id),
                name: format!("Student {id}"),
                email: format!("student{id}@uni.test"),
                resume_path: Some(resume.to_string_lossy().into_owned()),
                result_path: None,
            })
            .unwrap();
        self.store
            .insert_application(Application {
                id: ApplicationId(id),
                job_id: JOB,
                student_id: StudentId(id),
                status,
            })
            .unwrap();
        ApplicationId(id)
    }

    pub fn status(&self, id: ApplicationId) -> ApplicationStatus {
        self.store.application_status(id).unwrap().unwrap()
    }

    pub fn offer_letter(&self) -> OfferLetterUpload {
        offer_letter_named("offer.pdf")
    }

    pub fn offers_root(&self) -> PathBuf {
        self.files.path().join("offers")
    }

    pub fn letters(&self) -> OfferLetterStore {
        OfferLetterStore::new(self.offers_root())
    }
}

pub(super) fn offer_letter_named(file_name: &str) -> OfferLetterUpload {
    OfferLetterUpload {
        file_name: file_name.to_string(),
        content_base64: base64::engine::general_purpose::STANDARD.encode(b"%PDF-1.4 offer"),
    }
}

pub(super) fn harness() -> Harness {
    let store = Arc::new(InMemoryStore::default());
    store
        .insert_job(JobPosting {
            id: JOB,
            owner: OWNER,
            title: "Data Analyst".to_string(),
            company_name: "Contoso".to_string(),
            representative_name: "Priya".to_string(),
            representative_email: "priya@contoso.test".to_string(),
        })
        .unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let dispatcher = NotificationDispatcher::spawn(notifier.clone());
    let files = tempfile::tempdir().unwrap();
    let letters = OfferLetterStore::new(files.path().join("offers"));

    Harness {
        lifecycle: ApplicationLifecycle::new(store.clone(), letters, dispatcher.clone()),
        store,
        notifier,
        dispatcher,
        files,
    }
}

pub(super) fn interview_request(location: &str) -> InterviewRequest {
    InterviewRequest {
        date: NaiveDate::from_ymd_opt(2025, 4, 22).expect("valid date"),
        time: NaiveTime::from_hms_opt(10, 30, 0).expect("valid time"),
        mode: InterviewMode::Online,
        notes: Some("Camera on".to_string()),
        location: location.to_string(),
    }
}
