//! Integration tests for the application lifecycle, exercised through
//! the service facade and the HTTP router.

mod common {
    use std::sync::Arc;
    use std::time::Duration;

    use placement::workflows::assessment::{
        AssessmentService, HtmlReportRenderer, InMemoryResourceCache, UnconfiguredFormProvider,
    };
    use placement::workflows::hiring::{
        Application, ApplicationLifecycle, ApplicationStatus, JobPosting, OfferLetterStore,
        StudentProfile,
    };
    use placement::workflows::ids::{ApplicationId, JobId, StudentId, UserId};
    use placement::workflows::notify::{NotificationDispatcher, TracingNotifier};
    use placement::workflows::store::InMemoryStore;
    use placement::workflows::PlacementState;

    pub(super) const OWNER: UserId = UserId(1);
    pub(super) const JOB: JobId = JobId(1);

    pub(super) struct World {
        pub store: Arc<InMemoryStore>,
        pub lifecycle: ApplicationLifecycle,
        pub state: PlacementState,
        pub dir: tempfile::TempDir,
    }

    pub(super) fn world() -> World {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(InMemoryStore::default());
        store
            .insert_job(JobPosting {
                id: JOB,
                owner: OWNER,
                title: "Platform Engineer".to_string(),
                company_name: "Fabrikam".to_string(),
                representative_name: "Omar".to_string(),
                representative_email: "omar@fabrikam.test".to_string(),
            })
            .expect("job");

        let dispatcher = NotificationDispatcher::spawn(Arc::new(TracingNotifier));
        let letters = OfferLetterStore::new(dir.path().join("offers"));
        let lifecycle = ApplicationLifecycle::new(store.clone(), letters, dispatcher.clone());
        let assessments = AssessmentService::new(
            store.clone(),
            Arc::new(InMemoryResourceCache::default()),
            Arc::new(UnconfiguredFormProvider),
            Arc::new(HtmlReportRenderer::new(dir.path())),
            dispatcher,
            Duration::from_secs(1),
        );

        World {
            state: PlacementState {
                assessments,
                lifecycle: lifecycle.clone(),
            },
            store,
            lifecycle,
            dir,
        }
    }

    impl World {
        pub fn apply(&self, id: i64, status: ApplicationStatus) -> ApplicationId {
            let resume = self.dir.path().join(format!("cv-{id}.pdf"));
            std::fs::write(&resume, b"cv").expect("resume");
            self.store
                .insert_student(StudentProfile {
                    id: StudentId(id),
                    name: format!("Applicant {id}"),
                    email: format!("applicant{id}@uni.test"),
                    resume_path: Some(resume.to_string_lossy().into_owned()),
                    result_path: None,
                })
                .expect("student");
            self.store
                .insert_application(Application {
                    id: ApplicationId(id),
                    job_id: JOB,
                    student_id: StudentId(id),
                    status,
                })
                .expect("application");
            ApplicationId(id)
        }

        pub fn status(&self, id: ApplicationId) -> ApplicationStatus {
            self.store
                .application_status(id)
                .expect("read")
                .expect("exists")
        }
    }
}

use std::sync::{Arc, Barrier};
use std::thread;

use axum::body::Body;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use axum::http::{header, Method, Request, StatusCode};
use common::*;
use placement::workflows::hiring::{ApplicationStatus, TransitionOutcome};
use placement::workflows::ids::UserId;
use placement::workflows::placement_router;
use placement::workflows::router::ACTOR_HEADER;
use placement::workflows::WorkflowError;
use serde_json::{json, Value};
use tower::ServiceExt;

async fn call(world: &World, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(ACTOR_HEADER, OWNER.0.to_string());
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("encode"))),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = placement_router(world.state.clone())
        .oneshot(request)
        .await
        .expect("response");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn unauthorized_shortlist_leaves_status_untouched() {
    let world = world();
    let id = world.apply(1, ApplicationStatus::UnderReview);

    let err = world
        .lifecycle
        .shortlist(UserId(99), id)
        .expect_err("foreign company");

    assert_eq!(err, WorkflowError::Unauthorized { actor: 99 });
    assert_eq!(world.status(id), ApplicationStatus::UnderReview);
}

#[tokio::test]
async fn applicant_travels_from_application_to_hire_over_http() {
    let world = world();
    world.apply(1, ApplicationStatus::Applied);
    world.apply(2, ApplicationStatus::Applied);

    let (status, _) = call(&world, Method::GET, "/api/v1/applications/1/files/resume", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&world, Method::POST, "/api/v1/applications/1/shortlist", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "applied");

    let (status, _) = call(
        &world,
        Method::POST,
        "/api/v1/applications/1/interview",
        Some(json!({
            "date": "2025-05-06",
            "time": "14:00:00",
            "mode": "online",
            "notes": "Pairing exercise",
            "location": "https://meet.test/fab"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = call(
        &world,
        Method::POST,
        "/api/v1/applications/1/offer",
        Some(json!({
            "file_name": "offer-1.pdf",
            "content_base64": BASE64.encode(b"%PDF-1.4 offer")
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&world, Method::POST, "/api/v1/applications/1/hire", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "applied");

    let (status, funnel) = call(&world, Method::GET, "/api/v1/jobs/1/funnel", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(funnel["total"], 2);
    let reached: Vec<(String, u64)> = funnel["reached"]
        .as_array()
        .expect("reached")
        .iter()
        .map(|stage| {
            (
                stage["label"].as_str().unwrap_or_default().to_string(),
                stage["count"].as_u64().unwrap_or_default(),
            )
        })
        .collect();
    assert_eq!(
        reached,
        vec![
            ("Applied".to_string(), 2),
            ("UnderReview".to_string(), 1),
            ("ShortListed".to_string(), 1),
            ("Rejected".to_string(), 0),
            ("Offered".to_string(), 1),
            ("Hired".to_string(), 1),
        ]
    );
}

#[tokio::test]
async fn hiring_twice_is_a_conflict() {
    let world = world();
    world.apply(1, ApplicationStatus::Offered);

    let (first, _) = call(&world, Method::POST, "/api/v1/applications/1/hire", None).await;
    let (second, body) = call(&world, Method::POST, "/api/v1/applications/1/hire", None).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "invalid_transition");
}

#[tokio::test]
async fn racing_shortlists_apply_exactly_once() {
    for round in 0..25 {
        let world = world();
        let id = world.apply(round + 1, ApplicationStatus::UnderReview);
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let lifecycle = world.lifecycle.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    lifecycle.shortlist(OWNER, id)
                })
            })
            .collect();
        let outcomes: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().expect("shortlist thread"))
            .collect();

        let applied = outcomes
            .iter()
            .filter(|outcome| matches!(outcome, Ok(TransitionOutcome::Applied)))
            .count();
        // The loser either lost the compare-and-set or already observed
        // ShortListed and was refused before writing.
        let lost = outcomes.iter().all(|outcome| {
            matches!(
                outcome,
                Ok(_) | Err(WorkflowError::InvalidTransition { .. })
            )
        });

        assert_eq!(applied, 1, "round {round}: {outcomes:?}");
        assert!(lost, "round {round}: {outcomes:?}");
        assert_eq!(world.status(id), ApplicationStatus::ShortListed);
    }
}
