use std::path::Path;

use placement::workflows::hiring::{Application, JobPosting, StudentProfile};
use placement::workflows::store::InMemoryStore;
use placement::workflows::WorkflowError;
use serde::Deserialize;
use tracing::info;

/// Startup fixture for the in-memory store, so a fresh server has jobs and
/// applicants to act on.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SeedData {
    pub(crate) jobs: Vec<JobPosting>,
    pub(crate) students: Vec<StudentProfile>,
    pub(crate) applications: Vec<Application>,
}

impl SeedData {
    pub(crate) fn load(path: &Path) -> Result<Self, WorkflowError> {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            WorkflowError::internal(format!("unable to read seed file {}: {err}", path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|err| {
            WorkflowError::invalid_input(format!("seed file {}: {err}", path.display()))
        })
    }

    /// Jobs and students first, so every application resolves its context.
    pub(crate) fn apply(self, store: &InMemoryStore) -> Result<(), WorkflowError> {
        let (jobs, students, applications) = (
            self.jobs.len(),
            self.students.len(),
            self.applications.len(),
        );
        for job in self.jobs {
            store.insert_job(job)?;
        }
        for student in self.students {
            store.insert_student(student)?;
        }
        for application in self.applications {
            store.insert_application(application)?;
        }
        info!(jobs, students, applications, "store seeded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placement::workflows::hiring::{ApplicationRepository, ApplicationStatus};
    use placement::workflows::ids::ApplicationId;

    const FIXTURE: &str = r#"{
        "jobs": [{
            "id": 1, "owner": 7, "title": "Platform Engineer",
            "company_name": "Fabrikam", "representative_name": "Omar",
            "representative_email": "omar@fabrikam.test"
        }],
        "students": [{
            "id": 3, "name": "Ada", "email": "ada@uni.test",
            "resume_path": null, "result_path": null
        }],
        "applications": [{ "id": 5, "job_id": 1, "student_id": 3, "status": "Applied" }]
    }"#;

    #[test]
    fn seeded_application_resolves_its_context() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("seed.json");
        std::fs::write(&path, FIXTURE).expect("fixture");
        let store = InMemoryStore::default();

        SeedData::load(&path)
            .expect("parses")
            .apply(&store)
            .expect("applies");

        let context = store
            .context(ApplicationId(5))
            .expect("read")
            .expect("seeded");
        assert_eq!(context.job.company_name, "Fabrikam");
        assert_eq!(context.student.email, "ada@uni.test");
        assert_eq!(context.application.status, ApplicationStatus::Applied);
    }

    #[test]
    fn malformed_seed_is_invalid_input() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("seed.json");
        std::fs::write(&path, r#"{ "jobs": [{ "id": "one" }] }"#).expect("fixture");

        let err = SeedData::load(&path).expect_err("bad id");

        assert_eq!(err.kind(), "invalid_input");
    }
}
