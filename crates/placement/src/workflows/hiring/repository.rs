use crate::workflows::ids::{ApplicationId, InterviewId, JobId};
use crate::workflows::store::RepositoryError;

use super::domain::{
    Application, ApplicationContext, ApplicationStatus, Interview, InterviewStatus, JobPosting,
    NewInterview,
};

/// Storage abstraction for applications. Status writes are compare-and-set only.
pub trait ApplicationRepository: Send + Sync {
    fn fetch(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError>;

    /// Application joined with its job (owner, copy) and applicant profile.
    fn context(&self, id: ApplicationId) -> Result<Option<ApplicationContext>, RepositoryError>;

    /// Writes `next` only when the stored status still equals `expected`.
    /// Returns whether a row was affected.
    fn compare_and_set_status(
        &self,
        id: ApplicationId,
        expected: ApplicationStatus,
        next: ApplicationStatus,
    ) -> Result<bool, RepositoryError>;

    fn for_job(&self, job_id: JobId) -> Result<Vec<Application>, RepositoryError>;
}

pub trait InterviewRepository: Send + Sync {
    /// Fails with `Conflict` when the application already has a scheduled interview.
    fn insert(&self, interview: NewInterview) -> Result<Interview, RepositoryError>;

    /// Latest non-cancelled interview for the application.
    fn active_for_application(
        &self,
        application_id: ApplicationId,
    ) -> Result<Option<Interview>, RepositoryError>;

    /// Sets the status of one interview. Returns whether it exists.
    fn update_status(
        &self,
        id: InterviewId,
        status: InterviewStatus,
    ) -> Result<bool, RepositoryError>;

    /// Forces every non-cancelled interview of the application to `status`,
    /// returning the number of rows touched.
    fn close_for_application(
        &self,
        application_id: ApplicationId,
        status: InterviewStatus,
    ) -> Result<usize, RepositoryError>;
}

pub trait JobRepository: Send + Sync {
    fn fetch(&self, id: JobId) -> Result<Option<JobPosting>, RepositoryError>;

    /// Contact addresses of everyone who applied to the job.
    fn applicant_emails(&self, id: JobId) -> Result<Vec<String>, RepositoryError>;
}
