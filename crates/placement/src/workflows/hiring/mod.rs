//! Application and interview lifecycle: shortlist, interview, offer, hire or
//! reject, each gated on job ownership and applied with compare-and-set.

pub mod domain;
mod funnel;
mod letters;
mod lifecycle;
pub mod repository;

#[cfg(test)]
mod tests;

pub use domain::{
    Application, ApplicationContext, ApplicationStatus, Interview, InterviewMode,
    InterviewRequest, InterviewStatus, JobPosting, OfferDocument, OfferLetterUpload,
    StudentProfile, SubmittedFile, TransitionOutcome,
};
pub use funnel::{ApplicantFunnel, FunnelLink, StageCount};
pub use letters::OfferLetterStore;
pub use lifecycle::{ApplicationLifecycle, SubmittedFileView};
pub use repository::{ApplicationRepository, InterviewRepository, JobRepository};
