use std::path::PathBuf;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::workflows::error::WorkflowError;
use crate::workflows::ids::{ApplicationId, InterviewId, JobId, StudentId, UserId};

/// High level status tracked throughout the application workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ApplicationStatus {
    Applied,
    UnderReview,
    ShortListed,
    Rejected,
    Offered,
    Hired,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::UnderReview => "UnderReview",
            ApplicationStatus::ShortListed => "ShortListed",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Offered => "Offered",
            ApplicationStatus::Hired => "Hired",
        }
    }

    pub fn ordered() -> [ApplicationStatus; 6] {
        [
            ApplicationStatus::Applied,
            ApplicationStatus::UnderReview,
            ApplicationStatus::ShortListed,
            ApplicationStatus::Rejected,
            ApplicationStatus::Offered,
            ApplicationStatus::Hired,
        ]
    }

    /// Directed edges of the application state machine.
    pub const fn can_transition_to(self, next: ApplicationStatus) -> bool {
        matches!(
            (self, next),
            (ApplicationStatus::Applied, ApplicationStatus::UnderReview)
                | (ApplicationStatus::UnderReview, ApplicationStatus::ShortListed)
                | (ApplicationStatus::UnderReview, ApplicationStatus::Rejected)
                | (ApplicationStatus::ShortListed, ApplicationStatus::Rejected)
                | (ApplicationStatus::ShortListed, ApplicationStatus::Offered)
                | (ApplicationStatus::Offered, ApplicationStatus::Hired)
        )
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Rejected | ApplicationStatus::Hired)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub job_id: JobId,
    pub student_id: StudentId,
    pub status: ApplicationStatus,
}

/// Job listing fields the lifecycle needs: ownership plus notification copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: JobId,
    pub owner: UserId,
    pub title: String,
    pub company_name: String,
    pub representative_name: String,
    pub representative_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub id: StudentId,
    pub name: String,
    pub email: String,
    pub resume_path: Option<String>,
    pub result_path: Option<String>,
}

/// Application joined with its job and applicant, resolved in one repository call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationContext {
    pub application: Application,
    pub job: JobPosting,
    pub student: StudentProfile,
}

impl ApplicationContext {
    pub fn owner(&self) -> UserId {
        self.job.owner
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterviewStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl InterviewStatus {
    pub const fn label(self) -> &'static str {
        match self {
            InterviewStatus::Scheduled => "Scheduled",
            InterviewStatus::Completed => "Completed",
            InterviewStatus::Cancelled => "Cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewMode {
    Online,
    Onsite,
    Phone,
}

impl InterviewMode {
    pub const fn label(self) -> &'static str {
        match self {
            InterviewMode::Online => "online",
            InterviewMode::Onsite => "on-site",
            InterviewMode::Phone => "phone",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interview {
    pub id: InterviewId,
    pub application_id: ApplicationId,
    pub scheduled_by: UserId,
    pub scheduled_at: NaiveDateTime,
    pub mode: InterviewMode,
    pub status: InterviewStatus,
    pub notes: Option<String>,
    pub location: String,
}

/// Company-supplied schedule; date and time-of-day arrive as separate fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewRequest {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub mode: InterviewMode,
    #[serde(default)]
    pub notes: Option<String>,
    pub location: String,
}

impl InterviewRequest {
    pub fn scheduled_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

/// Row handed to the interview repository; the id is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInterview {
    pub application_id: ApplicationId,
    pub scheduled_by: UserId,
    pub scheduled_at: NaiveDateTime,
    pub mode: InterviewMode,
    pub notes: Option<String>,
    pub location: String,
}

/// Which applicant document a company is opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmittedFile {
    Resume,
    Result,
}

impl SubmittedFile {
    pub fn parse(raw: &str) -> Result<Self, WorkflowError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "resume" => Ok(Self::Resume),
            "result" => Ok(Self::Result),
            other => Err(WorkflowError::invalid_input(format!(
                "unknown file type '{other}', expected resume or result"
            ))),
        }
    }
}

/// Offer letter as uploaded by the company: a bare file name plus the
/// base64-encoded document bytes.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OfferLetterUpload {
    pub file_name: String,
    pub content_base64: String,
}

/// Offer letter persisted under the offer storage root and attached to the
/// offer notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfferDocument {
    pub file_name: String,
    pub path: PathBuf,
}

/// Result of a compare-and-set status write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionOutcome {
    /// The expected prior status matched and the new status was written.
    Applied,
    /// Another writer moved the record first; zero rows were affected.
    Stale,
}

impl TransitionOutcome {
    pub fn from_rows_affected(applied: bool) -> Self {
        if applied {
            Self::Applied
        } else {
            Self::Stale
        }
    }

    pub const fn is_applied(self) -> bool {
        matches!(self, TransitionOutcome::Applied)
    }
}
