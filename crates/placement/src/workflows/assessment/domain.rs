use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::ids::{JobId, ResultId, StudentId, TestId, UserId};

/// Canonical identifier of a form at the external provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormId(pub String);

impl fmt::Display for FormId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Public URL participants use to submit a test, normalized to a stable cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponderLink(String);

impl ResponderLink {
    /// Links that differ only by query parameters denote the same form.
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim();
        let base = match trimmed.find('?') {
            Some(index) => &trimmed[..index],
            None => trimmed,
        };
        Self(base.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResponderLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How the test questions were supplied by the company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadMethod {
    #[serde(rename = "GForms")]
    GForms,
    #[serde(rename = "CSVJSON")]
    CsvJson,
    #[serde(rename = "Manual")]
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradingType {
    Automatic,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Test {
    pub id: TestId,
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: u32,
    pub question_count: u32,
    pub end_time: DateTime<Utc>,
    pub grading: GradingType,
    pub upload_method: UploadMethod,
    pub job_id: JobId,
    pub owner: UserId,
    pub form_id: Option<FormId>,
    pub result_artifact: Option<String>,
    /// Pass threshold as a percentage of the maximum score.
    pub threshold: u8,
}

/// Company submission of a new test bound to one of its jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSubmission {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub duration_minutes: u32,
    pub question_count: u32,
    pub end_time: DateTime<Utc>,
    pub grading: GradingType,
    pub upload_method: UploadMethod,
    #[serde(default)]
    pub responder_link: Option<String>,
    pub job_id: JobId,
    pub threshold: u8,
}

/// Row handed to the test repository once the form id has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTest {
    pub name: String,
    pub description: Option<String>,
    pub duration_minutes: u32,
    pub question_count: u32,
    pub end_time: DateTime<Utc>,
    pub grading: GradingType,
    pub upload_method: UploadMethod,
    pub job_id: JobId,
    pub owner: UserId,
    pub form_id: Option<FormId>,
    pub threshold: u8,
}

/// Staged correct answers for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerKeyEntry {
    pub question_id: String,
    pub correct_answers: BTreeSet<String>,
    pub points: i64,
}

/// Participant answer to one question, written by the assessment front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub result_id: ResultId,
    pub question_id: String,
    pub values: BTreeSet<String>,
    pub time_taken_secs: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub id: ResultId,
    pub test_id: TestId,
    pub participant: StudentId,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub score: Option<i64>,
}
