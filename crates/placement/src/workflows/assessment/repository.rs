use std::collections::BTreeMap;

use crate::workflows::ids::{ResultId, TestId};
use crate::workflows::store::RepositoryError;

use super::domain::{AnswerKeyEntry, NewTest, SubmissionResponse, Test, TestResult};

pub trait TestRepository: Send + Sync {
    /// Fails with `Conflict` when the job already has a test with the same name.
    fn insert(&self, test: NewTest) -> Result<Test, RepositoryError>;
    fn fetch(&self, id: TestId) -> Result<Option<Test>, RepositoryError>;
    fn set_result_artifact(&self, id: TestId, path: &str) -> Result<(), RepositoryError>;
}

/// Staging and scoring storage used by the evaluation pipeline. Every call is
/// scoped to one test so concurrent runs for different tests never interfere.
pub trait EvaluationStore: Send + Sync {
    /// Swaps the staged key for `test_id` in one step; readers see either the
    /// previous key or the new one, never an empty intermediate.
    fn replace_answer_key(
        &self,
        test_id: TestId,
        entries: Vec<AnswerKeyEntry>,
    ) -> Result<(), RepositoryError>;

    fn answer_key(&self, test_id: TestId) -> Result<Vec<AnswerKeyEntry>, RepositoryError>;

    fn responses(&self, test_id: TestId) -> Result<Vec<SubmissionResponse>, RepositoryError>;

    fn results(&self, test_id: TestId) -> Result<Vec<TestResult>, RepositoryError>;

    /// Overwrites the score of every listed result.
    fn write_scores(
        &self,
        test_id: TestId,
        scores: &BTreeMap<ResultId, i64>,
    ) -> Result<(), RepositoryError>;
}
