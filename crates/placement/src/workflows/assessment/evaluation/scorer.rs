use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::info;

use crate::workflows::assessment::domain::{AnswerKeyEntry, SubmissionResponse, TestResult};
use crate::workflows::assessment::repository::EvaluationStore;
use crate::workflows::error::WorkflowResult;
use crate::workflows::ids::{ResultId, TestId};

#[derive(Clone)]
pub struct Scorer {
    store: Arc<dyn EvaluationStore>,
}

impl Scorer {
    pub fn new(store: Arc<dyn EvaluationStore>) -> Self {
        Self { store }
    }

    /// Scores every result of `test_id` against its staged key, overwriting
    /// previous scores. Returns the maximum attainable score.
    pub fn evaluate(&self, test_id: TestId) -> WorkflowResult<i64> {
        let key = self.store.answer_key(test_id)?;
        let responses = self.store.responses(test_id)?;
        let results = self.store.results(test_id)?;

        let scores = score_responses(&key, &responses, &results);
        self.store.write_scores(test_id, &scores)?;

        let total_points: i64 = key.iter().map(|entry| entry.points).sum();
        info!(
            test_id = %test_id,
            questions = key.len(),
            participants = scores.len(),
            total_points,
            "test scored"
        );
        Ok(total_points)
    }
}

impl std::fmt::Debug for Scorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scorer").finish_non_exhaustive()
    }
}

/// Points per result: a question scores only when the submitted value set
/// equals the correct set exactly. Results without a matching answer score 0.
pub fn score_responses(
    key: &[AnswerKeyEntry],
    responses: &[SubmissionResponse],
    results: &[TestResult],
) -> BTreeMap<ResultId, i64> {
    let by_question: HashMap<&str, &AnswerKeyEntry> = key
        .iter()
        .map(|entry| (entry.question_id.as_str(), entry))
        .collect();

    let mut scores: BTreeMap<ResultId, i64> =
        results.iter().map(|result| (result.id, 0)).collect();

    for response in responses {
        let Some(entry) = by_question.get(response.question_id.as_str()) else {
            continue;
        };
        if response.values != entry.correct_answers {
            continue;
        }
        if let Some(score) = scores.get_mut(&response.result_id) {
            *score += entry.points;
        }
    }

    scores
}
