use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::workflows::assessment::domain::{AnswerKeyEntry, FormId};
use crate::workflows::assessment::provider::{FormDefinition, FormProvider};
use crate::workflows::assessment::repository::EvaluationStore;
use crate::workflows::assessment::resolver::with_deadline;
use crate::workflows::error::WorkflowResult;
use crate::workflows::ids::TestId;

#[derive(Clone)]
pub struct AnswerKeyExtractor {
    provider: Arc<dyn FormProvider>,
    store: Arc<dyn EvaluationStore>,
    deadline: Duration,
}

impl AnswerKeyExtractor {
    pub fn new(
        provider: Arc<dyn FormProvider>,
        store: Arc<dyn EvaluationStore>,
        deadline: Duration,
    ) -> Self {
        Self {
            provider,
            store,
            deadline,
        }
    }

    /// Fetches the form and swaps the staged key of `test_id` for the one it
    /// carries. Returns the number of graded questions staged.
    pub async fn extract_and_stage(
        &self,
        test_id: TestId,
        form_id: &FormId,
    ) -> WorkflowResult<usize> {
        let definition =
            with_deadline(self.deadline, self.provider.form_definition(form_id)).await?;
        let entries = answer_key_from(&definition);
        let staged = entries.len();
        self.store.replace_answer_key(test_id, entries)?;
        info!(test_id = %test_id, form_id = %form_id, staged, "answer key staged");
        Ok(staged)
    }
}

impl std::fmt::Debug for AnswerKeyExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerKeyExtractor")
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

/// Graded questions with at least one correct answer, keyed by item id (the
/// id responses are recorded under). Ungraded items are skipped.
pub fn answer_key_from(definition: &FormDefinition) -> Vec<AnswerKeyEntry> {
    let mut entries = BTreeMap::new();
    for item in &definition.items {
        let Some(question) = &item.question else {
            continue;
        };
        let Some(grading) = &question.grading else {
            continue;
        };
        if grading.correct_answers.is_empty() {
            continue;
        }

        let key = if item.item_id.is_empty() {
            question.question_id.clone()
        } else {
            item.item_id.clone()
        };
        entries.insert(
            key.clone(),
            AnswerKeyEntry {
                question_id: key,
                correct_answers: grading.correct_answers.iter().cloned().collect(),
                points: grading.point_value,
            },
        );
    }
    entries.into_values().collect()
}
