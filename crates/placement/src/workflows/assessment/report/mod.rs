mod histogram;
mod render;

use std::sync::Arc;

use tracing::info;

use super::repository::EvaluationStore;
use crate::workflows::error::WorkflowResult;
use crate::workflows::ids::TestId;

pub use histogram::{HistogramBucket, TestReport, BUCKET_COUNT};
pub use render::{HtmlReportRenderer, RenderError, ReportRenderer};

/// Builds the report of a test from its persisted result scores.
#[derive(Clone)]
pub struct ReportAggregator {
    store: Arc<dyn EvaluationStore>,
}

impl ReportAggregator {
    pub fn new(store: Arc<dyn EvaluationStore>) -> Self {
        Self { store }
    }

    pub fn aggregate(
        &self,
        test_id: TestId,
        total_points: i64,
        threshold: u8,
    ) -> WorkflowResult<TestReport> {
        let scores: Vec<i64> = self
            .store
            .results(test_id)?
            .into_iter()
            .map(|result| result.score.unwrap_or(0))
            .collect();
        let report = TestReport::from_scores(test_id, total_points, threshold, &scores);
        info!(
            test_id = %test_id,
            participants = scores.len(),
            passed = report.passed,
            failed = report.failed,
            cutoff = report.cutoff,
            "test report aggregated"
        );
        Ok(report)
    }
}

impl std::fmt::Debug for ReportAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportAggregator").finish_non_exhaustive()
    }
}
