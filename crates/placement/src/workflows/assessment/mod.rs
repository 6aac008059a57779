//! Online assessments: test intake, form resolution, automatic grading and
//! result reporting.

pub mod cache;
pub mod domain;
pub mod evaluation;
pub mod provider;
pub mod report;
pub mod repository;
pub mod resolver;
pub mod service;

#[cfg(test)]
mod tests;

pub use cache::{CacheError, InMemoryResourceCache, RedisResourceCache, ResourceCache};
pub use domain::{
    AnswerKeyEntry, FormId, GradingType, ResponderLink, SubmissionResponse, Test, TestResult,
    TestSubmission, UploadMethod,
};
pub use evaluation::{AnswerKeyExtractor, Scorer};
pub use provider::{FormProvider, GoogleFormProvider, ProviderError, UnconfiguredFormProvider};
pub use report::{HtmlReportRenderer, ReportAggregator, ReportRenderer, TestReport};
pub use repository::{EvaluationStore, TestRepository};
pub use resolver::FormResolver;
pub use service::{AssessmentService, ResultDraft};
