//! Automatic grading: stage the answer key from the form definition, then
//! score every submission of the test against it.

mod answer_key;
mod scorer;

pub use answer_key::{answer_key_from, AnswerKeyExtractor};
pub use scorer::{score_responses, Scorer};
