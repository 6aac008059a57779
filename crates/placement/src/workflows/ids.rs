use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::WorkflowError;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Parses a path or form value, rejecting anything that is not a base-10 integer.
            pub fn parse(raw: &str) -> Result<Self, WorkflowError> {
                raw.trim().parse::<i64>().map(Self).map_err(|err| {
                    WorkflowError::invalid_input(format!(
                        concat!("invalid ", $label, " '{}': {}"),
                        raw, err
                    ))
                })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

numeric_id!(
    /// Authenticated account acting on a request (company representative or student).
    UserId,
    "user ID"
);
numeric_id!(JobId, "job ID");
numeric_id!(ApplicationId, "application ID");
numeric_id!(StudentId, "student ID");
numeric_id!(InterviewId, "interview ID");
numeric_id!(TestId, "test ID");
numeric_id!(
    /// One participant's attempt at a test.
    ResultId,
    "result ID"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_padded_integers() {
        assert_eq!(ApplicationId::parse(" 42 ").expect("parses"), ApplicationId(42));
    }

    #[test]
    fn parse_rejects_garbage_with_invalid_input() {
        match JobId::parse("12a") {
            Err(WorkflowError::InvalidInput(message)) => {
                assert!(message.contains("invalid job ID '12a'"))
            }
            other => panic!("expected invalid input, got {other:?}"),
        }
    }
}
