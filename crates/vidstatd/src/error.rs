//! Failure taxonomy for the parse and compile stages.
//!
//! Parse failures are control flow, not user-facing conditions: every
//! variant makes the facade run the heuristic path instead. Compile
//! failures are programming-contract violations that the answer layer
//! absorbs into `0`.

use thiserror::Error;

/// Why a generative parse attempt was abandoned.
#[derive(Debug, Error)]
pub enum ParseFailure {
    /// Network error, timeout, or non-success status from the completion
    /// backend.
    #[error("completion call failed: {0}")]
    Transport(String),

    /// The reply contained no parseable JSON object.
    #[error("no valid JSON object in model output: {0}")]
    MalformedOutput(String),

    /// The model explicitly declared the question unanswerable via an
    /// `"error"` key.
    #[error("model declined to answer: {0}")]
    Declined(String),

    /// The decoded candidate violated the intent schema.
    #[error("candidate intent failed validation: {0}")]
    Validation(String),
}

/// Contract violations inside the query compiler. Unreachable for
/// intents that passed validation; kept as a guard against whitelist
/// drift.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("field `{0}` has no column in the relation whitelist")]
    UnsupportedField(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}
