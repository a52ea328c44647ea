//! Error types
//!
//! `TestError` is what user code raises from a test, setup or teardown step.
//! `EngineError` covers the few ways a run itself can fail to start.

use std::any::Any;
use std::fmt::Write as _;
use thiserror::Error;

use super::result::ResultStatus;

/// Error raised by a test action
#[derive(Error, Debug)]
pub enum TestError {
    /// Assertion-style failure raised on purpose by test code
    #[error("{0}")]
    Failure(String),

    /// The test or suite opted out at runtime
    #[error("{0}")]
    Ignore(String),

    #[error("{0}")]
    Inconclusive(String),

    /// Cooperative abort; siblings that have not started are not run
    #[error("{0}")]
    Cancelled(String),

    /// Anything unexpected
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),

    /// Raised by an invocation layer around the real error
    #[error("{message}")]
    Invocation {
        message: String,
        #[source]
        source: Box<TestError>,
    },
}

impl TestError {
    pub fn failure(message: impl Into<String>) -> Self {
        TestError::Failure(message.into())
    }

    pub fn ignore(reason: impl Into<String>) -> Self {
        TestError::Ignore(reason.into())
    }

    pub fn inconclusive(message: impl Into<String>) -> Self {
        TestError::Inconclusive(message.into())
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        TestError::Cancelled(message.into())
    }

    pub fn invocation(message: impl Into<String>, source: TestError) -> Self {
        TestError::Invocation {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// Convert a caught panic payload. A `TestError` raised with
    /// `std::panic::panic_any` is kept as is; panics coming from the
    /// standard assertion macros count as failures.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let payload = match payload.downcast::<TestError>() {
            Ok(error) => return *error,
            Err(payload) => payload,
        };

        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };

        if message.starts_with("assertion") {
            TestError::Failure(message)
        } else {
            TestError::Unexpected(anyhow::anyhow!("test panicked: {message}"))
        }
    }

    /// Classify the error into the status and message recorded on a result.
    /// An invocation wrapper is unwrapped one level first.
    pub fn outcome(&self) -> Outcome {
        let error = match self {
            TestError::Invocation { source, .. } => source.as_ref(),
            other => other,
        };

        match error {
            TestError::Failure(msg) => Outcome::new(ResultStatus::Failure, msg),
            TestError::Ignore(msg) => Outcome::new(ResultStatus::Ignored, msg),
            TestError::Inconclusive(msg) => Outcome::new(ResultStatus::Inconclusive, msg),
            TestError::Cancelled(msg) => Outcome::new(ResultStatus::Cancelled, msg),
            TestError::Unexpected(err) => Outcome {
                status: ResultStatus::Error,
                message: build_message(err.chain()),
                detail: Some(format!("{err:?}")),
            },
            TestError::Invocation { .. } => Outcome {
                status: ResultStatus::Error,
                message: build_message(std::iter::successors(
                    Some(error as &(dyn std::error::Error + 'static)),
                    |e| {
                        let e: &(dyn std::error::Error + 'static) = *e;
                        e.source()
                    },
                )),
                detail: None,
            },
        }
    }
}

/// Status, message and optional detail recorded for a raised error
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub status: ResultStatus,
    pub message: String,
    pub detail: Option<String>,
}

impl Outcome {
    pub fn new(status: ResultStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            detail: None,
        }
    }
}

/// Render an error and its causes, one `---->` line per cause
fn build_message<'a, I>(chain: I) -> String
where
    I: IntoIterator<Item = &'a (dyn std::error::Error + 'static)>,
{
    let mut message = String::new();
    for (depth, error) in chain.into_iter().enumerate() {
        if depth == 0 {
            let _ = write!(message, "{error}");
        } else {
            let _ = write!(message, "\n  ----> {error}");
        }
    }
    message
}

/// Errors that prevent a run from starting
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("No test suite loaded")]
    NotLoaded,

    #[error("Test not found: {0}")]
    TestNotFound(String),

    #[error("Failed to start event pump thread: {0}")]
    PumpSpawn(#[source] std::io::Error),
}
