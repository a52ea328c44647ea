//! Data models for the execution engine
//!
//! Test node trees, result trees and the errors user code can raise.

mod error;
mod node;
mod result;

pub use error::{EngineError, Outcome, TestError};
pub use node::{
    strip_parameters, EffectiveEligibility, FixtureFactory, FixtureInstance, RunEligibility,
    SuiteKind, TestAction, TestCase, TestDescriptor, TestId, TestInfo, TestNode, TestSuite,
};
pub use result::{ResultStatus, RunSummary, TestResult};
