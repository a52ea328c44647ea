//! Test execution engine
//!
//! Runs suite trees and reports progress to listeners.

mod context;
mod runner;
mod suite;

pub use context::{FixtureRef, TestContext};
pub use runner::TestAssemblyRunner;
pub use suite::SuiteExecutor;
