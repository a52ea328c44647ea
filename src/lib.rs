//! nestrun - hierarchical test execution engine
//!
//! Builds suite trees from fixtures grouped by namespace, runs them with
//! one-time and per-test setup and teardown, and reports start, finish and
//! output events through listeners. Output events travel through a queue
//! drained by a background event pump.

pub mod builder;
pub mod config;
pub mod events;
pub mod executor;
pub mod models;
pub mod output;
pub mod plan;
pub mod utils;

pub use builder::NamespaceTreeBuilder;
pub use events::{EventPump, EventQueue, TestListener};
pub use executor::{TestAssemblyRunner, TestContext};
pub use models::{ResultStatus, TestCase, TestError, TestResult, TestSuite};
pub use plan::TestPlan;
