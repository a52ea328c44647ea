//! Result models
//!
//! A result tree mirrors the executed node tree. Each level records only its
//! own lifecycle outcome; roll-up views are computed on demand.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::Outcome;
use super::node::{EffectiveEligibility, RunEligibility, TestDescriptor};

/// Outcome of running a node
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Success,
    Failure,
    Error,
    Cancelled,
    Skipped,
    Ignored,
    NotRunnable,
    Inconclusive,
}

impl ResultStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            ResultStatus::Success => "✓",
            ResultStatus::Failure => "✗",
            ResultStatus::Error => "!",
            ResultStatus::Cancelled => "⊘",
            ResultStatus::Skipped => "○",
            ResultStatus::Ignored => "○",
            ResultStatus::NotRunnable => "?",
            ResultStatus::Inconclusive => "~",
        }
    }

    /// Failure, error and cancellation all count as a failed run
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            ResultStatus::Failure | ResultStatus::Error | ResultStatus::Cancelled
        )
    }

    /// Status reported for a node that is not executed in the given state
    pub fn for_not_run(state: RunEligibility) -> Option<Self> {
        match state {
            RunEligibility::Skipped => Some(ResultStatus::Skipped),
            RunEligibility::Ignored => Some(ResultStatus::Ignored),
            RunEligibility::NotRunnable => Some(ResultStatus::NotRunnable),
            RunEligibility::Runnable | RunEligibility::Explicit => None,
        }
    }

    /// Ranking used by [`TestResult::worst_status`]
    fn severity(&self) -> u8 {
        match self {
            ResultStatus::Success => 0,
            ResultStatus::Skipped => 1,
            ResultStatus::Ignored => 2,
            ResultStatus::Inconclusive => 3,
            ResultStatus::NotRunnable => 4,
            ResultStatus::Cancelled => 5,
            ResultStatus::Failure => 6,
            ResultStatus::Error => 7,
        }
    }
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultStatus::Success => write!(f, "SUCCESS"),
            ResultStatus::Failure => write!(f, "FAILURE"),
            ResultStatus::Error => write!(f, "ERROR"),
            ResultStatus::Cancelled => write!(f, "CANCELLED"),
            ResultStatus::Skipped => write!(f, "SKIPPED"),
            ResultStatus::Ignored => write!(f, "IGNORED"),
            ResultStatus::NotRunnable => write!(f, "NOT RUNNABLE"),
            ResultStatus::Inconclusive => write!(f, "INCONCLUSIVE"),
        }
    }
}

/// Result of running one node, with the results of its children
#[derive(Clone, Debug, Serialize)]
pub struct TestResult {
    pub test: TestDescriptor,
    pub status: ResultStatus,
    pub message: Option<String>,
    pub detail: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub children: Vec<TestResult>,
}

impl TestResult {
    /// A fresh result for `test`, assumed successful
    pub fn new(test: TestDescriptor) -> Self {
        Self {
            test,
            status: ResultStatus::Success,
            message: None,
            detail: None,
            started_at: Utc::now(),
            duration_ms: 0,
            children: Vec::new(),
        }
    }

    /// Copy of this result with the child results left out
    pub fn without_children(&self) -> TestResult {
        TestResult {
            test: self.test.clone(),
            status: self.status,
            message: self.message.clone(),
            detail: self.detail.clone(),
            started_at: self.started_at,
            duration_ms: self.duration_ms,
            children: Vec::new(),
        }
    }

    pub fn set_result(&mut self, status: ResultStatus, message: Option<String>) {
        self.status = status;
        self.message = message;
    }

    /// Record the outcome of a step that raised an error
    pub fn record(&mut self, outcome: Outcome) {
        self.status = outcome.status;
        self.message = Some(outcome.message);
        self.detail = outcome.detail;
    }

    /// Record a result for a node that is not executed
    pub fn record_not_run(&mut self, eligibility: &EffectiveEligibility) {
        let status =
            ResultStatus::for_not_run(eligibility.state).unwrap_or(ResultStatus::Skipped);
        self.set_result(status, eligibility.reason.clone());
    }

    /// Record a teardown error. The node becomes an error and the teardown
    /// message is appended to whatever was recorded before.
    pub fn record_teardown_error(&mut self, outcome: Outcome) {
        let message = format!("TearDown : {}", outcome.message);
        self.message = Some(match self.message.take() {
            Some(previous) => format!("{previous}\n{message}"),
            None => message,
        });
        if let Some(detail) = outcome.detail {
            let detail = format!("--TearDown\n{detail}");
            self.detail = Some(match self.detail.take() {
                Some(previous) => format!("{previous}\n{detail}"),
                None => detail,
            });
        }
        self.status = ResultStatus::Error;
    }

    pub fn add_child(&mut self, child: TestResult) {
        self.children.push(child);
    }

    pub fn is_suite(&self) -> bool {
        self.test.is_suite
    }

    pub fn full_name(&self) -> &str {
        &self.test.full_name
    }

    /// Find a result in this subtree (including this one) by full name
    pub fn find(&self, full_name: &str) -> Option<&TestResult> {
        if self.test.full_name == full_name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(full_name))
    }

    /// Worst status anywhere in this subtree
    pub fn worst_status(&self) -> ResultStatus {
        self.children
            .iter()
            .map(TestResult::worst_status)
            .fold(self.status, |worst, status| {
                if status.severity() > worst.severity() {
                    status
                } else {
                    worst
                }
            })
    }

    /// Results of the test cases in this subtree, in tree order
    pub fn leaves(&self) -> Vec<&TestResult> {
        if !self.is_suite() {
            return vec![self];
        }
        self.children.iter().flat_map(TestResult::leaves).collect()
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}ms]",
            self.status.symbol(),
            self.test.full_name,
            self.duration_ms
        )?;
        if let Some(msg) = &self.message {
            write!(f, " - {msg}")?;
        }
        Ok(())
    }
}

/// Leaf-level roll-up of a result tree
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub name: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub cancelled: usize,
    pub skipped: usize,
    pub ignored: usize,
    pub not_runnable: usize,
    pub inconclusive: usize,
    pub total_duration_ms: u64,
}

impl RunSummary {
    pub fn from_result(result: &TestResult) -> Self {
        let mut summary = Self {
            name: result.test.name.clone(),
            total_duration_ms: result.duration_ms,
            ..Self::default()
        };

        for leaf in result.leaves() {
            summary.total += 1;
            match leaf.status {
                ResultStatus::Success => summary.passed += 1,
                ResultStatus::Failure => summary.failed += 1,
                ResultStatus::Error => summary.errors += 1,
                ResultStatus::Cancelled => summary.cancelled += 1,
                ResultStatus::Skipped => summary.skipped += 1,
                ResultStatus::Ignored => summary.ignored += 1,
                ResultStatus::NotRunnable => summary.not_runnable += 1,
                ResultStatus::Inconclusive => summary.inconclusive += 1,
            }
        }

        summary
    }

    /// Tests that were actually attempted
    pub fn run_count(&self) -> usize {
        self.passed + self.failed + self.errors + self.cancelled + self.inconclusive
    }

    pub fn pass_rate(&self) -> f64 {
        let run = self.run_count();
        if run == 0 {
            0.0
        } else {
            (self.passed as f64 / run as f64) * 100.0
        }
    }

    pub fn is_all_passed(&self) -> bool {
        self.failed == 0 && self.errors == 0 && self.cancelled == 0 && self.not_runnable == 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run Summary - {}", self.name)?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {} | Error: {} | Cancelled: {}",
            self.total, self.passed, self.failed, self.errors, self.cancelled
        )?;
        writeln!(
            f,
            "Skipped: {} | Ignored: {} | Not Runnable: {} | Inconclusive: {}",
            self.skipped, self.ignored, self.not_runnable, self.inconclusive
        )?;
        write!(
            f,
            "Pass Rate: {:.1}% | Duration: {}ms",
            self.pass_rate(),
            self.total_duration_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TestCase, TestNode, TestSuite};

    fn descriptor(name: &str) -> TestDescriptor {
        TestNode::from(TestCase::new(name, |_| Ok(()))).descriptor()
    }

    fn suite_descriptor(name: &str) -> TestDescriptor {
        TestSuite::fixture(name).descriptor()
    }

    #[test]
    fn test_teardown_error_appends() {
        let mut result = TestResult::new(descriptor("t"));
        result.set_result(ResultStatus::Failure, Some("expected 1".to_string()));
        result.record_teardown_error(Outcome {
            status: ResultStatus::Error,
            message: "disk full".to_string(),
            detail: None,
        });

        assert_eq!(result.status, ResultStatus::Error);
        assert_eq!(
            result.message.as_deref(),
            Some("expected 1\nTearDown : disk full")
        );
    }

    #[test]
    fn test_not_run_status() {
        let mut result = TestResult::new(descriptor("t"));
        result.record_not_run(&EffectiveEligibility {
            state: RunEligibility::NotRunnable,
            reason: Some("bad signature".to_string()),
        });
        assert_eq!(result.status, ResultStatus::NotRunnable);
        assert_eq!(result.message.as_deref(), Some("bad signature"));
    }

    #[test]
    fn test_worst_status_and_summary() {
        let mut suite = TestResult::new(suite_descriptor("A.Fx"));
        let mut ok = TestResult::new(descriptor("ok"));
        ok.duration_ms = 5;
        let mut failed = TestResult::new(descriptor("bad"));
        failed.set_result(ResultStatus::Failure, Some("nope".to_string()));
        let mut skipped = TestResult::new(descriptor("skip"));
        skipped.set_result(ResultStatus::Skipped, None);
        suite.add_child(ok);
        suite.add_child(failed);
        suite.add_child(skipped);

        // the suite's own status is untouched by its children
        assert_eq!(suite.status, ResultStatus::Success);
        assert_eq!(suite.worst_status(), ResultStatus::Failure);

        let summary = RunSummary::from_result(&suite);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.run_count(), 2);
        assert!(!summary.is_all_passed());
        assert!((summary.pass_rate() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_find() {
        let mut suite = TestResult::new(suite_descriptor("A.Fx"));
        suite.add_child(TestResult::new(descriptor("A.Fx.One")));
        assert!(suite.find("A.Fx.One").is_some());
        assert!(suite.find("A.Fx").is_some());
        assert!(suite.find("A.Fx.Two").is_none());
    }
}
