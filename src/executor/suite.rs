//! Suite execution
//!
//! Walks a test tree top-down, running setup, children and teardown of each
//! suite and producing a result tree that mirrors the executed nodes.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::context::{FixtureRef, TestContext};
use crate::events::TestListener;
use crate::models::{
    EffectiveEligibility, FixtureInstance, Outcome, ResultStatus, RunEligibility, SuiteKind,
    TestAction, TestCase, TestError, TestId, TestNode, TestResult, TestSuite,
};
use crate::utils::timer::Timer;

/// Runs nodes and reports their progress to a listener.
///
/// The listener receives `test_started`/`test_finished` for every node that
/// gets a result, including nodes that are not executed. Output written
/// through a [`TestContext`] goes to the same listener.
#[derive(Clone)]
pub struct SuiteExecutor {
    listener: Arc<dyn TestListener>,
}

impl SuiteExecutor {
    pub fn new(listener: Arc<dyn TestListener>) -> Self {
        Self { listener }
    }

    /// Run `node` as the root of a run. An explicit node runs when it is
    /// the root.
    pub fn run(&self, node: &TestNode) -> TestResult {
        self.run_path(node, &[])
    }

    /// Run `root`, but below it only the nodes on `path` (ids from a child
    /// of `root` down to the selected node) and everything under the last
    /// one. Suites on the path run their setup, fixture and teardown as in
    /// a full run; nodes on the path run even if they are explicit.
    pub fn run_path(&self, root: &TestNode, path: &[TestId]) -> TestResult {
        let eligibility = EffectiveEligibility::resolve(root.info(), None);
        self.run_node(root, &eligibility, None, None, path)
    }

    fn run_node(
        &self,
        node: &TestNode,
        eligibility: &EffectiveEligibility,
        fixture: Option<FixtureRef<'_>>,
        hooks: Option<&TestSuite>,
        path: &[TestId],
    ) -> TestResult {
        if !eligibility.is_runnable() {
            return self.not_run(node, eligibility, path);
        }
        match node {
            TestNode::Case(case) => self.run_case(case, fixture, hooks),
            TestNode::Suite(suite) => self.run_suite(suite, eligibility, fixture, hooks, path),
        }
    }

    fn run_case(
        &self,
        case: &TestCase,
        fixture: Option<FixtureRef<'_>>,
        hooks: Option<&TestSuite>,
    ) -> TestResult {
        let test = case.descriptor();
        self.listener.test_started(&test);
        let timer = Timer::start(&case.info.full_name);
        let mut result = TestResult::new(test);

        let mut ctx = TestContext::new(&case.info.full_name, self.listener.clone(), fixture);

        let setup = hooks.map(TestSuite::setup).unwrap_or_default();
        let setup_error = setup
            .iter()
            .find_map(|action| invoke(action, &mut ctx).err());

        match setup_error {
            Some(e) => result.record(e.outcome()),
            None => {
                if let Err(e) = invoke(case.action(), &mut ctx) {
                    result.record(e.outcome());
                }
            }
        }

        let teardown = hooks.map(TestSuite::teardown).unwrap_or_default();
        for action in teardown.iter().rev() {
            if let Err(e) = invoke(action, &mut ctx) {
                result.record_teardown_error(e.outcome());
            }
        }

        result.duration_ms = timer.elapsed_ms();
        debug!("{}", result);
        self.listener.test_finished(&result);
        result
    }

    fn run_suite(
        &self,
        suite: &TestSuite,
        eligibility: &EffectiveEligibility,
        inherited: Option<FixtureRef<'_>>,
        hooks: Option<&TestSuite>,
        path: &[TestId],
    ) -> TestResult {
        let test = suite.descriptor();
        self.listener.test_started(&test);
        let timer = Timer::start(&suite.info.full_name);
        let mut result = TestResult::new(test);
        info!(
            "Running {} {} ({} tests)",
            suite.kind.name(),
            suite.info.full_name,
            suite.test_case_count()
        );

        let mut teardown = OneTimeTearDown {
            suite,
            listener: self.listener.clone(),
            own: None,
            inherited,
            done: false,
        };

        let setup = self.one_time_setup(suite, &mut teardown);
        let hooks = if suite.setup().is_empty() && suite.teardown().is_empty() {
            hooks
        } else {
            Some(suite)
        };

        match setup {
            Ok(()) => {
                self.run_children(suite, eligibility, &mut teardown, hooks, path, &mut result)
            }
            Err(e) => {
                let outcome = e.outcome();
                match outcome.status {
                    ResultStatus::Ignored => {
                        debug!("{} ignored during setup: {}", suite.info.full_name, outcome.message);
                        result.set_result(ResultStatus::Ignored, Some(outcome.message));
                    }
                    ResultStatus::Inconclusive => {
                        result.record(outcome);
                        self.run_children(suite, eligibility, &mut teardown, hooks, path, &mut result);
                    }
                    _ => {
                        warn!("One-time setup failed in {}: {}", suite.info.full_name, outcome.message);
                        result.record(outcome);
                        let message = setup_failure_message(suite);
                        for (child, rest) in enumerated(suite, path) {
                            result.add_child(self.mark_failed(child, eligibility, &message, rest));
                        }
                    }
                }
            }
        }

        for outcome in teardown.run() {
            warn!("One-time teardown failed in {}: {}", suite.info.full_name, outcome.message);
            result.record_teardown_error(outcome);
        }

        result.duration_ms = timer.elapsed_ms();
        info!("{} {} [{}ms]", result.status.symbol(), suite.info.full_name, result.duration_ms);
        self.listener.test_finished(&result);
        result
    }

    /// Create the fixture instance and run one-time setup, stopping at the
    /// first error
    fn one_time_setup(
        &self,
        suite: &TestSuite,
        teardown: &mut OneTimeTearDown<'_, '_>,
    ) -> Result<(), TestError> {
        if let Some(factory) = suite.fixture_factory() {
            let factory = factory.clone();
            let instance = catch_unwind(AssertUnwindSafe(|| factory()))
                .unwrap_or_else(|payload| Err(TestError::from_panic(payload)))?;
            teardown.own = Some(instance);
        }

        let name = suite.info.full_name.as_str();
        for action in suite.one_time_setup() {
            let mut ctx = TestContext::new(name, self.listener.clone(), teardown.fixture());
            invoke(action, &mut ctx)?;
        }
        Ok(())
    }

    fn run_children(
        &self,
        suite: &TestSuite,
        eligibility: &EffectiveEligibility,
        teardown: &mut OneTimeTearDown<'_, '_>,
        hooks: Option<&TestSuite>,
        path: &[TestId],
        result: &mut TestResult,
    ) {
        for (child, rest) in enumerated(suite, path) {
            let child_eligibility = EffectiveEligibility::resolve(child.info(), Some(eligibility));
            let child_result =
                self.run_node(child, &child_eligibility, teardown.fixture(), hooks, rest);
            let cancelled = child_result.status == ResultStatus::Cancelled;
            result.add_child(child_result);
            if cancelled {
                info!("Run cancelled in {}, remaining tests skipped", suite.info.full_name);
                break;
            }
        }
    }

    /// Synthetic result for a node that is not executed, at every level of
    /// its subtree
    fn not_run(
        &self,
        node: &TestNode,
        eligibility: &EffectiveEligibility,
        path: &[TestId],
    ) -> TestResult {
        let test = node.descriptor();
        self.listener.test_started(&test);
        let mut result = TestResult::new(test);
        result.record_not_run(eligibility);

        if let TestNode::Suite(suite) = node {
            for (child, rest) in enumerated(suite, path) {
                let child_eligibility =
                    EffectiveEligibility::resolve(child.info(), Some(eligibility));
                result.add_child(self.not_run(child, &child_eligibility, rest));
            }
        }

        self.listener.test_finished(&result);
        result
    }

    /// Failing result for a descendant of a suite whose setup failed.
    /// Descendants that would not have run keep their own status.
    fn mark_failed(
        &self,
        node: &TestNode,
        parent: &EffectiveEligibility,
        message: &str,
        path: &[TestId],
    ) -> TestResult {
        let eligibility = EffectiveEligibility::resolve(node.info(), Some(parent));
        if !eligibility.is_runnable() {
            return self.not_run(node, &eligibility, path);
        }

        let test = node.descriptor();
        self.listener.test_started(&test);
        let mut result = TestResult::new(test);
        result.set_result(ResultStatus::Failure, Some(message.to_string()));

        if let TestNode::Suite(suite) = node {
            for (child, rest) in enumerated(suite, path) {
                result.add_child(self.mark_failed(child, &eligibility, message, rest));
            }
        }

        self.listener.test_finished(&result);
        result
    }
}

impl std::fmt::Debug for SuiteExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SuiteExecutor").finish_non_exhaustive()
    }
}

/// Runs a suite's one-time teardown and releases its fixture instance.
/// Runs on drop as well, so unwinding out of a suite still tears it down.
struct OneTimeTearDown<'s, 'f> {
    suite: &'s TestSuite,
    listener: Arc<dyn TestListener>,
    own: Option<FixtureInstance>,
    inherited: Option<FixtureRef<'f>>,
    done: bool,
}

impl OneTimeTearDown<'_, '_> {
    /// The suite's own fixture instance, or the one of an enclosing suite
    fn fixture(&mut self) -> Option<FixtureRef<'_>> {
        if self.own.is_some() {
            self.own.as_deref_mut()
        } else {
            self.inherited.as_deref_mut()
        }
    }

    /// Run teardown actions in reverse order. Every action runs; the
    /// errors are returned in the order they occurred.
    fn run(&mut self) -> Vec<Outcome> {
        if self.done {
            return Vec::new();
        }
        self.done = true;

        let suite = self.suite;
        let listener = self.listener.clone();
        let mut errors = Vec::new();
        for action in suite.one_time_teardown().iter().rev() {
            let mut ctx = TestContext::new(&suite.info.full_name, listener.clone(), self.fixture());
            if let Err(e) = invoke(action, &mut ctx) {
                errors.push(e.outcome());
            }
        }
        self.own = None;
        errors
    }
}

impl Drop for OneTimeTearDown<'_, '_> {
    fn drop(&mut self) {
        if !self.done {
            for outcome in self.run() {
                error!(
                    "One-time teardown failed in {} while unwinding: {}",
                    self.suite.info.full_name, outcome.message
                );
            }
        }
    }
}

/// Invoke an action, turning a panic into a `TestError`
fn invoke(action: &TestAction, ctx: &mut TestContext<'_>) -> Result<(), TestError> {
    catch_unwind(AssertUnwindSafe(|| action(ctx)))
        .unwrap_or_else(|payload| Err(TestError::from_panic(payload)))
}

fn is_explicit(node: &TestNode) -> bool {
    node.info().run_state == RunEligibility::Explicit
}

/// Children a suite goes through, each with the rest of the selection path:
/// every non-explicit child, or only the next node on the path
fn enumerated<'n>(
    suite: &'n TestSuite,
    path: &'n [TestId],
) -> impl Iterator<Item = (&'n TestNode, &'n [TestId])> {
    let (next, rest) = match path.split_first() {
        Some((id, rest)) => (Some(*id), rest),
        None => (None, path),
    };
    suite
        .children()
        .iter()
        .filter(move |child| match next {
            Some(id) => child.id() == id,
            None => !is_explicit(child),
        })
        .map(move |child| (child, rest))
}

fn setup_failure_message(suite: &TestSuite) -> String {
    match suite.kind {
        SuiteKind::SetUpFixture => format!("Parent SetUp failed in {}", suite.fixture_name()),
        _ => format!("OneTimeSetUp failed in {}", suite.fixture_name()),
    }
}
