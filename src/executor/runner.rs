//! Test assembly runner
//!
//! Owns a loaded suite tree and runs it with an event pump attached.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{error, info};

use super::SuiteExecutor;
use crate::events::{
    EventPump, EventQueue, QueuingListener, TestListener, TestOutput,
};
use crate::models::{
    EngineError, RunSummary, TestDescriptor, TestId, TestNode, TestResult, TestSuite,
};
use crate::utils::timer::Timer;

/// Runs a loaded test tree.
///
/// Start and finish notifications reach the caller's listener directly on
/// the executing thread. Output notifications are queued and delivered by
/// the event pump, which also feeds every event to the host listeners.
#[derive(Debug, Default)]
pub struct TestAssemblyRunner {
    root: Option<TestNode>,
    autostop: bool,
    sort: bool,
}

impl TestAssemblyRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let the pump stop on its own once every started test has finished
    pub fn with_autostop(mut self, autostop: bool) -> Self {
        self.autostop = autostop;
        self
    }

    /// Sort the tree by name when it is loaded
    pub fn with_sort(mut self, sort: bool) -> Self {
        self.sort = sort;
        self
    }

    /// Load the tree to run, replacing any previously loaded one
    pub fn load(&mut self, mut suite: TestSuite) -> &TestNode {
        if self.sort {
            suite.sort();
        }
        info!(
            "Loaded {} ({} tests)",
            suite.info.full_name,
            suite.test_case_count()
        );
        self.root.insert(TestNode::Suite(suite))
    }

    pub fn is_loaded(&self) -> bool {
        self.root.is_some()
    }

    /// The loaded tree, if any
    pub fn root(&self) -> Option<&TestNode> {
        self.root.as_ref()
    }

    /// Run the whole loaded tree
    pub fn run(&self, listener: Arc<dyn TestListener>) -> Result<TestResult, EngineError> {
        let root = self.root.as_ref().ok_or(EngineError::NotLoaded)?;
        self.run_node(root, &[], listener)
    }

    /// Run a single node of the loaded tree, selected by full name. The
    /// node runs even if it is explicit, inside the setup, fixtures and
    /// teardown of the suites above it. The result is rooted at the loaded
    /// root and holds only the path down to the selected node.
    pub fn run_selected(
        &self,
        full_name: &str,
        listener: Arc<dyn TestListener>,
    ) -> Result<TestResult, EngineError> {
        let root = self.root.as_ref().ok_or(EngineError::NotLoaded)?;
        let path = if root.full_name() == full_name {
            Some(Vec::new())
        } else {
            root.as_suite().and_then(|suite| suite.path_to(full_name))
        };
        let path = path.ok_or_else(|| EngineError::TestNotFound(full_name.to_string()))?;
        self.run_node(root, &path, listener)
    }

    fn run_node(
        &self,
        node: &TestNode,
        path: &[TestId],
        listener: Arc<dyn TestListener>,
    ) -> Result<TestResult, EngineError> {
        let queue = Arc::new(EventQueue::new());
        let mut pump = EventPump::new(
            Arc::new(OutputForwarder {
                listener: listener.clone(),
            }),
            queue.clone(),
            self.autostop,
        );
        pump.start()?;

        let notifier = Arc::new(RunNotifier {
            listener,
            queue: QueuingListener::with_queue(queue),
        });

        info!("Starting run of {}", node.full_name());
        let timer = Timer::start(node.full_name());
        let result = SuiteExecutor::new(notifier).run_path(node, path);
        pump.stop();

        let summary = RunSummary::from_result(&result);
        info!(
            "Run of {} completed in {}ms - Pass: {}/{} ({:.1}%)",
            node.full_name(),
            timer.elapsed_ms(),
            summary.passed,
            summary.run_count(),
            summary.pass_rate()
        );
        Ok(result)
    }
}

/// Listener the executor reports to during a run
struct RunNotifier {
    listener: Arc<dyn TestListener>,
    queue: QueuingListener,
}

impl RunNotifier {
    /// Call the caller's listener; a panic there must not abort the run
    fn direct(&self, event: &str, notify: impl FnOnce(&dyn TestListener)) {
        let listener = self.listener.as_ref();
        if catch_unwind(AssertUnwindSafe(|| notify(listener))).is_err() {
            error!("Listener panicked while handling {} event", event);
        }
    }
}

impl TestListener for RunNotifier {
    fn test_started(&self, test: &TestDescriptor) {
        self.direct("started", |l| l.test_started(test));
        self.queue.test_started(test);
    }

    fn test_finished(&self, result: &TestResult) {
        self.direct("finished", |l| l.test_finished(result));
        self.queue.test_finished(result);
    }

    fn test_output(&self, output: &TestOutput) {
        self.queue.test_output(output);
    }
}

/// Pump-side listener for the caller: only output, since start and finish
/// were already delivered directly
struct OutputForwarder {
    listener: Arc<dyn TestListener>,
}

impl TestListener for OutputForwarder {
    fn test_started(&self, _test: &TestDescriptor) {}

    fn test_finished(&self, _result: &TestResult) {}

    fn test_output(&self, output: &TestOutput) {
        self.listener.test_output(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{host, RecordingListener, TestEvent};
    use crate::models::{FixtureInstance, ResultStatus, RunEligibility, TestCase, TestError};

    fn sample() -> TestSuite {
        TestSuite::root("assembly")
            .with_child(
                TestSuite::fixture("B.Second")
                    .with_child(TestCase::new("Zed", |_| Ok(())))
                    .with_child(TestCase::new("Alpha", |ctx| {
                        ctx.write_out("alpha says hi");
                        Ok(())
                    })),
            )
            .with_child(
                TestSuite::fixture("A.First")
                    .with_child(TestCase::new("Fails", |_| Err(TestError::failure("nope"))))
                    .with_child(
                        TestCase::new("Manual", |_| Ok(()))
                            .with_run_state(RunEligibility::Explicit, None),
                    ),
            )
    }

    #[test]
    fn test_run_requires_load() {
        let runner = TestAssemblyRunner::new();
        assert!(!runner.is_loaded());
        let err = runner.run(Arc::new(RecordingListener::new())).unwrap_err();
        assert!(matches!(err, EngineError::NotLoaded));
    }

    #[test]
    fn test_run_delivers_every_event_once() {
        let mut runner = TestAssemblyRunner::new();
        runner.load(sample());
        assert!(runner.is_loaded());

        let recorder = Arc::new(RecordingListener::new());
        let result = runner.run(recorder.clone()).unwrap();

        assert_eq!(result.children.len(), 2);
        assert_eq!(result.worst_status(), ResultStatus::Failure);
        // root + 2 fixtures + 3 non-explicit cases
        assert_eq!(recorder.started().len(), 6);
        assert_eq!(recorder.finished().len(), 6);
        let output = recorder.output();
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].text, "alpha says hi");
    }

    #[test]
    fn test_host_listener_sees_pumped_events() {
        let host_recorder = Arc::new(RecordingListener::new());
        let handle = host::register(host_recorder.clone());

        let mut runner = TestAssemblyRunner::new().with_autostop(true);
        runner.load(TestSuite::root("hosted").with_child(
            TestSuite::fixture("Hosted").with_child(TestCase::new("Only", |_| Ok(()))),
        ));
        runner.run(Arc::new(RecordingListener::new())).unwrap();
        host::unregister(handle);

        // other tests may run concurrently; look for this run's events only
        let ours: Vec<TestEvent> = host_recorder
            .events()
            .into_iter()
            .filter(|e| match e {
                TestEvent::Started(t) => t.full_name.starts_with("Hosted") || t.name == "hosted",
                TestEvent::Finished(r) => {
                    r.test.full_name.starts_with("Hosted") || r.test.name == "hosted"
                }
                TestEvent::Output(_) => false,
            })
            .collect();
        assert_eq!(ours.len(), 6);
    }

    #[test]
    fn test_sort_on_load() {
        let mut runner = TestAssemblyRunner::new().with_sort(true);
        let root = runner.load(sample());
        let names: Vec<&str> = root
            .as_suite()
            .unwrap()
            .children()
            .iter()
            .map(TestNode::name)
            .collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    #[test]
    fn test_run_selected_explicit() {
        let mut runner = TestAssemblyRunner::new();
        runner.load(sample());

        let result = runner
            .run_selected("A.First.Manual", Arc::new(RecordingListener::new()))
            .unwrap();
        assert_eq!(result.full_name(), "assembly");
        let manual = result.find("A.First.Manual").unwrap();
        assert_eq!(manual.status, ResultStatus::Success);
        assert_eq!(result.leaves().len(), 1);

        let err = runner
            .run_selected("A.First.Missing", Arc::new(RecordingListener::new()))
            .unwrap_err();
        assert!(matches!(err, EngineError::TestNotFound(name) if name == "A.First.Missing"));
    }

    #[test]
    fn test_run_selected_inside_fixture() {
        let mut runner = TestAssemblyRunner::new();
        runner.load(
            TestSuite::root("selected").with_child(
                TestSuite::fixture("A.Db")
                    .with_fixture(|| Ok(Box::new(7u32) as FixtureInstance))
                    .with_child(TestCase::new("Uses", |ctx| match ctx.fixture::<u32>().copied() {
                        Some(7) => Ok(()),
                        _ => Err(TestError::failure("no fixture")),
                    })),
            ),
        );

        let full = runner.run(Arc::new(RecordingListener::new())).unwrap();
        let selected = runner
            .run_selected("A.Db.Uses", Arc::new(RecordingListener::new()))
            .unwrap();

        assert_eq!(full.find("A.Db.Uses").unwrap().status, ResultStatus::Success);
        let uses = selected.find("A.Db.Uses").unwrap();
        assert_eq!(uses.status, ResultStatus::Success, "{:?}", uses.message);
    }

    #[test]
    fn test_listener_panic_does_not_abort_run() {
        struct Grumpy;

        impl TestListener for Grumpy {
            fn test_started(&self, _test: &TestDescriptor) {
                panic!("not listening");
            }
            fn test_finished(&self, _result: &TestResult) {}
            fn test_output(&self, _output: &TestOutput) {}
        }

        let mut runner = TestAssemblyRunner::new();
        runner.load(sample());
        let result = runner.run(Arc::new(Grumpy)).unwrap();
        assert_eq!(result.leaves().len(), 3);
    }
}
