//! Observer contract
//!
//! Listeners receive start, finish and output notifications while a run is
//! in progress.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::error;

use super::TestEvent;
use crate::models::{TestDescriptor, TestResult};

/// Stream a piece of test output was written to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputChannel {
    Out,
    Error,
}

impl fmt::Display for OutputChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputChannel::Out => write!(f, "out"),
            OutputChannel::Error => write!(f, "error"),
        }
    }
}

/// Text written by a test
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TestOutput {
    pub text: String,
    pub channel: OutputChannel,
}

impl TestOutput {
    pub fn new(text: impl Into<String>, channel: OutputChannel) -> Self {
        Self {
            text: text.into(),
            channel,
        }
    }
}

/// Receives notifications about a run
pub trait TestListener: Send + Sync {
    /// A test or suite is starting
    fn test_started(&self, test: &TestDescriptor);

    /// A test or suite finished
    fn test_finished(&self, result: &TestResult);

    /// A test wrote some output
    fn test_output(&self, output: &TestOutput);
}

/// Listener that discards everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NullListener;

impl TestListener for NullListener {
    fn test_started(&self, _test: &TestDescriptor) {}

    fn test_finished(&self, _result: &TestResult) {}

    fn test_output(&self, _output: &TestOutput) {}
}

/// Fans every notification out to a list of listeners
#[derive(Clone, Default)]
pub struct CompositeListener {
    listeners: Vec<Arc<dyn TestListener>>,
}

impl CompositeListener {
    pub fn new(listeners: Vec<Arc<dyn TestListener>>) -> Self {
        Self { listeners }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Call every listener; one that panics does not keep the event from
    /// the rest
    fn each(&self, event: &str, notify: impl Fn(&dyn TestListener)) {
        for listener in &self.listeners {
            let listener = listener.as_ref();
            if catch_unwind(AssertUnwindSafe(|| notify(listener))).is_err() {
                error!("Listener panicked while handling {} event", event);
            }
        }
    }
}

impl TestListener for CompositeListener {
    fn test_started(&self, test: &TestDescriptor) {
        self.each("started", |l| l.test_started(test));
    }

    fn test_finished(&self, result: &TestResult) {
        self.each("finished", |l| l.test_finished(result));
    }

    fn test_output(&self, output: &TestOutput) {
        self.each("output", |l| l.test_output(output));
    }
}

/// Keeps every notification it receives, in arrival order
#[derive(Debug, Default)]
pub struct RecordingListener {
    events: Mutex<Vec<TestEvent>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TestEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn started(&self) -> Vec<TestDescriptor> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                TestEvent::Started(test) => Some(test),
                _ => None,
            })
            .collect()
    }

    pub fn finished(&self) -> Vec<TestResult> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                TestEvent::Finished(result) => Some(result),
                _ => None,
            })
            .collect()
    }

    /// All output text in arrival order
    pub fn output(&self) -> Vec<TestOutput> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                TestEvent::Output(output) => Some(output),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: TestEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl TestListener for RecordingListener {
    fn test_started(&self, test: &TestDescriptor) {
        self.push(TestEvent::Started(test.clone()));
    }

    fn test_finished(&self, result: &TestResult) {
        self.push(TestEvent::Finished(result.clone()));
    }

    fn test_output(&self, output: &TestOutput) {
        self.push(TestEvent::Output(output.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TestCase, TestNode};

    #[test]
    fn test_composite_fans_out() {
        let first = Arc::new(RecordingListener::new());
        let second = Arc::new(RecordingListener::new());
        let composite = CompositeListener::new(vec![first.clone(), second.clone()]);

        let test = TestNode::from(TestCase::new("t", |_| Ok(()))).descriptor();
        composite.test_started(&test);
        composite.test_output(&TestOutput::new("hi", OutputChannel::Out));

        assert_eq!(first.events().len(), 2);
        assert_eq!(second.started().len(), 1);
        assert_eq!(second.output()[0].text, "hi");
    }

    #[test]
    fn test_composite_isolates_panicking_listener() {
        struct Loud;

        impl TestListener for Loud {
            fn test_started(&self, _test: &TestDescriptor) {
                panic!("started is not welcome here");
            }
            fn test_finished(&self, _result: &TestResult) {}
            fn test_output(&self, _output: &TestOutput) {}
        }

        let after = Arc::new(RecordingListener::new());
        let composite = CompositeListener::new(vec![Arc::new(Loud), after.clone()]);

        let test = TestNode::from(TestCase::new("t", |_| Ok(()))).descriptor();
        composite.test_started(&test);

        assert_eq!(after.started().len(), 1);
    }
}
