//! Listener that defers delivery by queueing every notification

use std::sync::Arc;

use super::{EventQueue, TestEvent, TestListener, TestOutput};
use crate::models::{TestDescriptor, TestResult};

/// Converts listener callbacks into queued [`TestEvent`]s.
///
/// Pair it with an [`EventPump`](super::EventPump) reading the same queue
/// to move listener work off the executing thread.
#[derive(Debug, Default)]
pub struct QueuingListener {
    events: Arc<EventQueue>,
}

impl QueuingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue events into an existing queue
    pub fn with_queue(events: Arc<EventQueue>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> Arc<EventQueue> {
        self.events.clone()
    }
}

impl TestListener for QueuingListener {
    fn test_started(&self, test: &TestDescriptor) {
        self.events.enqueue(TestEvent::Started(test.clone()));
    }

    // child results were already queued when they finished
    fn test_finished(&self, result: &TestResult) {
        self.events.enqueue(TestEvent::Finished(result.without_children()));
    }

    fn test_output(&self, output: &TestOutput) {
        self.events.enqueue(TestEvent::Output(output.clone()));
    }
}
