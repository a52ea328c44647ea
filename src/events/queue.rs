//! Event queue
//!
//! A FIFO of execution events shared by one producer and one consumer
//! thread. The consumer blocks on a condition variable while the queue is
//! empty and is woken by `enqueue` or `close`.

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

use super::{TestListener, TestOutput};
use crate::models::{TestDescriptor, TestResult};

/// Something that happened during a run
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum TestEvent {
    Started(TestDescriptor),
    Finished(TestResult),
    Output(TestOutput),
}

impl TestEvent {
    /// Deliver this event to a listener
    pub fn send(&self, listener: &dyn TestListener) {
        match self {
            TestEvent::Started(test) => listener.test_started(test),
            TestEvent::Finished(result) => listener.test_finished(result),
            TestEvent::Output(output) => listener.test_output(output),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TestEvent::Started(_) => "started",
            TestEvent::Finished(_) => "finished",
            TestEvent::Output(_) => "output",
        }
    }
}

#[derive(Debug, Default)]
struct QueueState {
    events: VecDeque<TestEvent>,
    closed: bool,
}

/// Thread-safe FIFO of events
#[derive(Debug, Default)]
pub struct EventQueue {
    state: Mutex<QueueState>,
    available: Condvar,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an event and wake one waiting consumer
    pub fn enqueue(&self, event: TestEvent) {
        self.lock().events.push_back(event);
        self.available.notify_one();
    }

    /// Remove the oldest event, blocking while the queue is empty.
    /// Returns `None` once the queue is closed and drained.
    pub fn dequeue(&self) -> Option<TestEvent> {
        let mut state = self.lock();
        loop {
            if let Some(event) = state.events.pop_front() {
                return Some(event);
            }
            if state.closed {
                return None;
            }
            state = self
                .available
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Remove the oldest event without blocking
    pub fn try_dequeue(&self) -> Option<TestEvent> {
        self.lock().events.pop_front()
    }

    /// Stop blocking consumers. Events already queued can still be drained.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_all();
    }

    /// Accept blocking consumers again after `close`
    pub fn reopen(&self) {
        self.lock().closed = false;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Advisory; may be stale as soon as it returns
    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::OutputChannel;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn output(text: &str) -> TestEvent {
        TestEvent::Output(TestOutput::new(text, OutputChannel::Out))
    }

    fn text(event: TestEvent) -> String {
        match event {
            TestEvent::Output(output) => output.text,
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_fifo_order() {
        let queue = EventQueue::new();
        queue.enqueue(output("a"));
        queue.enqueue(output("b"));
        assert_eq!(queue.len(), 2);
        assert_eq!(text(queue.dequeue().unwrap()), "a");
        assert_eq!(text(queue.try_dequeue().unwrap()), "b");
        assert!(queue.try_dequeue().is_none());
    }

    #[test]
    fn test_close_drains_then_ends() {
        let queue = EventQueue::new();
        queue.enqueue(output("last"));
        queue.close();
        assert!(queue.is_closed());
        assert_eq!(text(queue.dequeue().unwrap()), "last");
        assert!(queue.dequeue().is_none());
    }

    #[test]
    fn test_blocking_dequeue_wakes_on_enqueue() {
        let queue = Arc::new(EventQueue::new());
        let consumer = {
            let queue = queue.clone();
            thread::spawn(move || {
                let mut seen = Vec::new();
                while let Some(event) = queue.dequeue() {
                    seen.push(text(event));
                }
                seen
            })
        };

        thread::sleep(Duration::from_millis(20));
        for i in 0..100 {
            queue.enqueue(output(&i.to_string()));
        }
        queue.close();

        let seen = consumer.join().unwrap();
        let expected: Vec<String> = (0..100).map(|i| i.to_string()).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_reopen_blocks_again() {
        let queue = Arc::new(EventQueue::new());
        queue.close();
        queue.reopen();
        assert!(!queue.is_closed());

        let consumer = {
            let queue = queue.clone();
            thread::spawn(move || queue.dequeue().map(text))
        };
        thread::sleep(Duration::from_millis(20));
        queue.enqueue(output("after reopen"));
        assert_eq!(consumer.join().unwrap().as_deref(), Some("after reopen"));
    }

    #[test]
    fn test_close_wakes_blocked_consumer() {
        let queue = Arc::new(EventQueue::new());
        let consumer = {
            let queue = queue.clone();
            thread::spawn(move || queue.dequeue().is_none())
        };
        thread::sleep(Duration::from_millis(20));
        queue.close();
        assert!(consumer.join().unwrap());
    }
}
