//! Event pump
//!
//! Pulls events out of an [`EventQueue`] on a background thread and hands
//! them to a listener, so listeners never run on the thread executing the
//! tests.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

use super::{host, EventQueue, TestEvent, TestListener};
use crate::models::EngineError;

/// Name given to the consumer thread
const PUMP_THREAD_NAME: &str = "event-pump";

/// Lifecycle of an [`EventPump`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventPumpState {
    Stopped,
    /// Pumping with no stop requested
    Pumping,
    /// Still pumping; will exit once the queue is empty
    Stopping,
}

impl fmt::Display for EventPumpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventPumpState::Stopped => write!(f, "stopped"),
            EventPumpState::Pumping => write!(f, "pumping"),
            EventPumpState::Stopping => write!(f, "stopping"),
        }
    }
}

#[derive(Debug)]
struct SharedState(Mutex<EventPumpState>);

impl SharedState {
    fn get(&self) -> EventPumpState {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set(&self, state: EventPumpState) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }
}

/// Background consumer forwarding queued events to a listener.
///
/// Dropping the pump stops it and joins the consumer thread.
pub struct EventPump {
    listener: Arc<dyn TestListener>,
    events: Arc<EventQueue>,
    autostop: bool,
    state: Arc<SharedState>,
    thread: Option<JoinHandle<()>>,
}

impl EventPump {
    /// Create a pump. With `autostop`, the pump stops on its own once every
    /// `Started` event it has seen is matched by a `Finished` event.
    pub fn new(listener: Arc<dyn TestListener>, events: Arc<EventQueue>, autostop: bool) -> Self {
        Self {
            listener,
            events,
            autostop,
            state: Arc::new(SharedState(Mutex::new(EventPumpState::Stopped))),
            thread: None,
        }
    }

    pub fn state(&self) -> EventPumpState {
        self.state.get()
    }

    /// Start the consumer thread. Does nothing if already pumping. A
    /// stopped pump can be started again on the same queue.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.state() == EventPumpState::Pumping {
            return Ok(());
        }
        // an autostopped consumer may still need joining
        self.join_consumer();
        // a previous stop closed the queue
        self.events.reopen();

        let consumer = Consumer {
            listener: self.listener.clone(),
            host: host::listener(),
            events: self.events.clone(),
            state: self.state.clone(),
            autostop: self.autostop,
        };

        self.state.set(EventPumpState::Pumping);
        let spawned = thread::Builder::new()
            .name(PUMP_THREAD_NAME.to_string())
            .spawn(move || consumer.run());

        match spawned {
            Ok(handle) => {
                debug!("Event pump started (autostop: {})", self.autostop);
                self.thread = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.state.set(EventPumpState::Stopped);
                Err(EngineError::PumpSpawn(e))
            }
        }
    }

    /// Ask the consumer to finish the queue and wait for it to exit.
    /// Does nothing if no consumer is running.
    pub fn stop(&mut self) {
        if self.thread.is_none() {
            return;
        }
        if self.state() == EventPumpState::Pumping {
            self.state.set(EventPumpState::Stopping);
        }
        self.events.close();
        self.join_consumer();
        debug!("Event pump stopped");
    }

    fn join_consumer(&mut self) {
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                error!("Event pump thread terminated abnormally");
            }
            self.state.set(EventPumpState::Stopped);
        }
    }
}

impl Drop for EventPump {
    fn drop(&mut self) {
        self.stop();
    }
}

impl fmt::Debug for EventPump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventPump")
            .field("state", &self.state())
            .field("autostop", &self.autostop)
            .field("queued", &self.events.len())
            .finish()
    }
}

struct Consumer {
    listener: Arc<dyn TestListener>,
    host: Option<Arc<dyn TestListener>>,
    events: Arc<EventQueue>,
    state: Arc<SharedState>,
    autostop: bool,
}

impl Consumer {
    fn run(self) {
        let mut pending_tests: usize = 0;

        loop {
            let event = if self.state.get() == EventPumpState::Stopping {
                self.events.try_dequeue()
            } else {
                self.events.dequeue()
            };
            let Some(event) = event else { break };

            self.deliver(&event);

            if self.autostop {
                match event {
                    TestEvent::Started(_) => pending_tests += 1,
                    TestEvent::Finished(_) if pending_tests > 0 => {
                        pending_tests -= 1;
                        if pending_tests == 0 {
                            debug!("All started tests finished, event pump stopping");
                            self.state.set(EventPumpState::Stopping);
                        }
                    }
                    _ => {}
                }
            }
        }

        self.state.set(EventPumpState::Stopped);
    }

    fn deliver(&self, event: &TestEvent) {
        let targets = std::iter::once(&self.listener).chain(self.host.as_ref());
        for listener in targets {
            let delivered = catch_unwind(AssertUnwindSafe(|| event.send(listener.as_ref())));
            if delivered.is_err() {
                error!("Listener panicked while handling {} event", event.kind());
            }
        }
    }
}
