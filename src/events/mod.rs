//! Event delivery
//!
//! Listener contract, the event queue and the pump that drains it on a
//! background thread.

pub mod host;
mod listener;
mod pump;
mod queue;
mod queuing;
mod writer;

pub use listener::{
    CompositeListener, NullListener, OutputChannel, RecordingListener, TestListener, TestOutput,
};
pub use pump::{EventPump, EventPumpState};
pub use queue::{EventQueue, TestEvent};
pub use queuing::QueuingListener;
pub use writer::EventWriter;
