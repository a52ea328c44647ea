//! Process-wide listener registry
//!
//! Tooling that wants to observe every run registers a listener here. Each
//! event pump takes a snapshot of the registry when it starts and delivers
//! every pumped event to it in addition to its own downstream listener.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use super::{CompositeListener, TestListener};

static HOST_LISTENERS: RwLock<Vec<(ListenerHandle, Arc<dyn TestListener>)>> =
    RwLock::new(Vec::new());

/// Returned by [`register`]; pass it to [`unregister`] to remove the listener
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerHandle(u64);

/// Add a listener that observes every subsequently started run
pub fn register(listener: Arc<dyn TestListener>) -> ListenerHandle {
    static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);
    let handle = ListenerHandle(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed));

    let mut listeners = HOST_LISTENERS
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    listeners.push((handle, listener));
    debug!("Registered host listener {:?} ({} total)", handle, listeners.len());
    handle
}

/// Remove a previously registered listener. Returns false if it was unknown.
pub fn unregister(handle: ListenerHandle) -> bool {
    let mut listeners = HOST_LISTENERS
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    let before = listeners.len();
    listeners.retain(|(h, _)| *h != handle);
    before != listeners.len()
}

/// Remove every registered listener
pub fn clear() {
    HOST_LISTENERS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .clear();
}

pub fn count() -> usize {
    HOST_LISTENERS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .len()
}

/// Snapshot of the registry as a single listener, or `None` when empty
pub fn listener() -> Option<Arc<dyn TestListener>> {
    let listeners = HOST_LISTENERS
        .read()
        .unwrap_or_else(PoisonError::into_inner);
    if listeners.is_empty() {
        return None;
    }
    let snapshot = listeners.iter().map(|(_, l)| l.clone()).collect();
    Some(Arc::new(CompositeListener::new(snapshot)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{NullListener, OutputChannel, RecordingListener, TestOutput};

    #[test]
    fn test_register_and_unregister() {
        let handle = register(Arc::new(NullListener));
        assert!(count() >= 1);
        assert!(unregister(handle));
        assert!(!unregister(handle));
    }

    #[test]
    fn test_snapshot_includes_registered_listener() {
        let recorder = Arc::new(RecordingListener::new());
        let handle = register(recorder.clone());

        let host = listener().expect("registry is not empty");
        host.test_output(&TestOutput::new("to host", OutputChannel::Error));
        unregister(handle);

        assert!(recorder
            .output()
            .iter()
            .any(|o| o.text == "to host" && o.channel == OutputChannel::Error));
    }
}
