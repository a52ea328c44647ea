//! Execution context handed to test actions

use std::any::Any;
use std::sync::Arc;

use crate::events::{EventWriter, OutputChannel, TestListener};

/// Mutable borrow of a suite's fixture instance
pub type FixtureRef<'a> = &'a mut (dyn Any + Send + 'static);

/// What a running action can see: its test's name, the output writers and
/// the fixture instance of the enclosing suite.
pub struct TestContext<'a> {
    test_name: &'a str,
    out: EventWriter,
    err: EventWriter,
    fixture: Option<FixtureRef<'a>>,
}

impl<'a> TestContext<'a> {
    pub fn new(
        test_name: &'a str,
        listener: Arc<dyn TestListener>,
        fixture: Option<FixtureRef<'a>>,
    ) -> Self {
        Self {
            test_name,
            out: EventWriter::new(listener.clone(), OutputChannel::Out),
            err: EventWriter::new(listener, OutputChannel::Error),
            fixture,
        }
    }

    /// Full name of the node the action belongs to
    pub fn test_name(&self) -> &str {
        self.test_name
    }

    /// Standard output of the test; every write becomes one output event
    pub fn out(&mut self) -> &mut EventWriter {
        &mut self.out
    }

    /// Error output of the test
    pub fn err(&mut self) -> &mut EventWriter {
        &mut self.err
    }

    pub fn write_out(&self, text: &str) {
        self.out.write_text(text);
    }

    pub fn write_err(&self, text: &str) {
        self.err.write_text(text);
    }

    pub fn has_fixture(&self) -> bool {
        self.fixture.is_some()
    }

    /// The fixture instance, if there is one and it is a `T`
    pub fn fixture<T: Any>(&self) -> Option<&T> {
        self.fixture.as_deref()?.downcast_ref::<T>()
    }

    pub fn fixture_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.fixture.as_deref_mut()?.downcast_mut::<T>()
    }
}

impl std::fmt::Debug for TestContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestContext")
            .field("test_name", &self.test_name)
            .field("has_fixture", &self.has_fixture())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingListener;
    use std::io::Write;

    #[derive(Debug, Default, PartialEq)]
    struct Counter {
        hits: u32,
    }

    #[test]
    fn test_fixture_access() {
        let mut instance: Box<dyn Any + Send> = Box::new(Counter::default());
        let recorder = Arc::new(RecordingListener::new());
        let mut ctx = TestContext::new("A.Fixture.Test", recorder, Some(&mut *instance));

        assert!(ctx.has_fixture());
        ctx.fixture_mut::<Counter>().unwrap().hits += 2;
        assert_eq!(ctx.fixture::<Counter>(), Some(&Counter { hits: 2 }));
        assert!(ctx.fixture::<String>().is_none());
    }

    #[test]
    fn test_without_fixture() {
        let ctx = TestContext::new("Lonely", Arc::new(RecordingListener::new()), None);
        assert!(ctx.fixture::<Counter>().is_none());
        assert_eq!(ctx.test_name(), "Lonely");
    }

    #[test]
    fn test_output_channels() {
        let recorder = Arc::new(RecordingListener::new());
        let mut ctx = TestContext::new("Writer", recorder.clone(), None);

        writeln!(ctx.out(), "to out").unwrap();
        ctx.write_err("to err");

        let text_on = |channel| -> String {
            recorder
                .output()
                .into_iter()
                .filter(|o| o.channel == channel)
                .map(|o| o.text)
                .collect()
        };
        assert_eq!(text_on(OutputChannel::Out), "to out\n");
        assert_eq!(text_on(OutputChannel::Error), "to err");
    }
}
