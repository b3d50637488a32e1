//! Mock input source for unit testing.
//!
//! Allows tests to inject synthetic [`RawEvent`]s without an X server.

use std::sync::{
    mpsc::{self, Sender},
    Arc, Mutex,
};

use chord_core::RawEvent;

use super::{CaptureError, InputSource};

/// A mock implementation of [`InputSource`] that allows tests to inject events.
pub struct MockInputSource {
    sender: Arc<Mutex<Option<Sender<RawEvent>>>>,
    start_count: Arc<Mutex<u32>>,
}

impl MockInputSource {
    pub fn new() -> Self {
        Self {
            sender: Arc::new(Mutex::new(None)),
            start_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Injects a synthetic event, as if grabbed from the X server.
    ///
    /// Panics if `start()` has not been called or if `stop()` has been called.
    pub fn inject_event(&self, event: RawEvent) {
        let guard = self.sender.lock().expect("lock poisoned");
        if let Some(ref sender) = *guard {
            sender
                .send(event)
                .expect("receiver has been dropped; call start() first");
        } else {
            panic!("MockInputSource::inject_event called before start()");
        }
    }

    /// Injects every event of `events` in order.
    pub fn inject_all(&self, events: impl IntoIterator<Item = RawEvent>) {
        for event in events {
            self.inject_event(event);
        }
    }

    /// Returns the number of times [`InputSource::start`] was called.
    pub fn start_count(&self) -> u32 {
        *self.start_count.lock().expect("lock poisoned")
    }
}

impl Default for MockInputSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for MockInputSource {
    fn start(&self) -> Result<mpsc::Receiver<RawEvent>, CaptureError> {
        let mut sender = self.sender.lock().expect("lock poisoned");
        if sender.is_some() {
            return Err(CaptureError::AlreadyStarted);
        }
        let (tx, rx) = mpsc::channel();
        *sender = Some(tx);
        *self.start_count.lock().expect("lock poisoned") += 1;
        Ok(rx)
    }

    fn stop(&self) {
        // Drop the sender to close the channel
        *self.sender.lock().expect("lock poisoned") = None;
    }
}
