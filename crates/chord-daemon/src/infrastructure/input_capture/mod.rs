//! Input capture infrastructure for the chord daemon.
//!
//! On Linux this passively grabs every key on the controlled window through
//! Xlib and reads the grabbed events on a dedicated thread.  Captured events
//! are resolved into [`RawEvent`]s and placed into an `mpsc` channel consumed
//! by the session loop.
//!
//! # Testability
//!
//! The `InputSource` trait allows tests to inject synthetic events without
//! an X server.

use std::sync::mpsc;

use chord_core::RawEvent;

pub mod mock;

#[cfg(target_os = "linux")]
pub mod x11;

/// Error type for input capture operations.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("cannot open display {0}")]
    DisplayUnavailable(String),
    #[error("failed to start capture thread: {0}")]
    ThreadSpawn(String),
    #[error("capture is already running")]
    AlreadyStarted,
}

/// Trait abstracting input event production.
///
/// The production implementation grabs keys on an X11 window; tests use
/// [`mock::MockInputSource`].
pub trait InputSource: Send {
    /// Starts the input source and returns a receiver for captured events.
    fn start(&self) -> Result<mpsc::Receiver<RawEvent>, CaptureError>;
    /// Stops the input source and releases the grab.  The receiver
    /// disconnects once the capture thread has exited.
    fn stop(&self);
}
