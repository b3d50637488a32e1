//! Replay engine: re-emits an unclaimed chord to the drawing application.
//!
//! When a chord maps to nothing, the daemon must behave as if it had never
//! intercepted the keys.  Every buffered event is sent to the controlled
//! application in its original order, then the display connection is flushed
//! and synchronized so the application sees them before the next chord.
//!
//! Order matters: a Shift pressed before a letter is a capital, a Shift
//! pressed after it is not.

use chord_core::{Keystroke, RawEvent};
use thiserror::Error;
use tracing::debug;

/// Error type for display connection operations.
#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("platform error: {0}")]
    Platform(String),
    #[error("no keycode is mapped to keysym 0x{0:04X}")]
    UnmappedKeysym(u32),
    #[error("display connection unavailable")]
    Unavailable,
}

/// Connection to the controlled application's window.
///
/// The production implementation talks to the X server; tests record calls.
pub trait DisplayConnection: Send + Sync {
    /// Sends `event` to the controlled application as a propagating
    /// synthetic event.
    fn send_event(&self, event: &RawEvent) -> Result<(), DisplayError>;

    /// Performs a full press + release cycle of `keystroke` on the
    /// controlled application.
    fn press(&self, keystroke: Keystroke) -> Result<(), DisplayError>;

    /// Flushes the output buffer and waits until the server has processed it.
    fn sync(&self) -> Result<(), DisplayError>;
}

/// Re-emits `events` in order, then synchronizes.
///
/// # Errors
///
/// Returns the first [`DisplayError`]; the remaining events are not sent.
pub fn replay(display: &dyn DisplayConnection, events: &[RawEvent]) -> Result<(), DisplayError> {
    debug!(count = events.len(), "replaying chord");
    for event in events {
        display.send_event(event)?;
    }
    display.sync()
}
