//! Mock display connection for testing.
//!
//! The real connection talks to an X server, which tests cannot observe.
//! `MockDisplay` records every call in a `Mutex<Vec<...>>` so assertions can
//! inspect exactly what reached the controlled application and in what order.
//!
//! # `should_fail` flag
//!
//! Set `should_fail = true` to make every call return
//! `DisplayError::Platform`, simulating a lost connection.

use std::sync::Mutex;

use chord_core::{Keystroke, RawEvent};

use crate::application::replay::{DisplayConnection, DisplayError};

/// One call observed by [`MockDisplay`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayCall {
    Send(RawEvent),
    Press(Keystroke),
    Sync,
}

/// A mock display that records all calls without an X server.
#[derive(Default)]
pub struct MockDisplay {
    /// Every call, in order.
    pub calls: Mutex<Vec<DisplayCall>>,
    pub should_fail: bool,
}

impl MockDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// A display whose every call fails.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// The events passed to `send_event`, in order.
    pub fn sent_events(&self) -> Vec<RawEvent> {
        self.calls
            .lock()
            .expect("lock poisoned")
            .iter()
            .filter_map(|call| match call {
                DisplayCall::Send(event) => Some(event.clone()),
                _ => None,
            })
            .collect()
    }

    /// The keystrokes passed to `press`, in order.
    pub fn pressed(&self) -> Vec<Keystroke> {
        self.calls
            .lock()
            .expect("lock poisoned")
            .iter()
            .filter_map(|call| match call {
                DisplayCall::Press(keystroke) => Some(*keystroke),
                _ => None,
            })
            .collect()
    }

    pub fn sync_count(&self) -> usize {
        self.calls
            .lock()
            .expect("lock poisoned")
            .iter()
            .filter(|call| matches!(call, DisplayCall::Sync))
            .count()
    }

    fn record(&self, call: DisplayCall) -> Result<(), DisplayError> {
        if self.should_fail {
            return Err(DisplayError::Platform("mock failure".to_string()));
        }
        self.calls.lock().expect("lock poisoned").push(call);
        Ok(())
    }
}

impl DisplayConnection for MockDisplay {
    fn send_event(&self, event: &RawEvent) -> Result<(), DisplayError> {
        self.record(DisplayCall::Send(event.clone()))
    }

    fn press(&self, keystroke: Keystroke) -> Result<(), DisplayError> {
        self.record(DisplayCall::Press(keystroke))
    }

    fn sync(&self) -> Result<(), DisplayError> {
        self.record(DisplayCall::Sync)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chord_core::keymap::linux_x11::XK_Q_LOWER;
    use chord_core::{EventKind, ModifierMask};

    #[test]
    fn test_mock_display_records_calls_in_order() {
        // Arrange
        let display = MockDisplay::new();
        let event = RawEvent::key(EventKind::Press, 24, XK_Q_LOWER, ModifierMask::NONE, 1);

        // Act
        display.send_event(&event).unwrap();
        display.press(Keystroke::paste_style()).unwrap();
        display.sync().unwrap();

        // Assert
        assert_eq!(
            *display.calls.lock().unwrap(),
            vec![
                DisplayCall::Send(event.clone()),
                DisplayCall::Press(Keystroke::paste_style()),
                DisplayCall::Sync,
            ]
        );
        assert_eq!(display.sent_events(), vec![event]);
        assert_eq!(display.pressed(), vec![Keystroke::paste_style()]);
        assert_eq!(display.sync_count(), 1);
    }

    #[test]
    fn test_failing_mock_display_records_nothing() {
        let display = MockDisplay::failing();

        let result = display.sync();

        assert!(matches!(result, Err(DisplayError::Platform(_))));
        assert!(display.calls.lock().unwrap().is_empty());
    }
}
