//! Session: the mode slot plus event routing.
//!
//! In normal mode every event goes through the [`ChordDispatcher`].  A
//! binding may switch the session into another mode, after which events go
//! to that mode's [`ModeHandler`] until the handler hands control back.
//! The session never looks inside a handler; it only swaps which one is
//! active.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

use chord_core::keymap::linux_x11::XK_ESCAPE;
use chord_core::RawEvent;
use tracing::{info, warn};

use super::actions::Mode;
use super::dispatch::{ChordDispatcher, ChordResolution, DispatchError};
use super::replay::{DisplayConnection, DisplayError};

/// How long [`Session::run`] blocks before re-checking the running flag.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What a mode handler wants after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeTransition {
    Stay,
    /// Return to normal mode.
    Leave,
}

/// Handler of a non-normal mode.
pub trait ModeHandler: Send {
    fn on_event(
        &mut self,
        event: &RawEvent,
        display: &dyn DisplayConnection,
    ) -> Result<ModeTransition, DisplayError>;
}

/// Forwards every event unchanged and leaves on the release of Escape.
#[derive(Debug, Default)]
pub struct PassthroughMode;

impl ModeHandler for PassthroughMode {
    fn on_event(
        &mut self,
        event: &RawEvent,
        display: &dyn DisplayConnection,
    ) -> Result<ModeTransition, DisplayError> {
        display.send_event(event)?;
        display.sync()?;
        if event.is_release() && event.keysym == XK_ESCAPE {
            Ok(ModeTransition::Leave)
        } else {
            Ok(ModeTransition::Stay)
        }
    }
}

/// One input session against one controlled application window.
pub struct Session {
    mode: Mode,
    dispatcher: ChordDispatcher,
    handlers: HashMap<Mode, Box<dyn ModeHandler>>,
    display: Arc<dyn DisplayConnection>,
}

impl Session {
    /// Creates a session in normal mode with a [`PassthroughMode`] handler
    /// installed for every other mode.
    pub fn new(dispatcher: ChordDispatcher, display: Arc<dyn DisplayConnection>) -> Self {
        let mut handlers: HashMap<Mode, Box<dyn ModeHandler>> = HashMap::new();
        for mode in [Mode::Object, Mode::Style, Mode::Text] {
            handlers.insert(mode, Box::new(PassthroughMode));
        }
        Self {
            mode: Mode::Normal,
            dispatcher,
            handlers,
            display,
        }
    }

    /// Replaces the handler of `mode`.  Normal mode always runs the dispatcher.
    pub fn with_handler(mut self, mode: Mode, handler: Box<dyn ModeHandler>) -> Self {
        if mode == Mode::Normal {
            warn!("normal mode handler cannot be replaced");
            return self;
        }
        self.handlers.insert(mode, handler);
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode != mode {
            info!(from = %self.mode, to = %mode, "mode switch");
            self.mode = mode;
        }
    }

    /// Routes one event to the dispatcher or the active mode's handler.
    ///
    /// Returns the chord resolution when a normal-mode chord closed.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] if the controlled application cannot be
    /// reached.  The session should be torn down.
    pub fn handle_event(
        &mut self,
        event: RawEvent,
    ) -> Result<Option<ChordResolution>, DispatchError> {
        if self.mode != Mode::Normal {
            if let Some(handler) = self.handlers.get_mut(&self.mode) {
                if handler.on_event(&event, self.display.as_ref())? == ModeTransition::Leave {
                    self.set_mode(Mode::Normal);
                }
                return Ok(None);
            }
            warn!(mode = %self.mode, "no handler for mode");
            self.set_mode(Mode::Normal);
        }

        let resolution = self.dispatcher.handle(event)?;
        if let Some(ChordResolution::Action(action)) = &resolution {
            if let Some(next) = action.next_mode() {
                self.set_mode(next);
            }
        }
        Ok(resolution)
    }

    /// Feeds events from `events` until `running` is cleared or the sender
    /// disconnects.
    ///
    /// # Errors
    ///
    /// Stops at the first [`DispatchError`] and returns it.
    pub fn run(
        &mut self,
        events: &Receiver<RawEvent>,
        running: &AtomicBool,
    ) -> Result<(), DispatchError> {
        while running.load(Ordering::Relaxed) {
            match events.recv_timeout(POLL_INTERVAL) {
                Ok(event) => {
                    self.handle_event(event)?;
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    info!("event source closed");
                    break;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::actions::{Action, ActionTable, EditorLauncher, ModeSaver};
    use crate::application::paste_style::{Clipboard, ClipboardError, StylePaster};
    use chord_core::keymap::linux_x11::{XK_A_LOWER, XK_GRAVE, XK_S_LOWER, XK_T_LOWER};
    use chord_core::{EventKind, Keystroke, ModifierMask, StyleMetrics};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingDisplay {
        sent: Mutex<Vec<RawEvent>>,
        presses: Mutex<Vec<Keystroke>>,
    }

    impl DisplayConnection for RecordingDisplay {
        fn send_event(&self, event: &RawEvent) -> Result<(), DisplayError> {
            self.sent.lock().unwrap().push(event.clone());
            Ok(())
        }

        fn press(&self, keystroke: Keystroke) -> Result<(), DisplayError> {
            self.presses.lock().unwrap().push(keystroke);
            Ok(())
        }

        fn sync(&self) -> Result<(), DisplayError> {
            Ok(())
        }
    }

    struct Inert;

    impl Clipboard for Inert {
        fn copy(&self, _payload: &str, _target: &str) -> Result<(), ClipboardError> {
            Ok(())
        }
    }

    impl EditorLauncher for Inert {
        fn open(&self, _precompiled: bool) {}
    }

    impl ModeSaver for Inert {
        fn save(&self, _mode: Mode) {}
    }

    /// Counts events and leaves after `limit` of them.
    struct CountingMode {
        seen: Arc<Mutex<usize>>,
        limit: usize,
    }

    impl ModeHandler for CountingMode {
        fn on_event(
            &mut self,
            _event: &RawEvent,
            _display: &dyn DisplayConnection,
        ) -> Result<ModeTransition, DisplayError> {
            let mut seen = self.seen.lock().unwrap();
            *seen += 1;
            Ok(if *seen >= self.limit {
                ModeTransition::Leave
            } else {
                ModeTransition::Stay
            })
        }
    }

    fn session() -> (Session, Arc<RecordingDisplay>) {
        let display = Arc::new(RecordingDisplay::default());
        let inert = Arc::new(Inert);
        let actions = ActionTable::new(
            Arc::clone(&display) as Arc<dyn DisplayConnection>,
            Arc::clone(&inert) as Arc<dyn EditorLauncher>,
            Arc::clone(&inert) as Arc<dyn ModeSaver>,
        );
        let paster = StylePaster::new(
            StyleMetrics::default(),
            "image/x-inkscape-svg",
            inert as Arc<dyn Clipboard>,
            Arc::clone(&display) as Arc<dyn DisplayConnection>,
        );
        let dispatcher =
            ChordDispatcher::new(actions, paster, Arc::clone(&display) as Arc<dyn DisplayConnection>);
        let session = Session::new(dispatcher, Arc::clone(&display) as Arc<dyn DisplayConnection>);
        (session, display)
    }

    fn tap(session: &mut Session, keycode: u32, keysym: u32) -> Option<ChordResolution> {
        session
            .handle_event(RawEvent::key(EventKind::Press, keycode, keysym, ModifierMask::NONE, 0))
            .unwrap();
        session
            .handle_event(RawEvent::key(EventKind::Release, keycode, keysym, ModifierMask::NONE, 0))
            .unwrap()
    }

    #[test]
    fn test_session_starts_in_normal_mode() {
        let (session, _) = session();
        assert_eq!(session.mode(), Mode::Normal);
    }

    #[test]
    fn test_binding_switches_mode_slot() {
        // Arrange
        let (mut session, _) = session();

        // Act
        let resolution = tap(&mut session, 39, XK_S_LOWER);

        // Assert
        assert_eq!(resolution, Some(ChordResolution::Action(Action::SwitchMode(Mode::Style))));
        assert_eq!(session.mode(), Mode::Style);
    }

    #[test]
    fn test_text_binding_selects_tool_and_enters_text_mode() {
        let (mut session, display) = session();

        tap(&mut session, 49, XK_GRAVE);

        assert_eq!(session.mode(), Mode::Text);
        assert_eq!(*display.presses.lock().unwrap(), vec![Keystroke::plain(XK_T_LOWER)]);
    }

    #[test]
    fn test_passthrough_forwards_and_leaves_on_escape() {
        // Arrange
        let (mut session, display) = session();
        session.set_mode(Mode::Text);

        // Act – 't' is typed as text, not interpreted as the editor binding
        let typed = tap(&mut session, 28, XK_T_LOWER);
        tap(&mut session, 9, XK_ESCAPE);

        // Assert
        assert_eq!(typed, None);
        assert_eq!(display.sent.lock().unwrap().len(), 4);
        assert_eq!(session.mode(), Mode::Normal);
    }

    #[test]
    fn test_custom_handler_replaces_passthrough() {
        // Arrange
        let seen = Arc::new(Mutex::new(0));
        let (session, display) = session();
        let mut session = session.with_handler(
            Mode::Object,
            Box::new(CountingMode {
                seen: Arc::clone(&seen),
                limit: 2,
            }),
        );

        // Act – 'a' switches to object mode, the next tap goes to the handler
        tap(&mut session, 38, XK_A_LOWER);
        assert_eq!(session.mode(), Mode::Object);
        tap(&mut session, 38, XK_A_LOWER);

        // Assert
        assert_eq!(*seen.lock().unwrap(), 2);
        assert_eq!(session.mode(), Mode::Normal);
        assert!(display.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_run_drains_channel_until_disconnect() {
        // Arrange
        let (mut session, display) = session();
        let (tx, rx) = std::sync::mpsc::channel();
        let q = chord_core::keymap::linux_x11::XK_Q_LOWER;
        tx.send(RawEvent::key(EventKind::Press, 24, q, ModifierMask::NONE, 1)).unwrap();
        tx.send(RawEvent::key(EventKind::Release, 24, q, ModifierMask::NONE, 2)).unwrap();
        drop(tx);

        // Act
        let result = session.run(&rx, &AtomicBool::new(true));

        // Assert – unbound 'q' is replayed
        assert!(result.is_ok());
        assert_eq!(display.sent.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_run_returns_immediately_when_not_running() {
        let (mut session, display) = session();
        let (tx, rx) = std::sync::mpsc::channel();
        tx.send(RawEvent::other(1)).unwrap();

        session.run(&rx, &AtomicBool::new(false)).unwrap();

        assert!(display.sent.lock().unwrap().is_empty());
        drop(tx);
    }

    #[test]
    fn test_normal_handler_cannot_be_replaced() {
        let seen = Arc::new(Mutex::new(0));
        let (session, _) = session();
        let mut session = session.with_handler(
            Mode::Normal,
            Box::new(CountingMode {
                seen: Arc::clone(&seen),
                limit: 1,
            }),
        );

        tap(&mut session, 39, XK_S_LOWER);

        assert_eq!(*seen.lock().unwrap(), 0);
        assert_eq!(session.mode(), Mode::Style);
    }
}
