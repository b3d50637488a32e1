//! StylePaster: turns a multi-key chord into a pasted style.
//!
//! The style is synthesized from the chord's labels, serialized into the SVG
//! clipboard document, published on the clipboard under the drawing
//! application's target, and finally applied by pressing Control+Shift+V.
//! A degenerate style (no stroke, no fill) publishes nothing.

use std::collections::BTreeSet;
use std::sync::Arc;

use chord_core::style::svg::clipboard_document;
use chord_core::{synthesize, Keystroke, StyleMetrics};
use thiserror::Error;
use tracing::debug;

use super::replay::{DisplayConnection, DisplayError};

/// Error type for clipboard operations.
#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("failed to start clipboard command `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write clipboard payload: {0}")]
    Write(#[source] std::io::Error),
    #[error("clipboard command `{command}` exited with {status}")]
    Exit { command: String, status: String },
}

/// Publishes a payload on the clipboard under a named target.
pub trait Clipboard: Send + Sync {
    fn copy(&self, payload: &str, target: &str) -> Result<(), ClipboardError>;
}

/// Error type for [`StylePaster::paste`].
#[derive(Debug, Error)]
pub enum PasteError {
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
    #[error(transparent)]
    Display(#[from] DisplayError),
}

/// The paste-style use case.
pub struct StylePaster {
    metrics: StyleMetrics,
    target: String,
    clipboard: Arc<dyn Clipboard>,
    display: Arc<dyn DisplayConnection>,
}

impl StylePaster {
    pub fn new(
        metrics: StyleMetrics,
        target: impl Into<String>,
        clipboard: Arc<dyn Clipboard>,
        display: Arc<dyn DisplayConnection>,
    ) -> Self {
        Self {
            metrics,
            target: target.into(),
            clipboard,
            display,
        }
    }

    /// Pastes the style for `combination`.
    ///
    /// Returns `false` when the style is degenerate and nothing was pasted.
    ///
    /// # Errors
    ///
    /// Returns [`PasteError`] if publishing the payload or pressing the paste
    /// shortcut fails.
    pub fn paste(&self, combination: &BTreeSet<String>) -> Result<bool, PasteError> {
        let Some(style) = synthesize(combination, &self.metrics) else {
            debug!(?combination, "degenerate style, nothing to paste");
            return Ok(false);
        };
        debug!(style = %style.to_style_string(), "pasting style");
        self.clipboard.copy(&clipboard_document(&style), &self.target)?;
        self.display.press(Keystroke::paste_style())?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chord_core::RawEvent;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingClipboard {
        copies: Mutex<Vec<(String, String)>>,
        should_fail: bool,
    }

    impl Clipboard for RecordingClipboard {
        fn copy(&self, payload: &str, target: &str) -> Result<(), ClipboardError> {
            if self.should_fail {
                return Err(ClipboardError::Exit {
                    command: "xclip".to_string(),
                    status: "exit status: 1".to_string(),
                });
            }
            self.copies
                .lock()
                .unwrap()
                .push((payload.to_string(), target.to_string()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingDisplay {
        presses: Mutex<Vec<Keystroke>>,
    }

    impl DisplayConnection for RecordingDisplay {
        fn send_event(&self, _event: &RawEvent) -> Result<(), DisplayError> {
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

    fn combo(keys: &[&str]) -> BTreeSet<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    fn paster(
        clipboard: Arc<RecordingClipboard>,
        display: Arc<RecordingDisplay>,
    ) -> StylePaster {
        StylePaster::new(StyleMetrics::default(), "image/x-inkscape-svg", clipboard, display)
    }

    #[test]
    fn test_paste_publishes_document_then_presses_paste() {
        // Arrange
        let clipboard = Arc::new(RecordingClipboard::default());
        let display = Arc::new(RecordingDisplay::default());
        let paster = paster(Arc::clone(&clipboard), Arc::clone(&display));

        // Act
        let pasted = paster.paste(&combo(&["a", "g"])).unwrap();

        // Assert
        assert!(pasted);
        let copies = clipboard.copies.lock().unwrap();
        assert_eq!(copies.len(), 1);
        assert_eq!(copies[0].1, "image/x-inkscape-svg");
        assert!(copies[0].0.contains("marker-end: url(#marker-arrow-0.99525)"));
        assert_eq!(*display.presses.lock().unwrap(), vec![Keystroke::paste_style()]);
    }

    #[test]
    fn test_degenerate_style_publishes_nothing() {
        let clipboard = Arc::new(RecordingClipboard::default());
        let display = Arc::new(RecordingDisplay::default());
        let paster = paster(Arc::clone(&clipboard), Arc::clone(&display));

        let pasted = paster.paste(&combo(&["q", "r"])).unwrap();

        assert!(!pasted);
        assert!(clipboard.copies.lock().unwrap().is_empty());
        assert!(display.presses.lock().unwrap().is_empty());
    }

    #[test]
    fn test_clipboard_failure_skips_paste_shortcut() {
        let clipboard = Arc::new(RecordingClipboard {
            should_fail: true,
            ..Default::default()
        });
        let display = Arc::new(RecordingDisplay::default());
        let paster = paster(clipboard, Arc::clone(&display));

        let result = paster.paste(&combo(&["s", "b"]));

        assert!(matches!(result, Err(PasteError::Clipboard(ClipboardError::Exit { .. }))));
        assert!(display.presses.lock().unwrap().is_empty());
    }
}
