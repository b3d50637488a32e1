//! Single-key action table.
//!
//! A chord made of exactly one resolved key is looked up in a fixed binding
//! table.  Each binding either switches the input mode, asks for the
//! external editor, asks for the current mode's configuration to be saved,
//! or injects one shortcut into the drawing application:
//!
//! | Label     | Action                                   |
//! |-----------|------------------------------------------|
//! | `t`       | open editor, live rendering              |
//! | `Shift+t` | open editor, precompiled rendering       |
//! | `a`       | object mode                              |
//! | `Shift+a` | save object mode                         |
//! | `s`       | style mode                               |
//! | `Shift+s` | save style mode                          |
//! | `w`       | pencil tool (`p`)                        |
//! | `x`       | toggle snapping (Shift+`%`)              |
//! | `f`       | bezier tool (`b`)                        |
//! | `z`       | undo (Control+`z`)                       |
//! | `Shift+z` | delete (`Delete`)                        |
//! | `` ` ``   | text tool (`t`), then text mode          |
//!
//! Any other label is not consumed and the chord is replayed.

use std::fmt;
use std::sync::Arc;

use chord_core::keymap::linux_x11::{
    XK_B_LOWER, XK_DELETE, XK_P_LOWER, XK_PERCENT, XK_T_LOWER, XK_Z_LOWER,
};
use chord_core::{Keystroke, ModifierMask};
use tracing::{debug, info};

use super::replay::{DisplayConnection, DisplayError};

/// Input mode of the session.  Only `Normal` runs the chord dispatcher;
/// every other mode is served by its own handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    #[default]
    Normal,
    /// Placing saved objects.
    Object,
    /// Applying saved styles.
    Style,
    /// Typing text into the drawing.
    Text,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::Object => "object",
            Mode::Style => "style",
            Mode::Text => "text",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A shortcut of the drawing application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Pencil,
    Bezier,
    Snap,
    Undo,
    Delete,
    TextTool,
}

impl Command {
    pub fn keystroke(self) -> Keystroke {
        match self {
            Command::Pencil => Keystroke::plain(XK_P_LOWER),
            Command::Bezier => Keystroke::plain(XK_B_LOWER),
            Command::Snap => Keystroke::new(XK_PERCENT, ModifierMask::SHIFT),
            Command::Undo => Keystroke::new(XK_Z_LOWER, ModifierMask::CONTROL),
            Command::Delete => Keystroke::plain(XK_DELETE),
            Command::TextTool => Keystroke::plain(XK_T_LOWER),
        }
    }
}

/// What a single-key chord does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    OpenEditor { precompiled: bool },
    SwitchMode(Mode),
    SaveMode(Mode),
    Command(Command),
    /// Selects the text tool, then switches to text mode.
    EnterText,
}

impl Action {
    /// The mode the session must switch to after this action, if any.
    pub fn next_mode(self) -> Option<Mode> {
        match self {
            Action::SwitchMode(mode) => Some(mode),
            Action::EnterText => Some(Mode::Text),
            _ => None,
        }
    }
}

/// Looks up the binding for `label`.
pub fn action_for_label(label: &str) -> Option<Action> {
    let action = match label {
        "t" => Action::OpenEditor { precompiled: false },
        "Shift+t" => Action::OpenEditor { precompiled: true },
        "a" => Action::SwitchMode(Mode::Object),
        "Shift+a" => Action::SaveMode(Mode::Object),
        "s" => Action::SwitchMode(Mode::Style),
        "Shift+s" => Action::SaveMode(Mode::Style),
        "w" => Action::Command(Command::Pencil),
        "x" => Action::Command(Command::Snap),
        "f" => Action::Command(Command::Bezier),
        "z" => Action::Command(Command::Undo),
        "Shift+z" => Action::Command(Command::Delete),
        "`" => Action::EnterText,
        _ => return None,
    };
    Some(action)
}

/// Launches the external editor.  Fire-and-forget: failures are reported by
/// the implementation, not the caller.
#[cfg_attr(test, mockall::automock)]
pub trait EditorLauncher: Send + Sync {
    fn open(&self, precompiled: bool);
}

/// Persists the configuration of a mode.  Fire-and-forget, like
/// [`EditorLauncher`].
#[cfg_attr(test, mockall::automock)]
pub trait ModeSaver: Send + Sync {
    fn save(&self, mode: Mode);
}

/// Performs the side effects of single-key bindings.
pub struct ActionTable {
    display: Arc<dyn DisplayConnection>,
    editor: Arc<dyn EditorLauncher>,
    mode_saver: Arc<dyn ModeSaver>,
}

impl ActionTable {
    pub fn new(
        display: Arc<dyn DisplayConnection>,
        editor: Arc<dyn EditorLauncher>,
        mode_saver: Arc<dyn ModeSaver>,
    ) -> Self {
        Self {
            display,
            editor,
            mode_saver,
        }
    }

    /// Runs the binding for `label`.
    ///
    /// Returns the action performed, or `None` when the label is unbound and
    /// the chord must be replayed.  Mode switches are reported through
    /// [`Action::next_mode`]; the session owns the mode slot.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError`] if injecting a shortcut fails.
    pub fn act(&self, label: &str) -> Result<Option<Action>, DisplayError> {
        let Some(action) = action_for_label(label) else {
            debug!(label, "no binding");
            return Ok(None);
        };
        match action {
            Action::OpenEditor { precompiled } => {
                info!(precompiled, "opening editor");
                self.editor.open(precompiled);
            }
            Action::SwitchMode(_) => {}
            Action::SaveMode(mode) => {
                info!(%mode, "saving mode");
                self.mode_saver.save(mode);
            }
            Action::Command(command) => self.inject(command)?,
            Action::EnterText => self.inject(Command::TextTool)?,
        }
        Ok(Some(action))
    }

    fn inject(&self, command: Command) -> Result<(), DisplayError> {
        let keystroke = command.keystroke();
        debug!(?command, %keystroke, "injecting shortcut");
        self.display.press(keystroke)
    }
}
