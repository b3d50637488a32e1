//! Raw keyboard events as delivered by the event source.

use crate::keymap::{resolve_label, ModifierMask};

/// Kind of a captured event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A key went down.
    Press,
    /// A key came up.
    Release,
    /// Anything else the event source forwards (focus changes, mapping
    /// notifications).  Logged for replay but never part of a chord.
    Other,
}

/// One captured event, immutable once recorded.
///
/// Besides the resolved label the event keeps the raw X11 fields needed to
/// re-emit it unchanged: the hardware keycode, the modifier state at the time
/// of the event, and the server timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub kind: EventKind,
    /// Resolved label such as `"a"`, `"Shift+z"`, or `"?"` when unresolved.
    pub label: String,
    /// `false` when the keysym had no printable character (pure modifiers,
    /// function keys).  Unresolved presses never join a chord's identity.
    pub resolved: bool,
    /// Hardware keycode (8..=255 on X11).
    pub keycode: u32,
    /// Keysym at index 0 of the keycode's mapping, `0` for `NoSymbol`.
    pub keysym: u32,
    /// Modifier state immediately before the event.
    pub state: ModifierMask,
    /// Server timestamp in milliseconds.
    pub time: u64,
}

impl RawEvent {
    /// Builds a press or release event, resolving its label from
    /// `keysym` and `state`.
    pub fn key(kind: EventKind, keycode: u32, keysym: u32, state: ModifierMask, time: u64) -> Self {
        let (label, resolved) = match resolve_label(keysym, state) {
            Some(label) => (label, true),
            None => (state.label_prefix() + "?", false),
        };
        Self {
            kind,
            label,
            resolved,
            keycode,
            keysym,
            state,
            time,
        }
    }

    /// Builds a non-key event that is only carried along for replay.
    pub fn other(time: u64) -> Self {
        Self {
            kind: EventKind::Other,
            label: "?".to_string(),
            resolved: false,
            keycode: 0,
            keysym: 0,
            state: ModifierMask::NONE,
            time,
        }
    }

    pub fn is_press(&self) -> bool {
        self.kind == EventKind::Press
    }

    pub fn is_release(&self) -> bool {
        self.kind == EventKind::Release
    }
}
