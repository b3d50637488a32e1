//! Key labels, modifier masks, and synthetic keystrokes.
//!
//! A *label* is the textual identity of a key event: the modifier prefixes
//! followed by the character of the keysym, e.g. `"a"`, `"Shift+t"`,
//! `"Shift+Control+z"`.  Labels are the unit of chord identity and the keys
//! of the single-key binding table.
//!
//! Only `Shift` and `Control` contribute a prefix, in that order.  Other
//! modifier bits (Lock, Mod1..Mod5) are carried in the event for replay but
//! do not change the label.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

pub mod linux_x11;

/// X11 modifier state bitmask (`KeyButMask` from the core protocol).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModifierMask(pub u32);

impl ModifierMask {
    pub const NONE: Self = Self(0);
    pub const SHIFT: Self = Self(1 << 0);
    pub const LOCK: Self = Self(1 << 1);
    pub const CONTROL: Self = Self(1 << 2);
    pub const MOD1: Self = Self(1 << 3);

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// The label prefix for this state: `"Shift+"`, `"Control+"`, both, or empty.
    pub fn label_prefix(self) -> String {
        let mut prefix = String::new();
        if self.contains(Self::SHIFT) {
            prefix.push_str("Shift+");
        }
        if self.contains(Self::CONTROL) {
            prefix.push_str("Control+");
        }
        prefix
    }
}

impl BitOr for ModifierMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ModifierMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Resolves the label of a key event.
///
/// Returns `None` when the keysym has no printable character, which is the
/// case for modifier keys, function keys, and `NoSymbol`.
pub fn resolve_label(keysym: u32, state: ModifierMask) -> Option<String> {
    let ch = linux_x11::keysym_to_char(keysym)?;
    let mut label = state.label_prefix();
    label.push(ch);
    Some(label)
}

/// A synthetic keystroke: one full press + release cycle of `keysym` with
/// `modifiers` held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Keystroke {
    pub keysym: u32,
    pub modifiers: ModifierMask,
}

impl Keystroke {
    pub const fn new(keysym: u32, modifiers: ModifierMask) -> Self {
        Self { keysym, modifiers }
    }

    pub const fn plain(keysym: u32) -> Self {
        Self::new(keysym, ModifierMask::NONE)
    }

    /// Control+Shift+V, the drawing application's "paste style" shortcut.
    pub const fn paste_style() -> Self {
        Self::new(
            linux_x11::XK_V_LOWER,
            ModifierMask(ModifierMask::CONTROL.0 | ModifierMask::SHIFT.0),
        )
    }
}

impl fmt::Display for Keystroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = self.modifiers.label_prefix();
        match linux_x11::keysym_name(self.keysym) {
            Some(name) => write!(f, "{prefix}{name}"),
            None => write!(f, "{prefix}0x{:04X}", self.keysym),
        }
    }
}
