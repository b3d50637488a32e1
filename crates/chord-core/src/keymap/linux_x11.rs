//! X11 keysym tables.
//!
//! Keysym values are defined in X11/keysymdef.h.
//! Reference: https://gitlab.freedesktop.org/xorg/proto/xorgproto/-/blob/master/include/X11/keysymdef.h
//!
//! # Which keysyms have a character?
//!
//! Latin-1 keysyms (`0x0020..=0x00FF`) are numerically equal to their
//! character code, so `XK_a` is `0x0061` and `XK_percent` is `0x0025`.
//! A handful of TTY function keys in the `0xFFxx` range also carry a control
//! character in their low byte (`XK_Escape` = `0xFF1B` → ESC).  Every other
//! keysym, including the modifiers, has no character and leaves the key
//! unresolved.

// ── Named keysyms ─────────────────────────────────────────────────────────────

pub const NO_SYMBOL: u32 = 0x0000;

pub const XK_PERCENT: u32 = 0x0025;
pub const XK_GRAVE: u32 = 0x0060;
pub const XK_A_LOWER: u32 = 0x0061;
pub const XK_B_LOWER: u32 = 0x0062;
pub const XK_D_LOWER: u32 = 0x0064;
pub const XK_E_LOWER: u32 = 0x0065;
pub const XK_F_LOWER: u32 = 0x0066;
pub const XK_G_LOWER: u32 = 0x0067;
pub const XK_H_LOWER: u32 = 0x0068;
pub const XK_P_LOWER: u32 = 0x0070;
pub const XK_Q_LOWER: u32 = 0x0071;
pub const XK_R_LOWER: u32 = 0x0072;
pub const XK_S_LOWER: u32 = 0x0073;
pub const XK_T_LOWER: u32 = 0x0074;
pub const XK_V_LOWER: u32 = 0x0076;
pub const XK_W_LOWER: u32 = 0x0077;
pub const XK_X_LOWER: u32 = 0x0078;
pub const XK_Z_LOWER: u32 = 0x007A;

pub const XK_BACKSPACE: u32 = 0xFF08;
pub const XK_TAB: u32 = 0xFF09;
pub const XK_CLEAR: u32 = 0xFF0B;
pub const XK_RETURN: u32 = 0xFF0D;
pub const XK_PAUSE: u32 = 0xFF13;
pub const XK_SCROLL_LOCK: u32 = 0xFF14;
pub const XK_ESCAPE: u32 = 0xFF1B;
pub const XK_DELETE: u32 = 0xFFFF;

pub const XK_SHIFT_L: u32 = 0xFFE1;
pub const XK_SHIFT_R: u32 = 0xFFE2;
pub const XK_CONTROL_L: u32 = 0xFFE3;
pub const XK_CONTROL_R: u32 = 0xFFE4;
pub const XK_ALT_L: u32 = 0xFFE9;
pub const XK_SUPER_L: u32 = 0xFFEB;

/// TTY function keys whose low byte is the matching control character.
const TTY_FUNCTION_KEYS: [u32; 8] = [
    XK_BACKSPACE,
    XK_TAB,
    XK_CLEAR,
    XK_RETURN,
    XK_PAUSE,
    XK_SCROLL_LOCK,
    XK_ESCAPE,
    XK_DELETE,
];

/// Translates a keysym to its character, if it has one.
///
/// Returns `None` for `NoSymbol` and for every keysym outside Latin-1 other
/// than the TTY function keys.
pub fn keysym_to_char(keysym: u32) -> Option<char> {
    if keysym == NO_SYMBOL {
        return None;
    }
    if keysym & 0xFFFF_FF00 == 0 || TTY_FUNCTION_KEYS.contains(&keysym) {
        return Some(char::from((keysym & 0xFF) as u8));
    }
    None
}

/// Returns the keysymdef.h name (without the `XK_` prefix) of the keysyms
/// this crate injects or inspects.
pub fn keysym_name(keysym: u32) -> Option<&'static str> {
    KEYSYM_NAMES
        .iter()
        .find(|(_, value)| *value == keysym)
        .map(|(name, _)| *name)
}

const KEYSYM_NAMES: &[(&str, u32)] = &[
    ("percent", XK_PERCENT),
    ("grave", XK_GRAVE),
    ("a", XK_A_LOWER),
    ("b", XK_B_LOWER),
    ("d", XK_D_LOWER),
    ("e", XK_E_LOWER),
    ("f", XK_F_LOWER),
    ("g", XK_G_LOWER),
    ("h", XK_H_LOWER),
    ("p", XK_P_LOWER),
    ("q", XK_Q_LOWER),
    ("r", XK_R_LOWER),
    ("s", XK_S_LOWER),
    ("t", XK_T_LOWER),
    ("v", XK_V_LOWER),
    ("w", XK_W_LOWER),
    ("x", XK_X_LOWER),
    ("z", XK_Z_LOWER),
    ("BackSpace", XK_BACKSPACE),
    ("Tab", XK_TAB),
    ("Clear", XK_CLEAR),
    ("Return", XK_RETURN),
    ("Pause", XK_PAUSE),
    ("Scroll_Lock", XK_SCROLL_LOCK),
    ("Escape", XK_ESCAPE),
    ("Delete", XK_DELETE),
    ("Shift_L", XK_SHIFT_L),
    ("Shift_R", XK_SHIFT_R),
    ("Control_L", XK_CONTROL_L),
    ("Control_R", XK_CONTROL_R),
    ("Alt_L", XK_ALT_L),
    ("Super_L", XK_SUPER_L),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin1_letters_map_to_themselves() {
        assert_eq!(keysym_to_char(XK_A_LOWER), Some('a'));
        assert_eq!(keysym_to_char(XK_Z_LOWER), Some('z'));
        assert_eq!(keysym_to_char(XK_PERCENT), Some('%'));
    }

    #[test]
    fn test_upper_latin1_maps_to_accented_character() {
        // XK_eacute
        assert_eq!(keysym_to_char(0x00E9), Some('é'));
    }

    #[test]
    fn test_tty_function_keys_map_to_control_characters() {
        assert_eq!(keysym_to_char(XK_ESCAPE), Some('\u{1b}'));
        assert_eq!(keysym_to_char(XK_RETURN), Some('\r'));
    }

    #[test]
    fn test_delete_resolves_to_its_low_byte() {
        // Act
        let delete = keysym_to_char(XK_DELETE);

        // Assert – XK_Delete is 0xFFFF, so its label is the same as ydiaeresis (0x00FF)
        assert_eq!(delete, Some('\u{ff}'));
        assert_eq!(delete, keysym_to_char(0x00FF));
    }

    #[test]
    fn test_modifiers_and_no_symbol_have_no_character() {
        for keysym in [NO_SYMBOL, XK_SHIFT_L, XK_SHIFT_R, XK_CONTROL_L, XK_ALT_L, XK_SUPER_L] {
            assert_eq!(keysym_to_char(keysym), None, "keysym 0x{keysym:04X}");
        }
    }

    #[test]
    fn test_non_latin_keysym_has_no_character() {
        // XK_F1 and a Cyrillic keysym
        assert_eq!(keysym_to_char(0xFFBE), None);
        assert_eq!(keysym_to_char(0x06C1), None);
    }

    #[test]
    fn test_name_table_has_unique_values() {
        for (name, value) in KEYSYM_NAMES {
            assert_eq!(keysym_name(*value), Some(*name));
        }
        assert_eq!(keysym_name(0xFFBE), None);
    }
}
