//! Chord accumulation: the pressed set and event log of the open chord.
//!
//! A chord begins at the first press after the pressed set is empty and ends
//! when a release leaves the pressed set empty again.  Between those two
//! points every event is appended to the log so the chord can be replayed
//! verbatim if nothing claims it.  Non-key events arriving while idle belong
//! to no chord and are dropped.
//!
//! ```text
//!            press / other / release (set still non-empty)
//!              ┌──────────┐
//!              ▼          │
//!  ┌──────┐  press   ┌────┴─────┐  release, set empty  ┌────────┐
//!  │ idle │ ───────► │   open   │ ───────────────────► │ closed │ ──► take()
//!  └──────┘          └──────────┘                      └────────┘
//! ```
//!
//! Identity of a chord is the *union* of resolved labels seen while it was
//! open, not the live set at the instant of the last release.

use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use super::event::{EventKind, RawEvent};

/// Result of feeding one event to the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordStatus {
    /// Keys are still held; keep accumulating.
    Open,
    /// The last held key was released; call [`ChordAccumulator::take`].
    Closed,
}

/// A completed chord handed to the dispatcher.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Chord {
    /// Every resolved label pressed while the chord was open.
    pub labels: BTreeSet<String>,
    /// Every event of the chord in arrival order.
    pub events: Vec<RawEvent>,
}

impl Chord {
    /// Number of distinct resolved labels.
    pub fn cardinality(&self) -> usize {
        self.labels.len()
    }

    /// The only label of a single-key chord.
    pub fn single_label(&self) -> Option<&str> {
        if self.labels.len() == 1 {
            self.labels.iter().next().map(String::as_str)
        } else {
            None
        }
    }
}

/// Tracks the keys currently held and the ordered event log of one chord.
///
/// Held keys are keyed by keycode so that a release matches its press even
/// when the modifier state (and therefore the label) changed in between.
#[derive(Debug, Default)]
pub struct ChordAccumulator {
    held: BTreeMap<u32, String>,
    seen: BTreeSet<String>,
    events: Vec<RawEvent>,
}

impl ChordAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `event` and reports whether the chord is now complete.
    pub fn on_event(&mut self, event: RawEvent) -> ChordStatus {
        let status = match event.kind {
            EventKind::Press => {
                if event.resolved {
                    self.held.insert(event.keycode, event.label.clone());
                    self.seen.insert(event.label.clone());
                }
                ChordStatus::Open
            }
            EventKind::Release => {
                self.held.remove(&event.keycode);
                if self.held.is_empty() {
                    ChordStatus::Closed
                } else {
                    ChordStatus::Open
                }
            }
            EventKind::Other => {
                if self.is_empty() {
                    trace!("non-key event outside a chord, skipped");
                    return ChordStatus::Open;
                }
                ChordStatus::Open
            }
        };
        trace!(label = %event.label, kind = ?event.kind, ?status, "chord event");
        self.events.push(event);
        status
    }

    /// Hands over the accumulated chord and resets all per-chord state.
    pub fn take(&mut self) -> Chord {
        self.held.clear();
        Chord {
            labels: std::mem::take(&mut self.seen),
            events: std::mem::take(&mut self.events),
        }
    }

    /// `true` when no chord is in progress.
    pub fn is_empty(&self) -> bool {
        self.held.is_empty() && self.seen.is_empty() && self.events.is_empty()
    }

    /// Labels of the keys held right now.
    pub fn held_labels(&self) -> impl Iterator<Item = &str> {
        self.held.values().map(String::as_str)
    }

    /// Number of events logged for the open chord.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::linux_x11::{XK_A_LOWER, XK_D_LOWER, XK_G_LOWER, XK_SHIFT_L};
    use crate::keymap::ModifierMask;

    fn press(keycode: u32, keysym: u32, state: ModifierMask) -> RawEvent {
        RawEvent::key(EventKind::Press, keycode, keysym, state, 0)
    }

    fn release(keycode: u32, keysym: u32, state: ModifierMask) -> RawEvent {
        RawEvent::key(EventKind::Release, keycode, keysym, state, 0)
    }

    #[test]
    fn test_single_key_chord_closes_on_release() {
        // Arrange
        let mut acc = ChordAccumulator::new();

        // Act
        let first = acc.on_event(press(38, XK_A_LOWER, ModifierMask::NONE));
        let second = acc.on_event(release(38, XK_A_LOWER, ModifierMask::NONE));

        // Assert
        assert_eq!(first, ChordStatus::Open);
        assert_eq!(second, ChordStatus::Closed);
        let chord = acc.take();
        assert_eq!(chord.single_label(), Some("a"));
        assert_eq!(chord.events.len(), 2);
    }

    #[test]
    fn test_chord_identity_is_union_of_pressed_labels() {
        // Arrange
        let mut acc = ChordAccumulator::new();

        // Act – press a, press d, release a, press g, release d, release g
        acc.on_event(press(38, XK_A_LOWER, ModifierMask::NONE));
        acc.on_event(press(40, XK_D_LOWER, ModifierMask::NONE));
        assert_eq!(acc.on_event(release(38, XK_A_LOWER, ModifierMask::NONE)), ChordStatus::Open);
        acc.on_event(press(42, XK_G_LOWER, ModifierMask::NONE));
        assert_eq!(acc.on_event(release(40, XK_D_LOWER, ModifierMask::NONE)), ChordStatus::Open);
        let status = acc.on_event(release(42, XK_G_LOWER, ModifierMask::NONE));

        // Assert
        assert_eq!(status, ChordStatus::Closed);
        let chord = acc.take();
        let labels: Vec<&str> = chord.labels.iter().map(String::as_str).collect();
        assert_eq!(labels, vec!["a", "d", "g"]);
        assert_eq!(chord.events.len(), 6);
    }

    #[test]
    fn test_unresolved_press_is_logged_but_not_part_of_identity() {
        let mut acc = ChordAccumulator::new();

        acc.on_event(press(50, XK_SHIFT_L, ModifierMask::NONE));
        let status = acc.on_event(release(50, XK_SHIFT_L, ModifierMask::SHIFT));

        assert_eq!(status, ChordStatus::Closed);
        let chord = acc.take();
        assert_eq!(chord.cardinality(), 0);
        assert_eq!(chord.events.len(), 2);
    }

    #[test]
    fn test_release_matches_press_by_keycode_when_label_changes() {
        // Arrange – 'a' pressed without modifiers, Shift pressed afterwards
        let mut acc = ChordAccumulator::new();
        acc.on_event(press(38, XK_A_LOWER, ModifierMask::NONE));
        acc.on_event(press(50, XK_SHIFT_L, ModifierMask::NONE));

        // Act – 'a' released while Shift is down, so its label is "Shift+a"
        let status = acc.on_event(release(38, XK_A_LOWER, ModifierMask::SHIFT));

        // Assert
        assert_eq!(status, ChordStatus::Closed);
        assert_eq!(acc.take().single_label(), Some("a"));
    }

    #[test]
    fn test_shift_prefixed_key_keeps_prefixed_label() {
        let mut acc = ChordAccumulator::new();

        acc.on_event(press(50, XK_SHIFT_L, ModifierMask::NONE));
        acc.on_event(press(38, XK_A_LOWER, ModifierMask::SHIFT));
        let status = acc.on_event(release(38, XK_A_LOWER, ModifierMask::SHIFT));

        assert_eq!(status, ChordStatus::Closed);
        assert_eq!(acc.take().single_label(), Some("Shift+a"));
    }

    #[test]
    fn test_other_events_are_logged_without_changing_status() {
        let mut acc = ChordAccumulator::new();
        acc.on_event(press(38, XK_A_LOWER, ModifierMask::NONE));

        let status = acc.on_event(RawEvent::other(3));

        assert_eq!(status, ChordStatus::Open);
        assert_eq!(acc.pending_events(), 2);
        assert_eq!(acc.held_labels().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_other_event_while_idle_does_not_leak_into_next_chord() {
        // Arrange
        let mut acc = ChordAccumulator::new();

        // Act
        let status = acc.on_event(RawEvent::other(1));
        assert!(acc.is_empty());
        acc.on_event(press(38, XK_A_LOWER, ModifierMask::NONE));
        let closed = acc.on_event(release(38, XK_A_LOWER, ModifierMask::NONE));

        // Assert
        assert_eq!(status, ChordStatus::Open);
        assert_eq!(closed, ChordStatus::Closed);
        let chord = acc.take();
        assert_eq!(chord.single_label(), Some("a"));
        assert_eq!(chord.events.len(), 2);
    }

    #[test]
    fn test_take_resets_all_state() {
        // Arrange
        let mut acc = ChordAccumulator::new();
        acc.on_event(press(38, XK_A_LOWER, ModifierMask::NONE));
        acc.on_event(release(38, XK_A_LOWER, ModifierMask::NONE));

        // Act
        let _ = acc.take();

        // Assert
        assert!(acc.is_empty());
        assert_eq!(acc.pending_events(), 0);

        // A following chord is unaffected by the previous one.
        acc.on_event(press(42, XK_G_LOWER, ModifierMask::NONE));
        acc.on_event(release(42, XK_G_LOWER, ModifierMask::NONE));
        let chord = acc.take();
        assert_eq!(chord.single_label(), Some("g"));
        assert_eq!(chord.events.len(), 2);
    }

    #[test]
    fn test_stray_release_closes_an_empty_chord() {
        let mut acc = ChordAccumulator::new();

        let status = acc.on_event(release(50, XK_SHIFT_L, ModifierMask::SHIFT));

        assert_eq!(status, ChordStatus::Closed);
        let chord = acc.take();
        assert_eq!(chord.cardinality(), 0);
        assert_eq!(chord.events.len(), 1);
    }
}
