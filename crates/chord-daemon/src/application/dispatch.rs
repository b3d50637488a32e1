//! ChordDispatcher: the normal-mode dispatch loop.
//!
//! Every raw event is fed to the [`ChordAccumulator`].  When the chord
//! closes, the dispatcher decides what it meant:
//!
//! 1. More than one resolved key: paste a synthesized style.  The chord is
//!    consumed even when the style turns out degenerate.
//! 2. Exactly one resolved key: run its binding, if it has one.
//! 3. Otherwise (no resolved key, or an unbound single key): replay every
//!    logged event to the drawing application.
//!
//! Per-chord state is reset before any of this runs, so a failing replay or
//! injection never leaks events into the next chord.

use std::sync::Arc;

use chord_core::{Chord, ChordAccumulator, ChordStatus, RawEvent};
use thiserror::Error;
use tracing::debug;

use super::actions::{Action, ActionTable};
use super::paste_style::{PasteError, StylePaster};
use super::replay::{replay, DisplayConnection, DisplayError};

/// Error type for the dispatch loop.  Any error is fatal to the session.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("display error: {0}")]
    Display(#[from] DisplayError),
    #[error("paste failed: {0}")]
    Paste(#[from] PasteError),
}

/// How a completed chord was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChordResolution {
    /// Multi-key chord; `pasted` is `false` for a degenerate style.
    Styled { pasted: bool },
    /// Single-key chord with a binding.
    Action(Action),
    /// Unclaimed chord, replayed verbatim.
    Replayed { events: usize },
}

impl ChordResolution {
    /// `true` when the original events were suppressed.
    pub fn handled(&self) -> bool {
        !matches!(self, ChordResolution::Replayed { .. })
    }
}

/// The dispatch loop state machine.  One instance per session; it owns the
/// pressed set and event log exclusively.
pub struct ChordDispatcher {
    accumulator: ChordAccumulator,
    actions: ActionTable,
    paster: StylePaster,
    display: Arc<dyn DisplayConnection>,
}

impl ChordDispatcher {
    pub fn new(actions: ActionTable, paster: StylePaster, display: Arc<dyn DisplayConnection>) -> Self {
        Self {
            accumulator: ChordAccumulator::new(),
            actions,
            paster,
            display,
        }
    }

    /// Handles one raw event.
    ///
    /// Returns `Some` when the event closed a chord.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError`] if replaying, injecting, or pasting fails.
    pub fn handle(&mut self, event: RawEvent) -> Result<Option<ChordResolution>, DispatchError> {
        if self.accumulator.on_event(event) == ChordStatus::Open {
            return Ok(None);
        }
        let chord = self.accumulator.take();
        let resolution = self.resolve(chord)?;
        debug!(?resolution, handled = resolution.handled(), "chord resolved");
        Ok(Some(resolution))
    }

    /// `true` when no chord is open.
    pub fn is_idle(&self) -> bool {
        self.accumulator.is_empty()
    }

    fn resolve(&self, chord: Chord) -> Result<ChordResolution, DispatchError> {
        debug!(labels = ?chord.labels, events = chord.events.len(), "chord closed");
        if chord.cardinality() > 1 {
            let pasted = self.paster.paste(&chord.labels)?;
            return Ok(ChordResolution::Styled { pasted });
        }
        if let Some(label) = chord.single_label() {
            if let Some(action) = self.actions.act(label)? {
                return Ok(ChordResolution::Action(action));
            }
        }
        replay(self.display.as_ref(), &chord.events)?;
        Ok(ChordResolution::Replayed {
            events: chord.events.len(),
        })
    }
}
