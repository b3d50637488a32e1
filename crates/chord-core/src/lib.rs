//! # chord-core
//!
//! Shared library for the chord daemon containing the chord accumulator,
//! key label resolution, and the style synthesizer.
//!
//! This crate has zero dependencies on OS APIs, display connections, or
//! child processes.  Everything in here is a pure function of its inputs,
//! which keeps the interesting logic testable without an X server.
//!
//! # Architecture overview
//!
//! The chord daemon sits between the X11 event source and a vector drawing
//! application.  It watches every key press and release, and only when all
//! keys are released does it decide what the completed *chord* meant:
//!
//! - **`domain`** – The raw event type and the [`ChordAccumulator`], which
//!   tracks the keys currently held and logs every event of the open chord so
//!   it can be replayed verbatim when nothing claims it.
//!
//! - **`keymap`** – Modifier masks, X11 keysym tables, and the label resolver
//!   that turns `(keysym, modifier state)` into strings like `"Shift+a"`.
//!
//! - **`style`** – The ordered rule table that derives a drawing style
//!   (stroke, fill, markers, dash pattern) from the set of keys in a chord,
//!   plus the SVG clipboard payload the drawing application pastes.

pub mod domain;
pub mod keymap;
pub mod style;

pub use domain::chord::{Chord, ChordAccumulator, ChordStatus};
pub use domain::event::{EventKind, RawEvent};
pub use keymap::{resolve_label, Keystroke, ModifierMask};
pub use style::{synthesize, StyleDescriptor, StyleMetrics, StyleProperty, StyleValue};
