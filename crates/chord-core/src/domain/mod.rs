//! Domain entities with no OS dependencies.
//!
//! - **`event`** – [`event::RawEvent`], one captured key press or release.
//! - **`chord`** – [`chord::ChordAccumulator`], the per-chord pressed set and
//!   event log.

pub mod chord;
pub mod event;
