//! Application layer use cases for the chord daemon.
//!
//! Use cases in this layer orchestrate the pure `chord-core` types and talk
//! to the outside world only through traits (ports) that the infrastructure
//! layer implements.  Nothing here opens a display, spawns a process, or
//! touches the file system.
//!
//! # Sub-modules
//!
//! - **`replay`**      – The [`replay::DisplayConnection`] port and the replay
//!   engine that re-emits an unclaimed chord to the drawing application.
//!
//! - **`actions`**     – The fixed single-key binding table and the modes it
//!   switches between.
//!
//! - **`paste_style`** – Synthesizes a style from a multi-key chord, puts it
//!   on the clipboard, and triggers the paste.
//!
//! - **`dispatch`**    – The dispatch loop run in normal mode.  This is the
//!   critical path: it runs on every key event.
//!
//! - **`session`**     – Owns the mode slot and routes events either to the
//!   dispatch loop or to the handler of the active mode.

pub mod actions;
pub mod dispatch;
pub mod paste_style;
pub mod replay;
pub mod session;
