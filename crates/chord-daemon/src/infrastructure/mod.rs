//! Infrastructure layer for the chord daemon.
//!
//! Contains OS-facing adapters: the X11 key grab, the X11 display
//! connection, child-process collaborators (clipboard, editor, mode saver),
//! and file-system storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `chord_core`, but MUST NOT be imported by the `application` layer.

pub mod clipboard;
pub mod display;
pub mod input_capture;
pub mod launcher;
pub mod storage;
