//! Clipboard publication through an external command.
//!
//! The payload is piped into `xclip -selection clipboard -target <target> -i`.
//! xclip forks a background process that serves the selection, so the
//! command's output streams are discarded rather than captured.

use std::io::Write;
use std::process::{Command, Stdio};

use tracing::debug;

use crate::application::paste_style::{Clipboard, ClipboardError};

/// [`Clipboard`] backed by an xclip-compatible command.
pub struct CommandClipboard {
    program: String,
}

impl CommandClipboard {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

/// Arguments selecting the clipboard selection and the payload's target.
fn xclip_args(target: &str) -> [&str; 5] {
    ["-selection", "clipboard", "-target", target, "-i"]
}

impl Clipboard for CommandClipboard {
    fn copy(&self, payload: &str, target: &str) -> Result<(), ClipboardError> {
        let mut child = Command::new(&self.program)
            .args(xclip_args(target))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ClipboardError::Spawn {
                command: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(payload.as_bytes())
                .map_err(ClipboardError::Write)?;
        }

        let status = child.wait().map_err(ClipboardError::Write)?;
        if !status.success() {
            return Err(ClipboardError::Exit {
                command: self.program.clone(),
                status: status.to_string(),
            });
        }

        debug!(target, bytes = payload.len(), "clipboard updated");
        Ok(())
    }
}
