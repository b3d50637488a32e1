//! Fire-and-forget child processes: the external editor and the mode saver.
//!
//! Both ports promise the dispatcher nothing, so failures are logged here
//! and never returned.  Each child is reaped on a short-lived thread so no
//! zombie outlives it.

use std::process::{Child, Command};
use std::thread;

use tracing::{error, info, warn};

use crate::application::actions::{EditorLauncher, Mode, ModeSaver};

/// Environment variable telling the editor which rendering was requested.
pub const PRECOMPILED_ENV: &str = "CHORD_DAEMON_PRECOMPILED";

/// Waits for `child` in the background and logs a non-zero exit.
fn reap(name: String, mut child: Child) {
    let spawned = thread::Builder::new()
        .name("chord-reaper".to_string())
        .spawn(move || match child.wait() {
            Ok(status) if status.success() => info!(command = %name, "child finished"),
            Ok(status) => warn!(command = %name, %status, "child failed"),
            Err(e) => error!(command = %name, error = %e, "cannot wait for child"),
        });
    if let Err(e) = spawned {
        error!(error = %e, "cannot spawn reaper thread");
    }
}

/// Opens the configured editor command.
pub struct CommandEditorLauncher {
    program: String,
    args: Vec<String>,
}

impl CommandEditorLauncher {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn command(&self, precompiled: bool) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .env(PRECOMPILED_ENV, if precompiled { "1" } else { "0" });
        command
    }
}

impl EditorLauncher for CommandEditorLauncher {
    fn open(&self, precompiled: bool) {
        match self.command(precompiled).spawn() {
            Ok(child) => reap(self.program.clone(), child),
            Err(e) => error!(command = %self.program, error = %e, "cannot launch editor"),
        }
    }
}

/// Runs the configured save command with the mode name as last argument.
/// Without a command, saving is logged and skipped.
pub struct CommandModeSaver {
    program: Option<String>,
}

impl CommandModeSaver {
    pub fn new(program: Option<String>) -> Self {
        Self { program }
    }
}

impl ModeSaver for CommandModeSaver {
    fn save(&self, mode: Mode) {
        let Some(program) = &self.program else {
            warn!(%mode, "no save command configured, skipping");
            return;
        };
        match Command::new(program).arg(mode.as_str()).spawn() {
            Ok(child) => reap(program.clone(), child),
            Err(e) => error!(command = %program, %mode, error = %e, "cannot run save command"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_command_carries_args_and_rendering_flag() {
        // Arrange
        let launcher =
            CommandEditorLauncher::new("x-terminal-emulator", vec!["-e".to_string(), "vim".to_string()]);

        // Act
        let command = launcher.command(true);

        // Assert
        assert_eq!(command.get_program(), "x-terminal-emulator");
        let args: Vec<_> = command.get_args().collect();
        assert_eq!(args, ["-e", "vim"]);
        let flag = command
            .get_envs()
            .find(|(key, _)| *key == PRECOMPILED_ENV)
            .and_then(|(_, value)| value);
        assert_eq!(flag, Some(std::ffi::OsStr::new("1")));
    }

    #[test]
    fn test_missing_editor_is_logged_not_returned() {
        let launcher = CommandEditorLauncher::new("chord-daemon-test-no-such-editor", Vec::new());

        // Must not panic.
        launcher.open(false);
    }

    #[test]
    fn test_saver_without_command_skips() {
        let saver = CommandModeSaver::new(None);

        saver.save(Mode::Style);
    }
}
