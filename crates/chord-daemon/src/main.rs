//! Chord daemon entry point.
//!
//! Wires the X11 key grab, the X11 display connection, and the child-process
//! collaborators into a `Session`, then feeds captured events to it on a
//! blocking worker until Ctrl-C.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load config, init logging
//!  └─ X11Display::connect()        -- selects the controlled window
//!  └─ X11InputSource::start()      -- key grab thread -> mpsc channel
//!  └─ spawn_blocking(Session::run) -- chord dispatch, replay, paste
//! ```

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use chord_daemon::infrastructure::storage::config::{
    config_file_path, load_config, save_config, AppConfig,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Key-chord recognition and selective replay for a vector drawing
/// application running under X11.
#[derive(Debug, Parser)]
#[command(name = "chord-daemon", version)]
struct Cli {
    /// Path of the TOML configuration file.
    ///
    /// Defaults to `$XDG_CONFIG_HOME/chord-daemon/config.toml`.
    #[arg(long, env = "CHORD_DAEMON_CONFIG")]
    config: Option<PathBuf>,

    /// Log level used when `RUST_LOG` is unset; overrides the config file.
    #[arg(long, env = "CHORD_DAEMON_LOG_LEVEL")]
    log_level: Option<String>,

    /// Write the effective configuration to the config path and exit.
    #[arg(long)]
    init_config: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("failed to load configuration")?;

    // `RUST_LOG` wins; otherwise the CLI flag, then the config file.
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.general.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();

    if cli.init_config {
        let path = match cli.config {
            Some(path) => path,
            None => config_file_path().context("no config path")?,
        };
        save_config(&config, &path)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        info!(path = %path.display(), "configuration written");
        return Ok(());
    }

    config.style.validate().context("invalid [style] section")?;

    info!("chord daemon starting");

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    let result = run(config, running).await;
    if let Err(e) = &result {
        error!("session ended: {e:#}");
    }
    info!("chord daemon stopped");
    result
}

#[cfg(target_os = "linux")]
async fn run(config: AppConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    use chord_daemon::application::actions::{ActionTable, EditorLauncher, ModeSaver};
    use chord_daemon::application::dispatch::ChordDispatcher;
    use chord_daemon::application::paste_style::{Clipboard, StylePaster};
    use chord_daemon::application::replay::DisplayConnection;
    use chord_daemon::application::session::Session;
    use chord_daemon::infrastructure::clipboard::CommandClipboard;
    use chord_daemon::infrastructure::display::x11::X11Display;
    use chord_daemon::infrastructure::input_capture::{x11::X11InputSource, InputSource};
    use chord_daemon::infrastructure::launcher::{CommandEditorLauncher, CommandModeSaver};

    let display = Arc::new(
        X11Display::connect(config.display.name.as_deref(), config.display.target_window)
            .context("failed to connect to the X display")?,
    );
    let source = X11InputSource::new(config.display.name.clone(), display.window());

    let display_port: Arc<dyn DisplayConnection> = display;
    let editor: Arc<dyn EditorLauncher> = Arc::new(CommandEditorLauncher::new(
        config.editor.command.clone(),
        config.editor.args.clone(),
    ));
    let mode_saver: Arc<dyn ModeSaver> =
        Arc::new(CommandModeSaver::new(config.modes.save_command.clone()));
    let clipboard: Arc<dyn Clipboard> =
        Arc::new(CommandClipboard::new(config.clipboard.command.clone()));

    let actions = ActionTable::new(Arc::clone(&display_port), editor, mode_saver);
    let paster = StylePaster::new(
        config.style,
        config.clipboard.target.clone(),
        clipboard,
        Arc::clone(&display_port),
    );
    let dispatcher = ChordDispatcher::new(actions, paster, Arc::clone(&display_port));
    let mut session = Session::new(dispatcher, display_port);

    // Xlib calls block, so the session runs outside the async executor.
    tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
        let events = source.start().context("failed to grab keys")?;
        info!("chord daemon ready.  Press Ctrl-C to exit.");
        let result = session.run(&events, &running);
        source.stop();
        result.context("event dispatch failed")
    })
    .await
    .context("session worker panicked")?
}

#[cfg(not(target_os = "linux"))]
async fn run(_config: AppConfig, _running: Arc<AtomicBool>) -> anyhow::Result<()> {
    anyhow::bail!("chord-daemon needs an X11 display and only runs on Linux")
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        // Arrange: parse with no arguments
        let cli = Cli::parse_from(["chord-daemon"]);

        // Assert
        assert!(!cli.init_config);
        assert_eq!(cli.log_level, None);
    }

    #[test]
    fn test_cli_accepts_config_path() {
        let cli = Cli::parse_from(["chord-daemon", "--config", "/tmp/chord.toml", "--init-config"]);

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/chord.toml")));
        assert!(cli.init_config);
    }
}
