//! TOML-based configuration for the chord daemon.
//!
//! Reads `AppConfig` from `$XDG_CONFIG_HOME/chord-daemon/config.toml`
//! (`~/.config/chord-daemon/config.toml` when `XDG_CONFIG_HOME` is unset),
//! or from an explicit path given on the command line.
//!
//! ```toml
//! [general]
//! log_level = "debug"
//!
//! [style]
//! unit = 1.327
//! thick_width = 0.8
//!
//! [clipboard]
//! command = "xclip"
//! ```
//!
//! Every field has a serde default, so a missing file, a missing section,
//! or a missing field all fall back to the built-in values.

use std::path::{Path, PathBuf};

use chord_core::StyleMetrics;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The XDG config directory could not be determined.
    #[error("could not determine config directory (neither XDG_CONFIG_HOME nor HOME is set)")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    /// Stroke width metrics used by the style synthesizer.
    #[serde(default)]
    pub style: StyleMetrics,
    #[serde(default)]
    pub clipboard: ClipboardConfig,
    #[serde(default)]
    pub editor: EditorConfig,
    #[serde(default)]
    pub modes: ModesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// Schema version string – bump when breaking changes are introduced.
    #[serde(default = "default_version")]
    pub version: String,
    /// `tracing` log level: `"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"`.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Which X display and window to attach to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DisplayConfig {
    /// Display name such as `":0"`; `$DISPLAY` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// X window id of the drawing application; the window focused at
    /// start-up when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_window: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClipboardConfig {
    /// xclip-compatible command receiving the style document on stdin.
    #[serde(default = "default_clipboard_command")]
    pub command: String,
    /// Selection target the drawing application pastes styles from.
    #[serde(default = "default_clipboard_target")]
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditorConfig {
    #[serde(default = "default_editor_command")]
    pub command: String,
    #[serde(default = "default_editor_args")]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModesConfig {
    /// Command run with the mode name as argument when a mode is saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_command: Option<String>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_version() -> String {
    "1.0".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_clipboard_command() -> String {
    "xclip".to_string()
}
fn default_clipboard_target() -> String {
    "image/x-inkscape-svg".to_string()
}
fn default_editor_command() -> String {
    "x-terminal-emulator".to_string()
}
fn default_editor_args() -> Vec<String> {
    vec!["-e".to_string(), "vim".to_string()]
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            log_level: default_log_level(),
        }
    }
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        Self {
            command: default_clipboard_command(),
            target: default_clipboard_target(),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            command: default_editor_command(),
            args: default_editor_args(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the directory holding the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when neither
/// `XDG_CONFIG_HOME` nor `HOME` is set.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok_or(ConfigError::NoPlatformConfigDir)?;
    Ok(base.join("chord-daemon"))
}

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot
/// be determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from `path`, or from [`config_file_path`] when `None`.
/// Returns `AppConfig::default()` if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => config_file_path()?,
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => {
            let cfg: AppConfig = toml::from_str(&content)?;
            Ok(cfg)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("chord_daemon_{name}_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    // ── AppConfig defaults ────────────────────────────────────────────────────

    #[test]
    fn test_app_config_default_collaborators() {
        // Arrange / Act
        let cfg = AppConfig::default();

        // Assert
        assert_eq!(cfg.clipboard.command, "xclip");
        assert_eq!(cfg.clipboard.target, "image/x-inkscape-svg");
        assert_eq!(cfg.editor.command, "x-terminal-emulator");
        assert_eq!(cfg.editor.args, vec!["-e", "vim"]);
        assert_eq!(cfg.modes.save_command, None);
    }

    #[test]
    fn test_app_config_default_style_metrics() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.style, StyleMetrics::default());
        assert_eq!(cfg.style.unit, 1.327);
    }

    #[test]
    fn test_general_config_default_log_level_is_info() {
        let cfg = GeneralConfig::default();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.version, "1.0");
    }

    #[test]
    fn test_display_defaults_follow_environment() {
        let cfg = DisplayConfig::default();
        assert_eq!(cfg.name, None);
        assert_eq!(cfg.target_window, None);
    }

    // ── TOML parsing ──────────────────────────────────────────────────────────

    #[test]
    fn test_deserialize_empty_toml_uses_defaults() {
        // Act
        let cfg: AppConfig = toml::from_str("").expect("deserialize empty");

        // Assert
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_deserialize_partial_style_overrides_defaults() {
        // Arrange
        let toml_str = r#"
[style]
thick_width = 0.8

[display]
name = ":1"
target_window = 41943041
"#;

        // Act
        let cfg: AppConfig = toml::from_str(toml_str).expect("deserialize partial");

        // Assert
        assert_eq!(cfg.style.thick_width, 0.8);
        // Unspecified fields keep their defaults
        assert_eq!(cfg.style.base_width, 0.4);
        assert_eq!(cfg.display.name.as_deref(), Some(":1"));
        assert_eq!(cfg.display.target_window, Some(0x0280_0001));
    }

    #[test]
    fn test_unset_options_are_omitted_from_toml() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).expect("serialize");

        assert!(!toml_str.contains("target_window"));
        assert!(!toml_str.contains("save_command"));
        assert!(toml_str.contains("[clipboard]"));
    }

    #[test]
    fn test_deserialize_invalid_toml_returns_parse_error() {
        let result: Result<AppConfig, toml::de::Error> = toml::from_str("[[[ not valid toml");
        assert!(result.is_err());
    }

    // ── load / save ───────────────────────────────────────────────────────────

    #[test]
    fn test_load_config_returns_default_when_file_absent() {
        // Arrange
        let path = PathBuf::from("/nonexistent/path/that/cannot/exist/config.toml");

        // Act
        let cfg = load_config(Some(&path)).expect("missing file is not an error");

        // Assert
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn test_load_config_reports_parse_error() {
        let dir = scratch_dir("parse_error");
        let path = dir.join("config.toml");
        std::fs::write(&path, "[style\nunit = ").unwrap();

        let result = load_config(Some(&path));

        assert!(matches!(result, Err(ConfigError::Parse(_))));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_and_load_config_round_trip() {
        // Arrange
        let dir = scratch_dir("round_trip");
        let path = dir.join("nested").join("config.toml");
        let mut cfg = AppConfig::default();
        cfg.general.log_level = "debug".to_string();
        cfg.modes.save_command = Some("chord-save".to_string());

        // Act
        save_config(&cfg, &path).expect("save");
        let loaded = load_config(Some(&path)).expect("load");

        // Assert
        assert_eq!(loaded, cfg);

        // Cleanup
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_config_file_path_ends_with_config_toml() {
        if let Ok(path) = config_file_path() {
            assert!(
                path.ends_with("chord-daemon/config.toml"),
                "unexpected config path {path:?}"
            );
        }
        // NoPlatformConfigDir in a stripped environment is also acceptable.
    }
}
