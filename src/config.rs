//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/fontreg/fontreg.toml`
//! 3. Environment variables: `FONTREG_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use toml::{Table, Value};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::{expand_env_vars, DEFAULT_FONT_EXTENSIONS};
use crate::infrastructure::store::DEFAULT_NAMESPACE;
use crate::util::path::PathExt;

/// Per-user font directory used by Windows for per-user installs.
#[cfg(windows)]
const DEFAULT_FONT_ROOT_RAW: &str = r"%LOCALAPPDATA%\Microsoft\Windows\Fonts";

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub font_root: Option<PathBuf>,
    pub store_file: Option<PathBuf>,
    pub namespace: Option<String>,
    pub font_extensions: Option<Vec<String>>,
    pub editor: Option<String>,
}

/// Unified configuration for fontreg.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory whose fonts are managed
    pub font_root: PathBuf,
    /// TOML file backing the registration store
    pub store_file: PathBuf,
    /// Table path of the namespace root inside `store_file`
    pub namespace: String,
    /// Extensions treated as font files (case-insensitive)
    pub font_extensions: Vec<String>,
    /// Editor command (default: $EDITOR or "vim")
    pub editor: String,
}

impl Default for Settings {
    fn default() -> Self {
        // Try $EDITOR, fall back to vim
        let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".into());

        Self {
            font_root: default_font_root(),
            store_file: default_store_file(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            font_extensions: DEFAULT_FONT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            editor,
        }
    }
}

#[cfg(windows)]
fn default_font_root() -> PathBuf {
    PathBuf::from(expand_env_vars(DEFAULT_FONT_ROOT_RAW))
}

#[cfg(target_os = "macos")]
fn default_font_root() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().join("Library/Fonts"))
        .unwrap_or_else(|| PathBuf::from("~/Library/Fonts"))
}

#[cfg(not(any(windows, target_os = "macos")))]
fn default_font_root() -> PathBuf {
    BaseDirs::new()
        .map(|dirs| dirs.data_dir().join("fonts"))
        .unwrap_or_else(|| PathBuf::from("~/.local/share/fonts"))
}

fn default_store_file() -> PathBuf {
    ProjectDirs::from("", "", "fontreg")
        .map(|dirs| dirs.data_dir().join("registrations.toml"))
        .unwrap_or_else(|| PathBuf::from("~/.fontreg/registrations.toml"))
}

/// Get the XDG config directory for fontreg.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "fontreg").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("fontreg.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

impl Settings {
    /// The font root the core builds its tree from.
    pub fn font_root(&self) -> &Path {
        &self.font_root
    }

    /// Expand shell variables and tilde in path-like fields.
    ///
    /// Handles `~`, `$VAR`, `${VAR}` and `%VAR%` syntax.
    fn expand_paths(&mut self) {
        self.font_root = PathBuf::from(expand_env_vars(&self.font_root.to_string_lossy()));
        self.store_file = PathBuf::from(expand_env_vars(&self.store_file.to_string_lossy()));
        self.editor = expand_env_vars(&self.editor);
    }

    /// Make path fields absolute against `base` and fold `.`/`..` lexically.
    ///
    /// Tree node paths and store values derive from `font_root`, so it must
    /// be absolute and normalized before any tree is built.
    pub fn resolve_paths_under(&mut self, base: &Path) {
        self.font_root = self.font_root.resolve_under(base);
        self.store_file = self.store_file.resolve_under(base);
    }

    /// Replace the font root, e.g. from `--root`, resolving it like a configured one.
    pub fn override_font_root(&mut self, font_root: &Path) -> Result<(), ApplicationError> {
        self.font_root = PathBuf::from(expand_env_vars(&font_root.to_string_lossy()));
        self.resolve_paths_under(&current_dir()?);
        Ok(())
    }

    /// Overlay wins wherever it specifies a value; lists are replaced, not merged.
    fn apply(&self, overlay: &RawSettings) -> Self {
        Self {
            font_root: overlay
                .font_root
                .clone()
                .unwrap_or_else(|| self.font_root.clone()),
            store_file: overlay
                .store_file
                .clone()
                .unwrap_or_else(|| self.store_file.clone()),
            namespace: overlay
                .namespace
                .clone()
                .unwrap_or_else(|| self.namespace.clone()),
            font_extensions: overlay
                .font_extensions
                .clone()
                .unwrap_or_else(|| self.font_extensions.clone()),
            editor: overlay.editor.clone().unwrap_or_else(|| self.editor.clone()),
        }
    }

    /// Load settings with layered precedence from the global config location.
    pub fn load() -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref())
    }

    /// Load settings using `config_file` as the global layer.
    ///
    /// A missing file is not an error: defaults apply.
    pub fn load_from(config_file: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(path) = config_file {
            if path.exists() {
                debug!("loading config from {}", path.display());
                let raw = load_raw_settings(path)?;
                current = current.apply(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;

        // Expand ~ and $VAR in path-like fields
        current.expand_paths();
        current.resolve_paths_under(&current_dir()?);

        Ok(current)
    }

    /// Apply FONTREG_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("FONTREG")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("font_extensions")
                    .try_parsing(true),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("font_root") {
            settings.font_root = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("store_file") {
            settings.store_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("namespace") {
            settings.namespace = val;
        }
        if let Ok(val) = config.get::<Vec<String>>("font_extensions") {
            settings.font_extensions = val;
        }
        if let Ok(val) = config.get_string("editor") {
            settings.editor = val;
        }

        Ok(settings)
    }

    /// Persist a new font root into the global config file.
    pub fn save_font_root(font_root: &Path) -> Result<PathBuf, ApplicationError> {
        let path = global_config_path().ok_or_else(|| ApplicationError::Config {
            message: "cannot determine config directory".to_string(),
        })?;
        Self::save_font_root_to(&path, font_root)?;
        Ok(path)
    }

    /// Rewrite only the `font_root` key of `config_file`, creating it if needed.
    pub fn save_font_root_to(config_file: &Path, font_root: &Path) -> Result<(), ApplicationError> {
        let mut table = if config_file.exists() {
            let content = std::fs::read_to_string(config_file).map_err(|e| ApplicationError::Config {
                message: format!("read {}: {}", config_file.display(), e),
            })?;
            content.parse::<Table>().map_err(|e| ApplicationError::Config {
                message: format!("parse {}: {}", config_file.display(), e),
            })?
        } else {
            Table::new()
        };

        table.insert(
            "font_root".to_string(),
            Value::String(font_root.to_string_lossy().into_owned()),
        );

        let content = toml::to_string_pretty(&table).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })?;
        if let Some(parent) = config_file.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ApplicationError::Config {
                message: format!("create {}: {}", parent.display(), e),
            })?;
        }
        std::fs::write(config_file, content).map_err(|e| ApplicationError::Config {
            message: format!("write {}: {}", config_file.display(), e),
        })
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# fontreg configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/fontreg/fontreg.toml
#   Env:    FONTREG_* environment variables (explicit overrides)

# Directory whose font files are managed
# font_root = "~/.local/share/fonts"

# File backing the registration store
# store_file = "~/.local/share/fontreg/registrations.toml"

# Table inside store_file holding the registrations (dotted for nesting)
# namespace = "fonts"

# Extensions treated as font files (case-insensitive)
# font_extensions = ["ttf", "otf", "ttc"]

# Editor for `fontreg config edit`
# editor = "vim"
"#
        .to_string()
    }
}

fn current_dir() -> Result<PathBuf, ApplicationError> {
    std::env::current_dir().map_err(|e| ApplicationError::Config {
        message: format!("current directory: {e}"),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
