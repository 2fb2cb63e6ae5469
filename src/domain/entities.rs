//! Domain entities: registration naming, snapshots, font matching

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use itertools::Itertools;
use regex::{Captures, Regex};

use crate::domain::error::DomainError;

/// Suffix appended to every registration name this tool creates.
///
/// Names without it belong to the user or the OS and are never touched.
pub const REGISTRATION_SUFFIX: &str = " (custom)";

/// Extensions recognised as font files when nothing else is configured.
pub const DEFAULT_FONT_EXTENSIONS: [&str; 3] = ["ttf", "otf", "ttc"];

static DEFAULT_FONT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(ttf|otf|ttc)$").expect("static font pattern"));

static PERCENT_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%([A-Za-z_][A-Za-z0-9_()]*)%").expect("static %VAR% pattern")
});

/// Derive the registration name for a font file: `{stem} (custom)`.
pub fn registration_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{stem}{REGISTRATION_SUFFIX}")
}

/// True if `name` follows this tool's registration naming scheme.
pub fn is_own_registration(name: &str) -> bool {
    name.ends_with(REGISTRATION_SUFFIX)
}

/// One name -> path pair in the registration store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationEntry {
    pub name: String,
    pub path: PathBuf,
}

impl RegistrationEntry {
    /// Entry this tool would write for the given font file.
    pub fn for_font(path: &Path) -> Self {
        Self {
            name: registration_name(path),
            path: path.to_path_buf(),
        }
    }
}

/// Point-in-time, read-only view of the registration store.
///
/// Taken once per tree build so every node reflects the same state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationSnapshot {
    entries: BTreeMap<String, PathBuf>,
    paths: HashSet<PathBuf>,
}

impl RegistrationSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one entry. Later entries with the same name replace earlier ones.
    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        let name = name.into();
        let path = path.into();
        if let Some(previous) = self.entries.insert(name, path.clone()) {
            if !self.entries.values().any(|p| p == &previous) {
                self.paths.remove(&previous);
            }
        }
        self.paths.insert(path);
    }

    /// True if any entry, under any name, points at `path`.
    pub fn contains_path(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.entries.get(name).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Path)> {
        self.entries
            .iter()
            .map(|(name, path)| (name.as_str(), path.as_path()))
    }

    /// Entries created under this tool's naming scheme.
    pub fn own_entries(&self) -> impl Iterator<Item = RegistrationEntry> + '_ {
        self.iter()
            .filter(|(name, _)| is_own_registration(name))
            .map(|(name, path)| RegistrationEntry {
                name: name.to_string(),
                path: path.to_path_buf(),
            })
    }
}

impl<N: Into<String>, P: Into<PathBuf>> FromIterator<(N, P)> for RegistrationSnapshot {
    fn from_iter<I: IntoIterator<Item = (N, P)>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for (name, path) in iter {
            snapshot.insert(name, path);
        }
        snapshot
    }
}

/// Case-insensitive file-extension predicate for font files.
#[derive(Debug, Clone)]
pub struct FontMatcher {
    pattern: Regex,
}

impl Default for FontMatcher {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_FONT_PATTERN.clone(),
        }
    }
}

impl FontMatcher {
    /// Build a matcher for the given extensions (with or without leading dot).
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Result<Self, DomainError> {
        let alternatives = extensions
            .iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.'))
            .filter(|e| !e.is_empty())
            .map(regex::escape)
            .join("|");
        if alternatives.is_empty() {
            return Err(DomainError::InvalidFontPattern {
                pattern: String::new(),
                message: "no font extensions configured".to_string(),
            });
        }

        let pattern = format!(r"(?i)\.({alternatives})$");
        let regex = Regex::new(&pattern).map_err(|e| DomainError::InvalidFontPattern {
            pattern: pattern.clone(),
            message: e.to_string(),
        })?;
        Ok(Self { pattern: regex })
    }

    pub fn is_font_file(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| self.pattern.is_match(&name.to_string_lossy()))
            .unwrap_or(false)
    }
}

/// Expand environment variables in a path string.
///
/// Supports:
/// - `$VAR` and `${VAR}` syntax
/// - `~` for home directory
/// - `%VAR%` syntax, as found in Windows registry values
///
/// Unknown `%VAR%` references are left as written.
pub fn expand_env_vars(path: &str) -> String {
    let windows_expanded = PERCENT_VAR.replace_all(path, |caps: &Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });
    shellexpand::full(&windows_expanded)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| windows_expanded.into_owned())
}
