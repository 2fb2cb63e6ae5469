use std::path::{Component, Path, PathBuf};

pub trait PathExt {
    /// Absolute paths are kept; relative ones are joined onto `root`.
    fn resolve_under(&self, root: &Path) -> PathBuf;

    /// Path relative to `root` for display, or the path itself if unrelated.
    fn display_relative_to(&self, root: &Path) -> String;
}

impl PathExt for Path {
    fn resolve_under(&self, root: &Path) -> PathBuf {
        let joined = if self.is_absolute() {
            self.to_path_buf()
        } else {
            root.join(self)
        };
        normalize_lexically(&joined)
    }

    fn display_relative_to(&self, root: &Path) -> String {
        match pathdiff::diff_paths(self, root) {
            Some(rel) if rel.as_os_str().is_empty() => ".".to_string(),
            Some(rel) if !rel.starts_with("..") => normalize_path_separator(&rel.to_string_lossy()),
            _ => self.display().to_string(),
        }
    }
}

/// Drop `.` components and fold `..` without touching the filesystem.
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

// Helper function for cross-platform path comparison
pub fn normalize_path_separator(s: &str) -> String {
    s.replace('\\', "/")
}
