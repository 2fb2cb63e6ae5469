//! TOML-file-backed registration store
//!
//! Registrations live under a namespace table, e.g. `[fonts]`. Nested tables
//! below the namespace are read by `snapshot()` but never written: this tool
//! only inserts and deletes plain `name = "path"` pairs at the namespace root.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use toml::{Table, Value};
use tracing::{debug, instrument, trace};

use crate::domain::{expand_env_vars, RegistrationSnapshot};
use crate::infrastructure::traits::RegistrationStore;
use crate::infrastructure::{InfraError, InfraResult};

/// Default namespace root inside the store file.
pub const DEFAULT_NAMESPACE: &str = "fonts";

#[derive(Debug, Clone)]
pub struct TomlRegistrationStore {
    path: PathBuf,
    namespace: Vec<String>,
}

impl TomlRegistrationStore {
    /// `namespace` is a dotted table path such as `fonts` or `user.fonts`.
    pub fn new(path: impl Into<PathBuf>, namespace: &str) -> Self {
        let namespace = namespace
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        Self {
            path: path.into(),
            namespace,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> InfraResult<Option<Table>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| InfraError::io(format!("read {}", self.path.display()), e))?;
        let table = content
            .parse::<Table>()
            .map_err(|e| InfraError::store(format!("parse {}", self.path.display()), e.to_string()))?;
        Ok(Some(table))
    }

    fn save(&self, table: &Table) -> InfraResult<()> {
        let content = toml::to_string_pretty(table)
            .map_err(|e| InfraError::store("serialize", e.to_string()))?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)
            .map_err(|e| InfraError::io(format!("create {}", dir.display()), e))?;

        let mut tmp = NamedTempFile::new_in(&dir)
            .map_err(|e| InfraError::io(format!("create temp file in {}", dir.display()), e))?;
        tmp.write_all(content.as_bytes())
            .map_err(|e| InfraError::io("write temp file", e))?;
        tmp.persist(&self.path)
            .map_err(|e| InfraError::io(format!("replace {}", self.path.display()), e.error))?;
        Ok(())
    }

    fn namespace_table<'a>(&self, root: &'a Table) -> Option<&'a Table> {
        self.namespace
            .iter()
            .try_fold(root, |table, key| table.get(key).and_then(Value::as_table))
    }

    fn namespace_table_mut<'a>(&self, root: &'a mut Table) -> InfraResult<&'a mut Table> {
        let mut table = root;
        for key in &self.namespace {
            table = table
                .entry(key.clone())
                .or_insert_with(|| Value::Table(Table::new()))
                .as_table_mut()
                .ok_or_else(|| {
                    InfraError::store(
                        format!("namespace '{}'", self.namespace.join(".")),
                        format!("'{key}' is not a table"),
                    )
                })?;
        }
        Ok(table)
    }
}

/// Collect string values at this level, then descend into sub-tables.
fn collect_entries(table: &Table, snapshot: &mut RegistrationSnapshot) {
    for (name, value) in table {
        if let Value::String(path) = value {
            if !path.is_empty() {
                snapshot.insert(name.clone(), expand_env_vars(path));
            }
        }
    }
    for value in table.values() {
        if let Value::Table(sub) = value {
            collect_entries(sub, snapshot);
        }
    }
}

impl RegistrationStore for TomlRegistrationStore {
    #[instrument(level = "debug", skip(self), fields(store = %self.path.display()))]
    fn snapshot(&self) -> InfraResult<RegistrationSnapshot> {
        let mut snapshot = RegistrationSnapshot::new();
        if let Some(root) = self.load()? {
            if let Some(table) = self.namespace_table(&root) {
                collect_entries(table, &mut snapshot);
            }
        }
        debug!("snapshot: {} registrations", snapshot.len());
        Ok(snapshot)
    }

    fn insert(&self, name: &str, path: &Path) -> InfraResult<()> {
        trace!("insert: {} -> {}", name, path.display());
        let mut root = self.load()?.unwrap_or_default();
        let table = self.namespace_table_mut(&mut root)?;
        table.insert(
            name.to_string(),
            Value::String(path.to_string_lossy().into_owned()),
        );
        self.save(&root)
    }

    fn delete(&self, name: &str) -> InfraResult<()> {
        trace!("delete: {}", name);
        let Some(mut root) = self.load()? else {
            return Ok(());
        };
        if self.namespace_table(&root).is_none() {
            return Ok(());
        }
        let table = self.namespace_table_mut(&mut root)?;
        if table.remove(name).is_some() {
            self.save(&root)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn given_missing_file_when_snapshotting_then_empty() {
        let temp = TempDir::new().unwrap();
        let store = TomlRegistrationStore::new(temp.path().join("none.toml"), DEFAULT_NAMESPACE);
        assert!(store.snapshot().unwrap().is_empty());
    }

    #[test]
    fn given_nested_tables_when_snapshotting_then_reads_recursively() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("reg.toml");
        std::fs::write(
            &file,
            r#"
[fonts]
"Arial" = "/sys/arial.ttf"
"blank" = ""
"count" = 3

[fonts.vendor]
"Vendor Sans" = "/opt/vendor.otf"

[other]
"ignored" = "/nowhere.ttf"
"#,
        )
        .unwrap();
        let store = TomlRegistrationStore::new(&file, "fonts");

        let snapshot = store.snapshot().unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("Vendor Sans"), Some(Path::new("/opt/vendor.otf")));
        assert!(snapshot.get("ignored").is_none());
        assert!(snapshot.get("blank").is_none());
    }

    #[test]
    fn given_insert_then_delete_when_snapshotting_then_entry_gone_others_kept() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("sub/reg.toml");
        std::fs::create_dir_all(file.parent().unwrap()).unwrap();
        std::fs::write(&file, "[fonts]\n\"Arial\" = \"/sys/arial.ttf\"\n").unwrap();
        let store = TomlRegistrationStore::new(&file, "fonts");

        store.insert("f1 (custom)", Path::new("/F/f1.ttf")).unwrap();
        assert_eq!(
            store.snapshot().unwrap().get("f1 (custom)"),
            Some(Path::new("/F/f1.ttf"))
        );

        store.delete("f1 (custom)").unwrap();
        store.delete("never-there (custom)").unwrap();
        let snapshot = store.snapshot().unwrap();
        assert!(snapshot.get("f1 (custom)").is_none());
        assert_eq!(snapshot.get("Arial"), Some(Path::new("/sys/arial.ttf")));
    }

    #[test]
    fn given_dotted_namespace_when_inserting_then_creates_nested_tables() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("reg.toml");
        let store = TomlRegistrationStore::new(&file, "user.fonts");

        store.insert("a (custom)", Path::new("/F/a.ttf")).unwrap();

        let raw: Table = std::fs::read_to_string(&file).unwrap().parse().unwrap();
        assert!(raw["user"]["fonts"].get("a (custom)").is_some());
    }

    #[test]
    fn given_namespace_is_not_table_when_inserting_then_errors() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("reg.toml");
        std::fs::write(&file, "fonts = \"oops\"\n").unwrap();
        let store = TomlRegistrationStore::new(&file, "fonts");

        let result = store.insert("a (custom)", Path::new("/F/a.ttf"));
        assert!(matches!(result, Err(InfraError::Store { .. })));
    }
}
