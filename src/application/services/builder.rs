//! Font tree builder
//!
//! Walks a font root and annotates every font file with its registration
//! status, taken from one snapshot of the store.

use std::path::Path;
use std::sync::Arc;

use generational_arena::Index;
use tracing::{debug, instrument, trace};

use crate::application::{ApplicationResult, IoResultExt};
use crate::domain::{DomainError, FontMatcher, FontTree, NodeData, RegistrationSnapshot};
use crate::infrastructure::traits::FileSystem;

/// Constructs a `FontTree` from a directory root.
pub struct FontTreeBuilder {
    fs: Arc<dyn FileSystem>,
    matcher: FontMatcher,
}

impl FontTreeBuilder {
    pub fn new(fs: Arc<dyn FileSystem>, matcher: FontMatcher) -> Self {
        Self { fs, matcher }
    }

    /// Build the tree below `root`.
    ///
    /// Fails with `RootNotFound` if `root` is not an existing directory. Any
    /// enumeration error aborts the build; no partial tree is returned.
    #[instrument(level = "debug", skip(self, snapshot))]
    pub fn build(&self, root: &Path, snapshot: &RegistrationSnapshot) -> ApplicationResult<FontTree> {
        if !self.fs.exists(root) || !self.fs.is_dir(root) {
            return Err(DomainError::RootNotFound(root.to_path_buf()).into());
        }

        let mut tree = FontTree::new();
        self.build_directory(&mut tree, root, None, snapshot)?;

        debug!(
            "build: {} nodes, {} fonts checked",
            tree.len(),
            tree.checked_font_paths().len()
        );
        Ok(tree)
    }

    fn build_directory(
        &self,
        tree: &mut FontTree,
        dir: &Path,
        parent: Option<Index>,
        snapshot: &RegistrationSnapshot,
    ) -> ApplicationResult<Index> {
        let dir_idx = tree.insert_node(NodeData::directory(dir), false, parent);

        let files = self.fs.list_files(dir).with_path_context("list files", dir)?;
        for file in files.into_iter().filter(|f| self.matcher.is_font_file(f)) {
            let checked = snapshot.contains_path(&file);
            trace!("font {} checked={}", file.display(), checked);
            tree.insert_node(NodeData::font_file(file), checked, Some(dir_idx));
        }

        let subdirs = self
            .fs
            .list_dirs(dir)
            .with_path_context("list directories", dir)?;
        for subdir in subdirs {
            self.build_directory(tree, &subdir, Some(dir_idx), snapshot)?;
        }

        tree.refresh_directory(dir_idx);
        Ok(dir_idx)
    }
}
