//! Toggle cascade against a real directory tree and an in-memory store.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fontreg::application::services::{RegistryService, ToggleReport};
use fontreg::domain::{FontMatcher, FontTree};
use fontreg::infrastructure::traits::RealFileSystem;
use fontreg::util::testing::{init_test_setup, MemoryRegistrationStore};
use rstest::rstest;
use tempfile::TempDir;

struct Fixture {
    _temp: TempDir,
    root: PathBuf,
    store: Arc<MemoryRegistrationStore>,
    service: RegistryService,
}

impl Fixture {
    /// Creates `files` (relative, `/`-separated) below a fresh `Fonts` root.
    fn new(files: &[&str]) -> Self {
        init_test_setup();
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("Fonts");
        fs::create_dir_all(&root).unwrap();
        for rel in files {
            let path = root.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "").unwrap();
        }
        let store = Arc::new(MemoryRegistrationStore::new());
        let service = RegistryService::new(
            Arc::new(RealFileSystem),
            store.clone(),
            FontMatcher::default(),
        );
        Self {
            _temp: temp,
            root,
            store,
            service,
        }
    }

    fn register(&self, rel: &str) {
        let path = self.root.join(rel);
        let stem = path.file_stem().unwrap().to_string_lossy().into_owned();
        self.store.seed(&format!("{stem} (custom)"), path);
    }

    fn build(&self) -> FontTree {
        self.service.refresh(&self.root).unwrap()
    }

    fn checked(&self, tree: &FontTree, rel: &str) -> bool {
        let path = if rel.is_empty() {
            self.root.clone()
        } else {
            self.root.join(rel)
        };
        tree.is_checked(tree.find(&path).unwrap())
    }

    fn toggle(&self, tree: &mut FontTree, rel: &str, checked: bool) -> ToggleReport {
        self.service
            .toggle_path(tree, &self.root.join(rel), checked)
            .unwrap()
    }
}

fn checked_states(tree: &FontTree) -> Vec<(PathBuf, bool)> {
    tree.iter()
        .map(|(_, node)| (node.data.path.clone(), node.is_checked()))
        .collect()
}

#[test]
fn given_partially_registered_dir_when_building_then_dir_unchecked() {
    let fx = Fixture::new(&["A/f1.ttf", "A/f2.ttf"]);
    fx.register("A/f1.ttf");

    let tree = fx.build();

    assert!(!fx.checked(&tree, "A"));
    assert!(fx.checked(&tree, "A/f1.ttf"));
    assert!(!fx.checked(&tree, "A/f2.ttf"));
    assert!(!fx.checked(&tree, ""));
}

#[test]
fn given_last_unchecked_font_when_checking_then_dir_and_root_become_checked() {
    let fx = Fixture::new(&["A/f1.ttf", "A/f2.ttf"]);
    fx.register("A/f1.ttf");
    let mut tree = fx.build();

    let report = fx.toggle(&mut tree, "A/f2.ttf", true);

    assert_eq!(report.inserted, vec!["f2 (custom)".to_string()]);
    assert_eq!(fx.store.get("f2 (custom)"), Some(fx.root.join("A/f2.ttf")));
    assert!(fx.checked(&tree, "A"));
    assert!(fx.checked(&tree, ""));
}

#[test]
fn given_root_with_unchecked_sibling_when_checking_subdir_font_then_root_stays_unchecked() {
    let fx = Fixture::new(&["A/f1.ttf", "A/f2.ttf", "loose.otf"]);
    fx.register("A/f1.ttf");
    let mut tree = fx.build();

    fx.toggle(&mut tree, "A/f2.ttf", true);

    assert!(fx.checked(&tree, "A"));
    assert!(!fx.checked(&tree, ""));
}

#[test]
fn given_fully_checked_dir_when_unchecking_dir_then_both_entries_deleted() {
    let fx = Fixture::new(&["A/f1.ttf", "A/f2.ttf"]);
    fx.register("A/f1.ttf");
    fx.register("A/f2.ttf");
    let mut tree = fx.build();
    assert!(fx.checked(&tree, "A"));

    let report = fx.toggle(&mut tree, "A", false);

    assert_eq!(report.deleted.len(), 2);
    assert!(fx.store.get("f1 (custom)").is_none());
    assert!(fx.store.get("f2 (custom)").is_none());
    assert!(!fx.checked(&tree, "A"));
    assert!(!fx.checked(&tree, ""));
}

#[test]
fn given_unregistered_subtree_when_checking_dir_then_every_font_registered_once() {
    let fx = Fixture::new(&["A/a.ttf", "A/B/b.otf", "A/B/C/c.ttc", "A/B/readme.txt"]);
    let mut tree = fx.build();

    let report = fx.toggle(&mut tree, "A", true);

    assert_eq!(fx.store.inserts(), 3);
    assert_eq!(fx.store.deletes(), 0);
    assert_eq!(report.inserted.len(), 3);
    assert_eq!(fx.store.entries().len(), 3);
    for rel in ["A", "A/B", "A/B/C", ""] {
        assert!(fx.checked(&tree, rel), "{rel} should be checked");
    }
}

#[test]
fn given_partially_checked_dir_when_checking_dir_then_only_missing_fonts_inserted() {
    let fx = Fixture::new(&["A/a.ttf", "A/b.ttf", "A/c.ttf"]);
    fx.register("A/b.ttf");
    let mut tree = fx.build();

    let report = fx.toggle(&mut tree, "A", true);

    assert_eq!(fx.store.inserts(), 2);
    assert!(!report.inserted.contains(&"b (custom)".to_string()));
}

#[rstest]
#[case("A/f1.ttf", true)]
#[case("A/f2.ttf", false)]
#[case("B", true)]
#[case("C", false)]
fn given_node_in_current_state_when_toggling_then_no_store_calls_and_no_changes(
    #[case] rel: &str,
    #[case] checked: bool,
) {
    let fx = Fixture::new(&["A/f1.ttf", "A/f2.ttf", "B/g.ttf", "C/h.ttf"]);
    fx.register("A/f1.ttf");
    fx.register("B/g.ttf");
    let mut tree = fx.build();
    let before = checked_states(&tree);

    let report = fx.toggle(&mut tree, rel, checked);

    assert_eq!(fx.store.calls(), 0);
    assert_eq!(report.store_calls(), 0);
    assert!(report.is_noop());
    assert_eq!(checked_states(&tree), before);
}

#[test]
fn given_single_checked_font_when_unchecking_then_chain_unchecked_with_one_delete() {
    let fx = Fixture::new(&["A/B/x.ttf", "A/B/y.ttf", "A/z.ttf"]);
    fx.register("A/B/x.ttf");
    let mut tree = fx.build();

    let report = fx.toggle(&mut tree, "A/B/x.ttf", false);

    assert_eq!(fx.store.deletes(), 1);
    assert_eq!(fx.store.inserts(), 0);
    assert_eq!(report.deleted, vec!["x (custom)".to_string()]);
    for rel in ["A/B", "A", ""] {
        assert!(!fx.checked(&tree, rel));
    }
    assert_eq!(report.stale_root.as_deref(), Some(fx.root.as_path()));
}

#[test]
fn given_checked_font_elsewhere_when_unchecking_then_stale_climb_stops_below_it() {
    let fx = Fixture::new(&["A/B/x.ttf", "A/other.ttf"]);
    fx.register("A/B/x.ttf");
    fx.register("A/other.ttf");
    let mut tree = fx.build();

    let report = fx.toggle(&mut tree, "A/B/x.ttf", false);

    assert_eq!(report.stale_root.as_deref(), Some(fx.root.join("A/B").as_path()));
    assert_eq!(fx.store.get("other (custom)"), Some(fx.root.join("A/other.ttf")));
}

#[test]
fn given_random_toggle_sequence_when_applied_then_tree_stays_consistent() {
    let fx = Fixture::new(&[
        "a.ttf",
        "A/a1.ttf",
        "A/a2.otf",
        "A/B/b1.ttf",
        "A/B/b2.ttf",
        "C/c1.ttc",
    ]);
    fx.register("A/B/b1.ttf");
    let mut tree = fx.build();
    assert!(tree.is_consistent());

    let steps: &[(&str, bool)] = &[
        ("A", true),
        ("A/B/b2.ttf", false),
        ("C", true),
        ("a.ttf", true),
        ("A/B", true),
        ("", false),
        ("A/a1.ttf", true),
        ("A/B/b1.ttf", true),
        ("A/a1.ttf", true),
        ("", true),
        ("A", false),
    ];
    for (rel, checked) in steps {
        let path = if rel.is_empty() {
            fx.root.clone()
        } else {
            fx.root.join(rel)
        };
        fx.service.toggle_path(&mut tree, &path, *checked).unwrap();
        assert!(tree.is_consistent(), "inconsistent after toggling {rel}");
    }

    let mut registered: Vec<PathBuf> = fx.store.entries().into_values().collect();
    let mut expected = tree.checked_font_paths();
    registered.sort();
    expected.sort();
    assert_eq!(registered, expected);
}

#[test]
fn given_foreign_entries_when_toggling_then_they_are_untouched() {
    let fx = Fixture::new(&["A/f1.ttf"]);
    fx.store.seed("Arial", "/system/arial.ttf");
    fx.store.seed("Corp Sans", fx.root.join("A/f1.ttf"));
    let mut tree = fx.build();
    // A path registered under any name counts as checked
    assert!(fx.checked(&tree, "A/f1.ttf"));

    fx.toggle(&mut tree, "A/f1.ttf", false);
    fx.toggle(&mut tree, "A/f1.ttf", true);
    fx.toggle(&mut tree, "A/f1.ttf", false);

    let entries = fx.store.entries();
    assert_eq!(entries.get("Arial"), Some(&PathBuf::from("/system/arial.ttf")));
    assert_eq!(entries.get("Corp Sans"), Some(&fx.root.join("A/f1.ttf")));
}

#[test]
fn given_empty_dir_when_checking_it_then_it_stays_unchecked() {
    let fx = Fixture::new(&["f.ttf"]);
    fs::create_dir_all(fx.root.join("Empty")).unwrap();
    let mut tree = fx.build();

    let report = fx.toggle(&mut tree, "Empty", true);

    assert!(!fx.checked(&tree, "Empty"));
    assert_eq!(report.store_calls(), 0);
    assert!(tree.is_consistent());
}

#[test]
fn given_failing_store_when_toggling_then_tree_keeps_requested_state() {
    init_test_setup();
    let temp = TempDir::new().unwrap();
    let root = temp.path().to_path_buf();
    fs::write(root.join("a.ttf"), "").unwrap();
    fs::write(root.join("b.ttf"), "").unwrap();
    let store = Arc::new(MemoryRegistrationStore::failing());
    let service =
        RegistryService::new(Arc::new(RealFileSystem), store.clone(), FontMatcher::default());
    let mut tree = service.refresh(&root).unwrap();

    let report = service.toggle_path(&mut tree, &root, true).unwrap();

    assert_eq!(report.failures.len(), 2);
    assert!(report.inserted.is_empty());
    assert_eq!(store.calls(), 2);
    assert!(tree.is_checked(tree.find(Path::new(&root)).unwrap()));
}

#[test]
fn given_checked_font_beside_dir_when_unchecking_dir_then_stale_climb_starts_and_stops_at_dir() {
    let fx = Fixture::new(&["A/f1.ttf", "A/f2.ttf", "keep.ttf"]);
    fx.register("A/f1.ttf");
    fx.register("A/f2.ttf");
    fx.register("keep.ttf");
    let mut tree = fx.build();

    let report = fx.toggle(&mut tree, "A", false);

    assert_eq!(report.stale_root.as_deref(), Some(fx.root.join("A").as_path()));
    assert_eq!(report.deleted.len(), 2);
    assert_eq!(fx.store.get("keep (custom)"), Some(fx.root.join("keep.ttf")));
}

#[test]
fn given_no_other_checked_font_when_unchecking_dir_then_stale_climb_reaches_root() {
    let fx = Fixture::new(&["A/B/f1.ttf", "A/g.ttf", "loose.otf"]);
    fx.register("A/B/f1.ttf");
    let mut tree = fx.build();

    let report = fx.toggle(&mut tree, "A/B", false);

    assert_eq!(report.stale_root.as_deref(), Some(fx.root.as_path()));
    assert_eq!(fx.store.deletes(), 1);
}

#[test]
fn given_same_stem_in_two_dirs_when_checking_both_then_last_insert_owns_shared_name() {
    let fx = Fixture::new(&["A/x.ttf", "B/x.otf"]);
    let mut tree = fx.build();

    fx.toggle(&mut tree, "A/x.ttf", true);
    fx.toggle(&mut tree, "B/x.otf", true);
    assert!(fx.checked(&tree, ""));
    assert_eq!(fx.store.get("x (custom)"), Some(fx.root.join("B/x.otf")));

    let rebuilt = fx.build();
    assert!(!fx.checked(&rebuilt, "A/x.ttf"));
    assert!(fx.checked(&rebuilt, "B/x.otf"));

    let mut tree = rebuilt;
    let report = fx.toggle(&mut tree, "A/x.ttf", false);
    assert_eq!(report.store_calls(), 0);
    assert_eq!(fx.store.get("x (custom)"), Some(fx.root.join("B/x.otf")));
}
