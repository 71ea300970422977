//! Gap-free sequential renumbering of a document collection
//!
//! A pass scans the collection, builds an [`IdMap`] that relabels the
//! identifiers `PREFIX-001..PREFIX-total` in ascending numeric order, rewrites
//! every reference in every document, and then renames the documents in two
//! phases. Phase one moves each renamed document to a quarantine key, phase
//! two moves it to its final key; no rename can ever land on a key that is
//! still occupied, whatever permutation the map describes.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::Path;

use log::{debug, info};
use regex::Captures;
use thiserror::Error;

use crate::ident::{compare_digits, pad_width, IdScheme};
use crate::storage::{DirStore, DocumentStore, StoreError};

/// Errors that abort a renumbering pass
#[derive(Error, Debug)]
pub enum RenumberError {
    #[error("Directory not found: {0}")]
    MissingCollection(String),

    #[error("No {prefix}-* documents found in {location}")]
    EmptyCollection { prefix: String, location: String },

    #[error(
        "Documents left under quarantine keys by an interrupted renumber in {location}: {}. \
         Rename them back by hand before running again",
        .keys.join(", ")
    )]
    StrandedQuarantine { location: String, keys: Vec<String> },

    #[error("Failed to rewrite references in {key}: {source}")]
    Rewrite {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to rename {from} to {to}: {source}")]
    Rename {
        from: String,
        to: String,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One relabeled identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdMapping {
    pub old: String,
    pub new: String,
}

/// Old → new relabeling for one pass.
///
/// Holds entries only for identifiers that actually change, ordered by the
/// numeric value of the old identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdMap {
    entries: Vec<IdMapping>,
    index: HashMap<String, usize>,
}

impl IdMap {
    fn push(&mut self, old: String, new: String) {
        self.index.insert(old.clone(), self.entries.len());
        self.entries.push(IdMapping { old, new });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// New identifier for `old`, if it changes
    pub fn get(&self, old: &str) -> Option<&str> {
        self.index.get(old).map(|&i| self.entries[i].new.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &IdMapping> {
        self.entries.iter()
    }
}

/// Computes the compact relabeling of `keys`.
///
/// Keys that are not identifiers of `scheme` are ignored. Identifiers are
/// ordered by numeric value (ties, such as `REQ-5` next to `REQ-05`, by key
/// text) and numbered from 1, padded to the digit count of the total.
pub fn build_id_map(keys: &[String], scheme: &IdScheme) -> IdMap {
    let mut numbered: Vec<(&str, &str)> = keys
        .iter()
        .filter_map(|key| scheme.digits(key).map(|digits| (digits, key.as_str())))
        .collect();

    numbered.sort_by(|a, b| compare_digits(a.0, b.0).then_with(|| a.1.cmp(b.1)));

    let mut map = IdMap::default();
    if numbered.is_empty() {
        return map;
    }

    let pad = pad_width(numbered.len());
    for (position, (_, old)) in numbered.into_iter().enumerate() {
        let new = scheme.format(position + 1, pad);
        if old != new {
            map.push(old.to_string(), new);
        }
    }
    map
}

/// Replaces every identifier token found in `map` with its new value.
///
/// Tokens are matched whole, so `REQ-1` is never rewritten inside `REQ-10`.
/// Tokens absent from the map pass through byte-identical.
pub fn rewrite_references<'t>(text: &'t str, map: &IdMap, scheme: &IdScheme) -> Cow<'t, str> {
    if map.is_empty() {
        return Cow::Borrowed(text);
    }

    scheme
        .token_regex()
        .replace_all(text, |caps: &Captures| {
            let token = &caps[0];
            map.get(token).unwrap_or(token).to_string()
        })
}

/// Outcome of a renumbering pass
#[derive(Debug, Clone)]
pub struct RenumberReport {
    /// The relabeling that was (or, in a dry run, would be) applied
    pub map: IdMap,
    /// Number of identifier documents in the collection
    pub total: usize,
    /// Padding width of the new identifiers
    pub pad: usize,
    /// Documents whose content was rewritten
    pub rewritten: Vec<String>,
    /// Documents moved to a new key
    pub renamed: usize,
    pub dry_run: bool,
}

impl RenumberReport {
    /// Documents that kept their key
    pub fn unchanged(&self) -> usize {
        self.total - self.map.len()
    }
}

/// Runs a renumbering pass over the directory at `dir`.
///
/// A missing directory is reported as [`RenumberError::MissingCollection`]
/// before anything is touched.
pub fn renumber_dir<P: AsRef<Path>>(
    dir: P,
    extension: &str,
    scheme: &IdScheme,
    dry_run: bool,
) -> Result<RenumberReport, RenumberError> {
    let mut store = DirStore::open(dir.as_ref(), extension).map_err(|e| match e {
        StoreError::MissingDirectory(path) => {
            RenumberError::MissingCollection(path.display().to_string())
        }
        other => RenumberError::Store(other),
    })?;
    renumber(&mut store, scheme, dry_run)
}

/// Runs a renumbering pass over `store`.
///
/// The map is built from a full scan before any mutation. With `dry_run` the
/// report is returned without rewriting or renaming anything.
pub fn renumber(
    store: &mut dyn DocumentStore,
    scheme: &IdScheme,
    dry_run: bool,
) -> Result<RenumberReport, RenumberError> {
    let keys = store.list_keys()?;

    let stranded: Vec<String> = keys
        .iter()
        .filter(|key| scheme.is_quarantine_key(key))
        .cloned()
        .collect();
    if !stranded.is_empty() {
        return Err(RenumberError::StrandedQuarantine {
            location: store.location(),
            keys: stranded,
        });
    }

    let documents: Vec<String> = keys
        .iter()
        .filter(|key| scheme.is_identifier(key))
        .cloned()
        .collect();
    if documents.is_empty() {
        return Err(RenumberError::EmptyCollection {
            prefix: scheme.prefix().to_string(),
            location: store.location(),
        });
    }

    let map = build_id_map(&documents, scheme);
    let mut report = RenumberReport {
        total: documents.len(),
        pad: pad_width(documents.len()),
        map,
        rewritten: Vec::new(),
        renamed: 0,
        dry_run,
    };

    if report.map.is_empty() {
        info!(
            "{} document(s) in {} already compact, nothing to renumber",
            report.total,
            store.location()
        );
        return Ok(report);
    }

    info!(
        "{} identifier(s) to renumber in {} (pad={})",
        report.map.len(),
        store.location(),
        report.pad
    );

    if dry_run {
        return Ok(report);
    }

    // Non-identifier documents such as `REQ-overview` keep their key but
    // their references still follow the map.
    let scope: Vec<String> = keys
        .into_iter()
        .filter(|key| scheme.is_prefixed(key))
        .collect();
    report.rewritten = rewrite_collection(store, &scope, &report.map, scheme)?;
    report.renamed = rename_two_phase(store, &report.map, scheme)?;

    Ok(report)
}

/// Rewrites references in every document, including ones that keep their own
/// key. All documents are read before the first write; if a write fails the
/// documents already written are restored.
fn rewrite_collection(
    store: &mut dyn DocumentStore,
    documents: &[String],
    map: &IdMap,
    scheme: &IdScheme,
) -> Result<Vec<String>, RenumberError> {
    let mut pending: Vec<(&str, String, String)> = Vec::new();
    for key in documents {
        let text = store.read(key).map_err(|source| RenumberError::Rewrite {
            key: key.clone(),
            source,
        })?;
        if let Cow::Owned(updated) = rewrite_references(&text, map, scheme) {
            if updated != text {
                pending.push((key.as_str(), text, updated));
            }
        }
    }

    for (done, (key, _, updated)) in pending.iter().enumerate() {
        debug!("Rewriting references in {}", key);
        if let Err(source) = store.write(key, updated) {
            restore(store, &pending[..done]);
            return Err(RenumberError::Rewrite {
                key: key.to_string(),
                source,
            });
        }
    }

    Ok(pending.into_iter().map(|(key, _, _)| key.to_string()).collect())
}

fn restore(store: &mut dyn DocumentStore, written: &[(&str, String, String)]) {
    for (key, original, _) in written {
        if let Err(e) = store.write(key, original) {
            log::error!("Could not restore {} after a failed rewrite: {}", key, e);
        }
    }
}

/// Quarantines every renamed document, then commits it to its final key
fn rename_two_phase(
    store: &mut dyn DocumentStore,
    map: &IdMap,
    scheme: &IdScheme,
) -> Result<usize, RenumberError> {
    let mut quarantined = Vec::with_capacity(map.len());

    for mapping in map.iter() {
        let temp = scheme.quarantine_key(&mapping.old);
        debug!("Quarantining {} as {}", mapping.old, temp);
        store
            .rename(&mapping.old, &temp)
            .map_err(|source| RenumberError::Rename {
                from: mapping.old.clone(),
                to: temp.clone(),
                source,
            })?;
        quarantined.push((temp, mapping.new.as_str()));
    }

    for (temp, new) in &quarantined {
        debug!("Committing {} as {}", temp, new);
        store.rename(temp, new).map_err(|source| RenumberError::Rename {
            from: temp.clone(),
            to: new.to_string(),
            source,
        })?;
    }

    Ok(quarantined.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::{DEFAULT_PREFIX, DEFAULT_QUARANTINE_MARKER};
    use crate::storage::{MemoryStore, StoreOp};
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    fn scheme() -> IdScheme {
        IdScheme::new(DEFAULT_PREFIX, DEFAULT_QUARANTINE_MARKER).unwrap()
    }

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn pairs(map: &IdMap) -> Vec<(&str, &str)> {
        map.iter().map(|m| (m.old.as_str(), m.new.as_str())).collect()
    }

    #[test]
    fn test_build_id_map_fills_gap() {
        let scheme = IdScheme::new("A", "TEMP").unwrap();
        let map = build_id_map(&keys(&["A-1", "A-2", "A-4", "A-5"]), &scheme);
        assert_eq!(pairs(&map), vec![("A-4", "A-3"), ("A-5", "A-4")]);
        assert_eq!(map.get("A-1"), None);
    }

    #[test]
    fn test_build_id_map_orders_numerically() {
        let map = build_id_map(&keys(&["REQ-10", "REQ-2", "REQ-9"]), &scheme());
        assert_eq!(
            pairs(&map),
            vec![("REQ-2", "REQ-1"), ("REQ-9", "REQ-2"), ("REQ-10", "REQ-3")]
        );
    }

    #[test]
    fn test_build_id_map_fixes_padding() {
        // 3 documents need one digit, so REQ-02 loses its zero
        let map = build_id_map(&keys(&["REQ-1", "REQ-02", "REQ-3"]), &scheme());
        assert_eq!(pairs(&map), vec![("REQ-02", "REQ-2")]);

        let ten: Vec<String> = (1..=10).map(|n| format!("REQ-{}", n)).collect();
        let map = build_id_map(&ten, &scheme());
        assert_eq!(map.len(), 9);
        assert_eq!(map.get("REQ-1"), Some("REQ-01"));
        assert_eq!(map.get("REQ-10"), None);
    }

    #[test]
    fn test_build_id_map_ignores_foreign_keys() {
        let map = build_id_map(&keys(&["README", "REQ-1", "REQ-x", "REQ-3"]), &scheme());
        assert_eq!(pairs(&map), vec![("REQ-3", "REQ-2")]);
    }

    #[test]
    fn test_build_id_map_is_injective() {
        let input = keys(&["REQ-5", "REQ-05", "REQ-17", "REQ-3", "REQ-100", "REQ-8"]);
        let map = build_id_map(&input, &scheme());
        let targets: HashSet<&str> = map.iter().map(|m| m.new.as_str()).collect();
        assert_eq!(targets.len(), map.len());

        // No target collides with an identifier that keeps its key
        for key in &input {
            if map.get(key).is_none() {
                assert!(!targets.contains(key.as_str()));
            }
        }
    }

    #[test]
    fn test_rewrite_references_whole_tokens_only() {
        let ten: Vec<String> = (1..=10).map(|n| format!("REQ-{}", n)).collect();
        let map = build_id_map(&ten, &scheme());

        let text = "Depends on REQ-1 and REQ-10; see also REQ-100 and XREQ-1.";
        assert_eq!(
            rewrite_references(text, &map, &scheme()),
            "Depends on REQ-01 and REQ-10; see also REQ-100 and XREQ-1."
        );
    }

    #[test]
    fn test_rewrite_references_borrows_when_map_empty() {
        let text = "REQ-1";
        let rewritten = rewrite_references(text, &IdMap::default(), &scheme());
        assert!(matches!(rewritten, Cow::Borrowed(_)));
    }

    #[test]
    fn test_renumber_example_scenario() {
        let scheme = IdScheme::new("A", "TEMP").unwrap();
        let mut store = MemoryStore::with_documents([
            ("A-1", "**ID:** A-1\nDepends on A-5"),
            ("A-2", "**ID:** A-2\nConflicts with A-1"),
            ("A-4", "**ID:** A-4\nNone"),
            ("A-5", "**ID:** A-5\nDepends on A-4 and A-1"),
        ]);

        let report = renumber(&mut store, &scheme, false).unwrap();
        assert_eq!(pairs(&report.map), vec![("A-4", "A-3"), ("A-5", "A-4")]);
        assert_eq!(report.renamed, 2);
        assert_eq!(report.unchanged(), 2);

        let docs = store.documents();
        assert_eq!(docs.keys().collect::<Vec<_>>(), vec!["A-1", "A-2", "A-3", "A-4"]);
        assert_eq!(docs["A-1"], "**ID:** A-1\nDepends on A-4");
        assert_eq!(docs["A-2"], "**ID:** A-2\nConflicts with A-1");
        assert_eq!(docs["A-3"], "**ID:** A-3\nNone");
        assert_eq!(docs["A-4"], "**ID:** A-4\nDepends on A-3 and A-1");
    }

    #[test]
    fn test_renumber_cyclic_shift_is_collision_safe() {
        let mut store = MemoryStore::with_documents([
            ("REQ-2", "**ID:** REQ-2\nsecond"),
            ("REQ-3", "**ID:** REQ-3\nthird, after REQ-2"),
        ]);

        renumber(&mut store, &scheme(), false).unwrap();

        let docs = store.documents();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs["REQ-1"], "**ID:** REQ-1\nsecond");
        assert_eq!(docs["REQ-2"], "**ID:** REQ-2\nthird, after REQ-1");
        assert!(!docs.keys().any(|k| scheme().is_quarantine_key(k)));
    }

    #[test]
    fn test_renumber_is_idempotent() {
        let mut store = MemoryStore::with_documents([
            ("REQ-3", "REQ-3 uses REQ-12"),
            ("REQ-7", "REQ-7"),
            ("REQ-12", "REQ-12 blocks REQ-3"),
        ]);

        let first = renumber(&mut store, &scheme(), false).unwrap();
        assert_eq!(first.map.len(), 3);

        let second = renumber(&mut store, &scheme(), false).unwrap();
        assert!(second.map.is_empty());
        assert_eq!(store.documents()["REQ-1"], "REQ-1 uses REQ-3");
        assert_eq!(store.documents()["REQ-3"], "REQ-3 blocks REQ-1");
    }

    #[test]
    fn test_renumber_leaves_collection_gap_free() {
        let names: Vec<String> = [4, 8, 15, 16, 23, 42, 50, 51, 60, 77, 78, 99]
            .iter()
            .map(|n| format!("REQ-{}", n))
            .collect();
        let mut store =
            MemoryStore::with_documents(names.iter().map(|k| (k.clone(), format!("**ID:** {}", k))));

        renumber(&mut store, &scheme(), false).unwrap();

        let expected: Vec<String> = (1..=12).map(|n| format!("REQ-{:02}", n)).collect();
        let actual: Vec<String> = store.documents().keys().cloned().collect();
        assert_eq!(actual, expected);
        for (key, text) in store.documents() {
            assert_eq!(text, &format!("**ID:** {}", key));
        }
    }

    #[test]
    fn test_renumber_only_writes_changed_documents() {
        let mut store = MemoryStore::with_documents([
            ("REQ-1", "no references here"),
            ("REQ-2", "refers to REQ-1 only"),
            ("REQ-4", "self REQ-4"),
        ]);

        let report = renumber(&mut store, &scheme(), false).unwrap();
        assert_eq!(report.rewritten, vec!["REQ-4".to_string()]);
        assert_eq!(store.writes(), &["REQ-4".to_string()]);
        assert_eq!(store.documents()["REQ-3"], "self REQ-3");
    }

    #[test]
    fn test_dry_run_does_not_mutate() {
        let docs = [
            ("REQ-1", "see REQ-5"),
            ("REQ-5", "**ID:** REQ-5"),
            ("REQ-9", "**ID:** REQ-9 after REQ-5"),
        ];
        let mut store = MemoryStore::with_documents(docs);
        let before = store.documents().clone();

        let dry = renumber(&mut store, &scheme(), true).unwrap();
        assert!(dry.dry_run);
        assert_eq!(store.documents(), &before);
        assert!(store.writes().is_empty());
        assert!(dry.rewritten.is_empty());
        assert_eq!(dry.renamed, 0);

        let mut real_store = MemoryStore::with_documents(docs);
        let real = renumber(&mut real_store, &scheme(), false).unwrap();
        assert_eq!(dry.map, real.map);
    }

    #[test]
    fn test_empty_collection_is_an_error() {
        let mut store = MemoryStore::with_documents([("README", "# Register")]);
        let result = renumber(&mut store, &scheme(), false);
        assert!(matches!(result, Err(RenumberError::EmptyCollection { .. })));
    }

    #[test]
    fn test_stranded_quarantine_is_refused() {
        let mut store = MemoryStore::with_documents([
            ("REQ-1", "one"),
            ("REQ-TEMP-REQ-3", "three"),
        ]);
        let result = renumber(&mut store, &scheme(), false);
        match result {
            Err(RenumberError::StrandedQuarantine { keys, .. }) => {
                assert_eq!(keys, vec!["REQ-TEMP-REQ-3".to_string()]);
            }
            other => panic!("expected stranded quarantine error, got {:?}", other),
        }
        assert!(store.writes().is_empty());
    }

    #[test]
    fn test_read_failure_leaves_collection_untouched() {
        let mut store = MemoryStore::with_documents([
            ("REQ-1", "see REQ-3"),
            ("REQ-3", "three"),
            ("REQ-4", "four"),
        ]);
        store.fail_on(StoreOp::Read, "REQ-4");
        let before = store.documents().clone();

        let result = renumber(&mut store, &scheme(), false);
        assert!(matches!(result, Err(RenumberError::Rewrite { ref key, .. }) if key == "REQ-4"));
        assert_eq!(store.documents(), &before);
    }

    #[test]
    fn test_write_failure_restores_rewritten_documents() {
        let mut store = MemoryStore::with_documents([
            ("REQ-1", "see REQ-3"),
            ("REQ-3", "**ID:** REQ-3"),
        ]);
        store.fail_on(StoreOp::Write, "REQ-3");
        let before = store.documents().clone();

        let result = renumber(&mut store, &scheme(), false);
        assert!(matches!(result, Err(RenumberError::Rewrite { .. })));
        assert_eq!(store.documents(), &before);
    }

    #[test]
    fn test_build_id_map_ignores_non_ascii_digits() {
        let map = build_id_map(&keys(&["REQ-\u{0661}", "REQ-2", "REQ-3"]), &scheme());
        assert_eq!(pairs(&map), vec![("REQ-2", "REQ-1"), ("REQ-3", "REQ-2")]);
    }

    #[test]
    fn test_renumber_rewrites_prefixed_non_identifier_documents() {
        let mut store = MemoryStore::with_documents([
            ("REQ-1", "a"),
            ("REQ-3", "b"),
            ("REQ-overview", "see REQ-3"),
        ]);

        let report = renumber(&mut store, &scheme(), false).unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(pairs(&report.map), vec![("REQ-3", "REQ-2")]);
        assert_eq!(report.rewritten, vec!["REQ-overview".to_string()]);

        let docs = store.documents();
        assert_eq!(docs["REQ-overview"], "see REQ-2");
        assert_eq!(docs["REQ-2"], "b");
        assert!(!docs.contains_key("REQ-3"));
    }

    #[test]
    fn test_quarantine_rename_failure() {
        let mut store = MemoryStore::with_documents([("REQ-1", "see REQ-3"), ("REQ-3", "three")]);
        store.fail_on(StoreOp::Rename, "REQ-3");

        match renumber(&mut store, &scheme(), false) {
            Err(RenumberError::Rename { from, to, .. }) => {
                assert_eq!(from, "REQ-3");
                assert_eq!(to, "REQ-TEMP-REQ-3");
            }
            other => panic!("expected rename error, got {:?}", other),
        }
        // Content stage already ran; nothing was moved
        let keys: Vec<&String> = store.documents().keys().collect();
        assert_eq!(keys, vec!["REQ-1", "REQ-3"]);
        assert_eq!(store.documents()["REQ-1"], "see REQ-2");
    }

    #[test]
    fn test_commit_rename_failure_strands_quarantine_key() {
        let mut store = MemoryStore::with_documents([("REQ-1", "one"), ("REQ-3", "three")]);
        store.fail_on(StoreOp::Rename, "REQ-TEMP-REQ-3");

        match renumber(&mut store, &scheme(), false) {
            Err(RenumberError::Rename { from, to, .. }) => {
                assert_eq!(from, "REQ-TEMP-REQ-3");
                assert_eq!(to, "REQ-2");
            }
            other => panic!("expected rename error, got {:?}", other),
        }
        let keys: Vec<&String> = store.documents().keys().collect();
        assert_eq!(keys, vec!["REQ-1", "REQ-TEMP-REQ-3"]);

        let rerun = renumber(&mut store, &scheme(), false);
        assert!(matches!(rerun, Err(RenumberError::StrandedQuarantine { .. })));
    }

    /// Store where another writer takes `target` as soon as anything is
    /// quarantined
    struct ContendedStore {
        inner: MemoryStore,
        target: String,
    }

    impl DocumentStore for ContendedStore {
        fn location(&self) -> String {
            self.inner.location()
        }

        fn list_keys(&self) -> Result<Vec<String>, StoreError> {
            self.inner.list_keys()
        }

        fn contains(&self, key: &str) -> Result<bool, StoreError> {
            self.inner.contains(key)
        }

        fn read(&self, key: &str) -> Result<String, StoreError> {
            self.inner.read(key)
        }

        fn write(&mut self, key: &str, text: &str) -> Result<(), StoreError> {
            self.inner.write(key, text)
        }

        fn rename(&mut self, from: &str, to: &str) -> Result<(), StoreError> {
            self.inner.rename(from, to)?;
            if to.starts_with("REQ-TEMP-") {
                let target = self.target.clone();
                self.inner.write(&target, "written elsewhere")?;
            }
            Ok(())
        }
    }

    #[test]
    fn test_commit_rename_refuses_taken_target() {
        let mut store = ContendedStore {
            inner: MemoryStore::with_documents([("REQ-1", "one"), ("REQ-3", "three")]),
            target: "REQ-2".to_string(),
        };

        match renumber(&mut store, &scheme(), false) {
            Err(RenumberError::Rename { from, to, source }) => {
                assert_eq!(from, "REQ-TEMP-REQ-3");
                assert_eq!(to, "REQ-2");
                assert!(matches!(source, StoreError::AlreadyExists { .. }));
            }
            other => panic!("expected rename error, got {:?}", other),
        }
        let docs = store.inner.documents();
        assert_eq!(docs["REQ-2"], "written elsewhere");
        assert_eq!(docs["REQ-TEMP-REQ-3"], "three");
    }

    #[test]
    fn test_renumber_dir_end_to_end() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::write(dir.join("REQ-1.md"), "**ID:** REQ-1\n\nDepends on REQ-3\n").unwrap();
        fs::write(dir.join("REQ-3.md"), "**ID:** REQ-3\n").unwrap();
        fs::write(dir.join("README.md"), "| REQ-3 | untouched |\n").unwrap();

        let report = renumber_dir(dir, "md", &scheme(), false).unwrap();
        assert_eq!(pairs(&report.map), vec![("REQ-3", "REQ-2")]);

        assert!(!dir.join("REQ-3.md").exists());
        assert_eq!(fs::read_to_string(dir.join("REQ-2.md")).unwrap(), "**ID:** REQ-2\n");
        assert_eq!(
            fs::read_to_string(dir.join("REQ-1.md")).unwrap(),
            "**ID:** REQ-1\n\nDepends on REQ-2\n"
        );
        assert_eq!(
            fs::read_to_string(dir.join("README.md")).unwrap(),
            "| REQ-3 | untouched |\n"
        );
    }

    #[test]
    fn test_renumber_dir_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let result = renumber_dir(temp_dir.path().join("missing"), "md", &scheme(), true);
        assert!(matches!(result, Err(RenumberError::MissingCollection(_))));
    }
}
