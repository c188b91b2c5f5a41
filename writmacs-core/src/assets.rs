//! Named replacement tables and snippets, and the per-session cache over them.
//!
//! Providers distinguish "not found" (`Ok(None)`) from failures to read
//! what is there (`Err`). The cache resolves every name at most once.

use crate::error::{Result, WritError};
use crate::keymap::Keymap;
use crate::tsv;
use include_dir::{include_dir, Dir};
use once_cell::sync::OnceCell;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

// Default tables ship inside the binary so they work after cargo install
static BUNDLED_KEYMAPS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/keymaps");

const TABLE_EXT: &str = "tsv";

/// Source of named tables and snippets
pub trait AssetProvider: Send + Sync {
    fn lookup_table(&self, name: &str) -> Result<Option<Keymap>>;

    fn lookup_snippet(&self, name: &str) -> Result<Option<String>>;

    /// Every table name this provider can resolve
    fn table_names(&self) -> Result<Vec<String>>;
}

/// Names that could step outside the keymap directory never resolve
fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(|c| matches!(c, '/' | '\\' | '\0'))
}

/// Tables from `<root>/keymaps/*.tsv` over the bundled defaults, snippets
/// from every file in `<root>/snippets/`
pub struct DirectoryProvider {
    root: Option<PathBuf>,
    snippets: OnceCell<HashMap<String, String>>,
}

impl DirectoryProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            snippets: OnceCell::new(),
        }
    }

    /// Only the tables compiled into the binary, and no snippets
    pub fn bundled() -> Self {
        Self {
            root: None,
            snippets: OnceCell::new(),
        }
    }

    fn keymaps_dir(&self) -> Option<PathBuf> {
        self.root.as_ref().map(|root| root.join("keymaps"))
    }

    fn snippets_dir(&self) -> Option<PathBuf> {
        self.root.as_ref().map(|root| root.join("snippets"))
    }

    fn bundled_table(name: &str) -> Result<Option<Keymap>> {
        let Some(file) = BUNDLED_KEYMAPS.get_file(format!("{}.{}", name, TABLE_EXT)) else {
            return Ok(None);
        };
        table_from_bytes(file.path(), file.contents()).map(Some)
    }

    fn load_snippets(&self) -> Result<HashMap<String, String>> {
        let mut snippets = HashMap::new();
        let Some(dir) = self.snippets_dir().filter(|dir| dir.is_dir()) else {
            return Ok(snippets);
        };

        for path in files_in(&dir)? {
            let source = fs::read_to_string(&path).map_err(|e| WritError::io(&path, e))?;
            let loaded = tsv::parse_mapping(&source)?;
            tracing::debug!("Loaded {} snippets from {:?}", loaded.len(), path);
            snippets.extend(loaded);
        }

        Ok(snippets)
    }
}

/// Decode a table file; anything but UTF-8 is a read error
fn table_from_bytes(path: &Path, bytes: &[u8]) -> Result<Keymap> {
    let source = std::str::from_utf8(bytes)
        .map_err(|e| WritError::io(path, io::Error::new(io::ErrorKind::InvalidData, e)))?;
    Keymap::from_tsv(source)
}

/// Regular files directly inside `dir`, sorted by name
fn files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            WritError::io(path, e.into())
        })?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

impl AssetProvider for DirectoryProvider {
    fn lookup_table(&self, name: &str) -> Result<Option<Keymap>> {
        if !is_plain_name(name) {
            return Ok(None);
        }

        if let Some(dir) = self.keymaps_dir() {
            let path = dir.join(format!("{}.{}", name, TABLE_EXT));
            if path.is_file() {
                tracing::debug!("Loading keymap {} from {:?}", name, path);
                let bytes = fs::read(&path).map_err(|e| WritError::io(&path, e))?;
                return table_from_bytes(&path, &bytes).map(Some);
            }
        }

        Self::bundled_table(name)
    }

    fn lookup_snippet(&self, name: &str) -> Result<Option<String>> {
        let snippets = self.snippets.get_or_try_init(|| self.load_snippets())?;
        Ok(snippets.get(name).cloned())
    }

    fn table_names(&self) -> Result<Vec<String>> {
        let mut names: BTreeSet<String> = BUNDLED_KEYMAPS
            .files()
            .filter_map(|file| table_stem(file.path()))
            .collect();

        if let Some(dir) = self.keymaps_dir().filter(|dir| dir.is_dir()) {
            names.extend(files_in(&dir)?.iter().filter_map(|path| table_stem(path)));
        }

        Ok(names.into_iter().collect())
    }
}

fn table_stem(path: &Path) -> Option<String> {
    if path.extension()? != TABLE_EXT {
        return None;
    }
    path.file_stem()?.to_str().map(str::to_string)
}

/// In-memory provider, for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    tables: HashMap<String, Keymap>,
    snippets: HashMap<String, String>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: impl Into<String>, keymap: Keymap) -> Self {
        self.tables.insert(name.into(), keymap);
        self
    }

    pub fn with_snippet(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.snippets.insert(name.into(), text.into());
        self
    }
}

impl AssetProvider for MemoryProvider {
    fn lookup_table(&self, name: &str) -> Result<Option<Keymap>> {
        Ok(self.tables.get(name).cloned())
    }

    fn lookup_snippet(&self, name: &str) -> Result<Option<String>> {
        Ok(self.snippets.get(name).cloned())
    }

    fn table_names(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// Memoizing front for an [`AssetProvider`]
///
/// Misses are cached as well as hits. Safe to share between threads
/// expanding independent documents.
pub struct AssetCache {
    provider: Box<dyn AssetProvider>,
    tables: RwLock<HashMap<String, Option<Arc<Keymap>>>>,
    snippets: RwLock<HashMap<String, Option<Arc<str>>>>,
}

impl AssetCache {
    pub fn new(provider: impl AssetProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
            tables: RwLock::new(HashMap::new()),
            snippets: RwLock::new(HashMap::new()),
        }
    }

    pub fn table(&self, name: &str) -> Result<Option<Arc<Keymap>>> {
        if let Some(hit) = self.tables.read().get(name) {
            return Ok(hit.clone());
        }

        // Load under the write lock so a name is resolved only once
        let mut tables = self.tables.write();
        if let Some(hit) = tables.get(name) {
            return Ok(hit.clone());
        }
        let loaded = self.provider.lookup_table(name)?.map(Arc::new);
        tracing::debug!("Keymap {} resolved: {}", name, loaded.is_some());
        tables.insert(name.to_string(), loaded.clone());
        Ok(loaded)
    }

    /// Like [`AssetCache::table`], but a missing table is an error
    pub fn require_table(&self, name: &str) -> Result<Arc<Keymap>> {
        self.table(name)?.ok_or_else(|| WritError::UnknownKeymap {
            name: name.to_string(),
        })
    }

    pub fn snippet(&self, name: &str) -> Result<Option<Arc<str>>> {
        if let Some(hit) = self.snippets.read().get(name) {
            return Ok(hit.clone());
        }

        let mut snippets = self.snippets.write();
        if let Some(hit) = snippets.get(name) {
            return Ok(hit.clone());
        }
        let loaded: Option<Arc<str>> = self.provider.lookup_snippet(name)?.map(Arc::from);
        snippets.insert(name.to_string(), loaded.clone());
        Ok(loaded)
    }

    pub fn table_names(&self) -> Result<Vec<String>> {
        self.provider.table_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    #[test]
    fn test_bundled_tables() {
        let provider = DirectoryProvider::bundled();
        let names = provider.table_names().unwrap();
        assert_eq!(names, vec!["monospace", "rotated", "smallcaps"]);

        let smallcaps = provider.lookup_table("smallcaps").unwrap().unwrap();
        assert_eq!(smallcaps.apply("Caps"), "Cᴀᴘs");
        assert!(provider.lookup_table("nope").unwrap().is_none());
        assert!(provider.lookup_snippet("anything").unwrap().is_none());
    }

    #[test]
    fn test_user_table_overrides_bundled() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("keymaps")).unwrap();
        fs::write(dir.path().join("keymaps/smallcaps.tsv"), "a\tA\n").unwrap();
        fs::write(dir.path().join("keymaps/esperanto.tsv"), "cx\tĉ\n").unwrap();
        fs::write(dir.path().join("keymaps/README"), "not a table").unwrap();

        let provider = DirectoryProvider::new(dir.path());
        assert_eq!(
            provider.table_names().unwrap(),
            vec!["esperanto", "monospace", "rotated", "smallcaps"]
        );
        let smallcaps = provider.lookup_table("smallcaps").unwrap().unwrap();
        assert_eq!(smallcaps.apply("ab"), "Ab");
        let esperanto = provider.lookup_table("esperanto").unwrap().unwrap();
        assert_eq!(esperanto.apply("cxu"), "ĉu");
    }

    #[test]
    fn test_path_like_names_do_not_resolve() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("secret.tsv"), "a\tb\n").unwrap();
        fs::create_dir_all(dir.path().join("keymaps")).unwrap();

        let provider = DirectoryProvider::new(dir.path());
        assert!(provider.lookup_table("../secret").unwrap().is_none());
        assert!(provider.lookup_table(".hidden").unwrap().is_none());
    }

    #[test]
    fn test_snippets_merge_in_file_order() {
        let dir = tempdir().unwrap();
        let snippets = dir.path().join("snippets");
        fs::create_dir_all(&snippets).unwrap();
        fs::write(snippets.join("a.tsv"), "sig,signature\tfirst\nshrug\t¯\\\\_(ツ)_/¯\n").unwrap();
        fs::write(snippets.join("b.tsv"), "sig\tsecond\n").unwrap();

        let provider = DirectoryProvider::new(dir.path());
        assert_eq!(provider.lookup_snippet("sig").unwrap().as_deref(), Some("second"));
        assert_eq!(
            provider.lookup_snippet("signature").unwrap().as_deref(),
            Some("first")
        );
        assert_eq!(
            provider.lookup_snippet("shrug").unwrap().as_deref(),
            Some("¯\\_(ツ)_/¯")
        );
    }

    #[test]
    fn test_unreadable_table_is_an_error() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("keymaps")).unwrap();
        fs::write(dir.path().join("keymaps/bad.tsv"), "a\t\\uZZZZ\n").unwrap();

        let provider = DirectoryProvider::new(dir.path());
        assert!(matches!(
            provider.lookup_table("bad"),
            Err(WritError::InvalidEscape { line: 1, .. })
        ));
    }

    #[test]
    fn test_non_utf8_table_is_an_error() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("keymaps")).unwrap();
        fs::write(dir.path().join("keymaps/latin1.tsv"), b"a\t\xe9\n").unwrap();

        let provider = DirectoryProvider::new(dir.path());
        assert!(matches!(
            provider.lookup_table("latin1"),
            Err(WritError::Io { .. })
        ));
    }

    #[test]
    fn test_table_bytes_are_decoded_or_rejected() {
        let path = Path::new("rotated.tsv");
        let keymap = table_from_bytes(path, "a\tb\n".as_bytes()).unwrap();
        assert_eq!(keymap.get("a"), Some("b"));

        match table_from_bytes(path, b"\xff\xfe") {
            Err(WritError::Io { path: reported, source }) => {
                assert_eq!(reported, path);
                assert_eq!(source.kind(), io::ErrorKind::InvalidData);
            }
            other => panic!("expected a read error, got {other:?}"),
        }
    }

    struct CountingProvider {
        lookups: Arc<AtomicUsize>,
    }

    impl AssetProvider for CountingProvider {
        fn lookup_table(&self, name: &str) -> Result<Option<Keymap>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok((name == "known").then(Keymap::default))
        }

        fn lookup_snippet(&self, _name: &str) -> Result<Option<String>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }

        fn table_names(&self) -> Result<Vec<String>> {
            Ok(vec!["known".to_string()])
        }
    }

    #[test]
    fn test_cache_resolves_each_name_once() {
        let lookups = Arc::new(AtomicUsize::new(0));
        let cache = AssetCache::new(CountingProvider {
            lookups: lookups.clone(),
        });

        for _ in 0..3 {
            assert!(cache.table("known").unwrap().is_some());
            assert!(cache.table("missing").unwrap().is_none());
            assert!(cache.snippet("missing").unwrap().is_none());
        }
        assert_eq!(lookups.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_require_table_reports_name() {
        let cache = AssetCache::new(MemoryProvider::new());
        match cache.require_table("klingon") {
            Err(WritError::UnknownKeymap { name }) => assert_eq!(name, "klingon"),
            other => panic!("expected UnknownKeymap, got {:?}", other.map(|_| ())),
        }
    }
}
