//! Alias table: source-native team name -> canonical name, per source.
//!
//! On-disk format is a JSON object keyed by lowercase source id, each value an
//! object of `native -> canonical`. Both levels are written key-sorted with
//! 2-space indentation and a trailing newline so diffs stay minimal.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

/// `source_id -> (native_name -> canonical_name)`.
pub type AliasMap = BTreeMap<String, BTreeMap<String, String>>;

#[derive(Error, Debug)]
pub enum MappingError {
    #[error("alias file I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("alias file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("alias file top level must be a JSON object")]
    NotAnObject,
}

// =============================================================================
// Free functions
// =============================================================================

/// Set both team entries of one match for `source`.
///
/// Returns `false` (and leaves the map untouched) when both entries already
/// hold the supplied canonical values.
pub fn upsert(
    aliases: &mut AliasMap,
    source: &str,
    native_home: &str,
    native_away: &str,
    canonical_home: &str,
    canonical_away: &str,
) -> bool {
    let table = aliases.entry(source.to_lowercase()).or_default();

    let unchanged = table.get(native_home).map(String::as_str) == Some(canonical_home)
        && table.get(native_away).map(String::as_str) == Some(canonical_away);
    if unchanged {
        return false;
    }

    table.insert(native_home.to_string(), canonical_home.to_string());
    table.insert(native_away.to_string(), canonical_away.to_string());
    true
}

/// Deterministic text form of the alias table.
pub fn render_aliases(aliases: &AliasMap) -> Result<String, MappingError> {
    let mut text = serde_json::to_string_pretty(aliases)?;
    text.push('\n');
    Ok(text)
}

/// Write the alias table to `path` via a sibling temp file and a rename.
pub fn persist(path: &Path, aliases: &AliasMap) -> Result<(), MappingError> {
    let text = render_aliases(aliases)?;
    let io_err = |source: io::Error| MappingError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    fs::write(&tmp_path, text.as_bytes()).map_err(io_err)?;
    fs::rename(&tmp_path, path).map_err(io_err)
}

/// Parse alias file contents. Source keys are lowercased, non-object source
/// entries are skipped, non-string names are stringified.
pub fn parse_aliases(text: &str) -> Result<AliasMap, MappingError> {
    let value: serde_json::Value = serde_json::from_str(text)?;
    let serde_json::Value::Object(sources) = value else {
        return Err(MappingError::NotAnObject);
    };

    let mut aliases = AliasMap::new();
    for (source, table) in sources {
        let serde_json::Value::Object(entries) = table else {
            warn!(source = %source, "Skipping non-object alias entry");
            continue;
        };
        let target = aliases.entry(source.to_lowercase()).or_default();
        for (native, canonical) in entries {
            let canonical = match canonical {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            };
            target.insert(native, canonical);
        }
    }
    Ok(aliases)
}

/// Load the alias file, falling back to an empty table on any problem.
pub fn load_aliases(path: &Path) -> AliasMap {
    if !path.exists() {
        warn!(path = %path.display(), "Alias file not found, starting empty");
        return AliasMap::new();
    }

    let loaded = fs::read_to_string(path)
        .map_err(|source| MappingError::Io {
            path: path.to_path_buf(),
            source,
        })
        .and_then(|text| parse_aliases(&text));

    match loaded {
        Ok(aliases) => {
            let entries: usize = aliases.values().map(BTreeMap::len).sum();
            info!(path = %path.display(), sources = aliases.len(), entries, "Alias file loaded");
            aliases
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Alias file unreadable, starting empty");
            AliasMap::new()
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// The alias table together with its backing file.
///
/// `dirty` records an in-memory change whose persistence has not succeeded
/// yet, so the next link request flushes it even when it changes nothing.
#[derive(Debug, Clone)]
pub struct MappingStore {
    aliases: AliasMap,
    path: PathBuf,
    dirty: bool,
}

impl MappingStore {
    pub fn new(path: impl Into<PathBuf>, aliases: AliasMap) -> Self {
        Self {
            aliases,
            path: path.into(),
            dirty: false,
        }
    }

    /// Open the store at `path`, loading whatever is there.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let aliases = load_aliases(&path);
        Self::new(path, aliases)
    }

    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn upsert(
        &mut self,
        source: &str,
        native_home: &str,
        native_away: &str,
        canonical_home: &str,
        canonical_away: &str,
    ) -> bool {
        let changed = upsert(
            &mut self.aliases,
            source,
            native_home,
            native_away,
            canonical_home,
            canonical_away,
        );
        if changed {
            self.dirty = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("mapping_store_{}_{}", name, std::process::id()))
            .join("aliases.json")
    }

    #[test]
    fn test_upsert_reports_change_once() {
        let mut map = AliasMap::new();
        assert!(upsert(&mut map, "A", "PSG", "OM", "Paris SG", "Olympique Marseille"));
        assert!(!upsert(&mut map, "a", "PSG", "OM", "Paris SG", "Olympique Marseille"));
        assert!(upsert(&mut map, "a", "PSG", "OM", "Paris Saint-Germain", "Olympique Marseille"));
        assert_eq!(map["a"]["PSG"], "Paris Saint-Germain");
        assert_eq!(map["a"].len(), 2);
    }

    #[test]
    fn test_render_is_sorted_with_trailing_newline() {
        let mut map = AliasMap::new();
        upsert(&mut map, "zeta", "b", "a", "B", "A");
        upsert(&mut map, "alpha", "Évian", "x", "Evian TG", "X");
        let text = render_aliases(&map).unwrap();
        let expected = "{\n  \"alpha\": {\n    \"x\": \"X\",\n    \"Évian\": \"Evian TG\"\n  },\n  \"zeta\": {\n    \"a\": \"A\",\n    \"b\": \"B\"\n  }\n}\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_persist_then_load_round_trips() {
        let path = temp_path("round_trip");
        let mut map = AliasMap::new();
        upsert(&mut map, "a_source", "PSG", "OM", "Paris SG", "Olympique Marseille");
        persist(&path, &map).unwrap();
        assert_eq!(load_aliases(&path), map);
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_parse_lowercases_and_skips_bad_entries() {
        let map = parse_aliases(r#"{"A_Source": {"PSG": "Paris SG", "n": 7}, "b": "oops"}"#).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map["a_source"]["PSG"], "Paris SG");
        assert_eq!(map["a_source"]["n"], "7");
    }

    #[test]
    fn test_parse_rejects_non_object() {
        assert!(matches!(parse_aliases("[1,2]"), Err(MappingError::NotAnObject)));
        assert!(matches!(parse_aliases("{"), Err(MappingError::Json(_))));
    }

    #[test]
    fn test_missing_file_loads_empty() {
        assert!(load_aliases(Path::new("/nonexistent/dir/aliases.json")).is_empty());
    }

    #[test]
    fn test_store_dirty_flag() {
        let path = temp_path("dirty");
        let mut store = MappingStore::new(&path, AliasMap::new());
        assert!(store.upsert("a", "x", "y", "X", "Y"));
        assert!(store.is_dirty());
        persist(store.path(), store.aliases()).unwrap();
        store.mark_clean();
        assert!(!store.is_dirty());
        assert!(!store.upsert("a", "x", "y", "X", "Y"));
        assert!(!store.is_dirty());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
