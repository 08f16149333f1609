//! Map Catalog
//!
//! Maps are plain-text grids stored as `<name>.txt` in one directory. They
//! are parsed when the catalog loads, so a lobby can only ever select a map
//! that will build an arena.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::game::arena::Arena;
use crate::game::error::MapError;

/// Name of the built-in map.
pub const DEFAULT_MAP_NAME: &str = "default";

/// Built-in 17x15 arena used when no map directory is available.
pub const DEFAULT_MAP: &str = "\
#################
#S.X.X.X.X.X.X.S#
#.#.#.#.#.#.#.#.#
#X.X.X.X.X.X.X.X#
#.#.#.#O#.#.#.#.#
#X.X.X.X.X.X.X.X#
#.#.#.#.#.#.#.#.#
#X.X.X.X.X.X.X.X#
#.#.#.#O#.#.#.#.#
#X.X.X.X.X.X.X.X#
#.#.#.#.#.#.#.#.#
#X.X.X.X.X.X.X.X#
#.#.#.#.#.#.#.#.#
#S.X.X.X.X.X.X.S#
#################
";

/// Validated map texts keyed by name.
#[derive(Debug, Clone)]
pub struct MapCatalog {
    maps: BTreeMap<String, String>,
}

impl MapCatalog {
    /// Catalog holding only the built-in map.
    pub fn builtin() -> Self {
        let mut maps = BTreeMap::new();
        maps.insert(DEFAULT_MAP_NAME.to_string(), DEFAULT_MAP.to_string());
        Self { maps }
    }

    /// Load every `*.txt` file in `dir`.
    ///
    /// Unreadable or invalid maps are logged and skipped. The built-in map
    /// is present unless the directory supplies its own `default.txt`.
    pub fn load(dir: &Path) -> std::io::Result<Self> {
        let mut catalog = Self::builtin();

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("txt") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Skipping map {}: {}", path.display(), e);
                    continue;
                }
            };

            if let Err(e) = catalog.insert(name, text) {
                warn!("Skipping map {}: {}", path.display(), e);
            }
        }

        info!("Loaded {} maps from {}", catalog.maps.len(), dir.display());
        Ok(catalog)
    }

    /// Load from `dir`, falling back to the built-in map on I/O failure.
    pub fn load_or_builtin(dir: &Path) -> Self {
        match Self::load(dir) {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Maps directory {} unavailable ({}); using built-in map", dir.display(), e);
                Self::builtin()
            }
        }
    }

    /// Add or replace a map after checking that it parses.
    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) -> Result<(), MapError> {
        let text = text.into();
        Arena::parse(&text)?;
        self.maps.insert(name.into(), text);
        Ok(())
    }

    /// Sorted map names.
    pub fn names(&self) -> Vec<String> {
        self.maps.keys().cloned().collect()
    }

    /// Map text by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.maps.get(name).map(String::as_str)
    }

    /// Whether `name` is known.
    pub fn contains(&self, name: &str) -> bool {
        self.maps.contains_key(name)
    }

    /// Number of maps.
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// True if no maps are known.
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }
}

impl Default for MapCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("blast_arena_maps_{}_{}", tag, uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_builtin_map_parses() {
        let arena = Arena::parse(DEFAULT_MAP).unwrap();
        assert_eq!(arena.width(), 17);
        assert_eq!(arena.height(), 15);
        assert_eq!(arena.spawn_points().len(), 4);
    }

    #[test]
    fn test_load_directory() {
        let dir = scratch_dir("load");
        fs::write(dir.join("small.txt"), "#####\n#S.S#\n#####\n").unwrap();
        fs::write(dir.join("broken.txt"), "#?#\n").unwrap();
        fs::write(dir.join("notes.md"), "not a map").unwrap();

        let catalog = MapCatalog::load(&dir).unwrap();
        assert_eq!(catalog.names(), vec!["default".to_string(), "small".to_string()]);
        assert!(catalog.get("small").unwrap().starts_with("#####"));
        assert!(!catalog.contains("broken"));
        assert!(!catalog.contains("notes"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_directory_overrides_default() {
        let dir = scratch_dir("override");
        fs::write(dir.join("default.txt"), "###\n#S#\n###\n").unwrap();

        let catalog = MapCatalog::load(&dir).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("default"), Some("###\n#S#\n###\n"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_insert_validates() {
        let mut catalog = MapCatalog::builtin();
        assert!(catalog.insert("tiny", "S.S").is_ok());
        assert!(matches!(catalog.insert("bad", "S?S"), Err(MapError::InvalidGlyph { .. })));
        assert_eq!(catalog.names(), vec!["default".to_string(), "tiny".to_string()]);
    }

    #[test]
    fn test_missing_directory_falls_back() {
        let dir = std::env::temp_dir().join("blast_arena_maps_does_not_exist_9f2c");
        let catalog = MapCatalog::load_or_builtin(&dir);
        assert_eq!(catalog.names(), vec![DEFAULT_MAP_NAME.to_string()]);
    }
}
