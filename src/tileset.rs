//! Tileset catalog: the ordered base, super and ortho terrain entries
//!
//! A tileset definition file is line oriented:
//!
//! ```text
//! base   0   ""           ""        "boring/grass.gif"
//! super  *   "woods:1"    ""        "woods/light_1.gif;woods/light_2.gif"
//! base   >4  ""           "winter"  "mountain/peak.gif"
//! include "winter.tileset"
//! ```
//!
//! Entries keep file order; matching depends on it. Includes are resolved
//! relative to the including file and flattened into the same lists.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::TilesetError;
use crate::terrain::{HexTerrain, Level};
use crate::tokens::tokenize;

/// Theme every tileset offers for rendering hexes without tiles.
pub const TRANSPARENT_THEME: &str = "transparent";

/// Maximum nesting of `include` directives.
pub const MAX_INCLUDE_DEPTH: usize = 100;

/// Reference to a tile image, relative to the tileset image directory.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ImageRef {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One catalog template: the terrain it stands for and its candidate images.
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainEntry {
    pub pattern: HexTerrain,
    pub images: Vec<ImageRef>,
}

impl TerrainEntry {
    /// An entry for `pattern` with its candidate images.
    pub fn new(pattern: HexTerrain, images: Vec<ImageRef>) -> Self {
        Self { pattern, images }
    }

    /// Pick a candidate image by seed.
    pub fn image(&self, seed: u64) -> Option<&ImageRef> {
        if self.images.is_empty() {
            return None;
        }
        self.images.get((seed % self.images.len() as u64) as usize)
    }
}

/// Which list an entry belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    Base,
    Super,
    Ortho,
}

impl Layer {
    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "base" => Some(Layer::Base),
            "super" => Some(Layer::Super),
            "ortho" => Some(Layer::Ortho),
            _ => None,
        }
    }
}

/// The loaded tileset. Immutable once built; a reload builds a new one.
#[derive(Clone, Debug)]
pub struct Catalog {
    pub bases: Vec<TerrainEntry>,
    pub supers: Vec<TerrainEntry>,
    pub orthos: Vec<TerrainEntry>,
    pub themes: BTreeSet<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        let mut themes = BTreeSet::new();
        themes.insert(TRANSPARENT_THEME.to_string());
        Self {
            bases: Vec::new(),
            supers: Vec::new(),
            orthos: Vec::new(),
            themes,
        }
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to a layer, recording its theme.
    pub fn push(&mut self, layer: Layer, entry: TerrainEntry) {
        if let Some(theme) = &entry.pattern.theme {
            self.themes.insert(theme.clone());
        }
        match layer {
            Layer::Base => self.bases.push(entry),
            Layer::Super => self.supers.push(entry),
            Layer::Ortho => self.orthos.push(entry),
        }
    }

    /// Builder form of [`Catalog::push`].
    pub fn with_entry(mut self, layer: Layer, entry: TerrainEntry) -> Self {
        self.push(layer, entry);
        self
    }

    /// Every base, super and ortho image the catalog refers to.
    pub fn image_refs(&self) -> impl Iterator<Item = &ImageRef> {
        self.bases
            .iter()
            .chain(&self.supers)
            .chain(&self.orthos)
            .flat_map(|entry| entry.images.iter())
    }

    /// A usable catalog must offer at least one base entry to fall back on.
    pub fn validate(&self) -> Result<(), TilesetError> {
        if self.bases.is_empty() {
            return Err(TilesetError::NoBaseEntry);
        }
        if !self
            .bases
            .iter()
            .any(|e| e.pattern.elevation == Level::Wildcard && e.pattern.terrains.is_empty())
        {
            warn!("tileset has no wildcard base entry for the empty hex");
        }
        Ok(())
    }

    /// Load a tileset file and everything it includes.
    pub fn load(path: &Path) -> Result<Self, TilesetError> {
        let start = Instant::now();
        let mut catalog = Catalog::new();
        catalog.load_file(path, 0)?;
        catalog.validate()?;

        debug!(
            "loaded {} base, {} super and {} ortho entries",
            catalog.bases.len(),
            catalog.supers.len(),
            catalog.orthos.len()
        );
        info!(
            "tileset {} loaded in {}ms",
            path.display(),
            start.elapsed().as_millis()
        );
        Ok(catalog)
    }

    fn load_file(&mut self, path: &Path, depth: usize) -> Result<(), TilesetError> {
        let text = std::fs::read_to_string(path).map_err(|source| TilesetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

        for (line_idx, raw) in text.lines().enumerate() {
            let line = line_idx + 1;
            let tokens = tokenize(raw).map_err(|source| TilesetError::Token {
                path: path.to_path_buf(),
                line,
                source,
            })?;
            let Some(keyword) = tokens.first() else {
                continue;
            };

            if keyword == "include" {
                let Some(file) = tokens.get(1) else {
                    return Err(TilesetError::Syntax {
                        path: path.to_path_buf(),
                        line,
                        message: "include needs a file name".to_string(),
                    });
                };
                if depth + 1 >= MAX_INCLUDE_DEPTH {
                    warn!("{}:{}: include depth limit reached, skipping {}", path.display(), line, file);
                    continue;
                }
                debug!("including {}", file);
                self.load_file(&base_dir.join(file), depth + 1)?;
                continue;
            }

            let Some(layer) = Layer::from_keyword(keyword) else {
                continue;
            };
            if tokens.len() < 5 {
                return Err(TilesetError::Syntax {
                    path: path.to_path_buf(),
                    line,
                    message: format!(
                        "expected `{} <elevation> \"terrain\" \"theme\" \"images\"`",
                        keyword
                    ),
                });
            }

            let elevation: Level = tokens[1].parse().map_err(|source| TilesetError::Terrain {
                path: path.to_path_buf(),
                line,
                source,
            })?;
            let pattern = HexTerrain::parse(elevation, &tokens[2], &tokens[3]).map_err(|source| {
                TilesetError::Terrain {
                    path: path.to_path_buf(),
                    line,
                    source,
                }
            })?;
            let images: Vec<ImageRef> = tokens[4]
                .split(';')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(ImageRef::from)
                .collect();
            if images.is_empty() {
                warn!("{}:{}: entry has no images, skipped", path.display(), line);
                continue;
            }

            self.push(layer, TerrainEntry::new(pattern, images));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::TerrainKind;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hex_terrain_view_{}_{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_load_entries_and_themes() {
        let dir = scratch_dir("tileset_basic");
        let path = dir.join("main.tileset");
        std::fs::write(
            &path,
            r#"
# generic
base * "" "" "boring/grass.gif"
base >4 "" "winter" "snow/peak.gif"
super * "woods:1" "" "woods/l1.gif;woods/l2.gif"
ortho * "bridge:*:9" "" "bridge/b9.gif"
"#,
        )
        .unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.bases.len(), 2);
        assert_eq!(catalog.supers.len(), 1);
        assert_eq!(catalog.orthos.len(), 1);
        assert_eq!(catalog.bases[1].pattern.elevation, Level::AtLeast(4));
        assert_eq!(catalog.supers[0].images.len(), 2);
        assert_eq!(
            catalog.orthos[0].pattern.terrain(TerrainKind::Bridge).unwrap().exits,
            Some(9)
        );
        assert!(catalog.themes.contains("winter"));
        assert!(catalog.themes.contains(TRANSPARENT_THEME));
    }

    #[test]
    fn test_include_is_flattened_in_order() {
        let dir = scratch_dir("tileset_include");
        std::fs::write(dir.join("extra.tileset"), "base 1 \"\" \"\" \"one.gif\"\n").unwrap();
        let path = dir.join("main.tileset");
        std::fs::write(
            &path,
            "base 0 \"\" \"\" \"zero.gif\"\ninclude \"extra.tileset\"\nbase * \"\" \"\" \"any.gif\"\n",
        )
        .unwrap();

        let catalog = Catalog::load(&path).unwrap();
        let names: Vec<&str> = catalog.bases.iter().map(|e| e.images[0].as_str()).collect();
        assert_eq!(names, vec!["zero.gif", "one.gif", "any.gif"]);
    }

    #[test]
    fn test_circular_include_terminates() {
        let dir = scratch_dir("tileset_cycle");
        let path = dir.join("loop.tileset");
        std::fs::write(&path, "base * \"\" \"\" \"g.gif\"\ninclude \"loop.tileset\"\n").unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.bases.len(), MAX_INCLUDE_DEPTH);
    }

    #[test]
    fn test_missing_base_is_rejected() {
        let dir = scratch_dir("tileset_nobase");
        let path = dir.join("supers.tileset");
        std::fs::write(&path, "super * \"woods:1\" \"\" \"w.gif\"\n").unwrap();
        assert!(matches!(Catalog::load(&path), Err(TilesetError::NoBaseEntry)));
    }

    #[test]
    fn test_bad_terrain_reports_line() {
        let dir = scratch_dir("tileset_bad");
        let path = dir.join("bad.tileset");
        std::fs::write(&path, "\nbase * \"lava:1\" \"\" \"l.gif\"\n").unwrap();
        match Catalog::load(&path) {
            Err(TilesetError::Terrain { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_quote_reports_line() {
        let dir = scratch_dir("tileset_quote");
        let path = dir.join("quote.tileset");
        std::fs::write(&path, "base * \"\" \"\" \"g.gif\"\nbase 1 \"woods:1 \"\" \"w.gif\n").unwrap();
        match Catalog::load(&path) {
            Err(TilesetError::Token { line, source, .. }) => {
                assert_eq!(line, 2);
                assert!(matches!(source, crate::error::TokenError::UnterminatedQuote { .. }));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_entry_image_by_seed() {
        let entry = TerrainEntry::new(
            HexTerrain::default(),
            vec![ImageRef::from("a"), ImageRef::from("b"), ImageRef::from("c")],
        );
        assert_eq!(entry.image(4).unwrap().as_str(), "b");
        assert_eq!(entry.image(4), entry.image(4));
    }
}
