//! Hex-to-tile matching
//!
//! Picks the base, super and ortho images for a hex from a [`Catalog`].
//!
//! Super and ortho entries must match exactly, and every terrain an entry
//! matched is taken out of consideration for later entries in the same list.
//! Base entries are scored continuously and the best one wins:
//!
//! ```text
//! score = elevation_factor * terrain_factor * theme_factor     (in [0, 1])
//! ```
//!
//! Results are cached per hex *instance* ([`HexId`]), not per terrain value.
//! The board owner invalidates entries explicitly when hexes change.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::board::Board;
use crate::hex::{Hex, HexId};
use crate::terrain::{HexTerrain, Level, Terrain, TerrainKind};
use crate::tileset::{Catalog, ImageRef, TerrainEntry};

/// Theme factor when the hex has a theme and the entry has none.
pub const UNTHEMED_FALLBACK: f64 = 0.001;

/// Theme factor when the themes disagree otherwise.
pub const THEME_MISMATCH: f64 = 0.0001;

/// Elevation factor: 1.0 for wildcard or a satisfied "at least", otherwise
/// `1.01 / (|difference| + 1.01)`.
pub fn elevation_factor(hex: &HexTerrain, entry: &HexTerrain) -> f64 {
    let level = hex.level();
    match entry.elevation {
        Level::Wildcard => 1.0,
        Level::AtLeast(t) if level >= t => 1.0,
        Level::AtLeast(t) | Level::Exact(t) => 1.01 / ((level - t).abs() as f64 + 1.01),
    }
}

fn level_match(hex_terrain: &Terrain, entry_terrain: &Terrain) -> f64 {
    let level = hex_terrain.level.value().unwrap_or(0);
    let score = match entry_terrain.level {
        Level::Wildcard => 1.0,
        Level::AtLeast(t) if level >= t => 1.0,
        Level::AtLeast(t) | Level::Exact(t) => 1.0 / ((level - t).abs() as f64 + 1.0),
    };
    if entry_terrain.has_exits_specified() && !exits_equal(hex_terrain, entry_terrain) {
        score * 0.5
    } else {
        score
    }
}

fn exits_equal(hex_terrain: &Terrain, entry_terrain: &Terrain) -> bool {
    hex_terrain.exits.unwrap_or(0) == entry_terrain.exits.unwrap_or(0)
}

/// Terrain factor: summed per-type matches over the larger terrain count.
pub fn terrain_factor(hex: &HexTerrain, entry: &HexTerrain) -> f64 {
    let max_terrains = hex.terrains_present().max(entry.terrains_present());
    if max_terrains == 0 {
        return 1.0;
    }
    let matches: f64 = hex
        .terrains
        .iter()
        .filter_map(|(kind, hex_terrain)| {
            entry
                .terrain(*kind)
                .map(|entry_terrain| level_match(hex_terrain, entry_terrain))
        })
        .sum();
    matches / max_terrains as f64
}

fn themes_equal(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

/// Theme factor: exact match wins, untagged entries are a slight fallback,
/// and a mismatch never fully excludes an entry.
pub fn theme_factor(hex: &HexTerrain, entry: &HexTerrain) -> f64 {
    if themes_equal(hex.theme.as_deref(), entry.theme.as_deref()) {
        1.0
    } else if hex.theme.is_some() && entry.theme.is_none() {
        UNTHEMED_FALLBACK
    } else {
        THEME_MISMATCH
    }
}

/// Continuous base-image score in `[0, 1]`; 1.0 is a perfect match.
pub fn base_match_score(hex: &HexTerrain, entry: &HexTerrain) -> f64 {
    elevation_factor(hex, entry) * terrain_factor(hex, entry) * theme_factor(hex, entry)
}

/// Exact match used for super and ortho entries. Only the entry's conditions
/// are checked; the hex may carry more terrain. A themed hex matches an
/// unthemed entry.
pub fn exact_match(hex: &HexTerrain, entry: &HexTerrain) -> bool {
    if !entry.elevation.accepts(hex.level()) {
        return false;
    }
    if let Some(theme) = entry.theme.as_deref() {
        if !themes_equal(Some(theme), hex.theme.as_deref()) {
            return false;
        }
    }
    if hex.terrains_present() < entry.terrains_present() {
        return false;
    }
    entry.terrains.iter().all(|(kind, entry_terrain)| {
        hex.terrain(*kind).is_some_and(|hex_terrain| {
            let level_ok = match hex_terrain.level.value() {
                Some(level) => entry_terrain.level.accepts(level),
                None => entry_terrain.level == Level::Wildcard,
            };
            level_ok && (!entry_terrain.has_exits_specified() || exits_equal(hex_terrain, entry_terrain))
        })
    })
}

/// Images matched by one super or ortho pass and the terrain it claimed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayerMatch {
    pub images: Vec<ImageRef>,
    pub consumed: BTreeSet<TerrainKind>,
}

/// Run one exact-match pass over `entries` in order. Each matching entry adds
/// its image and removes its terrain types from what later entries see.
/// The input terrain is not modified.
pub fn match_layer(entries: &[TerrainEntry], terrain: &HexTerrain, seed: u64) -> LayerMatch {
    let mut remaining = terrain.clone();
    let mut result = LayerMatch::default();

    for entry in entries {
        if !exact_match(&remaining, &entry.pattern) {
            continue;
        }
        if let Some(image) = entry.image(seed) {
            result.images.push(image.clone());
        }
        for kind in entry.pattern.terrains.keys() {
            if remaining.terrains.remove(kind).is_some() {
                result.consumed.insert(*kind);
            }
        }
    }

    result
}

/// Best-scoring base image for the terrain, stopping at the first perfect match.
/// Metal deposits are ignored; they have no visual.
pub fn match_base(entries: &[TerrainEntry], terrain: &HexTerrain, seed: u64) -> Option<ImageRef> {
    let terrain = terrain.without(&[TerrainKind::MetalContent]);
    let mut best: Option<&TerrainEntry> = None;
    let mut best_score = -1.0;

    for entry in entries {
        let score = base_match_score(&terrain, &entry.pattern);
        if score == 1.0 {
            best = Some(entry);
            break;
        }
        if score > best_score {
            best = Some(entry);
            best_score = score;
        }
    }

    let entry = best?;
    if entry.images.is_empty() {
        return None;
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    entry.images.get(rng.gen_range(0..entry.images.len())).cloned()
}

/// How the three match stages share terrain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageComposition {
    /// Every stage sees the hex's full terrain.
    #[default]
    Independent,
    /// Ortho, then super, then base; each sees what the previous stage left.
    Chained,
}

/// Cached tiles for one hex.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchResult {
    /// `None` only if the catalog has no base entries.
    pub base: Option<ImageRef>,
    pub supers: Vec<ImageRef>,
    pub orthos: Vec<ImageRef>,
}

/// Run all three stages for a terrain.
pub fn compose(
    catalog: &Catalog,
    terrain: &HexTerrain,
    seed: u64,
    composition: StageComposition,
) -> MatchResult {
    match composition {
        StageComposition::Independent => MatchResult {
            orthos: match_layer(&catalog.orthos, terrain, seed).images,
            supers: match_layer(&catalog.supers, terrain, seed).images,
            base: match_base(&catalog.bases, terrain, seed),
        },
        StageComposition::Chained => {
            let orthos = match_layer(&catalog.orthos, terrain, seed);
            let after_orthos = terrain.without(&orthos.consumed);
            let supers = match_layer(&catalog.supers, &after_orthos, seed);
            let after_supers = after_orthos.without(&supers.consumed);
            MatchResult {
                base: match_base(&catalog.bases, &after_supers, seed),
                supers: supers.images,
                orthos: orthos.images,
            }
        }
    }
}

struct MatcherState {
    catalog: Arc<Catalog>,
    cache: HashMap<HexId, Arc<MatchResult>>,
    /// Bumped on every invalidation; warm-up results from an older
    /// generation are dropped.
    generation: u64,
}

impl MatcherState {
    fn invalidated(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

/// Tile matcher with a per-hex cache.
///
/// A single lock guards the catalog and the cache, so a lookup that misses
/// computes and stores under the same lock.
pub struct HexMatcher {
    state: Mutex<MatcherState>,
    composition: StageComposition,
    warned_missing_base: AtomicBool,
}

impl HexMatcher {
    /// Matcher over `catalog` with an empty cache.
    pub fn new(catalog: Catalog, composition: StageComposition) -> Self {
        Self {
            state: Mutex::new(MatcherState {
                catalog: Arc::new(catalog),
                cache: HashMap::new(),
                generation: 0,
            }),
            composition,
            warned_missing_base: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MatcherState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// How the match stages share terrain.
    pub fn composition(&self) -> StageComposition {
        self.composition
    }

    /// The catalog currently matched against.
    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(&self.lock().catalog)
    }

    fn compute(&self, catalog: &Catalog, hex: &Hex) -> MatchResult {
        let result = compose(catalog, hex.terrain(), hex.coords().seed(), self.composition);
        if result.base.is_none() && !self.warned_missing_base.swap(true, Ordering::Relaxed) {
            warn!("no base tile for hex {}; the tileset needs a wildcard base entry", hex.coords());
        }
        result
    }

    /// Match the hex afresh and store the result, replacing any cached one.
    pub fn assign_and_cache(&self, hex: &Hex) -> Arc<MatchResult> {
        let mut state = self.lock();
        let result = Arc::new(self.compute(&state.catalog, hex));
        state.cache.insert(hex.id(), Arc::clone(&result));
        result
    }

    /// Cached tiles for the hex, matching it first if needed.
    pub fn matches(&self, hex: &Hex) -> Arc<MatchResult> {
        let mut state = self.lock();
        if let Some(cached) = state.cache.get(&hex.id()) {
            return Arc::clone(cached);
        }
        let result = Arc::new(self.compute(&state.catalog, hex));
        state.cache.insert(hex.id(), Arc::clone(&result));
        result
    }

    /// Base image of the hex, if the catalog has one for it.
    pub fn base(&self, hex: &Hex) -> Option<ImageRef> {
        self.matches(hex).base.clone()
    }

    /// Super images of the hex, in catalog order.
    pub fn supers(&self, hex: &Hex) -> Vec<ImageRef> {
        self.matches(hex).supers.clone()
    }

    /// Ortho images of the hex, in catalog order.
    pub fn orthos(&self, hex: &Hex) -> Vec<ImageRef> {
        self.matches(hex).orthos.clone()
    }

    /// Whether a match is stored for the hex with this id.
    pub fn is_cached(&self, id: HexId) -> bool {
        self.lock().cache.contains_key(&id)
    }

    /// Number of stored matches.
    pub fn cached_len(&self) -> usize {
        self.lock().cache.len()
    }

    /// Forget the tiles of one hex after its terrain changed.
    pub fn clear_hex(&self, id: HexId) {
        let mut state = self.lock();
        state.cache.remove(&id);
        state.invalidated();
    }

    /// Forget all tiles, e.g. after the board was replaced or all hexes changed.
    pub fn clear_all(&self) {
        let mut state = self.lock();
        state.cache.clear();
        state.invalidated();
    }

    /// Swap in a freshly loaded catalog and drop every cached match.
    pub fn reload(&self, catalog: Catalog) {
        let mut state = self.lock();
        state.catalog = Arc::new(catalog);
        state.cache.clear();
        state.invalidated();
    }

    /// Match every uncached hex of the board in parallel and store the results.
    ///
    /// Matching runs outside the lock against a snapshot of the catalog. If
    /// the cache was invalidated meanwhile (hex changed, board replaced,
    /// catalog reloaded) the whole batch is dropped.
    pub fn warm(&self, board: &Board) {
        let (catalog, generation, pending) = {
            let state = self.lock();
            let pending: Vec<&Hex> = board.hexes().filter(|hex| !state.cache.contains_key(&hex.id())).collect();
            (Arc::clone(&state.catalog), state.generation, pending)
        };
        if pending.is_empty() {
            return;
        }

        let computed: Vec<(HexId, MatchResult)> = pending
            .par_iter()
            .map(|hex| (hex.id(), self.compute(&catalog, hex)))
            .collect();

        let stored = self.store_warmed(generation, computed);
        debug!("warmed {} hex matches", stored);
    }

    /// Store warm-up results computed at `generation`. Returns how many were kept.
    fn store_warmed(&self, generation: u64, computed: Vec<(HexId, MatchResult)>) -> usize {
        let mut state = self.lock();
        if state.generation != generation {
            debug!("cache invalidated during warm-up; discarding {} matches", computed.len());
            return 0;
        }
        let count = computed.len();
        for (id, result) in computed {
            state.cache.entry(id).or_insert_with(|| Arc::new(result));
        }
        count
    }
}
