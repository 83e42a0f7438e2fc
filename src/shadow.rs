//! Terrain shadow map
//!
//! Builds one translucent, board-sized overlay holding the shadows of
//! elevation steps, woods, buildings and bridges for a lighting condition.
//!
//! Algorithm:
//! 1. Blur the generic hex mask into a shadow stamp (twice at night)
//! 2. Bucket hexes by elevation; only rim hexes of a plateau cast shadows
//! 3. Per elevation level, build a clip region from slightly enlarged hexes
//! 4. Collect the elevation differences present, capped at [`MAX_DIFFERENCE`]
//! 5. Pre-render one streak image per difference by stamping along the light vector
//! 6. Stamp streaks from higher casters onto each lower level's clip region
//! 7. Stamp blurred super/ortho images for woods, buildings and bridges
//!
//! Any unmet precondition or missing image yields no map at all; callers
//! simply render without shadows until the next rebuild.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use image::RgbaImage;
use tracing::{debug, info};

use crate::board::Board;
use crate::error::ShadowError;
use crate::geometry::{board_pixel_size, hex_location, Polygon, HEX_H, HEX_W};
use crate::hex::Coords;
use crate::images::TileImages;
use crate::lighting::{GamePhase, Light, LightVector};
use crate::matcher::HexMatcher;
use crate::raster::{blurred_shadow, stamp, ClipMask};
use crate::terrain::TerrainKind;
use crate::tileset::ImageRef;

/// Largest elevation difference that gets its own streak length.
pub const MAX_DIFFERENCE: i32 = 35;

/// Stamps per level of height for elevation shadows.
pub const ELEVATION_STEPS: i32 = 10;

/// Stamps per level of height for woods, building and bridge shadows.
pub const FEATURE_STEPS: i32 = 5;

/// First stamp of an elevation streak when hex inclines are drawn.
pub const INCLINE_START_STEP: i32 = 4;

/// Enlargement of hex outlines in clip regions, closing seams between hexes.
pub const CLIP_SCALE: f64 = 1.02;

/// Woods are two levels high but look best casting 1.5 levels of shadow.
const FOLIAGE_HEIGHT_FACTOR: f64 = 0.75;

/// User-facing switches for shadow rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShadowSettings {
    pub enabled: bool,
    pub hex_inclines: bool,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            hex_inclines: false,
        }
    }
}

/// Hexes bucketed by elevation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElevationField {
    /// Every hex, by level.
    pub levels: BTreeMap<i32, BTreeSet<Coords>>,
    /// Hexes that cast elevation shadows, by level. Has a (possibly empty)
    /// entry for every level in `levels`.
    pub casters: BTreeMap<i32, BTreeSet<Coords>>,
}

impl ElevationField {
    /// Bucket the board's hexes. A hex casts a shadow unless each of its
    /// neighbours in `shadow_dirs` is on the board and not lower than it.
    pub fn from_board(board: &Board, shadow_dirs: [usize; 3]) -> Self {
        let mut field = Self::default();
        for hex in board.hexes() {
            let c = hex.coords();
            let level = hex.level();
            field.levels.entry(level).or_default().insert(c);
            let casters = field.casters.entry(level).or_default();

            let surrounded = shadow_dirs.iter().all(|&dir| {
                let n = c.translated(dir);
                board.contains(n) && board.hex(n).map_or(true, |nh| nh.level() >= level)
            });
            if !surrounded {
                casters.insert(c);
            }
        }
        field
    }

    /// Capped differences between every level and each higher level.
    pub fn difference_buckets(&self) -> BTreeSet<i32> {
        let mut diffs = BTreeSet::new();
        for &shadowed in self.levels.keys() {
            for &caster in self.levels.range(shadowed + 1..).map(|(level, _)| level) {
                diffs.insert((caster - shadowed).min(MAX_DIFFERENCE));
            }
        }
        diffs
    }

    /// Clip region of a level: the union of its hexes, slightly enlarged.
    /// `None` if no hex sits at that level.
    pub fn clip_mask(&self, level: i32, width: u32, height: u32) -> Option<ClipMask> {
        let coords = self.levels.get(&level)?;
        let polygons: Vec<Polygon> = coords.iter().map(|&c| Polygon::hex(c, CLIP_SCALE)).collect();
        Some(ClipMask::from_polygons(width, height, &polygons))
    }
}

/// One elevation streak drawn onto a lower level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ElevationStamp {
    pub shadowed_level: i32,
    pub caster: Coords,
    pub difference: i32,
}

/// What went into a shadow map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShadowStats {
    pub difference_buckets: BTreeSet<i32>,
    pub elevation_stamps: Vec<ElevationStamp>,
    pub foliage_stamps: usize,
    pub building_stamps: usize,
    pub bridge_stamps: usize,
}

/// A composited shadow overlay at zoom 1.
#[derive(Clone, Debug)]
pub struct ShadowMap {
    pub image: RgbaImage,
    pub stats: ShadowStats,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum MaskSource {
    HexMask,
    Tile(ImageRef),
}

/// Builds shadow maps and keeps blurred masks between builds.
pub struct ShadowCompositor {
    matcher: Arc<HexMatcher>,
    images: Arc<TileImages>,
    settings: ShadowSettings,
    masks: Mutex<HashMap<(MaskSource, u32), Arc<RgbaImage>>>,
}

impl ShadowCompositor {
    /// Compositor drawing tiles from `images` as chosen by `matcher`.
    pub fn new(matcher: Arc<HexMatcher>, images: Arc<TileImages>, settings: ShadowSettings) -> Self {
        Self {
            matcher,
            images,
            settings,
            masks: Mutex::new(HashMap::new()),
        }
    }

    /// Change the shadow switches; takes effect on the next `compose`.
    pub fn set_settings(&mut self, settings: ShadowSettings) {
        self.settings = settings;
    }

    /// Drop all blurred masks, e.g. after the tile images were reloaded.
    pub fn clear_cache(&self) {
        self.lock_masks().clear();
    }

    /// Number of blurred masks held in the cache.
    pub fn cached_masks(&self) -> usize {
        self.lock_masks().len()
    }

    fn lock_masks(&self) -> MutexGuard<'_, HashMap<(MaskSource, u32), Arc<RgbaImage>>> {
        self.masks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Build the shadow map for the board, or `None` when shadows are not
    /// shown or could not be produced.
    pub fn compose(&self, board: &Board, light: Light, phase: GamePhase) -> Option<ShadowMap> {
        if !self.settings.enabled {
            debug!("shadow map disabled");
            return None;
        }
        if board.is_space() || board.is_sky() {
            debug!("no shadow map on {:?} boards", board.board_type());
            return None;
        }
        if !board.has_size() {
            debug!("board size unknown; no shadow map");
            return None;
        }
        if !self.images.is_loaded() {
            debug!("tile images not loaded; no shadow map");
            return None;
        }
        if phase.is_unknown() {
            debug!("board editor phase; no shadow map");
            return None;
        }

        let start = Instant::now();
        match self.build(board, light) {
            Ok(map) => {
                let memory = map.image.width() as u64 * map.image.height() as u64 * 4 / 1_000_000;
                info!(
                    "shadow map prepared in {:.1}ms; memory (roughly) {} MB",
                    start.elapsed().as_secs_f64() * 1000.0,
                    memory
                );
                Some(map)
            }
            Err(e) => {
                debug!("shadow map not built: {}", e);
                None
            }
        }
    }

    fn blurred(&self, source: MaskSource, passes: u32) -> Result<Arc<RgbaImage>, ShadowError> {
        let key = (source, passes);
        if let Some(mask) = self.lock_masks().get(&key) {
            return Ok(Arc::clone(mask));
        }

        let original = match &key.0 {
            MaskSource::HexMask => self.images.hex_mask().ok_or(ShadowError::MissingHexMask)?,
            MaskSource::Tile(image_ref) => self
                .images
                .get(image_ref)
                .ok_or_else(|| ShadowError::MissingImage(image_ref.to_string()))?,
        };
        if original.width() == 0 || original.height() == 0 {
            return Err(match &key.0 {
                MaskSource::HexMask => ShadowError::MissingHexMask,
                MaskSource::Tile(image_ref) => ShadowError::MissingImage(image_ref.to_string()),
            });
        }

        let mask = Arc::new(blurred_shadow(&original, passes));
        self.lock_masks().insert(key, Arc::clone(&mask));
        Ok(mask)
    }

    fn build(&self, board: &Board, light: Light) -> Result<ShadowMap, ShadowError> {
        let passes = light.blur_passes();
        let hex_shadow = self.blurred(MaskSource::HexMask, passes)?;

        let (width, height) = board_pixel_size(board);
        let mut image = RgbaImage::new(width, height);
        let mut stats = ShadowStats::default();
        let direction = light.light_direction();

        let field = ElevationField::from_board(board, direction.shadow_directions());
        stats.difference_buckets = field.difference_buckets();

        let streaks: BTreeMap<i32, RgbaImage> = stats
            .difference_buckets
            .iter()
            .map(|&diff| {
                (
                    diff,
                    streak_image(&hex_shadow, direction, diff, self.settings.hex_inclines),
                )
            })
            .collect();

        let step = direction.scaled(1.0 / FEATURE_STEPS as f64);
        for &shadowed in field.levels.keys() {
            // one level's clip region is alive at a time
            let Some(clip) = field.clip_mask(shadowed, width, height) else {
                continue;
            };
            let clip = &clip;

            // Elevation shadows
            for (&caster_level, casters) in field.casters.range(shadowed + 1..) {
                let diff = (caster_level - shadowed).min(MAX_DIFFERENCE);
                let Some(streak) = streaks.get(&diff) else {
                    continue;
                };
                let offset_x = (direction.x.abs() * diff as f64 + HEX_W as f64) as i32;
                let offset_y = (direction.y.abs() * diff as f64 + HEX_H as f64) as i32;
                for &c in casters {
                    let (x0, y0) = hex_location(c);
                    stamp(&mut image, streak, x0 - offset_x, y0 - offset_y, Some(clip));
                    stats.elevation_stamps.push(ElevationStamp {
                        shadowed_level: shadowed,
                        caster: c,
                        difference: diff,
                    });
                }
            }

            // Woods, building and bridge shadows
            for (&caster_level, coords) in &field.levels {
                for &c in coords {
                    let Some(hex) = board.hex(c) else {
                        continue;
                    };
                    let terrain = hex.terrain();
                    let origin = hex_location(c);

                    let has_foliage = terrain.contains(TerrainKind::Woods) || terrain.contains(TerrainKind::Jungle);
                    let has_building = terrain.contains(TerrainKind::Building);
                    if has_foliage || has_building {
                        if let Some(last) = self.matcher.supers(hex).last() {
                            let mask = self.blurred(MaskSource::Tile(last.clone()), passes)?;

                            if has_foliage {
                                if let Some(foliage) = terrain.level_of(TerrainKind::FoliageElev) {
                                    let reach = caster_level as f64 + FOLIAGE_HEIGHT_FACTOR * foliage as f64
                                        - shadowed as f64;
                                    if reach > 0.0 {
                                        let count = (FEATURE_STEPS as f64 * reach) as i32;
                                        stats.foliage_stamps +=
                                            stamp_along(&mut image, &mask, origin, step, count, clip);
                                    }
                                }
                            }

                            if has_building {
                                if let Some(bldg) = terrain.level_of(TerrainKind::BldgElev) {
                                    let reach = caster_level + bldg - shadowed;
                                    if reach > 0 {
                                        stats.building_stamps += stamp_along(
                                            &mut image,
                                            &mask,
                                            origin,
                                            step,
                                            FEATURE_STEPS * reach,
                                            clip,
                                        );
                                    }
                                }
                            }
                        }
                    }

                    if terrain.contains(TerrainKind::Bridge) {
                        let orthos = self.matcher.orthos(hex);
                        let Some(last) = orthos.last() else {
                            continue;
                        };
                        let mask = self.blurred(MaskSource::Tile(last.clone()), passes)?;
                        if let Some(bridge) = terrain.level_of(TerrainKind::BridgeElev) {
                            let distance = (FEATURE_STEPS * (caster_level + bridge - shadowed)) as f64;
                            let x = (origin.0 as f64 + step.x * distance) as i32;
                            let y = (origin.1 as f64 + step.y * distance) as i32;
                            // the mask is translucent; repeat it to darken
                            for _ in 0..FEATURE_STEPS {
                                stamp(&mut image, &mask, x, y, Some(clip));
                                stats.bridge_stamps += 1;
                            }
                        }
                    }
                }
            }
        }

        Ok(ShadowMap { image, stats })
    }
}

/// Stamp `mask` `count` times starting at `origin`, moving by `step` each time.
fn stamp_along(
    image: &mut RgbaImage,
    mask: &RgbaImage,
    origin: (i32, i32),
    step: LightVector,
    count: i32,
    clip: &ClipMask,
) -> usize {
    let mut x = origin.0 as f64;
    let mut y = origin.1 as f64;
    let mut stamped = 0;
    for _ in 0..count {
        stamp(image, mask, x as i32, y as i32, Some(clip));
        x += step.x;
        y += step.y;
        stamped += 1;
    }
    stamped
}

/// Streak for an elevation difference: the hex shadow stamped from the image
/// centre along the light vector, ten stamps per level.
fn streak_image(hex_shadow: &RgbaImage, direction: LightVector, diff: i32, inclines: bool) -> RgbaImage {
    let n = ELEVATION_STEPS as f64;
    let width = ((direction.x.abs() * diff as f64 + HEX_W as f64) as u32) * 2;
    let height = ((direction.y.abs() * diff as f64 + HEX_H as f64) as u32) * 2;
    let mut image = RgbaImage::new(width, height);

    let step = direction.scaled(1.0 / n);
    let centre_x = width as f64 / 2.0;
    let centre_y = height as f64 / 2.0;
    // with inclines, one-level steps only get a faint shadow
    let (first, last) = if inclines {
        (INCLINE_START_STEP, (n * (diff as f64 - 0.4)) as i32)
    } else {
        (0, ELEVATION_STEPS * diff)
    };

    for i in first..last {
        let x = centre_x + step.x * i as f64;
        let y = centre_y + step.y * i as f64;
        stamp(&mut image, hex_shadow, x as i32, y as i32, None);
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::StageComposition;
    use crate::terrain::{HexTerrain, Level, Terrain};
    use crate::tileset::{Catalog, Layer, TerrainEntry};
    use image::Rgba;

    fn base_catalog() -> Catalog {
        Catalog::new().with_entry(
            Layer::Base,
            TerrainEntry::new(
                HexTerrain {
                    elevation: Level::Wildcard,
                    ..HexTerrain::default()
                },
                vec![ImageRef::from("grass.png")],
            ),
        )
    }

    fn loaded_images() -> Arc<TileImages> {
        let images = TileImages::in_memory().with_generated_hex_mask();
        images.mark_loaded();
        Arc::new(images)
    }

    fn compositor(catalog: Catalog, images: Arc<TileImages>) -> ShadowCompositor {
        let matcher = Arc::new(HexMatcher::new(catalog, StageComposition::Independent));
        ShadowCompositor::new(matcher, images, ShadowSettings::default())
    }

    fn tiny_tile() -> RgbaImage {
        RgbaImage::from_pixel(HEX_W, HEX_H, Rgba([30, 90, 30, 255]))
    }

    #[test]
    fn test_field_partitions_hexes() {
        let mut board = Board::filled(4, 3, &HexTerrain::flat(0));
        board.set_hex(Coords::new(1, 1), HexTerrain::flat(2)).unwrap();
        board.set_hex(Coords::new(3, 2), HexTerrain::flat(-1)).unwrap();

        let field = ElevationField::from_board(&board, [4, 5, 3]);
        let total: usize = field.levels.values().map(BTreeSet::len).sum();
        assert_eq!(total, 12);
        let mut seen = BTreeSet::new();
        for coords in field.levels.values() {
            for c in coords {
                assert!(seen.insert(*c));
            }
        }
        assert_eq!(field.levels.keys().copied().collect::<Vec<_>>(), vec![-1, 0, 2]);
        assert_eq!(field.casters.len(), field.levels.len());
    }

    #[test]
    fn test_plateau_interior_does_not_cast() {
        let board = Board::filled(3, 3, &HexTerrain::flat(1));
        let field = ElevationField::from_board(&board, [4, 5, 3]);
        // (2, 1) has all of SW, NW and S on board at equal height
        assert!(!field.casters[&1].contains(&Coords::new(2, 1)));
        // the north-west neighbour of (2, 0) is off the board
        assert!(field.casters[&1].contains(&Coords::new(2, 0)));
        // column 0 has nothing to its west
        assert!(field.casters[&1].contains(&Coords::new(0, 1)));
    }

    #[test]
    fn test_higher_neighbour_still_surrounds() {
        let mut board = Board::filled(3, 3, &HexTerrain::flat(0));
        board.set_hex(Coords::new(1, 2), HexTerrain::flat(5)).unwrap();
        let field = ElevationField::from_board(&board, [4, 5, 3]);
        // south of (1, 1) is higher, SW and NW are level
        assert!(!field.casters[&0].contains(&Coords::new(1, 1)));
    }

    #[test]
    fn test_difference_buckets_are_capped() {
        let mut board = Board::filled(3, 1, &HexTerrain::flat(0));
        board.set_hex(Coords::new(1, 0), HexTerrain::flat(3)).unwrap();
        board.set_hex(Coords::new(2, 0), HexTerrain::flat(50)).unwrap();
        let field = ElevationField::from_board(&board, [4, 5, 3]);
        let buckets: Vec<i32> = field.difference_buckets().into_iter().collect();
        assert_eq!(buckets, vec![3, 35]);
    }

    #[test]
    fn test_clip_mask_covers_each_level() {
        let mut board = Board::filled(2, 1, &HexTerrain::flat(0));
        board.set_hex(Coords::new(1, 0), HexTerrain::flat(3)).unwrap();
        let field = ElevationField::from_board(&board, [4, 5, 3]);
        let (w, h) = board_pixel_size(&board);
        let low = field.clip_mask(0, w, h).unwrap();
        let high = field.clip_mask(3, w, h).unwrap();
        assert!(field.clip_mask(1, w, h).is_none());
        assert!(low.allows(42, 36));
        assert!(!low.allows(105, 72));
        assert!(high.allows(105, 72));
        assert!(low.covered_pixels() > 0);
    }

    #[test]
    fn test_streak_lengths() {
        let mask = blurred_shadow(&crate::raster::hex_mask_image(), 1);
        let light = Light::Day.light_direction();
        let streak = streak_image(&mask, light, 2, false);
        assert_eq!(streak.width(), ((19.0 * 2.0 + 84.0) as u32) * 2);
        assert_eq!(streak.height(), ((7.0 * 2.0 + 72.0) as u32) * 2);
        assert!(streak.pixels().any(|p| p[3] > 0));

        let flat = streak_image(&mask, LightVector::new(0.0, 0.0), 1, false);
        assert!(flat.pixels().any(|p| p[3] > 0));

        // inclines leave a one-level step with only two faint stamps
        let soft = streak_image(&mask, light, 1, true);
        let hard = streak_image(&mask, light, 1, false);
        let sum = |img: &RgbaImage| img.pixels().map(|p| p[3] as u64).sum::<u64>();
        assert!(sum(&soft) < sum(&hard));
    }

    #[test]
    fn test_disabled_gives_none() {
        let board = Board::filled(2, 2, &HexTerrain::flat(0));
        let mut compositor = compositor(base_catalog(), loaded_images());
        compositor.set_settings(ShadowSettings {
            enabled: false,
            hex_inclines: false,
        });
        assert!(compositor.compose(&board, Light::Day, GamePhase::Movement).is_none());
    }

    #[test]
    fn test_space_and_sky_give_none() {
        let compositor = compositor(base_catalog(), loaded_images());
        let mut board = Board::filled(2, 2, &HexTerrain::flat(0));
        board.set_board_type(crate::board::BoardType::Space);
        assert!(compositor.compose(&board, Light::Day, GamePhase::Movement).is_none());
        board.set_board_type(crate::board::BoardType::Sky);
        assert!(compositor.compose(&board, Light::Day, GamePhase::Movement).is_none());
    }

    #[test]
    fn test_unknown_size_gives_none() {
        let compositor = compositor(base_catalog(), loaded_images());
        let board = Board::new(0, 0);
        assert!(compositor.compose(&board, Light::Day, GamePhase::Movement).is_none());
    }

    #[test]
    fn test_unloaded_tiles_give_none() {
        let images = Arc::new(TileImages::in_memory().with_generated_hex_mask());
        let compositor = compositor(base_catalog(), images);
        let board = Board::filled(2, 2, &HexTerrain::flat(0));
        assert!(compositor.compose(&board, Light::Day, GamePhase::Movement).is_none());
    }

    #[test]
    fn test_editor_phase_gives_none() {
        let compositor = compositor(base_catalog(), loaded_images());
        let board = Board::filled(2, 2, &HexTerrain::flat(0));
        assert!(compositor.compose(&board, Light::Day, GamePhase::Unknown).is_none());
        assert!(compositor.compose(&board, Light::Day, GamePhase::Firing).is_some());
    }

    #[test]
    fn test_missing_hex_mask_gives_none() {
        let images = TileImages::in_memory();
        images.mark_loaded();
        let compositor = compositor(base_catalog(), Arc::new(images));
        let board = Board::filled(2, 2, &HexTerrain::flat(0));
        assert!(compositor.compose(&board, Light::Day, GamePhase::Movement).is_none());
    }

    #[test]
    fn test_blur_cache_tracks_day_and_night() {
        let compositor = compositor(base_catalog(), loaded_images());
        let board = Board::filled(2, 2, &HexTerrain::flat(0));
        compositor.compose(&board, Light::Day, GamePhase::Movement).unwrap();
        assert_eq!(compositor.cached_masks(), 1);
        compositor.compose(&board, Light::Day, GamePhase::Movement).unwrap();
        assert_eq!(compositor.cached_masks(), 1);
        compositor.compose(&board, Light::Dusk, GamePhase::Movement).unwrap();
        assert_eq!(compositor.cached_masks(), 2);
        compositor.clear_cache();
        assert_eq!(compositor.cached_masks(), 0);
    }

    fn woods_catalog() -> Catalog {
        base_catalog()
            .with_entry(
                Layer::Super,
                TerrainEntry::new(
                    HexTerrain {
                        elevation: Level::Wildcard,
                        ..HexTerrain::default()
                    }
                    .with_terrain(TerrainKind::Woods, Terrain::pattern(Level::Wildcard)),
                    vec![ImageRef::from("woods.png")],
                ),
            )
            .with_entry(
                Layer::Ortho,
                TerrainEntry::new(
                    HexTerrain {
                        elevation: Level::Wildcard,
                        ..HexTerrain::default()
                    }
                    .with_terrain(TerrainKind::Bridge, Terrain::pattern(Level::Wildcard)),
                    vec![ImageRef::from("bridge.png")],
                ),
            )
    }

    #[test]
    fn test_woods_shadow_stamps() {
        let images = loaded_images();
        images.insert(ImageRef::from("woods.png"), tiny_tile());
        let compositor = compositor(woods_catalog(), images);

        let terrain = HexTerrain::flat(0)
            .with_terrain(TerrainKind::Woods, Terrain::new(1))
            .with_terrain(TerrainKind::FoliageElev, Terrain::new(2));
        let board = Board::filled(1, 1, &terrain);

        let map = compositor.compose(&board, Light::Day, GamePhase::Movement).unwrap();
        // 5 steps * (0 + 0.75 * 2 - 0)
        assert_eq!(map.stats.foliage_stamps, 7);
        assert!(map.stats.elevation_stamps.is_empty());
        assert!(map.image.pixels().any(|p| p[3] > 0));
    }

    #[test]
    fn test_missing_super_image_gives_none() {
        let compositor = compositor(woods_catalog(), loaded_images());
        let terrain = HexTerrain::flat(0)
            .with_terrain(TerrainKind::Woods, Terrain::new(1))
            .with_terrain(TerrainKind::FoliageElev, Terrain::new(2));
        let board = Board::filled(1, 1, &terrain);
        assert!(compositor.compose(&board, Light::Day, GamePhase::Movement).is_none());
    }

    #[test]
    fn test_bridge_shadow_stamps() {
        let images = loaded_images();
        images.insert(ImageRef::from("bridge.png"), tiny_tile());
        let compositor = compositor(woods_catalog(), images);

        let terrain = HexTerrain::flat(0)
            .with_terrain(TerrainKind::Bridge, Terrain::new(1))
            .with_terrain(TerrainKind::BridgeElev, Terrain::new(1));
        let board = Board::filled(1, 1, &terrain);

        let map = compositor.compose(&board, Light::Day, GamePhase::Movement).unwrap();
        assert_eq!(map.stats.bridge_stamps, FEATURE_STEPS as usize);
    }

    #[test]
    fn test_building_without_height_casts_nothing() {
        let images = loaded_images();
        let catalog = base_catalog().with_entry(
            Layer::Super,
            TerrainEntry::new(
                HexTerrain {
                    elevation: Level::Wildcard,
                    ..HexTerrain::default()
                }
                .with_terrain(TerrainKind::Building, Terrain::pattern(Level::Wildcard)),
                vec![ImageRef::from("house.png")],
            ),
        );
        images.insert(ImageRef::from("house.png"), tiny_tile());
        let compositor = compositor(catalog, images);

        let mut board = Board::filled(2, 1, &HexTerrain::flat(0));
        board
            .set_hex(
                Coords::new(0, 0),
                HexTerrain::flat(0).with_terrain(TerrainKind::Building, Terrain::new(1)),
            )
            .unwrap();
        board
            .set_hex(
                Coords::new(1, 0),
                HexTerrain::flat(0)
                    .with_terrain(TerrainKind::Building, Terrain::new(1))
                    .with_terrain(TerrainKind::BldgElev, Terrain::new(2)),
            )
            .unwrap();

        let map = compositor.compose(&board, Light::Day, GamePhase::Movement).unwrap();
        assert_eq!(map.stats.building_stamps, (FEATURE_STEPS * 2) as usize);
    }
}
