//! Decoded tile images, shared between the board renderer and the shadow compositor.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use image::RgbaImage;
use rayon::prelude::*;
use tracing::{debug, error, info};

use crate::error::ImageLoadError;
use crate::raster::hex_mask_image;
use crate::tileset::{Catalog, ImageRef};

/// Thread-safe store of tile rasters keyed by [`ImageRef`].
///
/// Images are read lazily from `dir` on first use, or up front through
/// [`TileImages::preload`]. The store counts as loaded once preloading
/// finished or [`TileImages::mark_loaded`] was called.
pub struct TileImages {
    dir: Option<PathBuf>,
    images: RwLock<HashMap<ImageRef, Arc<RgbaImage>>>,
    hex_mask: RwLock<Option<Arc<RgbaImage>>>,
    loaded: AtomicBool,
}

impl TileImages {
    /// A store that only holds what is inserted.
    pub fn in_memory() -> Self {
        Self {
            dir: None,
            images: RwLock::new(HashMap::new()),
            hex_mask: RwLock::new(None),
            loaded: AtomicBool::new(false),
        }
    }

    /// A store reading images from a directory.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
            ..Self::in_memory()
        }
    }

    /// Add or replace an image under the given reference.
    pub fn insert(&self, image_ref: ImageRef, image: RgbaImage) {
        self.images
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(image_ref, Arc::new(image));
    }

    /// Set the hex-shaped image used as the generic shadow caster.
    pub fn set_hex_mask(&self, mask: RgbaImage) {
        *self.hex_mask.write().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(mask));
    }

    /// Use the built-in hex outline as the generic shadow caster.
    pub fn with_generated_hex_mask(self) -> Self {
        self.set_hex_mask(hex_mask_image());
        self
    }

    /// The generic shadow caster, if one was set.
    pub fn hex_mask(&self) -> Option<Arc<RgbaImage>> {
        self.hex_mask.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Declare the store complete, e.g. after inserting images by hand.
    pub fn mark_loaded(&self) {
        self.loaded.store(true, Ordering::Release);
    }

    /// Whether preloading finished; shadows are only built after that.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Number of decoded images held.
    pub fn len(&self) -> usize {
        self.images.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The image for a reference, reading it from disk if needed.
    /// Unreadable images are logged and reported as absent.
    pub fn get(&self, image_ref: &ImageRef) -> Option<Arc<RgbaImage>> {
        if let Some(image) = self
            .images
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(image_ref)
        {
            return Some(Arc::clone(image));
        }

        let dir = self.dir.as_deref()?;
        match load_image(dir, image_ref) {
            Ok(image) => {
                let image = Arc::new(image);
                self.images
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(image_ref.clone(), Arc::clone(&image));
                Some(image)
            }
            Err(e) => {
                error!("{}", e);
                None
            }
        }
    }

    /// Decode every image the catalog refers to, in parallel, then mark the store loaded.
    /// Returns the number of images that failed to load.
    pub fn preload(&self, catalog: &Catalog) -> usize {
        let wanted: BTreeSet<&ImageRef> = {
            let images = self.images.read().unwrap_or_else(PoisonError::into_inner);
            catalog.image_refs().filter(|r| !images.contains_key(*r)).collect()
        };

        let mut failures = 0;
        if let Some(dir) = self.dir.as_deref() {
            let results: Vec<(ImageRef, Result<RgbaImage, ImageLoadError>)> = wanted
                .par_iter()
                .map(|r| ((*r).clone(), load_image(dir, r)))
                .collect();

            let mut images = self.images.write().unwrap_or_else(PoisonError::into_inner);
            for (image_ref, result) in results {
                match result {
                    Ok(image) => {
                        images.insert(image_ref, Arc::new(image));
                    }
                    Err(e) => {
                        error!("{}", e);
                        failures += 1;
                    }
                }
            }
        } else {
            failures = wanted.len();
            debug!("no image directory; {} catalog images unavailable", failures);
        }

        info!("tile images loaded ({} failed)", failures);
        self.mark_loaded();
        failures
    }
}

fn load_image(dir: &Path, image_ref: &ImageRef) -> Result<RgbaImage, ImageLoadError> {
    let path = dir.join(image_ref.as_str());
    image::open(&path)
        .map(|img| img.to_rgba8())
        .map_err(|source| ImageLoadError::Decode { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::HexTerrain;
    use crate::tileset::{Layer, TerrainEntry};
    use image::Rgba;

    #[test]
    fn test_in_memory_store() {
        let store = TileImages::in_memory();
        assert!(!store.is_loaded());
        store.insert(ImageRef::from("a.png"), RgbaImage::new(2, 2));
        assert!(store.get(&ImageRef::from("a.png")).is_some());
        assert!(store.get(&ImageRef::from("b.png")).is_none());
        store.mark_loaded();
        assert!(store.is_loaded());
    }

    #[test]
    fn test_generated_hex_mask() {
        let store = TileImages::in_memory();
        assert!(store.hex_mask().is_none());
        let store = store.with_generated_hex_mask();
        assert!(store.hex_mask().is_some());
    }

    #[test]
    fn test_preload_from_dir() {
        let dir = std::env::temp_dir().join(format!("hex_terrain_view_images_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        RgbaImage::from_pixel(3, 3, Rgba([1, 2, 3, 255]))
            .save(dir.join("grass.png"))
            .unwrap();

        let catalog = Catalog::new()
            .with_entry(
                Layer::Base,
                TerrainEntry::new(HexTerrain::flat(0), vec![ImageRef::from("grass.png")]),
            )
            .with_entry(
                Layer::Super,
                TerrainEntry::new(HexTerrain::flat(0), vec![ImageRef::from("missing.png")]),
            );

        let store = TileImages::from_dir(&dir);
        assert_eq!(store.preload(&catalog), 1);
        assert!(store.is_loaded());
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&ImageRef::from("grass.png")).unwrap().dimensions(), (3, 3));
    }
}
