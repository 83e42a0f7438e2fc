//! Raster helpers: source-over stamping, clip masks and shadow masks.

use image::{imageops, GrayImage, Luma, Rgba, RgbaImage};

use crate::geometry::{Polygon, HEX_H, HEX_OUTLINE, HEX_W};

/// Alpha of a fully opaque source pixel once turned into a shadow mask.
pub const SHADOW_ALPHA: u8 = 24;

/// Gaussian sigma of one blur pass.
pub const BLUR_SIGMA: f32 = 2.0;

/// Border added around a mask so the blur has room to spread.
pub const MASK_PADDING: u32 = 2;

/// Composite `src` over `dst` (straight alpha).
pub fn blend_pixel(dst: &mut Rgba<u8>, src: Rgba<u8>) {
    let sa = src[3] as f32 / 255.0;
    if sa <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        *dst = Rgba([0, 0, 0, 0]);
        return;
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let s = src[c] as f32;
        let d = dst[c] as f32;
        out[c] = ((s * sa + d * da * (1.0 - sa)) / out_a).round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    *dst = Rgba(out);
}

/// Which pixels of a target image may be drawn on.
///
/// Only the bounding box of the covered area is stored; `origin` places it
/// in target coordinates.
#[derive(Clone, Debug)]
pub struct ClipMask {
    mask: GrayImage,
    origin: (u32, u32),
}

impl ClipMask {
    /// Union of the given polygons within a `width` x `height` target,
    /// rasterised at pixel centres.
    pub fn from_polygons<'a, I>(width: u32, height: u32, polygons: I) -> Self
    where
        I: IntoIterator<Item = &'a Polygon>,
    {
        let polygons: Vec<&Polygon> = polygons.into_iter().collect();

        let bounds = polygons
            .iter()
            .map(|polygon| polygon.bounds())
            .reduce(|a, b| (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3)));
        let Some((min_x, min_y, max_x, max_y)) = bounds else {
            return Self::empty();
        };
        let x0 = min_x.max(0);
        let y0 = min_y.max(0);
        let x1 = max_x.min(width as i32 - 1);
        let y1 = max_y.min(height as i32 - 1);
        if x0 > x1 || y0 > y1 {
            return Self::empty();
        }

        let origin = (x0 as u32, y0 as u32);
        let mut mask = GrayImage::new((x1 - x0 + 1) as u32, (y1 - y0 + 1) as u32);
        for polygon in polygons {
            let (px0, py0, px1, py1) = polygon.bounds();
            for y in py0.max(y0)..=py1.min(y1) {
                for x in px0.max(x0)..=px1.min(x1) {
                    if polygon.contains(x as f64 + 0.5, y as f64 + 0.5) {
                        mask.put_pixel((x - x0) as u32, (y - y0) as u32, Luma([255]));
                    }
                }
            }
        }
        Self { mask, origin }
    }

    fn empty() -> Self {
        Self {
            mask: GrayImage::new(0, 0),
            origin: (0, 0),
        }
    }

    /// Whether the target pixel (`x`, `y`) may be drawn on.
    pub fn allows(&self, x: u32, y: u32) -> bool {
        let (Some(lx), Some(ly)) = (x.checked_sub(self.origin.0), y.checked_sub(self.origin.1)) else {
            return false;
        };
        lx < self.mask.width() && ly < self.mask.height() && self.mask.get_pixel(lx, ly)[0] > 0
    }

    /// Number of target pixels that may be drawn on.
    pub fn covered_pixels(&self) -> usize {
        self.mask.pixels().filter(|p| p[0] > 0).count()
    }
}

/// Draw `src` onto `dst` with its top-left corner at (`x`, `y`), optionally clipped.
pub fn stamp(dst: &mut RgbaImage, src: &RgbaImage, x: i32, y: i32, clip: Option<&ClipMask>) {
    let (dw, dh) = (dst.width() as i32, dst.height() as i32);
    let sx0 = (-x).max(0);
    let sy0 = (-y).max(0);
    let sx1 = (src.width() as i32).min(dw - x);
    let sy1 = (src.height() as i32).min(dh - y);

    for sy in sy0..sy1 {
        for sx in sx0..sx1 {
            let px = src.get_pixel(sx as u32, sy as u32);
            if px[3] == 0 {
                continue;
            }
            let tx = (x + sx) as u32;
            let ty = (y + sy) as u32;
            if clip.is_some_and(|clip| !clip.allows(tx, ty)) {
                continue;
            }
            blend_pixel(dst.get_pixel_mut(tx, ty), *px);
        }
    }
}

/// Opaque white hex shape of tile size, the generic shadow caster.
pub fn hex_mask_image() -> RgbaImage {
    let outline = Polygon {
        points: HEX_OUTLINE.to_vec(),
    };
    RgbaImage::from_fn(HEX_W, HEX_H, |x, y| {
        if outline.contains(x as f64 + 0.5, y as f64 + 0.5) {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    })
}

/// Turn an image into a translucent black silhouette, padded for blurring.
pub fn shadow_mask(src: &RgbaImage) -> RgbaImage {
    let mut mask = RgbaImage::new(src.width() + 2 * MASK_PADDING, src.height() + 2 * MASK_PADDING);
    for (x, y, px) in src.enumerate_pixels() {
        let alpha = (px[3] as u32 * SHADOW_ALPHA as u32 / 255) as u8;
        if alpha > 0 {
            mask.put_pixel(x + MASK_PADDING, y + MASK_PADDING, Rgba([0, 0, 0, alpha]));
        }
    }
    mask
}

/// Shadow mask of `src`, blurred `passes` times.
pub fn blurred_shadow(src: &RgbaImage, passes: u32) -> RgbaImage {
    let mut mask = shadow_mask(src);
    for _ in 0..passes {
        mask = imageops::blur(&mask, BLUR_SIGMA);
    }
    mask
}
