//! Whole-board render: every hex's matched tiles drawn in layer order,
//! with the shadow overlay on top.

use image::RgbaImage;
use tracing::debug;

use crate::board::Board;
use crate::geometry::{board_pixel_size, hex_location};
use crate::images::TileImages;
use crate::matcher::HexMatcher;
use crate::raster::stamp;
use crate::shadow::ShadowMap;

/// Render a board at zoom 1.
///
/// Each hex gets its base tile, then its supers, then its orthos. Images the
/// store cannot provide are left out. The shadow map, if any, goes over all
/// tiles.
pub fn render_board(
    board: &Board,
    matcher: &HexMatcher,
    images: &TileImages,
    shadow: Option<&ShadowMap>,
) -> RgbaImage {
    let (width, height) = board_pixel_size(board);
    let mut img = RgbaImage::new(width, height);
    let mut missing = 0usize;

    for hex in board.hexes() {
        let (x, y) = hex_location(hex.coords());
        let matched = matcher.matches(hex);

        let layers = matched.base.iter().chain(&matched.supers).chain(&matched.orthos);
        for image_ref in layers {
            match images.get(image_ref) {
                Some(tile) => stamp(&mut img, &tile, x, y, None),
                None => missing += 1,
            }
        }
    }

    if missing > 0 {
        debug!("{} tile images missing from board render", missing);
    }

    if let Some(shadow) = shadow {
        stamp(&mut img, &shadow.image, 0, 0, None);
    }

    img
}
