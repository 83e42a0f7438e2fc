//! Pixel geometry of the hex board at zoom 1.

use crate::board::Board;
use crate::hex::Coords;

/// Width of a hex tile image in pixels.
pub const HEX_W: u32 = 84;

/// Height of a hex tile image in pixels.
pub const HEX_H: u32 = 72;

/// Horizontal distance between neighbouring hex columns.
pub const HEX_WC: u32 = HEX_W - HEX_W / 4;

/// Outline of a hex inside its `HEX_W` x `HEX_H` tile.
pub const HEX_OUTLINE: [(f64, f64); 8] = [
    (21.0, 0.0),
    (62.0, 0.0),
    (83.0, 35.0),
    (83.0, 36.0),
    (62.0, 71.0),
    (21.0, 71.0),
    (0.0, 36.0),
    (0.0, 35.0),
];

/// Top-left pixel of the tile for a hex.
pub fn hex_location(c: Coords) -> (i32, i32) {
    let x = c.x * HEX_WC as i32;
    let y = c.y * HEX_H as i32 + if c.x & 1 == 1 { HEX_H as i32 / 2 } else { 0 };
    (x, y)
}

/// Pixel size of the whole board image.
pub fn board_pixel_size(board: &Board) -> (u32, u32) {
    let width = board.width() as u32 * HEX_WC + HEX_W / 4;
    let height = board.height() as u32 * HEX_H + HEX_H / 2;
    (width, height)
}

/// A closed polygon in board pixel space.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    pub points: Vec<(f64, f64)>,
}

impl Polygon {
    /// Outline of the hex at `c`, scaled around the hex centre.
    pub fn hex(c: Coords, scale: f64) -> Self {
        let (x0, y0) = hex_location(c);
        let cx = HEX_W as f64 / 2.0;
        let cy = HEX_H as f64 / 2.0;
        let points = HEX_OUTLINE
            .iter()
            .map(|&(px, py)| {
                (
                    x0 as f64 + cx + (px - cx) * scale,
                    y0 as f64 + cy + (py - cy) * scale,
                )
            })
            .collect();
        Self { points }
    }

    /// Integer bounding box as (min_x, min_y, max_x, max_y), inclusive.
    pub fn bounds(&self) -> (i32, i32, i32, i32) {
        let mut min_x = f64::MAX;
        let mut min_y = f64::MAX;
        let mut max_x = f64::MIN;
        let mut max_y = f64::MIN;
        for &(x, y) in &self.points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        (
            min_x.floor() as i32,
            min_y.floor() as i32,
            max_x.ceil() as i32,
            max_y.ceil() as i32,
        )
    }

    /// Even-odd point containment.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let n = self.points.len();
        let mut inside = false;
        let mut j = n.wrapping_sub(1);
        for i in 0..n {
            let (xi, yi) = self.points[i];
            let (xj, yj) = self.points[j];
            if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
        inside
    }
}
