//! Hex coordinates, directions and board cells.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::terrain::HexTerrain;

/// Offset coordinates of a hex. Odd columns sit half a hex lower than even ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coords {
    pub x: i32,
    pub y: i32,
}

impl Coords {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Neighbouring coordinates in a direction:
    /// 0 = N, 1 = NE, 2 = SE, 3 = S, 4 = SW, 5 = NW.
    pub fn translated(&self, dir: usize) -> Coords {
        let odd = self.x & 1 == 1;
        let (dx, dy) = match dir % 6 {
            0 => (0, -1),
            1 => (1, if odd { 0 } else { -1 }),
            2 => (1, if odd { 1 } else { 0 }),
            3 => (0, 1),
            4 => (-1, if odd { 1 } else { 0 }),
            _ => (-1, if odd { 0 } else { -1 }),
        };
        Coords::new(self.x + dx, self.y + dy)
    }

    /// Stable per-position seed for picking among candidate tile images.
    pub fn seed(&self) -> u64 {
        (((self.y as u32 as u64) << 16) ^ (self.x as u32 as u64)) & 0x7fff_ffff
    }

    /// Board-file label, 1-based `XXYY`.
    pub fn board_label(&self) -> String {
        format!("{:02}{:02}", self.x + 1, self.y + 1)
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.board_label())
    }
}

static NEXT_HEX_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a hex instance. Two hexes with equal terrain still have
/// distinct ids; tile caches are keyed on this, not on the terrain value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HexId(u64);

impl HexId {
    fn next() -> Self {
        HexId(NEXT_HEX_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// A board cell.
///
/// Cloning a hex produces a duplicate with a fresh [`HexId`].
#[derive(Debug)]
pub struct Hex {
    id: HexId,
    coords: Coords,
    terrain: HexTerrain,
}

impl Hex {
    /// A hex with a fresh identity.
    pub fn new(coords: Coords, terrain: HexTerrain) -> Self {
        Self {
            id: HexId::next(),
            coords,
            terrain,
        }
    }

    /// Identity of this hex instance.
    pub fn id(&self) -> HexId {
        self.id
    }

    /// Position on the board.
    pub fn coords(&self) -> Coords {
        self.coords
    }

    /// Elevation, terrains and theme.
    pub fn terrain(&self) -> &HexTerrain {
        &self.terrain
    }

    /// Mutable terrain. The identity is kept, so cached tiles for this hex
    /// must be cleared by the owner after editing.
    pub fn terrain_mut(&mut self) -> &mut HexTerrain {
        &mut self.terrain
    }

    /// Exact elevation of the hex.
    pub fn level(&self) -> i32 {
        self.terrain.level()
    }
}

impl Clone for Hex {
    fn clone(&self) -> Self {
        Hex::new(self.coords, self.terrain.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translated_even_column() {
        let c = Coords::new(2, 2);
        assert_eq!(c.translated(0), Coords::new(2, 1));
        assert_eq!(c.translated(1), Coords::new(3, 1));
        assert_eq!(c.translated(2), Coords::new(3, 2));
        assert_eq!(c.translated(3), Coords::new(2, 3));
        assert_eq!(c.translated(4), Coords::new(1, 2));
        assert_eq!(c.translated(5), Coords::new(1, 1));
    }

    #[test]
    fn test_translated_odd_column() {
        let c = Coords::new(1, 2);
        assert_eq!(c.translated(1), Coords::new(2, 2));
        assert_eq!(c.translated(2), Coords::new(2, 3));
        assert_eq!(c.translated(4), Coords::new(0, 3));
        assert_eq!(c.translated(5), Coords::new(0, 2));
    }

    #[test]
    fn test_opposite_directions_return() {
        for x in 0..4 {
            for y in 0..4 {
                let c = Coords::new(x, y);
                for dir in 0..6 {
                    assert_eq!(c.translated(dir).translated((dir + 3) % 6), c);
                }
            }
        }
    }

    #[test]
    fn test_clone_gets_new_identity() {
        let hex = Hex::new(Coords::new(0, 0), HexTerrain::flat(2));
        let dup = hex.clone();
        assert_ne!(hex.id(), dup.id());
        assert_eq!(hex.terrain(), dup.terrain());
    }

    #[test]
    fn test_board_label() {
        assert_eq!(Coords::new(0, 0).board_label(), "0101");
        assert_eq!(Coords::new(11, 4).to_string(), "1205");
    }
}
