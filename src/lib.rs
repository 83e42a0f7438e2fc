//! Hex terrain view library
//!
//! Tileset matching for hex boards and the terrain shadow overlay.
//! Re-exports modules for use by the binary and integration tests.

pub mod board;
pub mod config;
pub mod error;
pub mod geometry;
pub mod hex;
pub mod images;
pub mod lighting;
pub mod matcher;
pub mod raster;
pub mod render;
pub mod shadow;
pub mod terrain;
pub mod tileset;
pub(crate) mod tokens;

pub use board::{Board, BoardType};
pub use config::ViewConfig;
pub use hex::{Coords, Hex, HexId};
pub use images::TileImages;
pub use lighting::{GamePhase, Light};
pub use matcher::{HexMatcher, MatchResult, StageComposition};
pub use shadow::{ShadowCompositor, ShadowMap, ShadowSettings};
pub use terrain::{HexTerrain, Level, Terrain, TerrainKind};
pub use tileset::{Catalog, ImageRef, Layer, TerrainEntry};
