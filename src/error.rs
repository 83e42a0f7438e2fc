//! Error types for tileset, board, configuration and image loading.

use std::path::PathBuf;

use thiserror::Error;

/// Problems reading or parsing a tileset definition.
#[derive(Debug, Error)]
pub enum TilesetError {
    #[error("failed to read tileset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {message}")]
    Syntax {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("{path}:{line}: {source}")]
    Terrain {
        path: PathBuf,
        line: usize,
        #[source]
        source: TerrainParseError,
    },

    #[error("{path}:{line}: {source}")]
    Token {
        path: PathBuf,
        line: usize,
        #[source]
        source: TokenError,
    },

    #[error("tileset has no base entries; a wildcard base entry is required")]
    NoBaseEntry,
}

/// Problems splitting a tileset or board line into tokens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("unterminated quoted string starting at column {column}")]
    UnterminatedQuote { column: usize },
}

/// Problems parsing a terrain or level string such as `woods:1;foliage_elev:2`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TerrainParseError {
    #[error("unknown terrain type `{0}`")]
    UnknownKind(String),

    #[error("invalid level `{0}`")]
    InvalidLevel(String),

    #[error("invalid exits `{0}`")]
    InvalidExits(String),

    #[error("malformed terrain `{0}`")]
    Malformed(String),
}

/// Problems reading or parsing a board file.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("failed to read board {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: {source}")]
    Terrain {
        line: usize,
        #[source]
        source: TerrainParseError,
    },

    #[error("line {line}: {source}")]
    Token {
        line: usize,
        #[source]
        source: TokenError,
    },

    #[error("hex ({x}, {y}) lies outside a {width}x{height} board")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: usize,
        height: usize,
    },

    #[error("board size {width}x{height} exceeds the {max}x{max} limit")]
    TooLarge { width: usize, height: usize, max: usize },

    #[error("board has no size directive")]
    MissingSize,
}

/// Problems loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Problems decoding tile images.
#[derive(Debug, Error)]
pub enum ImageLoadError {
    #[error("failed to load image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Reasons a shadow map could not be composited.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ShadowError {
    #[error("no hex mask image available")]
    MissingHexMask,

    #[error("tile image {0} is not available")]
    MissingImage(String),
}
