//! Hex board: a rectangular grid of optional hexes.
//!
//! The board owns its hexes. Whoever edits it is responsible for telling the
//! tile matcher which hexes changed (see [`crate::matcher::HexMatcher`]);
//! there are no listeners.

use std::path::Path;

use crate::error::BoardError;
use crate::hex::{Coords, Hex};
use crate::terrain::{HexTerrain, Level};
use crate::tokens::tokenize;

/// Largest width or height a board may have.
pub const MAX_BOARD_SIZE: usize = 1024;

/// Kind of map the board represents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BoardType {
    #[default]
    Ground,
    Sky,
    Space,
}

impl BoardType {
    /// Parse `ground`, `sky` or `space`, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ground" => Some(BoardType::Ground),
            "sky" => Some(BoardType::Sky),
            "space" => Some(BoardType::Space),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Board {
    width: usize,
    height: usize,
    board_type: BoardType,
    hexes: Vec<Option<Hex>>,
}

impl Board {
    /// A board of the given size with no hexes set. Each dimension is
    /// clamped to [`MAX_BOARD_SIZE`]; use [`Board::try_new`] to reject
    /// oversized boards instead.
    pub fn new(width: usize, height: usize) -> Self {
        let width = width.min(MAX_BOARD_SIZE);
        let height = height.min(MAX_BOARD_SIZE);
        let mut hexes = Vec::with_capacity(width * height);
        hexes.resize_with(width * height, || None);
        Self {
            width,
            height,
            board_type: BoardType::Ground,
            hexes,
        }
    }

    /// A board of the given size, or an error if either dimension exceeds
    /// [`MAX_BOARD_SIZE`].
    pub fn try_new(width: usize, height: usize) -> Result<Self, BoardError> {
        if width > MAX_BOARD_SIZE || height > MAX_BOARD_SIZE {
            return Err(BoardError::TooLarge {
                width,
                height,
                max: MAX_BOARD_SIZE,
            });
        }
        Ok(Self::new(width, height))
    }

    /// A board where every hex has the given terrain.
    pub fn filled(width: usize, height: usize, terrain: &HexTerrain) -> Self {
        let mut board = Self::new(width, height);
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let c = Coords::new(x, y);
                let idx = board.index(c).unwrap_or_default();
                board.hexes[idx] = Some(Hex::new(c, terrain.clone()));
            }
        }
        board
    }

    /// Width in hexes.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in hexes.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Ground, sky or space.
    pub fn board_type(&self) -> BoardType {
        self.board_type
    }

    /// Mark the board as ground, sky or space.
    pub fn set_board_type(&mut self, board_type: BoardType) {
        self.board_type = board_type;
    }

    /// Space boards never get terrain shadows.
    pub fn is_space(&self) -> bool {
        self.board_type == BoardType::Space
    }

    /// Sky (low-altitude) boards never get terrain shadows.
    pub fn is_sky(&self) -> bool {
        self.board_type == BoardType::Sky
    }

    /// Whether the board dimensions are known (non-zero).
    pub fn has_size(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    fn index(&self, c: Coords) -> Option<usize> {
        if self.contains(c) {
            Some(c.y as usize * self.width + c.x as usize)
        } else {
            None
        }
    }

    /// Whether the coordinates lie on the board.
    pub fn contains(&self, c: Coords) -> bool {
        c.x >= 0 && c.y >= 0 && (c.x as usize) < self.width && (c.y as usize) < self.height
    }

    /// The hex at the coordinates; `None` off-board or where no hex is set.
    pub fn hex(&self, c: Coords) -> Option<&Hex> {
        self.index(c).and_then(|idx| self.hexes[idx].as_ref())
    }

    /// Mutable access to a hex. Its identity is kept; clear cached tiles for it afterwards.
    pub fn hex_mut(&mut self, c: Coords) -> Option<&mut Hex> {
        let idx = self.index(c)?;
        self.hexes[idx].as_mut()
    }

    /// Place a new hex with the given terrain, returning the hex it replaced.
    pub fn set_hex(&mut self, c: Coords, terrain: HexTerrain) -> Result<Option<Hex>, BoardError> {
        let idx = self.index(c).ok_or(BoardError::OutOfBounds {
            x: c.x,
            y: c.y,
            width: self.width,
            height: self.height,
        })?;
        Ok(self.hexes[idx].replace(Hex::new(c, terrain)))
    }

    /// All hexes present on the board, column by column.
    pub fn hexes(&self) -> impl Iterator<Item = &Hex> {
        (0..self.width as i32)
            .flat_map(move |x| (0..self.height as i32).map(move |y| Coords::new(x, y)))
            .filter_map(move |c| self.hex(c))
    }

    /// Lowest hex elevation, or 0 for an empty board.
    pub fn min_elevation(&self) -> i32 {
        self.hexes().map(Hex::level).min().unwrap_or(0)
    }

    /// Highest hex elevation, or 0 for an empty board.
    pub fn max_elevation(&self) -> i32 {
        self.hexes().map(Hex::level).max().unwrap_or(0)
    }

    /// Read a board file from disk.
    pub fn load(path: &Path) -> Result<Self, BoardError> {
        let text = std::fs::read_to_string(path).map_err(|source| BoardError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse board text: `size W H`, `type ground|sky|space`,
    /// `hex XXYY elevation "terrain" "theme"` and `end`.
    pub fn parse(text: &str) -> Result<Self, BoardError> {
        let mut board: Option<Board> = None;
        let mut board_type = BoardType::Ground;

        for (line_idx, raw) in text.lines().enumerate() {
            let line = line_idx + 1;
            let tokens = tokenize(raw).map_err(|source| BoardError::Token { line, source })?;
            let Some(directive) = tokens.first() else {
                continue;
            };

            match directive.as_str() {
                "size" => {
                    let (w, h) = match (tokens.get(1), tokens.get(2)) {
                        (Some(w), Some(h)) => (w.parse::<usize>().ok(), h.parse::<usize>().ok()),
                        _ => (None, None),
                    };
                    let (Some(w), Some(h)) = (w, h) else {
                        return Err(BoardError::Syntax {
                            line,
                            message: "expected `size <width> <height>`".to_string(),
                        });
                    };
                    board = Some(Board::try_new(w, h)?);
                }
                "type" => {
                    board_type = tokens
                        .get(1)
                        .and_then(|name| BoardType::from_name(name))
                        .ok_or_else(|| BoardError::Syntax {
                            line,
                            message: "expected `type ground|sky|space`".to_string(),
                        })?;
                }
                "hex" => {
                    let board = board.as_mut().ok_or(BoardError::MissingSize)?;
                    if tokens.len() < 4 {
                        return Err(BoardError::Syntax {
                            line,
                            message: "expected `hex XXYY elevation \"terrain\" [\"theme\"]`".to_string(),
                        });
                    }
                    let coords = parse_label(&tokens[1]).ok_or_else(|| BoardError::Syntax {
                        line,
                        message: format!("bad hex label `{}`", tokens[1]),
                    })?;
                    let elevation: i32 = tokens[2].parse().map_err(|_| BoardError::Syntax {
                        line,
                        message: format!("bad elevation `{}`", tokens[2]),
                    })?;
                    let theme = tokens.get(4).map(String::as_str).unwrap_or("");
                    let terrain = HexTerrain::parse(Level::Exact(elevation), &tokens[3], theme)
                        .map_err(|source| BoardError::Terrain { line, source })?;
                    board.set_hex(coords, terrain)?;
                }
                "end" => break,
                _ => {}
            }
        }

        let mut board = board.ok_or(BoardError::MissingSize)?;
        board.board_type = board_type;
        Ok(board)
    }
}

/// Parse a 1-based `XXYY` label (or `XXXYYY` for wide boards).
fn parse_label(label: &str) -> Option<Coords> {
    if label.len() < 4 || label.len() % 2 != 0 || !label.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let half = label.len() / 2;
    let x: i32 = label[..half].parse().ok()?;
    let y: i32 = label[half..].parse().ok()?;
    Some(Coords::new(x - 1, y - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TokenError;
    use crate::terrain::TerrainKind;

    const SMALL_BOARD: &str = r#"
size 3 2
# a small test board
hex 0101 0 "" ""
hex 0201 2 "woods:1;foliage_elev:2" ""
hex 0301 -1 "water:1" "winter"
hex 0102 1 "" ""
end
hex 0202 9 "" ""
"#;

    #[test]
    fn test_parse_small_board() {
        let board = Board::parse(SMALL_BOARD).unwrap();
        assert_eq!(board.width(), 3);
        assert_eq!(board.height(), 2);
        assert_eq!(board.hexes().count(), 4);

        let woods = board.hex(Coords::new(1, 0)).unwrap();
        assert_eq!(woods.level(), 2);
        assert_eq!(woods.terrain().level_of(TerrainKind::FoliageElev), Some(2));

        let water = board.hex(Coords::new(2, 0)).unwrap();
        assert_eq!(water.terrain().theme.as_deref(), Some("winter"));

        // lines after `end` are ignored
        assert!(board.hex(Coords::new(1, 1)).is_none());
        assert_eq!(board.min_elevation(), -1);
        assert_eq!(board.max_elevation(), 2);
    }

    #[test]
    fn test_board_type_directive() {
        let board = Board::parse("size 1 1\ntype sky\n").unwrap();
        assert!(board.is_sky());
        assert!(!board.is_space());
    }

    #[test]
    fn test_out_of_bounds_hex() {
        let err = Board::parse("size 2 2\nhex 0303 0 \"\" \"\"\n").unwrap_err();
        assert!(matches!(err, BoardError::OutOfBounds { x: 2, y: 2, .. }));
    }

    #[test]
    fn test_oversized_board_is_rejected() {
        let err = Board::parse("size 4294967296 4294967296\nhex 0101 0 \"\" \"\"\n").unwrap_err();
        assert!(matches!(err, BoardError::TooLarge { max: MAX_BOARD_SIZE, .. }));

        let err = Board::parse("size 2 1025\n").unwrap_err();
        assert!(matches!(err, BoardError::TooLarge { width: 2, height: 1025, .. }));

        assert!(Board::parse(&format!("size {} 1\n", MAX_BOARD_SIZE)).is_ok());
        assert!(matches!(
            Board::parse("size 99999999999999999999999 1\n"),
            Err(BoardError::Syntax { line: 1, .. })
        ));
    }

    #[test]
    fn test_new_clamps_dimensions() {
        let board = Board::new(usize::MAX, 3);
        assert_eq!(board.width(), MAX_BOARD_SIZE);
        assert_eq!(board.height(), 3);
        assert!(Board::try_new(usize::MAX, usize::MAX).is_err());
    }

    #[test]
    fn test_unterminated_quote_reports_line() {
        let err = Board::parse("size 2 2\nhex 0101 0 \"woods:1\n").unwrap_err();
        assert!(matches!(
            err,
            BoardError::Token {
                line: 2,
                source: TokenError::UnterminatedQuote { column: 12 }
            }
        ));
    }

    #[test]
    fn test_hex_before_size() {
        let err = Board::parse("hex 0101 0 \"\" \"\"\n").unwrap_err();
        assert!(matches!(err, BoardError::MissingSize));
    }

    #[test]
    fn test_set_hex_returns_replaced() {
        let mut board = Board::filled(2, 2, &HexTerrain::flat(0));
        let old_id = board.hex(Coords::new(0, 0)).unwrap().id();
        let replaced = board.set_hex(Coords::new(0, 0), HexTerrain::flat(3)).unwrap();
        assert_eq!(replaced.map(|h| h.id()), Some(old_id));
        assert_ne!(board.hex(Coords::new(0, 0)).unwrap().id(), old_id);
        assert_eq!(board.max_elevation(), 3);
    }

    #[test]
    fn test_parse_label() {
        assert_eq!(parse_label("0101"), Some(Coords::new(0, 0)));
        assert_eq!(parse_label("1612"), Some(Coords::new(15, 11)));
        assert_eq!(parse_label("101102"), Some(Coords::new(100, 101)));
        assert_eq!(parse_label("101"), None);
    }
}
