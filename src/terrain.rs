//! Terrain composition of a hex
//!
//! A `HexTerrain` is the value both board hexes and tileset entries are made
//! of: an elevation, a set of typed terrains with levels and optional exit
//! masks, and an optional theme tag. Board hexes only ever carry exact levels;
//! tileset entries may use wildcards and "at least" thresholds.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::TerrainParseError;

/// A level (or elevation) value as found in a hex or a tileset pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Level {
    /// An exact level.
    Exact(i32),
    /// Any level greater or equal to the threshold (`>n` in tileset files).
    AtLeast(i32),
    /// Any level at all (`*` in tileset files).
    Wildcard,
}

impl Level {
    /// Whether a concrete level satisfies this pattern exactly.
    pub fn accepts(&self, level: i32) -> bool {
        match *self {
            Level::Exact(l) => l == level,
            Level::AtLeast(t) => level >= t,
            Level::Wildcard => true,
        }
    }

    /// The concrete value of an exact level; patterns have none.
    pub fn value(&self) -> Option<i32> {
        match *self {
            Level::Exact(l) => Some(l),
            _ => None,
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::Exact(0)
    }
}

impl FromStr for Level {
    type Err = TerrainParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "*" {
            return Ok(Level::Wildcard);
        }
        if let Some(rest) = s.strip_prefix('>') {
            return rest
                .trim()
                .parse()
                .map(Level::AtLeast)
                .map_err(|_| TerrainParseError::InvalidLevel(s.to_string()));
        }
        s.parse()
            .map(Level::Exact)
            .map_err(|_| TerrainParseError::InvalidLevel(s.to_string()))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Exact(l) => write!(f, "{}", l),
            Level::AtLeast(t) => write!(f, ">{}", t),
            Level::Wildcard => write!(f, "*"),
        }
    }
}

/// Terrain types understood by tilesets and boards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TerrainKind {
    Woods,
    Water,
    Rough,
    Rubble,
    Jungle,
    Sand,
    Tundra,
    Magma,
    PlantedFields,
    HeavyIndustrial,
    Space,
    Pavement,
    Road,
    Swamp,
    Mud,
    Rapids,
    Ice,
    Snow,
    Fire,
    Smoke,
    Geyser,
    Building,
    BldgCf,
    BldgElev,
    BldgClass,
    BldgArmor,
    BldgBasementType,
    Bridge,
    BridgeCf,
    BridgeElev,
    FuelTank,
    FuelTankCf,
    FuelTankElev,
    Impassable,
    Elevator,
    Fortified,
    Screen,
    Fluff,
    Arms,
    Legs,
    MetalContent,
    BlackIce,
    FoliageElev,
    CliffTop,
    CliffBottom,
    InclineTop,
    InclineBottom,
    InclineHighTop,
    InclineHighBottom,
    Deployment,
}

const KIND_NAMES: &[(TerrainKind, &str)] = &[
    (TerrainKind::Woods, "woods"),
    (TerrainKind::Water, "water"),
    (TerrainKind::Rough, "rough"),
    (TerrainKind::Rubble, "rubble"),
    (TerrainKind::Jungle, "jungle"),
    (TerrainKind::Sand, "sand"),
    (TerrainKind::Tundra, "tundra"),
    (TerrainKind::Magma, "magma"),
    (TerrainKind::PlantedFields, "planted_fields"),
    (TerrainKind::HeavyIndustrial, "heavy_industrial"),
    (TerrainKind::Space, "space"),
    (TerrainKind::Pavement, "pavement"),
    (TerrainKind::Road, "road"),
    (TerrainKind::Swamp, "swamp"),
    (TerrainKind::Mud, "mud"),
    (TerrainKind::Rapids, "rapids"),
    (TerrainKind::Ice, "ice"),
    (TerrainKind::Snow, "snow"),
    (TerrainKind::Fire, "fire"),
    (TerrainKind::Smoke, "smoke"),
    (TerrainKind::Geyser, "geyser"),
    (TerrainKind::Building, "building"),
    (TerrainKind::BldgCf, "bldg_cf"),
    (TerrainKind::BldgElev, "bldg_elev"),
    (TerrainKind::BldgClass, "bldg_class"),
    (TerrainKind::BldgArmor, "bldg_armor"),
    (TerrainKind::BldgBasementType, "bldg_basement_type"),
    (TerrainKind::Bridge, "bridge"),
    (TerrainKind::BridgeCf, "bridge_cf"),
    (TerrainKind::BridgeElev, "bridge_elev"),
    (TerrainKind::FuelTank, "fuel_tank"),
    (TerrainKind::FuelTankCf, "fuel_tank_cf"),
    (TerrainKind::FuelTankElev, "fuel_tank_elev"),
    (TerrainKind::Impassable, "impassable"),
    (TerrainKind::Elevator, "elevator"),
    (TerrainKind::Fortified, "fortified"),
    (TerrainKind::Screen, "screen"),
    (TerrainKind::Fluff, "fluff"),
    (TerrainKind::Arms, "arms"),
    (TerrainKind::Legs, "legs"),
    (TerrainKind::MetalContent, "metal_content"),
    (TerrainKind::BlackIce, "black_ice"),
    (TerrainKind::FoliageElev, "foliage_elev"),
    (TerrainKind::CliffTop, "cliff_top"),
    (TerrainKind::CliffBottom, "cliff_bottom"),
    (TerrainKind::InclineTop, "incline_top"),
    (TerrainKind::InclineBottom, "incline_bottom"),
    (TerrainKind::InclineHighTop, "incline_high_top"),
    (TerrainKind::InclineHighBottom, "incline_high_bottom"),
    (TerrainKind::Deployment, "deployment_zone"),
];

impl TerrainKind {
    /// Name as written in tileset and board files.
    pub fn name(&self) -> &'static str {
        KIND_NAMES
            .iter()
            .find(|(kind, _)| kind == self)
            .map(|(_, name)| *name)
            .unwrap_or("unknown")
    }

    /// Look up a terrain kind by its file-format name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        KIND_NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(kind, _)| *kind)
    }
}

impl fmt::Display for TerrainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single terrain on a hex: its level and, optionally, the exits it connects to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Terrain {
    pub level: Level,
    /// Six-bit exit mask, one bit per hex direction. `None` means "not specified".
    pub exits: Option<u8>,
}

impl Terrain {
    /// An exact level with no exits given.
    pub fn new(level: i32) -> Self {
        Self {
            level: Level::Exact(level),
            exits: None,
        }
    }

    /// A catalog pattern level with no exits given.
    pub fn pattern(level: Level) -> Self {
        Self { level, exits: None }
    }

    pub fn with_exits(mut self, exits: u8) -> Self {
        self.exits = Some(exits & 0x3f);
        self
    }

    pub fn has_exits_specified(&self) -> bool {
        self.exits.is_some()
    }
}

/// Elevation, terrains and theme of a hex or of a tileset pattern.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HexTerrain {
    pub elevation: Level,
    pub terrains: BTreeMap<TerrainKind, Terrain>,
    pub theme: Option<String>,
}

impl HexTerrain {
    /// A hex at the given elevation with no terrain and no theme.
    pub fn flat(elevation: i32) -> Self {
        Self {
            elevation: Level::Exact(elevation),
            ..Self::default()
        }
    }

    /// Build from the textual pieces found in board and tileset files.
    /// An empty theme string means "no theme".
    pub fn parse(elevation: Level, terrain: &str, theme: &str) -> Result<Self, TerrainParseError> {
        let theme = theme.trim();
        Ok(Self {
            elevation,
            terrains: parse_terrains(terrain)?,
            theme: if theme.is_empty() {
                None
            } else {
                Some(theme.to_string())
            },
        })
    }

    /// Add or replace one terrain.
    pub fn with_terrain(mut self, kind: TerrainKind, terrain: Terrain) -> Self {
        self.terrains.insert(kind, terrain);
        self
    }

    pub fn with_theme(mut self, theme: impl Into<String>) -> Self {
        self.theme = Some(theme.into());
        self
    }

    /// Whether the terrain kind is present at any level.
    pub fn contains(&self, kind: TerrainKind) -> bool {
        self.terrains.contains_key(&kind)
    }

    /// The terrain of a kind, if present.
    pub fn terrain(&self, kind: TerrainKind) -> Option<&Terrain> {
        self.terrains.get(&kind)
    }

    /// Exact level of a terrain, if present.
    pub fn level_of(&self, kind: TerrainKind) -> Option<i32> {
        self.terrains.get(&kind).and_then(|t| t.level.value())
    }

    /// Number of terrain kinds present.
    pub fn terrains_present(&self) -> usize {
        self.terrains.len()
    }

    /// Exact elevation of a board hex. Patterns report 0.
    pub fn level(&self) -> i32 {
        self.elevation.value().unwrap_or(0)
    }

    /// Copy of this terrain with the given kinds removed.
    pub fn without<'a, I>(&self, kinds: I) -> Self
    where
        I: IntoIterator<Item = &'a TerrainKind>,
    {
        let mut copy = self.clone();
        for kind in kinds {
            copy.terrains.remove(kind);
        }
        copy
    }

    /// Terrain string in file syntax, e.g. `woods:1;foliage_elev:2`.
    pub fn terrain_string(&self) -> String {
        self.terrains
            .iter()
            .map(|(kind, t)| match t.exits {
                Some(exits) => format!("{}:{}:{}", kind, t.level, exits),
                None => format!("{}:{}", kind, t.level),
            })
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Parse a `;`-separated terrain list of `kind:level[:exits]` items.
pub fn parse_terrains(s: &str) -> Result<BTreeMap<TerrainKind, Terrain>, TerrainParseError> {
    let mut terrains = BTreeMap::new();
    for item in s.split(';').map(str::trim).filter(|item| !item.is_empty()) {
        let mut parts = item.split(':');
        let kind_name = parts.next().unwrap_or_default();
        let kind = TerrainKind::from_name(kind_name)
            .ok_or_else(|| TerrainParseError::UnknownKind(kind_name.to_string()))?;
        let level: Level = parts
            .next()
            .ok_or_else(|| TerrainParseError::Malformed(item.to_string()))?
            .parse()?;
        let exits = match parts.next() {
            Some(raw) => {
                let raw = raw.trim();
                let exits: u8 = raw
                    .parse()
                    .map_err(|_| TerrainParseError::InvalidExits(raw.to_string()))?;
                if exits > 0x3f {
                    return Err(TerrainParseError::InvalidExits(raw.to_string()));
                }
                Some(exits)
            }
            None => None,
        };
        if parts.next().is_some() {
            return Err(TerrainParseError::Malformed(item.to_string()));
        }
        terrains.insert(kind, Terrain { level, exits });
    }
    Ok(terrains)
}
