//! Lighting conditions and the shadow direction they imply.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Ambient light of the battlefield.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Light {
    #[default]
    Day,
    Dusk,
    FullMoon,
    Glare,
    Moonless,
    SolarFlare,
    PitchBlack,
}

impl Light {
    pub const ALL: [Light; 7] = [
        Light::Day,
        Light::Dusk,
        Light::FullMoon,
        Light::Glare,
        Light::Moonless,
        Light::SolarFlare,
        Light::PitchBlack,
    ];

    /// Name used in configuration and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Light::Day => "day",
            Light::Dusk => "dusk",
            Light::FullMoon => "full_moon",
            Light::Glare => "glare",
            Light::Moonless => "moonless",
            Light::SolarFlare => "solar_flare",
            Light::PitchBlack => "pitch_black",
        }
    }

    pub fn is_day(&self) -> bool {
        *self == Light::Day
    }

    pub fn is_dusk(&self) -> bool {
        *self == Light::Dusk
    }

    /// No directional light at all.
    pub fn is_moonless_or_pitch_black(&self) -> bool {
        matches!(self, Light::Moonless | Light::PitchBlack)
    }

    /// Offset, in pixels per level of height, that shadows are stretched by.
    pub fn light_direction(&self) -> LightVector {
        if self.is_moonless_or_pitch_black() {
            LightVector::new(0.0, 0.0)
        } else if self.is_dusk() {
            LightVector::new(-38.0, 14.0)
        } else {
            LightVector::new(-19.0, 7.0)
        }
    }

    /// Blur passes applied to shadow masks; night shadows are softer.
    pub fn blur_passes(&self) -> u32 {
        if self.is_day() {
            1
        } else {
            2
        }
    }
}

impl FromStr for Light {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Light::ALL
            .iter()
            .copied()
            .find(|light| light.name() == wanted)
            .ok_or_else(|| format!("unknown light condition `{}`", s))
    }
}

impl fmt::Display for Light {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Two-dimensional shadow offset in board pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LightVector {
    pub x: f64,
    pub y: f64,
}

impl LightVector {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The vector multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// The hex direction shadows fall towards, and its two neighbours.
    pub fn shadow_directions(&self) -> [usize; 3] {
        let angle = (-self.y).atan2(self.x);
        let main = (0.5 + 1.5 - angle / PI * 3.0) as i32;
        [
            main.rem_euclid(6) as usize,
            (main + 1).rem_euclid(6) as usize,
            (main + 5).rem_euclid(6) as usize,
        ]
    }
}

/// Phase of the game the board is shown in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum GamePhase {
    /// No game running; the board editor uses this.
    #[default]
    Unknown,
    Lounge,
    Deployment,
    Initiative,
    Movement,
    Firing,
    Physical,
    End,
}

impl GamePhase {
    pub fn is_unknown(&self) -> bool {
        *self == GamePhase::Unknown
    }
}

impl FromStr for GamePhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unknown" | "editor" => Ok(GamePhase::Unknown),
            "lounge" => Ok(GamePhase::Lounge),
            "deployment" => Ok(GamePhase::Deployment),
            "initiative" => Ok(GamePhase::Initiative),
            "movement" => Ok(GamePhase::Movement),
            "firing" => Ok(GamePhase::Firing),
            "physical" => Ok(GamePhase::Physical),
            "end" => Ok(GamePhase::End),
            _ => Err(format!("unknown game phase `{}`", s)),
        }
    }
}
