/// All simulation entity types. Pure data.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Viewport-space vector (one unit = one canvas pixel).
pub type Vec2 = Vector2<f32>;

/// Where a parked alien waits while no combat vignette is running.
pub const PARKED_COORD: f32 = -9999.0;

pub fn parked_position() -> Vec2 {
    Vec2::new(PARKED_COORD, PARKED_COORD)
}

// ── Viewport ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }
}

// ── Colour ───────────────────────────────────────────────────────────────────

/// Straight (non-premultiplied) RGBA, 8 bits per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Parse `#rrggbb`. Returns `None` for anything else.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 {
            return None;
        }
        let value = u32::from_str_radix(digits, 16).ok()?;
        Some(Self::rgb(
            ((value >> 16) & 0xff) as u8,
            ((value >> 8) & 0xff) as u8,
            (value & 0xff) as u8,
        ))
    }

    /// Same colour with alpha scaled by `opacity` (0..=1).
    pub fn with_opacity(self, opacity: f32) -> Self {
        let a = (self.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }
}

// ── Starfield ────────────────────────────────────────────────────────────────

/// A depth band of the starfield.
#[derive(Clone, Debug, PartialEq)]
pub struct Layer {
    pub count: usize,
    pub near: f32,
    pub far: f32,
    pub color: Rgba,
    /// Only the nearest band gets a soft halo.
    pub glow: bool,
}

#[derive(Clone, Debug)]
pub struct Star {
    pub x: f32,
    pub y: f32,
    /// Distance-like depth; shrinks as the star approaches.
    pub z: f32,
    /// Opacity, always within [0.1, 1].
    pub o: f32,
    /// Index into the owning starfield's layer list.
    pub layer: usize,
    /// Projected screen position from the last tick.
    pub screen_x: f32,
    pub screen_y: f32,
    /// Projected point radius from the last tick.
    pub size: f32,
}

// ── Vignette ─────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Normal,
    /// Slow, tumbling, no thrust.
    Broken,
    /// Alien escort and gunfire.
    Combat,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Normal => "normal",
            Mode::Broken => "broken",
            Mode::Combat => "combat",
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(Mode::Normal),
            "broken" => Ok(Mode::Broken),
            "combat" => Ok(Mode::Combat),
            other => Err(format!("unknown mode '{other}' (expected normal, broken or combat)")),
        }
    }
}

/// Position plus heading in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub position: Vec2,
    pub angle: f32,
}

#[derive(Clone, Debug)]
pub struct Ship {
    /// Sprite centre.
    pub position: Vec2,
    pub velocity: Vec2,
    /// Heading in degrees, 0 = +x, clockwise on screen (y grows downward).
    pub angle: f32,
    pub active: bool,
    /// Seconds since the vignette spawned.
    pub timer: f32,
    /// Integer pixel-art scale, 1..=4.
    pub scale: u32,
    pub mode: Mode,
}

impl Ship {
    pub fn pose(&self) -> Pose {
        Pose {
            position: self.position,
            angle: self.angle,
        }
    }
}

impl Default for Ship {
    fn default() -> Self {
        Self {
            position: Vec2::zeros(),
            velocity: Vec2::zeros(),
            angle: 0.0,
            active: false,
            timer: 0.0,
            scale: 1,
            mode: Mode::Normal,
        }
    }
}

/// The combat escort. Its pose is derived from the ship each tick.
#[derive(Clone, Debug)]
pub struct Alien {
    pub position: Vec2,
    pub angle: f32,
    pub active: bool,
    pub scale: u32,
    pub frame_index: usize,
    /// Seconds accumulated towards the next animation frame.
    pub frame_ticker: f32,
}

impl Default for Alien {
    fn default() -> Self {
        Self {
            position: parked_position(),
            angle: 0.0,
            active: false,
            scale: 1,
            frame_index: 0,
            frame_ticker: 0.0,
        }
    }
}

// ── Particles & projectiles ──────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub alpha: f32,
}

#[derive(Clone, Debug)]
pub struct Bullet {
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    /// Remaining lifetime in seconds.
    pub life: f32,
}
