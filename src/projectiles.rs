/// Straight-line bullets fired from the ship's two guns during combat.
///
/// Bullets are purely cosmetic: nothing is collision-checked and nothing is
/// bounds-checked.  The life budget alone retires them.

use nalgebra::Rotation2;
use rand::Rng;

use crate::canvas::Canvas;
use crate::entities::{Bullet, Mode, Rgba, Ship, Vec2};
use crate::sprites::SHIP_CELL_SIZE;

/// Muzzle speed, units per second, before adding the ship's own velocity.
pub const BULLET_SPEED: f32 = 1000.0;
/// Seconds a bullet survives (240 frames at 60 Hz).
pub const BULLET_LIFE: f32 = 4.0;

/// Gun muzzles as (col, row) cells of the ship sprite.
const GUN_CELLS: [(f32, f32); 2] = [(6.0, 4.0), (6.0, 11.0)];
/// Centre of the 15×15 ship grid, in cells.
const GRID_CENTER: f32 = 7.5;

/// Fire intervals are whole 60 Hz frames in `[MIN, MAX)`.
const MIN_INTERVAL_FRAMES: u32 = 5;
const MAX_INTERVAL_FRAMES: u32 = 55;
const FIRST_INTERVAL_FRAMES: u32 = 20;
const FRAMES_PER_SECOND: f32 = 60.0;

const BULLET_COLOR: Rgba = Rgba::WHITE;

/// Gun muzzle offsets from the ship centre, in sprite-local units
/// (unrotated) for the given scale.
pub fn gun_offsets(scale: u32) -> [Vec2; 2] {
    let unit = SHIP_CELL_SIZE as f32 * scale as f32;
    GUN_CELLS.map(|(col, row)| Vec2::new((col - GRID_CENTER) * unit, (row - GRID_CENTER) * unit))
}

/// World-space gun muzzles for the ship's current pose.
pub fn gun_positions(ship: &Ship) -> [Vec2; 2] {
    let rotation = Rotation2::new(ship.angle.to_radians());
    gun_offsets(ship.scale).map(|offset| ship.position + rotation * offset)
}

// ── Cadence ──────────────────────────────────────────────────────────────────

/// Pseudo-random but frame-rate-independent firing rhythm.
#[derive(Clone, Debug, PartialEq)]
pub struct FireCadence {
    /// Seconds since the last volley.
    pub accumulator: f32,
    /// Seconds to wait before the next volley.
    pub threshold: f32,
}

impl Default for FireCadence {
    fn default() -> Self {
        Self {
            accumulator: 0.0,
            threshold: FIRST_INTERVAL_FRAMES as f32 / FRAMES_PER_SECOND,
        }
    }
}

impl FireCadence {
    /// Advance by `dt`.  Returns `true` when a volley is due, in which case
    /// the accumulator restarts and a new threshold is rolled.
    pub fn advance(&mut self, dt: f32, rng: &mut impl Rng) -> bool {
        self.accumulator += dt;
        if self.accumulator < self.threshold {
            return false;
        }
        self.accumulator = 0.0;
        let frames = rng.gen_range(MIN_INTERVAL_FRAMES..MAX_INTERVAL_FRAMES);
        self.threshold = frames as f32 / FRAMES_PER_SECOND;
        true
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// ── System ───────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct ProjectileSystem {
    bullets: Vec<Bullet>,
    cadence: FireCadence,
}

impl ProjectileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    pub fn len(&self) -> usize {
        self.bullets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bullets.is_empty()
    }

    pub fn cadence(&self) -> &FireCadence {
        &self.cadence
    }

    /// Restart the firing rhythm; called when a new vignette begins.
    pub fn reset_cadence(&mut self) {
        self.cadence.reset();
    }

    /// Add `bullet` as-is, outside any volley.
    pub fn push(&mut self, bullet: Bullet) {
        self.bullets.push(bullet);
    }

    /// Fire one volley (one bullet per gun).  Does nothing unless the ship
    /// is active and in combat.  Returns the number of bullets spawned.
    pub fn fire(&mut self, ship: &Ship) -> usize {
        if !ship.active || ship.mode != Mode::Combat {
            return 0;
        }
        let angle = ship.angle.to_radians();
        let velocity = Vec2::new(angle.cos(), angle.sin()) * BULLET_SPEED + ship.velocity;
        let radius = ship.scale as f32;
        let muzzles = gun_positions(ship);
        for position in muzzles {
            self.bullets.push(Bullet {
                position,
                velocity,
                radius,
                life: BULLET_LIFE,
            });
        }
        muzzles.len()
    }

    /// Advance the cadence and fire if a volley is due.
    pub fn update_fire(&mut self, ship: &Ship, dt: f32, rng: &mut impl Rng) -> usize {
        if ship.active && ship.mode == Mode::Combat && self.cadence.advance(dt, rng) {
            self.fire(ship)
        } else {
            0
        }
    }

    /// Integrate and retire expired bullets.
    pub fn tick(&mut self, dt: f32) {
        for b in &mut self.bullets {
            b.position += b.velocity * dt;
            b.life -= dt;
        }
        self.bullets.retain(|b| b.life > 0.0);
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        for b in &self.bullets {
            canvas.fill_circle(b.position, b.radius, BULLET_COLOR);
        }
    }
}
