/// Vignette director, the ship/alien state machine.
///
/// Inactive → Active{normal | broken | combat} → Inactive.  The director
/// owns the single ship and its dependent alien escort.  Randomness comes
/// in through `rng` so callers control determinism (tests use a seeded
/// RNG).

use rand::Rng;

use crate::entities::{parked_position, Alien, Mode, Pose, Ship, Vec2, Viewport};
use crate::sprites::ALIEN_FRAME_COUNT;

// ── Tuning ───────────────────────────────────────────────────────────────────

/// Chance of a spawn per 60 Hz frame while inactive.
pub const SPAWN_CHANCE_PER_FRAME: f64 = 0.002;
/// How far outside the viewport a ship starts.
pub const SPAWN_MARGIN: f32 = 100.0;
/// How far outside the viewport a ship may wander before retiring.
pub const DESPAWN_BUFFER: f32 = 100.0;
/// Target jitter as a fraction of the smaller viewport dimension.
pub const TARGET_SPREAD: f32 = 0.25;
pub const MIN_SCALE: u32 = 1;
pub const MAX_SCALE: u32 = 4;
/// Heading change per second while broken (0.5° per 60 Hz frame).
pub const BROKEN_SPIN_DEG_PER_SEC: f32 = 30.0;

pub const ALIEN_FORWARD_OFFSET: f32 = 200.0;
pub const BOB_AMPLITUDE: f32 = 50.0;
/// Bobbing angular frequency, rad/s of ship elapsed time.
pub const BOB_FREQUENCY: f32 = 2.0;
/// Seconds per alien animation frame (30 frames at 60 Hz).
pub const ALIEN_FRAME_PERIOD: f32 = 0.5;

/// Speeds in units per second.
const BROKEN_SPEED: (f32, f32) = (0.8 * 60.0, 1.6 * 60.0);
const CRUISE_SPEED: (f32, f32) = (2.0 * 60.0, 8.0 * 60.0);

/// Longest a vignette of `mode` may run, seconds.
pub fn lifetime_cap(mode: Mode) -> f32 {
    match mode {
        Mode::Broken => 50.0,
        Mode::Combat => 25.0,
        Mode::Normal => 20.0,
    }
}

/// Spawn hazard rate per second equivalent to the per-frame chance.
pub fn spawn_rate_per_second() -> f64 {
    -60.0 * (1.0 - SPAWN_CHANCE_PER_FRAME).ln()
}

/// Probability that a spawn happens within a frame of `dt` seconds.
pub fn spawn_probability(dt: f32) -> f64 {
    if dt <= 0.0 || !dt.is_finite() {
        return 0.0;
    }
    1.0 - (-spawn_rate_per_second() * dt as f64).exp()
}

/// 10% broken, 30% combat, 60% normal.
pub fn roll_mode(rng: &mut impl Rng) -> Mode {
    let roll: f64 = rng.gen();
    if roll < 0.1 {
        Mode::Broken
    } else if roll < 0.4 {
        Mode::Combat
    } else {
        Mode::Normal
    }
}

pub fn roll_scale(rng: &mut impl Rng) -> u32 {
    rng.gen_range(MIN_SCALE..=MAX_SCALE)
}

pub fn roll_speed(mode: Mode, rng: &mut impl Rng) -> f32 {
    let (lo, hi) = match mode {
        Mode::Broken => BROKEN_SPEED,
        Mode::Normal | Mode::Combat => CRUISE_SPEED,
    };
    rng.gen_range(lo..hi)
}

/// The escort's pose: ahead of the ship along its heading, bobbing side to
/// side.  A pure function of the ship pose and its elapsed time.
pub fn alien_pose(ship: Pose, elapsed: f32) -> Pose {
    let heading = ship.angle.to_radians();
    let forward = Vec2::new(heading.cos(), heading.sin());
    let side = Vec2::new(-forward.y, forward.x);
    let bob = (elapsed * BOB_FREQUENCY).sin() * BOB_AMPLITUDE;
    Pose {
        position: ship.position + forward * ALIEN_FORWARD_OFFSET + side * bob,
        angle: ship.angle,
    }
}

// ── Spawn planning ───────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Top, Edge::Right, Edge::Bottom, Edge::Left];
}

/// Where a vignette starts and how it moves.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnPlan {
    pub edge: Edge,
    pub position: Vec2,
    pub target: Vec2,
    pub velocity: Vec2,
    /// Heading in degrees, `atan2(vy, vx)`.
    pub angle: f32,
}

impl SpawnPlan {
    /// Head from `position` straight at `target` at `speed`.  A zero-length
    /// path yields a non-finite velocity, which the director retires.
    pub fn toward(edge: Edge, position: Vec2, target: Vec2, speed: f32) -> Self {
        let delta = target - position;
        let velocity = delta / delta.norm() * speed;
        Self {
            edge,
            position,
            target,
            velocity,
            angle: velocity.y.atan2(velocity.x).to_degrees(),
        }
    }
}

fn along(extent: f32, rng: &mut impl Rng) -> f32 {
    if extent > 0.0 {
        rng.gen_range(0.0..extent)
    } else {
        0.0
    }
}

/// A uniformly random point just outside `edge`.
pub fn spawn_point(viewport: Viewport, edge: Edge, rng: &mut impl Rng) -> Vec2 {
    let w = viewport.width as f32;
    let h = viewport.height as f32;
    match edge {
        Edge::Top => Vec2::new(along(w, rng), -SPAWN_MARGIN),
        Edge::Right => Vec2::new(w + SPAWN_MARGIN, along(h, rng)),
        Edge::Bottom => Vec2::new(along(w, rng), h + SPAWN_MARGIN),
        Edge::Left => Vec2::new(-SPAWN_MARGIN, along(h, rng)),
    }
}

/// A point jittered around the viewport centre.
pub fn spawn_target(viewport: Viewport, rng: &mut impl Rng) -> Vec2 {
    let spread = viewport.width.min(viewport.height) as f32 * TARGET_SPREAD;
    let jitter = Vec2::new(rng.gen::<f32>() - 0.5, rng.gen::<f32>() - 0.5) * spread;
    viewport.center() + jitter
}

/// Random edge, start point, target and speed for a vignette of `mode`.
pub fn plan_spawn(viewport: Viewport, mode: Mode, rng: &mut impl Rng) -> SpawnPlan {
    let edge = Edge::ALL[rng.gen_range(0..Edge::ALL.len())];
    let position = spawn_point(viewport, edge, rng);
    let target = spawn_target(viewport, rng);
    let speed = roll_speed(mode, rng);
    SpawnPlan::toward(edge, position, target, speed)
}

// ── Events ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetireReason {
    /// Left the viewport by more than the despawn buffer.
    OutOfBounds,
    /// Ran past the mode's lifetime cap.
    Expired,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VignetteEvent {
    Spawned { mode: Mode, scale: u32, speed: f32 },
    Retired { mode: Mode, reason: RetireReason, elapsed: f32 },
}

// ── Director ─────────────────────────────────────────────────────────────────

pub struct Director {
    viewport: Viewport,
    ship: Ship,
    alien: Alien,
}

impl Director {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ship: Ship::default(),
            alien: Alien::default(),
        }
    }

    pub fn ship(&self) -> &Ship {
        &self.ship
    }

    pub fn alien(&self) -> &Alien {
        &self.alien
    }

    pub fn is_active(&self) -> bool {
        self.ship.active
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Takes effect on the next bounds check; in-flight state is kept.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// While inactive, roll for a spawn over a frame of `dt` seconds.
    pub fn maybe_spawn(&mut self, dt: f32, rng: &mut impl Rng) -> Option<VignetteEvent> {
        if self.ship.active || !rng.gen_bool(spawn_probability(dt).clamp(0.0, 1.0)) {
            return None;
        }
        Some(self.spawn_random(rng))
    }

    /// Roll mode, scale and trajectory, then spawn.
    pub fn spawn_random(&mut self, rng: &mut impl Rng) -> VignetteEvent {
        let mode = roll_mode(rng);
        self.force_spawn(mode, rng)
    }

    /// Spawn a vignette of `mode` right away, replacing any running one.
    pub fn force_spawn(&mut self, mode: Mode, rng: &mut impl Rng) -> VignetteEvent {
        let scale = roll_scale(rng);
        let plan = plan_spawn(self.viewport, mode, rng);
        self.spawn(mode, scale, plan)
    }

    /// Start a vignette from an explicit plan.
    pub fn spawn(&mut self, mode: Mode, scale: u32, plan: SpawnPlan) -> VignetteEvent {
        self.ship = Ship {
            position: plan.position,
            velocity: plan.velocity,
            angle: plan.angle,
            active: true,
            timer: 0.0,
            scale,
            mode,
        };
        if mode == Mode::Combat {
            let pose = alien_pose(self.ship.pose(), 0.0);
            self.alien = Alien {
                position: pose.position,
                angle: pose.angle,
                active: true,
                scale,
                frame_index: 0,
                frame_ticker: 0.0,
            };
        } else {
            self.park_alien();
        }

        let speed = plan.velocity.norm();
        log::info!(
            "vignette spawned: mode={} scale={} edge={:?} speed={:.0}",
            mode.as_str(),
            scale,
            plan.edge,
            speed
        );
        VignetteEvent::Spawned { mode, scale, speed }
    }

    fn park_alien(&mut self) {
        self.alien.active = false;
        self.alien.position = parked_position();
        self.alien.frame_index = 0;
        self.alien.frame_ticker = 0.0;
    }

    /// End the running vignette.
    pub fn retire(&mut self, reason: RetireReason) -> VignetteEvent {
        self.ship.active = false;
        self.park_alien();
        log::debug!(
            "vignette retired: mode={} reason={:?} elapsed={:.1}s",
            self.ship.mode.as_str(),
            reason,
            self.ship.timer
        );
        VignetteEvent::Retired {
            mode: self.ship.mode,
            reason,
            elapsed: self.ship.timer,
        }
    }

    /// True once `position` is more than the despawn buffer outside the
    /// viewport on any side.  Non-finite positions count as outside.
    pub fn is_out_of_bounds(&self, position: Vec2) -> bool {
        if !position.x.is_finite() || !position.y.is_finite() {
            return true;
        }
        let w = self.viewport.width as f32;
        let h = self.viewport.height as f32;
        position.x < -DESPAWN_BUFFER
            || position.x > w + DESPAWN_BUFFER
            || position.y < -DESPAWN_BUFFER
            || position.y > h + DESPAWN_BUFFER
    }

    /// Why the running vignette should end now, if it should.
    pub fn retire_reason(&self) -> Option<RetireReason> {
        if !self.ship.active {
            None
        } else if self.is_out_of_bounds(self.ship.position) {
            Some(RetireReason::OutOfBounds)
        } else if self.ship.timer >= lifetime_cap(self.ship.mode) {
            Some(RetireReason::Expired)
        } else {
            None
        }
    }

    /// Advance the running vignette by `dt` seconds, then apply the
    /// deactivation checks.  Does nothing while inactive.
    pub fn tick(&mut self, dt: f32) -> Option<VignetteEvent> {
        if !self.ship.active {
            return None;
        }

        self.ship.position += self.ship.velocity * dt;
        self.ship.timer += dt;
        if self.ship.mode == Mode::Broken {
            self.ship.angle += BROKEN_SPIN_DEG_PER_SEC * dt;
        }

        if self.ship.mode == Mode::Combat && self.alien.active {
            let pose = alien_pose(self.ship.pose(), self.ship.timer);
            self.alien.position = pose.position;
            self.alien.angle = pose.angle;
            self.alien.scale = self.ship.scale;

            self.alien.frame_ticker += dt;
            if self.alien.frame_ticker >= ALIEN_FRAME_PERIOD {
                self.alien.frame_ticker = 0.0;
                self.alien.frame_index = (self.alien.frame_index + 1) % ALIEN_FRAME_COUNT;
            }
        }

        self.retire_reason().map(|reason| self.retire(reason))
    }
}
