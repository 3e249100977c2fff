/// The render loop's simulation context.
///
/// `Backdrop` owns every system and surface: the starfield renders onto
/// the sky layer, the vignette onto a transparent battle layer, and the
/// two are composited into the output canvas.  Systems never reach into
/// each other; the context hands them what they need for each pass.

use std::time::Instant;

use rand::Rng;

use crate::canvas::Canvas;
use crate::director::{Director, VignetteEvent};
use crate::entities::{Mode, Rgba, Viewport};
use crate::particles::ParticleSystem;
use crate::projectiles::ProjectileSystem;
use crate::sprites::{
    angle_step_for, RotatedSpriteCache, SpriteSheet, ALIEN_CELL_SIZE, DEFAULT_ANGLE_STEP,
    SHIP_CELL_SIZE,
};
use crate::starfield::Starfield;

/// Longest frame step ever simulated, seconds.
pub const MAX_FRAME_DELTA: f32 = 0.25;

// ── Frame clock ──────────────────────────────────────────────────────────────

/// Turns monotonic timestamps into per-frame deltas.
#[derive(Debug, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the previous call, clamped to `[0, MAX_FRAME_DELTA]`.
    /// The first call returns 0.
    pub fn tick(&mut self, now: Instant) -> f32 {
        let delta = match self.last {
            Some(last) => now.saturating_duration_since(last).as_secs_f32(),
            None => 0.0,
        };
        self.last = Some(now);
        delta.min(MAX_FRAME_DELTA)
    }
}

// ── Backdrop ─────────────────────────────────────────────────────────────────

pub struct Backdrop {
    viewport: Viewport,
    background: Rgba,
    starfield: Starfield,
    director: Director,
    particles: ParticleSystem,
    projectiles: ProjectileSystem,
    ship_sprites: RotatedSpriteCache,
    alien_sprites: RotatedSpriteCache,
    /// Heading quantization for sprite rotations, degrees.
    angle_step: u32,
    sky: Canvas,
    battle: Canvas,
    output: Canvas,
}

impl Backdrop {
    pub fn new(viewport: Viewport, background: Rgba, rng: &mut impl Rng) -> Self {
        Self {
            viewport,
            background,
            starfield: Starfield::new(viewport, rng),
            director: Director::new(viewport),
            particles: ParticleSystem::new(),
            projectiles: ProjectileSystem::new(),
            ship_sprites: RotatedSpriteCache::new(SpriteSheet::ship(), SHIP_CELL_SIZE),
            alien_sprites: RotatedSpriteCache::new(SpriteSheet::alien(), ALIEN_CELL_SIZE),
            angle_step: DEFAULT_ANGLE_STEP,
            sky: Canvas::new(viewport.width, viewport.height),
            battle: Canvas::new(viewport.width, viewport.height),
            output: Canvas::new(viewport.width, viewport.height),
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn starfield(&self) -> &Starfield {
        &self.starfield
    }

    pub fn director(&self) -> &Director {
        &self.director
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn projectiles(&self) -> &ProjectileSystem {
        &self.projectiles
    }

    /// The composited frame from the last `frame` call.
    pub fn output(&self) -> &Canvas {
        &self.output
    }

    /// Use `step` whole degrees between cached rotations (at least 1).
    pub fn with_angle_step(mut self, step: u32) -> Self {
        self.angle_step = step.max(1);
        self
    }

    pub fn angle_step(&self) -> u32 {
        self.angle_step
    }

    pub fn ship_sprites(&self) -> &RotatedSpriteCache {
        &self.ship_sprites
    }

    /// Rebuild the starfield and surfaces for a new size.  The running
    /// vignette, particles and bullets carry over untouched.
    pub fn resize(&mut self, viewport: Viewport, rng: &mut impl Rng) {
        if viewport == self.viewport {
            return;
        }
        log::info!(
            "viewport resized {}x{} -> {}x{}",
            self.viewport.width,
            self.viewport.height,
            viewport.width,
            viewport.height
        );
        self.viewport = viewport;
        self.starfield.resize(viewport, rng);
        self.director.set_viewport(viewport);
        self.sky.resize(viewport.width, viewport.height);
        self.battle.resize(viewport.width, viewport.height);
        self.output.resize(viewport.width, viewport.height);
    }

    /// Start a vignette of `mode` immediately.
    pub fn force_spawn(&mut self, mode: Mode, rng: &mut impl Rng) -> VignetteEvent {
        self.projectiles.reset_cadence();
        self.director.force_spawn(mode, rng)
    }

    /// Run one complete frame of `dt` seconds and composite the result.
    pub fn frame(&mut self, dt: f32, rng: &mut impl Rng) -> Vec<VignetteEvent> {
        self.update_sky(dt, rng);
        let events = self.update_battle(dt, rng);
        self.draw_battle();
        self.output.compose(&self.sky, &self.battle);
        events
    }

    /// Starfield pass: runs every frame, independent of the vignette.
    pub fn update_sky(&mut self, dt: f32, rng: &mut impl Rng) {
        self.starfield.tick(dt, rng);
        self.sky.clear(self.background);
        self.starfield.draw(&mut self.sky);
    }

    /// Vignette simulation pass, in fixed order: spawn roll, director tick
    /// (motion and deactivation), thrust, gunfire, particles, bullets.
    pub fn update_battle(&mut self, dt: f32, rng: &mut impl Rng) -> Vec<VignetteEvent> {
        let mut events = Vec::new();

        if !self.director.is_active() {
            if let Some(event) = self.director.maybe_spawn(dt, rng) {
                self.projectiles.reset_cadence();
                events.push(event);
            }
        }

        events.extend(self.director.tick(dt));

        let ship = self.director.ship();
        if ship.active {
            if ship.mode != Mode::Broken {
                self.particles.emit_thrust(ship, rng);
            }
            self.projectiles.update_fire(ship, dt, rng);
        }

        self.particles.tick(dt);
        self.projectiles.tick(dt);
        events
    }

    /// Draw the battle layer back to front: particles, bullets, alien, ship.
    pub fn draw_battle(&mut self) {
        self.battle.clear_transparent();
        self.particles.draw(&mut self.battle);
        self.projectiles.draw(&mut self.battle);

        let ship = self.director.ship();
        let alien = self.director.alien();
        let step = angle_step_for(ship.mode, self.angle_step);
        if ship.active && alien.active {
            match self
                .alien_sprites
                .get(alien.frame_index, alien.scale, alien.angle, step)
            {
                Some(bitmap) => self.battle.blit(&bitmap, alien.position, 0.0, 1.0),
                None => log::warn!("no alien sprite for frame {}", alien.frame_index),
            }
        }
        if ship.active {
            match self.ship_sprites.get(0, ship.scale, ship.angle, step) {
                Some(bitmap) => self.battle.blit(&bitmap, ship.position, 0.0, 1.0),
                None => log::warn!("no ship sprite at scale {}", ship.scale),
            }
        }
    }
}
