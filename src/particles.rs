/// Thrust particles: short-lived glow discs trailing the ship.

use nalgebra::Rotation2;
use rand::Rng;

use crate::canvas::Canvas;
use crate::entities::{Particle, Rgba, Ship, Vec2};
use crate::sprites::SHIP_CELL_SIZE;

pub const PARTICLES_PER_EMIT: usize = 4;
/// Half-width of the exhaust cone, radians.
pub const THRUST_SPREAD: f32 = 0.3;
pub const MIN_SPEED: f32 = 1.0;
pub const MAX_SPEED: f32 = 1.5;
/// Alpha lost per second (0.1 per 60 Hz frame).
pub const ALPHA_FADE_PER_SECOND: f32 = 6.0;
/// Gradient reaches full transparency at this multiple of the radius.
const GRADIENT_REACH: f32 = 1.8;
const CORE_COLOR: Rgba = Rgba::rgb(180, 220, 255);
const EDGE_COLOR: Rgba = Rgba::new(0, 100, 255, 0);

/// Ship sprite width in cells.
const SHIP_COLS: f32 = 15.0;

/// Radius multiplier applied per second (0.9 per 60 Hz frame).
pub fn radius_decay_per_second() -> f32 {
    0.9_f32.powi(60)
}

/// World-space rear-centre of the ship, where exhaust leaves it.
pub fn thrust_origin(ship: &Ship) -> Vec2 {
    let half_width = SHIP_COLS * SHIP_CELL_SIZE as f32 * ship.scale as f32 / 2.0;
    let rear = Rotation2::new(ship.angle.to_radians()) * Vec2::new(-half_width, 0.0);
    ship.position + rear
}

#[derive(Default)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Emit one burst of exhaust behind `ship`.
    pub fn emit_thrust(&mut self, ship: &Ship, rng: &mut impl Rng) {
        let origin = thrust_origin(ship);
        let backwards = ship.angle.to_radians() + std::f32::consts::PI;
        let scale = ship.scale as f32;
        for _ in 0..PARTICLES_PER_EMIT {
            let heading = backwards + rng.gen_range(-THRUST_SPREAD..THRUST_SPREAD);
            let speed = rng.gen_range(MIN_SPEED..MAX_SPEED);
            self.particles.push(Particle {
                position: origin,
                velocity: Vec2::new(heading.cos(), heading.sin()) * speed,
                radius: (3.0 + rng.gen::<f32>()) * scale,
                alpha: 1.0,
            });
        }
    }

    /// Integrate, decay, and drop particles that have faded out.
    pub fn tick(&mut self, dt: f32) {
        let shrink = radius_decay_per_second().powf(dt);
        for p in &mut self.particles {
            p.position += p.velocity * dt;
            p.radius *= shrink;
            p.alpha -= ALPHA_FADE_PER_SECOND * dt;
        }
        self.particles.retain(|p| p.alpha > 0.0);
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        for p in &self.particles {
            canvas.fill_radial_gradient(
                p.position,
                p.radius,
                CORE_COLOR.with_opacity(p.alpha),
                EDGE_COLOR,
                p.radius * GRADIENT_REACH,
            );
        }
    }
}
