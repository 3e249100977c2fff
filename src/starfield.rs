/// Four-layer parallax starfield.
///
/// Stars fall towards the viewer along z, are projected around a slowly
/// drifting camera centre, and wrap back to the far end of their layer
/// when they pass the viewer.

use rand::Rng;

use crate::canvas::Canvas;
use crate::entities::{Layer, Rgba, Star, Vec2, Viewport};

/// Depth units per second.
pub const STAR_SPEED: f32 = 80.0;
pub const FOCAL_LENGTH: f32 = 128.0;
/// Angular frequency (rad/s) of the camera centre's x drift.
const DRIFT_FREQ_X: f32 = 0.001;
const DRIFT_FREQ_Y: f32 = 0.0013;
/// Drift amplitude as a fraction of the viewport size.
const DRIFT_AMOUNT: f32 = 0.1;
/// Largest opacity change per tick, either direction.
pub const TWINKLE_STEP: f32 = 0.025;
pub const MIN_OPACITY: f32 = 0.1;
pub const MAX_OPACITY: f32 = 1.0;
/// Halo radius relative to the star's point size.
const GLOW_SPREAD: f32 = 3.0;
const GLOW_OPACITY: f32 = 0.4;

/// Layer definitions for a viewport `width` units wide.  A pure function
/// of the width.
pub fn generate_layers(width: u32) -> Vec<Layer> {
    let w = width as f32;
    let white = Rgba::rgb(0xff, 0xff, 0xff);
    vec![
        Layer { count: 50, near: w * 0.95, far: w, color: white, glow: true },
        Layer { count: 75, near: w * 0.7, far: w, color: Rgba::rgb(0x88, 0xcc, 0xff), glow: false },
        Layer { count: 100, near: w * 0.4, far: w * 0.7, color: white, glow: false },
        Layer { count: 125, near: w * 0.1, far: w * 0.4, color: Rgba::rgb(0xff, 0x99, 0xcc), glow: false },
    ]
}

fn sample_depth(layer: &Layer, rng: &mut impl Rng) -> f32 {
    if layer.far > layer.near {
        rng.gen_range(layer.near..layer.far)
    } else {
        layer.near
    }
}

fn sample_coord(extent: u32, rng: &mut impl Rng) -> f32 {
    if extent == 0 {
        0.0
    } else {
        rng.gen_range(0.0..extent as f32)
    }
}

pub struct Starfield {
    viewport: Viewport,
    layers: Vec<Layer>,
    stars: Vec<Star>,
    /// Seconds simulated since the field was created.
    time: f32,
}

impl Starfield {
    pub fn new(viewport: Viewport, rng: &mut impl Rng) -> Self {
        let mut field = Self {
            viewport,
            layers: Vec::new(),
            stars: Vec::new(),
            time: 0.0,
        };
        field.resize(viewport, rng);
        field
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Total stars across all layers.
    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }

    /// Regenerate layers for the new size and repopulate every star.  The
    /// old layer list and star set are replaced together.
    pub fn resize(&mut self, viewport: Viewport, rng: &mut impl Rng) {
        let layers = generate_layers(viewport.width);
        let mut stars = Vec::with_capacity(layers.iter().map(|l| l.count).sum());
        for (index, layer) in layers.iter().enumerate() {
            for _ in 0..layer.count {
                let x = sample_coord(viewport.width, rng);
                let y = sample_coord(viewport.height, rng);
                stars.push(Star {
                    x,
                    y,
                    z: sample_depth(layer, rng),
                    o: rng.gen_range(MIN_OPACITY..=MAX_OPACITY),
                    layer: index,
                    screen_x: x,
                    screen_y: y,
                    size: 0.0,
                });
            }
        }
        self.viewport = viewport;
        self.layers = layers;
        self.stars = stars;
    }

    /// Current projection centre.
    pub fn camera_center(&self) -> Vec2 {
        let w = self.viewport.width as f32;
        let h = self.viewport.height as f32;
        Vec2::new(
            w / 2.0 + (self.time * DRIFT_FREQ_X).sin() * w * DRIFT_AMOUNT,
            h / 2.0 + (self.time * DRIFT_FREQ_Y).cos() * h * DRIFT_AMOUNT,
        )
    }

    /// Advance every star by `dt` seconds.
    pub fn tick(&mut self, dt: f32, rng: &mut impl Rng) {
        self.time += dt;
        let center = self.camera_center();
        let width = self.viewport.width as f32;

        for star in &mut self.stars {
            star.z -= STAR_SPEED * dt;
            if star.z <= 0.0 {
                let layer = &self.layers[star.layer];
                star.z = sample_depth(layer, rng);
                star.x = sample_coord(self.viewport.width, rng);
                star.y = sample_coord(self.viewport.height, rng);
            }

            let k = FOCAL_LENGTH / star.z;
            star.screen_x = (star.x - center.x) * k + center.x;
            star.screen_y = (star.y - center.y) * k + center.y;
            star.size = if width > 0.0 { (1.0 - star.z / width) * 2.0 } else { 0.0 };

            star.o += rng.gen_range(-TWINKLE_STEP..=TWINKLE_STEP);
            star.o = star.o.clamp(MIN_OPACITY, MAX_OPACITY);
        }
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        for star in &self.stars {
            let layer = &self.layers[star.layer];
            let at = Vec2::new(star.screen_x, star.screen_y);
            let color = layer.color.with_opacity(star.o);
            if layer.glow {
                let halo = (star.size * GLOW_SPREAD).max(2.0);
                canvas.fill_glow(at, halo, color.with_opacity(GLOW_OPACITY));
            }
            canvas.fill_circle(at, star.size, color);
        }
    }
}
