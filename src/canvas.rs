/// Software raster surface: every pixel the backdrop shows is drawn here.
///
/// The canvas is a plain RGBA buffer with just the primitives the backdrop
/// needs: solid fills, discs, halos, radial gradients, nearest-neighbour
/// sprite blits and source-over compositing.  Nothing is ever smoothed, so
/// pixel-art sprites stay crisp at every scale and rotation.

use std::f32::consts::PI;

use nalgebra::Rotation2;

use crate::entities::{Rgba, Vec2};

/// Radii below this are drawn as a single partially covered pixel.
const SUBPIXEL_RADIUS: f32 = 0.75;

// ── Blending ─────────────────────────────────────────────────────────────────

/// Source-over blend of straight-alpha colours.
fn blend(src: Rgba, dst: Rgba) -> Rgba {
    if src.a == 255 {
        return src;
    }
    if src.a == 0 {
        return dst;
    }
    let sa = src.a as f32 / 255.0;
    let da = dst.a as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    let channel = |s: u8, d: u8| -> u8 {
        let v = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
        v.round().clamp(0.0, 255.0) as u8
    };
    Rgba::new(
        channel(src.r, dst.r),
        channel(src.g, dst.g),
        channel(src.b, dst.b),
        (out_a * 255.0).round() as u8,
    )
}

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round().clamp(0.0, 255.0) as u8
}

fn lerp_rgba(a: Rgba, b: Rgba, t: f32) -> Rgba {
    Rgba::new(
        lerp_u8(a.r, b.r, t),
        lerp_u8(a.g, b.g, t),
        lerp_u8(a.b, b.b, t),
        lerp_u8(a.a, b.a, t),
    )
}

fn is_finite(v: Vec2) -> bool {
    v.x.is_finite() && v.y.is_finite()
}

// ── Bitmap ───────────────────────────────────────────────────────────────────

/// An immutable-once-built image, used for pre-rendered sprites.
#[derive(Clone, Debug, PartialEq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Bitmap {
    /// Fully transparent bitmap.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::TRANSPARENT; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x < self.width && y < self.height {
            Some(self.pixels[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }

    /// Overwrite a rectangle, clipped to the bitmap.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgba) {
        let x_end = x.saturating_add(w).min(self.width);
        let y_end = y.saturating_add(h).min(self.height);
        for row in y..y_end {
            for col in x..x_end {
                self.pixels[row as usize * self.width as usize + col as usize] = color;
            }
        }
    }

    pub fn opaque_pixel_count(&self) -> usize {
        self.pixels.iter().filter(|p| p.a > 0).count()
    }

    /// Copy rotated by `angle_deg` about the centre, nearest-neighbour,
    /// into the smallest bitmap that holds every rotated texel.
    pub fn rotated(&self, angle_deg: f32) -> Bitmap {
        let (sin, cos) = angle_deg.to_radians().sin_cos();
        let (w, h) = (self.width as f32, self.height as f32);
        // Trim float noise so right angles keep the exact size.
        let out_w = ((w * cos.abs() + h * sin.abs()) - 1e-3).ceil().max(0.0) as u32;
        let out_h = ((w * sin.abs() + h * cos.abs()) - 1e-3).ceil().max(0.0) as u32;

        let mut out = Bitmap::new(out_w, out_h);
        let half = Vec2::new(w / 2.0, h / 2.0);
        let out_half = Vec2::new(out_w as f32 / 2.0, out_h as f32 / 2.0);
        let inverse = Rotation2::new(-angle_deg.to_radians());
        for y in 0..out_h {
            for x in 0..out_w {
                let offset = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - out_half;
                let local = inverse * offset + half;
                if local.x < 0.0 || local.y < 0.0 {
                    continue;
                }
                if let Some(texel) = self.pixel(local.x.floor() as u32, local.y.floor() as u32) {
                    out.pixels[y as usize * out_w as usize + x as usize] = texel;
                }
            }
        }
        out
    }
}

// ── Canvas ───────────────────────────────────────────────────────────────────

pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::TRANSPARENT; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reallocate to a new size; contents become transparent.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![Rgba::TRANSPARENT; width as usize * height as usize];
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba> {
        if x < self.width && y < self.height {
            Some(self.pixels[y as usize * self.width as usize + x as usize])
        } else {
            None
        }
    }

    pub fn clear(&mut self, color: Rgba) {
        self.pixels.fill(color);
    }

    pub fn clear_transparent(&mut self) {
        self.clear(Rgba::TRANSPARENT);
    }

    fn blend_pixel(&mut self, x: i64, y: i64, color: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let i = (y as usize) * self.width as usize + x as usize;
        self.pixels[i] = blend(color, self.pixels[i]);
    }

    /// Blend a filled axis-aligned rectangle.
    pub fn fill_rect(&mut self, x: i64, y: i64, w: u32, h: u32, color: Rgba) {
        for row in y..y + h as i64 {
            for col in x..x + w as i64 {
                self.blend_pixel(col, row, color);
            }
        }
    }

    /// Visit every pixel whose centre lies inside the disc, passing the
    /// distance from the disc centre to `shade`.
    fn shade_disc(&mut self, center: Vec2, radius: f32, mut shade: impl FnMut(f32) -> Rgba) {
        let x0 = (center.x - radius).floor().max(0.0) as i64;
        let y0 = (center.y - radius).floor().max(0.0) as i64;
        let x1 = ((center.x + radius).ceil() as i64).min(self.width as i64 - 1);
        let y1 = ((center.y + radius).ceil() as i64).min(self.height as i64 - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 + 0.5 - center.x;
                let dy = y as f32 + 0.5 - center.y;
                let d = (dx * dx + dy * dy).sqrt();
                if d <= radius {
                    let color = shade(d);
                    self.blend_pixel(x, y, color);
                }
            }
        }
    }

    pub fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        if !is_finite(center) || !radius.is_finite() || radius <= 0.0 {
            return;
        }
        if radius < SUBPIXEL_RADIUS {
            let coverage = (PI * radius * radius).min(1.0);
            self.blend_pixel(
                center.x.floor() as i64,
                center.y.floor() as i64,
                color.with_opacity(coverage),
            );
            return;
        }
        self.shade_disc(center, radius, |_| color);
    }

    /// Soft halo fading quadratically from `color` at the centre to nothing
    /// at `radius`.  Stands in for a canvas shadow blur.
    pub fn fill_glow(&mut self, center: Vec2, radius: f32, color: Rgba) {
        if !is_finite(center) || !radius.is_finite() || radius < SUBPIXEL_RADIUS {
            return;
        }
        self.shade_disc(center, radius, |d| {
            let falloff = 1.0 - d / radius;
            color.with_opacity(falloff * falloff)
        });
    }

    /// Disc of `radius` filled with a radial gradient running from `inner`
    /// at the centre to `outer` at `gradient_radius` (clamped beyond).
    pub fn fill_radial_gradient(
        &mut self,
        center: Vec2,
        radius: f32,
        inner: Rgba,
        outer: Rgba,
        gradient_radius: f32,
    ) {
        if !is_finite(center) || !radius.is_finite() || radius <= 0.0 || gradient_radius <= 0.0 {
            return;
        }
        if radius < SUBPIXEL_RADIUS {
            self.fill_circle(center, radius, inner);
            return;
        }
        self.shade_disc(center, radius, |d| {
            lerp_rgba(inner, outer, (d / gradient_radius).min(1.0))
        });
    }

    /// Draw `bitmap` centred on `center`, rotated by `angle_deg` and scaled
    /// by `scale`, sampling nearest-neighbour.  Transparent texels are
    /// skipped.
    pub fn blit(&mut self, bitmap: &Bitmap, center: Vec2, angle_deg: f32, scale: f32) {
        if !is_finite(center) || !angle_deg.is_finite() || !(scale > 0.0) {
            return;
        }
        let half = Vec2::new(
            bitmap.width() as f32 * scale / 2.0,
            bitmap.height() as f32 * scale / 2.0,
        );
        // Snap the top-left corner to the pixel grid so unrotated blits
        // land exactly one texel per cell.
        let origin = (center - half).map(|c| c.round());
        let center = origin + half;

        let inverse = Rotation2::new(-angle_deg.to_radians());
        let reach = half.norm().ceil();
        let x0 = ((center.x - reach).floor() as i64).max(0);
        let y0 = ((center.y - reach).floor() as i64).max(0);
        let x1 = ((center.x + reach).ceil() as i64).min(self.width as i64 - 1);
        let y1 = ((center.y + reach).ceil() as i64).min(self.height as i64 - 1);

        for y in y0..=y1 {
            for x in x0..=x1 {
                let offset = Vec2::new(x as f32 + 0.5, y as f32 + 0.5) - center;
                let local = (inverse * offset + half) / scale;
                if local.x < 0.0 || local.y < 0.0 {
                    continue;
                }
                let texel = bitmap.pixel(local.x.floor() as u32, local.y.floor() as u32);
                if let Some(color) = texel.filter(|c| c.a > 0) {
                    self.blend_pixel(x, y, color);
                }
            }
        }
    }

    /// Source-over composite `top` onto this canvas.  Sizes must match;
    /// mismatched layers are skipped.
    pub fn composite_over(&mut self, top: &Canvas) {
        if top.width != self.width || top.height != self.height {
            log::warn!(
                "skipping composite of {}x{} layer onto {}x{} canvas",
                top.width,
                top.height,
                self.width,
                self.height
            );
            return;
        }
        for (dst, src) in self.pixels.iter_mut().zip(top.pixels.iter()) {
            *dst = blend(*src, *dst);
        }
    }

    /// Copy `base` then composite `top` over it.
    pub fn compose(&mut self, base: &Canvas, top: &Canvas) {
        if base.width != self.width || base.height != self.height {
            self.resize(base.width, base.height);
        }
        self.pixels.copy_from_slice(&base.pixels);
        self.composite_over(top);
    }

    /// Flatten to `RGBA8` bytes, row-major.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|p| [p.r, p.g, p.b, p.a])
            .collect()
    }
}
