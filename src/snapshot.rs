/// Headless runs: simulate at a fixed step and save the final frame as PNG.

use std::path::Path;

use rand::Rng;

use crate::backdrop::Backdrop;
use crate::canvas::Canvas;
use crate::error::BackdropError;

/// Step the backdrop for `duration` seconds at `fps`.  Returns the number
/// of frames simulated.
pub fn run_headless(backdrop: &mut Backdrop, duration: f32, fps: u32, rng: &mut impl Rng) -> u32 {
    let fps = fps.max(1);
    let dt = 1.0 / fps as f32;
    let frames = (duration.max(0.0) * fps as f32).ceil() as u32;
    for _ in 0..frames {
        for event in backdrop.frame(dt, rng) {
            log::debug!("{event:?}");
        }
    }
    frames
}

pub fn write_png(canvas: &Canvas, path: &Path) -> Result<(), BackdropError> {
    image::save_buffer(
        path,
        &canvas.to_rgba8(),
        canvas.width(),
        canvas.height(),
        image::ColorType::Rgba8,
    )?;
    log::info!(
        "wrote {}x{} snapshot to {}",
        canvas.width(),
        canvas.height(),
        path.display()
    );
    Ok(())
}
