/// Terminal presenter. All terminal I/O lives here.
///
/// Each terminal cell shows two vertically stacked canvas pixels: the
/// upper half block `▀` takes the top pixel as its foreground and the
/// bottom pixel as its background.  Only cells that changed since the last
/// frame are re-emitted, inside a synchronized update.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal::{BeginSynchronizedUpdate, EndSynchronizedUpdate},
    QueueableCommand,
};
use signage_backdrop::canvas::Canvas;
use signage_backdrop::entities::{Rgba, Viewport};

const HALF_BLOCK: char = '▀';

/// Canvas pixels per terminal cell, vertically.
pub const PIXELS_PER_ROW: u32 = 2;

/// Canvas viewport backing a `cols` × `rows` terminal.
pub fn viewport_for(cols: u16, rows: u16) -> Viewport {
    Viewport::new(cols.max(1) as u32, rows.max(1) as u32 * PIXELS_PER_ROW)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cell {
    top: (u8, u8, u8),
    bottom: (u8, u8, u8),
}

fn rgb(pixel: Option<Rgba>) -> (u8, u8, u8) {
    pixel.map(|p| (p.r, p.g, p.b)).unwrap_or((0, 0, 0))
}

fn color((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb { r, g, b }
}

pub struct Presenter {
    cols: u16,
    rows: u16,
    /// What the terminal shows; `None` forces a redraw.
    shown: Vec<Option<Cell>>,
    next: Vec<Cell>,
}

impl Presenter {
    pub fn new(cols: u16, rows: u16) -> Self {
        let mut presenter = Self {
            cols: 0,
            rows: 0,
            shown: Vec::new(),
            next: Vec::new(),
        };
        presenter.resize(cols, rows);
        presenter
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        let n = cols as usize * rows as usize;
        self.shown = vec![None; n];
        self.next = vec![Cell { top: (0, 0, 0), bottom: (0, 0, 0) }; n];
    }

    fn sample(&mut self, canvas: &Canvas) {
        for row in 0..self.rows as u32 {
            for col in 0..self.cols as u32 {
                let i = (row * self.cols as u32 + col) as usize;
                self.next[i] = Cell {
                    top: rgb(canvas.pixel(col, row * PIXELS_PER_ROW)),
                    bottom: rgb(canvas.pixel(col, row * PIXELS_PER_ROW + 1)),
                };
            }
        }
    }

    /// Present one composited frame.
    pub fn render<W: Write>(&mut self, out: &mut W, canvas: &Canvas) -> std::io::Result<()> {
        self.sample(canvas);

        out.queue(BeginSynchronizedUpdate)?;
        let mut fg = None;
        let mut bg = None;
        for row in 0..self.rows {
            for col in 0..self.cols {
                let i = row as usize * self.cols as usize + col as usize;
                let cell = self.next[i];
                if self.shown[i] == Some(cell) {
                    continue;
                }
                self.shown[i] = Some(cell);

                out.queue(cursor::MoveTo(col, row))?;
                if fg != Some(cell.top) {
                    fg = Some(cell.top);
                    out.queue(style::SetForegroundColor(color(cell.top)))?;
                }
                if bg != Some(cell.bottom) {
                    bg = Some(cell.bottom);
                    out.queue(style::SetBackgroundColor(color(cell.bottom)))?;
                }
                out.queue(Print(HALF_BLOCK))?;
            }
        }
        out.queue(style::ResetColor)?;
        out.queue(EndSynchronizedUpdate)?;
        out.flush()
    }
}
