/// Pixel-art sprite sheets and the pre-rendered bitmap cache.
///
/// Sheets are written as text art plus a palette.  A palette entry of
/// `#000000` marks background, which renders transparent.  The cache turns
/// a `(frame, scale)` pair into a ready-to-blit bitmap once and hands out
/// shared handles after that.  `RotatedSpriteCache` does the same for
/// headings snapped to a whole-degree step, so the frame loop only ever
/// blits unrotated bitmaps.

use std::collections::HashMap;
use std::rc::Rc;

use crate::canvas::Bitmap;
use crate::entities::{Mode, Rgba};

const SHIP_ART: [&str; 15] = [
    "...............",
    "...............",
    "...............",
    "..####.........",
    "...##..........",
    "....##.........",
    "....####.......",
    "..###########..",
    "....####.......",
    "....##.........",
    "...##..........",
    "..####.........",
    "...............",
    "...............",
    "...............",
];

const SHIP_PALETTE: [(char, &str); 2] = [('.', "#000000"), ('#', "#ffffff")];

const ALIEN_ART: [[&str; 15]; 2] = [
    [
        "...............",
        ".....gg........",
        ".....ggg.......",
        "...gg.gglll....",
        "...ggg.gl..l...",
        "....gglgoo.....",
        "....llllool....",
        "...lllllll.....",
        "....llllool....",
        "....gglgoo.....",
        "...ggg.gl..l...",
        "...gg.gglll....",
        ".....ggg.......",
        ".....gg........",
        "...............",
    ],
    [
        "...............",
        "...............",
        ".....gg........",
        ".....gggll.....",
        "...gg.ggl.l....",
        "....gglgoo.....",
        "....llllool....",
        "...lllllll.....",
        "....llllool....",
        "....gglgoo.....",
        "...gg.ggl.l....",
        ".....gggll.....",
        ".....gg........",
        "...............",
        "...............",
    ],
];

const ALIEN_PALETTE: [(char, &str); 4] = [
    ('.', "#000000"),
    ('g', "#60c494"),
    ('l', "#68a22a"),
    ('o', "#b9712f"),
];

pub const ALIEN_FRAME_COUNT: usize = ALIEN_ART.len();

/// Units per sprite cell at scale 1.
pub const SHIP_CELL_SIZE: u32 = 2;
pub const ALIEN_CELL_SIZE: u32 = 1;

/// Heading quantization in degrees.
pub const DEFAULT_ANGLE_STEP: u32 = 3;
/// Finer step for the slow tumble of a broken ship.
pub const BROKEN_ANGLE_STEP: u32 = 1;

// ── Sheets ───────────────────────────────────────────────────────────────────

/// One animation frame: a grid of cells, `None` = background.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteFrame {
    cols: usize,
    rows: usize,
    cells: Vec<Option<Rgba>>,
}

impl SpriteFrame {
    /// Build a frame from text art.  Characters missing from the palette,
    /// and palette colours equal to `#000000`, are background.
    pub fn from_art(art: &[&str], palette: &[(char, &str)]) -> Self {
        let rows = art.len();
        let cols = art.iter().map(|row| row.chars().count()).max().unwrap_or(0);
        let lookup: HashMap<char, Option<Rgba>> = palette
            .iter()
            .map(|(ch, hex)| {
                let color = Rgba::from_hex(hex).filter(|c| *c != Rgba::rgb(0, 0, 0));
                (*ch, color)
            })
            .collect();

        let mut cells = vec![None; cols * rows];
        for (r, row) in art.iter().enumerate() {
            for (c, ch) in row.chars().enumerate() {
                cells[r * cols + c] = lookup.get(&ch).copied().flatten();
            }
        }
        Self { cols, rows, cells }
    }

    /// Build a frame from a 0/1 grid painted in a single colour.
    pub fn from_mask(mask: &[&[u8]], color: Rgba) -> Self {
        let rows = mask.len();
        let cols = mask.iter().map(|row| row.len()).max().unwrap_or(0);
        let mut cells = vec![None; cols * rows];
        for (r, row) in mask.iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                if v != 0 {
                    cells[r * cols + c] = Some(color);
                }
            }
        }
        Self { cols, rows, cells }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell(&self, col: usize, row: usize) -> Option<Rgba> {
        if col < self.cols && row < self.rows {
            self.cells[row * self.cols + col]
        } else {
            None
        }
    }

    /// Paint every non-background cell as a solid `cell_size` square.
    pub fn render(&self, cell_size: u32) -> Bitmap {
        let mut bitmap = Bitmap::new(self.cols as u32 * cell_size, self.rows as u32 * cell_size);
        for row in 0..self.rows {
            for col in 0..self.cols {
                if let Some(color) = self.cell(col, row) {
                    bitmap.fill_rect(
                        col as u32 * cell_size,
                        row as u32 * cell_size,
                        cell_size,
                        cell_size,
                        color,
                    );
                }
            }
        }
        bitmap
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpriteSheet {
    pub name: &'static str,
    pub frames: Vec<SpriteFrame>,
}

impl SpriteSheet {
    pub fn ship() -> Self {
        Self {
            name: "ship",
            frames: vec![SpriteFrame::from_art(&SHIP_ART, &SHIP_PALETTE)],
        }
    }

    pub fn alien() -> Self {
        Self {
            name: "alien",
            frames: ALIEN_ART
                .iter()
                .map(|art| SpriteFrame::from_art(art, &ALIEN_PALETTE))
                .collect(),
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Grid size of the first frame, `(cols, rows)`.
    pub fn grid_size(&self) -> (usize, usize) {
        self.frames
            .first()
            .map(|f| (f.cols(), f.rows()))
            .unwrap_or((0, 0))
    }
}

// ── Cache ────────────────────────────────────────────────────────────────────

/// Memoized `(frame_index, scale) -> bitmap` renders of one sheet.
pub struct SpriteCache {
    sheet: SpriteSheet,
    /// Units per cell at scale 1.
    cell_size: u32,
    rendered: HashMap<(usize, u32), Rc<Bitmap>>,
}

impl SpriteCache {
    pub fn new(sheet: SpriteSheet, cell_size: u32) -> Self {
        Self {
            sheet,
            cell_size,
            rendered: HashMap::new(),
        }
    }

    pub fn sheet(&self) -> &SpriteSheet {
        &self.sheet
    }

    /// Rendered bitmap for `frame_index` at `scale`, or `None` when the
    /// frame does not exist or the scale is zero.
    pub fn get(&mut self, frame_index: usize, scale: u32) -> Option<Rc<Bitmap>> {
        if scale == 0 {
            return None;
        }
        if let Some(bitmap) = self.rendered.get(&(frame_index, scale)) {
            return Some(Rc::clone(bitmap));
        }
        let frame = self.sheet.frames.get(frame_index)?;
        let bitmap = Rc::new(frame.render(self.cell_size * scale));
        log::debug!(
            "rendered {} frame {} at scale {} ({}x{})",
            self.sheet.name,
            frame_index,
            scale,
            bitmap.width(),
            bitmap.height()
        );
        self.rendered
            .insert((frame_index, scale), Rc::clone(&bitmap));
        Some(bitmap)
    }

    /// Number of distinct renders held.
    pub fn len(&self) -> usize {
        self.rendered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }
}

// ── Rotations ────────────────────────────────────────────────────────────────

/// Step used for a ship in `mode`.  Never coarser than `step`, never zero.
pub fn angle_step_for(mode: Mode, step: u32) -> u32 {
    let step = step.max(1);
    match mode {
        Mode::Broken => step.min(BROKEN_ANGLE_STEP),
        Mode::Normal | Mode::Combat => step,
    }
}

/// Snap `angle_deg` to the nearest multiple of `step`, wrapped to `0..360`.
pub fn quantize_angle(angle_deg: f32, step: u32) -> u32 {
    if !angle_deg.is_finite() {
        return 0;
    }
    let step = step.max(1) as i64;
    let snapped = (angle_deg / step as f32).round() as i64 * step;
    snapped.rem_euclid(360) as u32
}

/// Memoized `(frame_index, scale, quantized_angle) -> bitmap` rotations,
/// built on top of the unrotated `SpriteCache`.
pub struct RotatedSpriteCache {
    base: SpriteCache,
    rotated: HashMap<(usize, u32, u32), Rc<Bitmap>>,
}

impl RotatedSpriteCache {
    pub fn new(sheet: SpriteSheet, cell_size: u32) -> Self {
        Self {
            base: SpriteCache::new(sheet, cell_size),
            rotated: HashMap::new(),
        }
    }

    pub fn base(&self) -> &SpriteCache {
        &self.base
    }

    /// Bitmap for `frame_index` at `scale`, rotated to `angle_deg` snapped
    /// to `step` degrees.  `None` under the same conditions as
    /// `SpriteCache::get`.
    pub fn get(
        &mut self,
        frame_index: usize,
        scale: u32,
        angle_deg: f32,
        step: u32,
    ) -> Option<Rc<Bitmap>> {
        let angle = quantize_angle(angle_deg, step);
        let key = (frame_index, scale, angle);
        if let Some(bitmap) = self.rotated.get(&key) {
            return Some(Rc::clone(bitmap));
        }
        let upright = self.base.get(frame_index, scale)?;
        let bitmap = if angle == 0 {
            upright
        } else {
            Rc::new(upright.rotated(angle as f32))
        };
        self.rotated.insert(key, Rc::clone(&bitmap));
        Some(bitmap)
    }

    /// Number of distinct rotations held.
    pub fn len(&self) -> usize {
        self.rotated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rotated.is_empty()
    }
}
