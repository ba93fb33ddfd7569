//! Synthetic board scenes for tests and benches.
//!
//! Scenes are deterministic: tiles are rendered analytically and noise is
//! driven by a caller-provided seed.

use crate::glyph;
use crate::image::GrayBuf;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// Background intensity of a synthetic board.
pub const BOARD_BG: u8 = 235;
/// Tile face intensity.
pub const TILE_FACE: u8 = 250;
/// Tile border intensity.
pub const TILE_BORDER: u8 = 40;
/// Glyph ink intensity.
pub const TILE_INK: u8 = 30;

/// Placement of one synthetic tile.
#[derive(Clone, Debug)]
pub struct TileSpec {
    /// Center x in pixels.
    pub cx: f64,
    /// Center y in pixels.
    pub cy: f64,
    /// Side length in pixels.
    pub side: f64,
    /// Rotation in degrees.
    pub angle_deg: f64,
    /// Letter printed on the tile, if any.
    pub letter: Option<char>,
}

/// An empty board canvas.
#[must_use]
pub fn board_frame(width: usize, height: usize) -> GrayBuf {
    GrayBuf::filled(width, height, BOARD_BG)
}

/// Render a tile into the canvas: bright face, dark border ring, optional
/// centered glyph. Rotation is handled analytically so rotated tiles have
/// rotated glyphs.
pub fn draw_tile(canvas: &mut GrayBuf, spec: &TileSpec) {
    let half = spec.side / 2.0;
    let border_w = (spec.side * 0.035).clamp(2.0, 6.0);
    let a = spec.angle_deg.to_radians();
    let (sin, cos) = a.sin_cos();

    let glyph_scale = (spec.side * 0.45 / glyph::GLYPH_H as f64).max(1.0);
    let glyph_rows = spec.letter.and_then(glyph::glyph);

    let reach = half * std::f64::consts::SQRT_2 + 1.0;
    let x0 = ((spec.cx - reach).floor().max(0.0)) as usize;
    let y0 = ((spec.cy - reach).floor().max(0.0)) as usize;
    let x1 = ((spec.cx + reach).ceil().min((canvas.width.saturating_sub(1)) as f64)) as usize;
    let y1 = ((spec.cy + reach).ceil().min((canvas.height.saturating_sub(1)) as f64)) as usize;

    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f64 - spec.cx;
            let dy = y as f64 - spec.cy;
            // Into the tile's local frame
            let lx = dx * cos + dy * sin;
            let ly = -dx * sin + dy * cos;
            if lx.abs() > half || ly.abs() > half {
                continue;
            }
            let mut value = if lx.abs() > half - border_w || ly.abs() > half - border_w {
                TILE_BORDER
            } else {
                TILE_FACE
            };
            if let Some(rows) = glyph_rows {
                let gx = lx / glyph_scale + glyph::GLYPH_W as f64 / 2.0;
                let gy = ly / glyph_scale + glyph::GLYPH_H as f64 / 2.0;
                if gx >= 0.0 && gy >= 0.0 {
                    let (col, row) = (gx as usize, gy as usize);
                    if col < glyph::GLYPH_W
                        && row < glyph::GLYPH_H
                        && rows[row] & (1 << (glyph::GLYPH_W - 1 - col)) != 0
                    {
                        value = TILE_INK;
                    }
                }
            }
            canvas.set(x, y, value);
        }
    }
}

/// Build a board with the given tiles.
#[must_use]
pub fn make_board(width: usize, height: usize, tiles: &[TileSpec]) -> GrayBuf {
    let mut canvas = board_frame(width, height);
    for spec in tiles {
        draw_tile(&mut canvas, spec);
    }
    canvas
}

/// Add seeded Gaussian noise to a canvas.
pub fn add_noise(canvas: &mut GrayBuf, sigma: f64, seed: u64) {
    if sigma <= 0.0 {
        return;
    }
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let normal = Normal::new(0.0, sigma).expect("valid noise sigma");
    for pixel in &mut canvas.data {
        let noise = normal.sample(&mut rng);
        *pixel = (f64::from(*pixel) + noise).clamp(0.0, 255.0) as u8;
    }
}

/// Render a standalone reference image for a letter, shaped like a
/// rectified tile crop: white background with the glyph centered. Useful
/// for building template galleries in tests.
#[must_use]
pub fn letter_reference(letter: char, size: usize) -> GrayBuf {
    let mut buf = GrayBuf::filled(size, size, 255);
    let scale = (size as f64 * 0.5 / glyph::GLYPH_H as f64).max(1.0) as usize;
    glyph::draw_glyph(
        &mut buf,
        letter,
        size as i64 / 2,
        size as i64 / 2,
        scale,
        TILE_INK,
    );
    buf
}
