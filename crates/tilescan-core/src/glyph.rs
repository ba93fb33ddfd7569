//! Minimal 5x7 bitmap glyphs for A-Z.
//!
//! Used for the diagnostic overlay and for synthetic test scenes. Each
//! glyph row is 5 bits wide, most significant bit leftmost.

use crate::image::GrayBuf;

/// Glyph width in cells.
pub const GLYPH_W: usize = 5;
/// Glyph height in cells.
pub const GLYPH_H: usize = 7;

const GLYPHS: [[u8; GLYPH_H]; 26] = [
    [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // A
    [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E], // B
    [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E], // C
    [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E], // D
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F], // E
    [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10], // F
    [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F], // G
    [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11], // H
    [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E], // I
    [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C], // J
    [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11], // K
    [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F], // L
    [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11], // M
    [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11], // N
    [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // O
    [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10], // P
    [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D], // Q
    [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11], // R
    [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E], // S
    [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04], // T
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E], // U
    [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04], // V
    [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A], // W
    [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11], // X
    [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04], // Y
    [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F], // Z
];

/// Row bitmap for an uppercase letter, or `None` for anything else.
#[must_use]
pub fn glyph(letter: char) -> Option<&'static [u8; GLYPH_H]> {
    if letter.is_ascii_uppercase() {
        Some(&GLYPHS[(letter as u8 - b'A') as usize])
    } else {
        None
    }
}

/// Stamp a letter into a grayscale buffer, centered at (cx, cy), each
/// glyph cell drawn as a `scale` x `scale` block of `value` pixels.
/// Cells falling outside the buffer are skipped.
pub fn draw_glyph(buf: &mut GrayBuf, letter: char, cx: i64, cy: i64, scale: usize, value: u8) {
    let Some(rows) = glyph(letter) else {
        return;
    };
    let scale = scale.max(1) as i64;
    let x0 = cx - (GLYPH_W as i64 * scale) / 2;
    let y0 = cy - (GLYPH_H as i64 * scale) / 2;
    for (row, &bits) in rows.iter().enumerate() {
        for col in 0..GLYPH_W {
            if bits & (1 << (GLYPH_W - 1 - col)) == 0 {
                continue;
            }
            for dy in 0..scale {
                for dx in 0..scale {
                    let x = x0 + col as i64 * scale + dx;
                    let y = y0 + row as i64 * scale + dy;
                    if x >= 0 && y >= 0 && (x as usize) < buf.width && (y as usize) < buf.height {
                        buf.set(x as usize, y as usize, value);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_letters_have_glyphs() {
        for c in 'A'..='Z' {
            assert!(glyph(c).is_some());
        }
        assert!(glyph('a').is_none());
        assert!(glyph('1').is_none());
    }

    #[test]
    fn test_glyphs_are_distinct() {
        for a in 0..26 {
            for b in a + 1..26 {
                assert_ne!(GLYPHS[a], GLYPHS[b], "glyphs {a} and {b} collide");
            }
        }
    }

    #[test]
    fn test_draw_glyph_stamps_ink() {
        let mut buf = GrayBuf::filled(64, 64, 255);
        draw_glyph(&mut buf, 'T', 32, 32, 4, 0);
        let dark = buf.data.iter().filter(|&&p| p == 0).count();
        // T has 11 set cells at 4x4 pixels each
        assert_eq!(dark, 11 * 16);
    }

    #[test]
    fn test_draw_glyph_clips_at_border() {
        let mut buf = GrayBuf::filled(8, 8, 255);
        draw_glyph(&mut buf, 'W', 0, 0, 4, 0);
        // Must not panic; some ink lands inside
        assert!(buf.data.iter().any(|&p| p == 0));
    }
}
