//! Diagnostic overlay rendering.
//!
//! Produces an RGB copy of the frame with each tile outlined in a color
//! keyed to its status and the recognized letter stamped at the tile
//! centroid. This is a side artifact for humans; nothing downstream
//! consumes it.

use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

use crate::glyph;
use crate::image::ImageView;
use crate::{TileReading, TileStatus};

const COLOR_RECOGNIZED: Rgb<u8> = Rgb([0, 255, 0]);
const COLOR_BLANK: Rgb<u8> = Rgb([0, 0, 255]);
const COLOR_UNKNOWN: Rgb<u8> = Rgb([255, 165, 0]);
const COLOR_LETTER: Rgb<u8> = Rgb([255, 0, 0]);

/// Render the annotated frame.
#[must_use]
pub fn annotate(frame: &ImageView, readings: &[TileReading]) -> RgbImage {
    let mut out = RgbImage::new(frame.width as u32, frame.height as u32);
    for y in 0..frame.height {
        let row = frame.row(y);
        for x in 0..frame.width {
            let v = row[x];
            out.put_pixel(x as u32, y as u32, Rgb([v, v, v]));
        }
    }

    for reading in readings {
        let color = match reading.status {
            TileStatus::Recognized => COLOR_RECOGNIZED,
            TileStatus::Blank => COLOR_BLANK,
            TileStatus::Unknown => COLOR_UNKNOWN,
        };
        let corners = reading.region.corner_points();
        for i in 0..4 {
            let a = corners[i];
            let b = corners[(i + 1) % 4];
            draw_line_segment_mut(
                &mut out,
                (a.x as f32, a.y as f32),
                (b.x as f32, b.y as f32),
                color,
            );
        }

        if let Some(letter) = reading.letter {
            draw_glyph_rgb(
                &mut out,
                letter,
                reading.region.cx as i64,
                reading.region.cy as i64,
                3,
                COLOR_LETTER,
            );
        }
    }
    out
}

fn draw_glyph_rgb(img: &mut RgbImage, letter: char, cx: i64, cy: i64, scale: i64, color: Rgb<u8>) {
    let Some(rows) = glyph::glyph(letter) else {
        return;
    };
    let x0 = cx - (glyph::GLYPH_W as i64 * scale) / 2;
    let y0 = cy - (glyph::GLYPH_H as i64 * scale) / 2;
    for (row, &bits) in rows.iter().enumerate() {
        for col in 0..glyph::GLYPH_W {
            if bits & (1 << (glyph::GLYPH_W - 1 - col)) == 0 {
                continue;
            }
            for dy in 0..scale {
                for dx in 0..scale {
                    let x = x0 + col as i64 * scale + dx;
                    let y = y0 + row as i64 * scale + dy;
                    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
                        img.put_pixel(x as u32, y as u32, color);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::OrientedBox;
    use crate::image::GrayBuf;

    fn reading(status: TileStatus, letter: Option<char>) -> TileReading {
        TileReading {
            region: OrientedBox::axis_aligned(32.0, 32.0, 20.0, 20.0),
            letter,
            confidence: if letter.is_some() { 90.0 } else { 0.0 },
            status,
        }
    }

    #[test]
    fn test_annotation_matches_frame_size() {
        let frame = GrayBuf::filled(64, 48, 200);
        let img = annotate(&frame.view(), &[]);
        assert_eq!(img.dimensions(), (64, 48));
        assert_eq!(img.get_pixel(10, 10), &Rgb([200, 200, 200]));
    }

    #[test]
    fn test_outline_color_keyed_by_status() {
        let frame = GrayBuf::filled(64, 64, 200);
        let img = annotate(&frame.view(), &[reading(TileStatus::Blank, None)]);
        // Top edge of the box runs through (32, 22)
        assert_eq!(img.get_pixel(32, 22), &COLOR_BLANK);
    }

    #[test]
    fn test_letter_overlaid_at_centroid() {
        let frame = GrayBuf::filled(64, 64, 200);
        let img = annotate(
            &frame.view(),
            &[reading(TileStatus::Recognized, Some('T'))],
        );
        // The stem of a T passes through the centroid
        assert_eq!(img.get_pixel(32, 32), &COLOR_LETTER);
    }
}
