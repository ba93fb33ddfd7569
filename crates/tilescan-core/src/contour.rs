//! Contour extraction over a binary mask.
//!
//! Connected components are labeled with a row-major seed scan, then each
//! component's outer boundary is traced with Moore-neighbor following. The
//! scan order fixes the contour enumeration order, so downstream consumers
//! see a deterministic sequence for identical masks.

use crate::geom::Point;
use crate::image::GrayBuf;
use bumpalo::collections::Vec as BumpVec;
use bumpalo::Bump;

/// 8-neighborhood in clockwise screen order starting at west.
const NB: [(i64, i64); 8] = [
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
];

#[inline]
fn dir_index(dx: i64, dy: i64) -> usize {
    NB.iter()
        .position(|&(nx, ny)| nx == dx && ny == dy)
        .expect("delta is a valid 8-neighbor offset")
}

/// Extract the outer boundary of every 8-connected component of set
/// pixels, in component discovery order.
pub fn find_contours(arena: &Bump, mask: &GrayBuf) -> Vec<Vec<Point>> {
    let w = mask.width;
    let h = mask.height;
    if w == 0 || h == 0 {
        return Vec::new();
    }

    let labels = arena.alloc_slice_fill_copy(w * h, 0u32);
    let mut stack: BumpVec<usize> = BumpVec::new_in(arena);
    let mut contours = Vec::new();
    let mut next_label = 0u32;

    for idx in 0..w * h {
        if mask.data[idx] == 0 || labels[idx] != 0 {
            continue;
        }
        next_label += 1;
        let label = next_label;
        let (sx, sy) = (idx % w, idx / w);

        // Flood the component so later seeds skip it.
        labels[idx] = label;
        stack.push(idx);
        while let Some(cur) = stack.pop() {
            let cx = (cur % w) as i64;
            let cy = (cur / w) as i64;
            for &(dx, dy) in &NB {
                let nx = cx + dx;
                let ny = cy + dy;
                if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                    continue;
                }
                let nidx = ny as usize * w + nx as usize;
                if mask.data[nidx] != 0 && labels[nidx] == 0 {
                    labels[nidx] = label;
                    stack.push(nidx);
                }
            }
        }

        // The seed is the topmost-leftmost pixel of its component, so its
        // west neighbor is guaranteed background.
        contours.push(trace_boundary(labels, w, h, sx, sy, label));
    }
    contours
}

/// Moore-neighbor boundary following from the component's topmost-leftmost
/// pixel. Returns the closed outer boundary without a repeated endpoint.
fn trace_boundary(
    labels: &[u32],
    w: usize,
    h: usize,
    sx: usize,
    sy: usize,
    label: u32,
) -> Vec<Point> {
    let in_component = |x: i64, y: i64| -> bool {
        x >= 0 && y >= 0 && x < w as i64 && y < h as i64 && labels[y as usize * w + x as usize] == label
    };

    let start = (sx as i64, sy as i64);
    let mut contour = vec![Point::new(sx as f64, sy as f64)];

    let mut p = start;
    let mut back = (start.0 - 1, start.1);
    // Worst case visits each boundary pixel from every direction once.
    let cap = 4 * (w * h + 4);

    for _ in 0..cap {
        let from = dir_index(back.0 - p.0, back.1 - p.1);
        let mut found = None;
        let mut prev = back;
        for i in 1..=8 {
            let d = (from + i) % 8;
            let cand = (p.0 + NB[d].0, p.1 + NB[d].1);
            if in_component(cand.0, cand.1) {
                found = Some(cand);
                break;
            }
            prev = cand;
        }
        let Some(next) = found else {
            break; // isolated pixel
        };
        back = prev;
        p = next;
        if p == start {
            break; // completed the loop
        }
        contour.push(Point::new(p.0 as f64, p.1 as f64));
    }
    contour
}

/// Simplify a polyline with the iterative Douglas-Peucker algorithm.
///
/// The first and last input points are always kept.
pub fn douglas_peucker<'a>(arena: &'a Bump, points: &[Point], epsilon: f64) -> BumpVec<'a, Point> {
    if points.len() < 3 {
        let mut v = BumpVec::new_in(arena);
        v.extend_from_slice(points);
        return v;
    }

    let n = points.len();
    let mut keep = BumpVec::from_iter_in((0..n).map(|_| false), arena);
    keep[0] = true;
    keep[n - 1] = true;

    let mut stack = BumpVec::new_in(arena);
    stack.push((0, n - 1));

    while let Some((start, end)) = stack.pop() {
        if end - start < 2 {
            continue;
        }

        let mut dmax = 0.0;
        let mut index = start;
        for i in start + 1..end {
            let d = perpendicular_distance(points[i], points[start], points[end]);
            if d > dmax {
                index = i;
                dmax = d;
            }
        }

        if dmax > epsilon {
            keep[index] = true;
            stack.push((start, index));
            stack.push((index, end));
        }
    }

    let mut simplified = BumpVec::new_in(arena);
    for (i, &k) in keep.iter().enumerate() {
        if k {
            simplified.push(points[i]);
        }
    }
    simplified
}

/// Approximate a closed contour as a polygon: the contour is closed by
/// appending its first point, simplified, and the duplicate endpoint
/// dropped again.
pub fn approx_polygon(arena: &Bump, contour: &[Point], epsilon: f64) -> Vec<Point> {
    if contour.len() < 3 {
        return contour.to_vec();
    }
    let mut closed = BumpVec::new_in(arena);
    closed.extend_from_slice(contour);
    closed.push(contour[0]);
    let mut simplified: Vec<Point> = douglas_peucker(arena, &closed, epsilon).to_vec();
    simplified.pop();
    simplified
}

fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let mag = (dx * dx + dy * dy).sqrt();
    if mag < 1e-9 {
        return ((p.x - a.x).powi(2) + (p.y - a.y).powi(2)).sqrt();
    }
    ((dy * p.x - dx * p.y + b.x * a.y - b.y * a.x).abs()) / mag
}

/// Shoelace area of a closed polygon given without a repeated endpoint.
#[must_use]
pub fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..points.len() {
        let j = (i + 1) % points.len();
        area += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    area.abs() * 0.5
}

/// Euclidean length of the closed boundary.
#[must_use]
pub fn arc_length(points: &[Point]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut len = 0.0;
    for i in 0..points.len() {
        let j = (i + 1) % points.len();
        len += points[i].distance(&points[j]);
    }
    len
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_square_mask(size: usize, x0: usize, y0: usize, side: usize) -> GrayBuf {
        let mut mask = GrayBuf::filled(size, size, 0);
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                mask.set(x, y, 255);
            }
        }
        mask
    }

    #[test]
    fn test_empty_mask_has_no_contours() {
        let arena = Bump::new();
        let mask = GrayBuf::filled(32, 32, 0);
        assert!(find_contours(&arena, &mask).is_empty());
    }

    #[test]
    fn test_square_contour_metrics() {
        let arena = Bump::new();
        let mask = filled_square_mask(64, 10, 10, 20);
        let contours = find_contours(&arena, &mask);
        assert_eq!(contours.len(), 1);
        let c = &contours[0];
        // Boundary of a 20x20 block has 4*19 pixels
        assert_eq!(c.len(), 76);
        // Shoelace over pixel centers of a 20-wide block spans 19 units
        assert!((polygon_area(c) - 361.0).abs() < 1.0);
        assert!((arc_length(c) - 76.0).abs() < 1.0);
    }

    #[test]
    fn test_two_components_in_discovery_order() {
        let arena = Bump::new();
        let mut mask = filled_square_mask(64, 4, 30, 8);
        for y in 4..12 {
            for x in 40..48 {
                mask.set(x, y, 255);
            }
        }
        let contours = find_contours(&arena, &mask);
        assert_eq!(contours.len(), 2);
        // Row-major seed scan discovers the upper square first
        assert!(contours[0][0].y < contours[1][0].y);
    }

    #[test]
    fn test_single_pixel_component() {
        let arena = Bump::new();
        let mut mask = GrayBuf::filled(8, 8, 0);
        mask.set(3, 3, 255);
        let contours = find_contours(&arena, &mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 1);
    }

    #[test]
    fn test_approx_square_has_four_vertices() {
        let arena = Bump::new();
        let mask = filled_square_mask(64, 10, 10, 20);
        let contours = find_contours(&arena, &mask);
        let poly = approx_polygon(&arena, &contours[0], 0.06 * arc_length(&contours[0]));
        assert_eq!(poly.len(), 4, "square should simplify to 4 vertices");
    }

    #[test]
    fn test_douglas_peucker_keeps_endpoints() {
        let arena = Bump::new();
        let pts = [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.1),
            Point::new(2.0, -0.1),
            Point::new(3.0, 0.0),
        ];
        let out = douglas_peucker(&arena, &pts, 0.5);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], pts[0]);
        assert_eq!(out[1], pts[3]);
    }
}
