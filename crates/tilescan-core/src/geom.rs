//! Geometric primitives: points, oriented boxes, corner ordering,
//! minimum-area enclosing rectangles and the perspective transform.

use nalgebra::{SMatrix, SVector};

/// A 2D point with subpixel precision.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
}

impl Point {
    /// Construct a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// A rotated rectangle describing a tile candidate: center, size and
/// rotation angle in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OrientedBox {
    /// Center x in frame pixels.
    pub cx: f64,
    /// Center y in frame pixels.
    pub cy: f64,
    /// Width along the box's local x axis.
    pub w: f64,
    /// Height along the box's local y axis.
    pub h: f64,
    /// Rotation angle in degrees, counterclockwise.
    pub angle_deg: f64,
}

impl OrientedBox {
    /// Axis-aligned constructor (zero rotation).
    #[must_use]
    pub const fn axis_aligned(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self {
            cx,
            cy,
            w,
            h,
            angle_deg: 0.0,
        }
    }

    /// Enclosed area.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.w * self.h
    }

    /// Length of the shorter side.
    #[must_use]
    pub fn short_side(&self) -> f64 {
        self.w.min(self.h)
    }

    /// The four corner points in local order (no canonical ordering; use
    /// [`order_corners`] before warping).
    #[must_use]
    pub fn corner_points(&self) -> [Point; 4] {
        let a = self.angle_deg.to_radians();
        let (sin, cos) = a.sin_cos();
        let hw = self.w / 2.0;
        let hh = self.h / 2.0;
        let local = [(-hw, -hh), (hw, -hh), (hw, hh), (-hw, hh)];
        local.map(|(lx, ly)| Point {
            x: self.cx + lx * cos - ly * sin,
            y: self.cy + lx * sin + ly * cos,
        })
    }

    /// Center-to-center distance to another box.
    #[must_use]
    pub fn center_distance(&self, other: &OrientedBox) -> f64 {
        ((self.cx - other.cx).powi(2) + (self.cy - other.cy).powi(2)).sqrt()
    }
}

/// Canonically order four corner points as [top-left, top-right,
/// bottom-right, bottom-left].
///
/// Uses a stable lexicographic sort on (y, x): the first two points after
/// sorting are the top pair, the last two the bottom pair. This is
/// invariant to the rotation of the source box, unlike sum/difference
/// heuristics.
#[must_use]
pub fn order_corners(mut pts: [Point; 4]) -> [Point; 4] {
    pts.sort_by(|a, b| {
        a.y.partial_cmp(&b.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });
    let (tl, tr) = if pts[0].x <= pts[1].x {
        (pts[0], pts[1])
    } else {
        (pts[1], pts[0])
    };
    let (bl, br) = if pts[2].x <= pts[3].x {
        (pts[2], pts[3])
    } else {
        (pts[3], pts[2])
    };
    [tl, tr, br, bl]
}

/// Convex hull via Andrew's monotone chain, returned without the closing
/// point.
#[must_use]
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut pts: Vec<Point> = points.to_vec();
    pts.sort_by(|a, b| {
        a.x.partial_cmp(&b.x)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal))
    });
    pts.dedup_by(|a, b| (a.x - b.x).abs() < 1e-12 && (a.y - b.y).abs() < 1e-12);
    let n = pts.len();
    if n < 3 {
        return pts;
    }

    let cross = |o: &Point, a: &Point, b: &Point| -> f64 {
        (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
    };

    let mut hull: Vec<Point> = Vec::with_capacity(2 * n);
    for p in pts.iter() {
        while hull.len() >= 2 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(*p);
    }
    let lower_len = hull.len() + 1;
    for p in pts.iter().rev() {
        while hull.len() >= lower_len && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(*p);
    }
    hull.pop();
    hull
}

/// Minimum-area oriented rectangle enclosing a point set, via rotating
/// calipers over the convex hull.
///
/// Returns `None` for an empty input. Collinear or single-point inputs
/// yield a rectangle with a zero dimension.
#[must_use]
pub fn min_area_rect(points: &[Point]) -> Option<OrientedBox> {
    if points.is_empty() {
        return None;
    }
    let hull = convex_hull(points);
    if hull.len() == 1 {
        return Some(OrientedBox::axis_aligned(hull[0].x, hull[0].y, 0.0, 0.0));
    }

    let mut best: Option<(f64, OrientedBox)> = None;
    for i in 0..hull.len() {
        let a = hull[i];
        let b = hull[(i + 1) % hull.len()];
        let len = a.distance(&b);
        if len < 1e-12 {
            continue;
        }
        let ux = (b.x - a.x) / len;
        let uy = (b.y - a.y) / len;
        // Perpendicular axis
        let vx = -uy;
        let vy = ux;

        let mut min_u = f64::MAX;
        let mut max_u = f64::MIN;
        let mut min_v = f64::MAX;
        let mut max_v = f64::MIN;
        for p in &hull {
            let pu = p.x * ux + p.y * uy;
            let pv = p.x * vx + p.y * vy;
            min_u = min_u.min(pu);
            max_u = max_u.max(pu);
            min_v = min_v.min(pv);
            max_v = max_v.max(pv);
        }

        let w = max_u - min_u;
        let h = max_v - min_v;
        let area = w * h;
        let cu = (min_u + max_u) / 2.0;
        let cv = (min_v + max_v) / 2.0;
        let rect = OrientedBox {
            cx: cu * ux + cv * vx,
            cy: cu * uy + cv * vy,
            w,
            h,
            angle_deg: uy.atan2(ux).to_degrees(),
        };
        match best {
            Some((best_area, _)) if best_area <= area => {}
            _ => best = Some((area, rect)),
        }
    }
    best.map(|(_, rect)| rect)
}

/// A 3x3 perspective transform.
pub struct Homography {
    /// The 3x3 homography matrix.
    pub h: SMatrix<f64, 3, 3>,
}

impl Homography {
    /// Compute the homography mapping 4 source points onto 4 destination
    /// points using DLT with h33 fixed to 1, solved as an 8x8 system.
    ///
    /// Returns `None` when the system is singular (degenerate geometry).
    #[must_use]
    pub fn from_pairs(src: &[[f64; 2]; 4], dst: &[[f64; 2]; 4]) -> Option<Self> {
        let mut a = SMatrix::<f64, 8, 9>::zeros();

        for i in 0..4 {
            let sx = src[i][0];
            let sy = src[i][1];
            let dx = dst[i][0];
            let dy = dst[i][1];

            a[(i * 2, 0)] = -sx;
            a[(i * 2, 1)] = -sy;
            a[(i * 2, 2)] = -1.0;
            a[(i * 2, 6)] = sx * dx;
            a[(i * 2, 7)] = sy * dx;
            a[(i * 2, 8)] = dx;

            a[(i * 2 + 1, 3)] = -sx;
            a[(i * 2 + 1, 4)] = -sy;
            a[(i * 2 + 1, 5)] = -1.0;
            a[(i * 2 + 1, 6)] = sx * dy;
            a[(i * 2 + 1, 7)] = sy * dy;
            a[(i * 2 + 1, 8)] = dy;
        }

        let mut b = SVector::<f64, 8>::zeros();
        let mut m = SMatrix::<f64, 8, 8>::zeros();
        for i in 0..8 {
            for j in 0..8 {
                m[(i, j)] = a[(i, j)];
            }
            b[i] = -a[(i, 8)];
        }

        let h_vec = m.lu().solve(&b)?;
        let mut h = SMatrix::<f64, 3, 3>::identity();
        h[(0, 0)] = h_vec[0];
        h[(0, 1)] = h_vec[1];
        h[(0, 2)] = h_vec[2];
        h[(1, 0)] = h_vec[3];
        h[(1, 1)] = h_vec[4];
        h[(1, 2)] = h_vec[5];
        h[(2, 0)] = h_vec[6];
        h[(2, 1)] = h_vec[7];
        h[(2, 2)] = 1.0;
        Some(Self { h })
    }

    /// Project a point through the homography.
    #[must_use]
    pub fn project(&self, p: [f64; 2]) -> [f64; 2] {
        let res = self.h * SVector::<f64, 3>::new(p[0], p[1], 1.0);
        let w = res[2];
        [res[0] / w, res[1] / w]
    }
}
