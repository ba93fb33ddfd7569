//! Grouping of adjacent tiles into word-level bounding regions.
//!
//! Two boxes are adjacent when either their minimum corner-to-corner
//! distance or their center-to-center distance falls below a threshold
//! proportional to their average side length. Connected components under
//! that relation are merged into the minimum-area rectangle enclosing
//! every member corner; singletons pass through unchanged.

use crate::config::ClusterParams;
use crate::geom::{min_area_rect, OrientedBox, Point};

/// Flat-array Union-Find with path halving and union by rank.
struct UnionFind {
    parent: Vec<u32>,
    rank: Vec<u8>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size as u32).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, i: u32) -> u32 {
        let mut root = i;
        while self.parent[root as usize] != root {
            self.parent[root as usize] = self.parent[self.parent[root as usize] as usize];
            root = self.parent[root as usize];
        }
        root
    }

    fn union(&mut self, i: u32, j: u32) {
        let root_i = self.find(i);
        let root_j = self.find(j);
        if root_i == root_j {
            return;
        }
        match self.rank[root_i as usize].cmp(&self.rank[root_j as usize]) {
            std::cmp::Ordering::Less => self.parent[root_i as usize] = root_j,
            std::cmp::Ordering::Greater => self.parent[root_j as usize] = root_i,
            std::cmp::Ordering::Equal => {
                self.parent[root_i as usize] = root_j;
                self.rank[root_j as usize] += 1;
            }
        }
    }
}

fn adjacent(a: &OrientedBox, b: &OrientedBox, params: &ClusterParams) -> bool {
    let avg_side = (a.w + a.h + b.w + b.h) / 4.0;

    let corners_a = a.corner_points();
    let corners_b = b.corner_points();
    let mut min_dist = f64::MAX;
    for pa in &corners_a {
        for pb in &corners_b {
            min_dist = min_dist.min(pa.distance(pb));
        }
    }

    min_dist < avg_side * params.corner_factor
        || a.center_distance(b) < avg_side * params.center_factor
}

/// Merge adjacent boxes into word-level bounding regions.
pub fn cluster_boxes(boxes: &[OrientedBox], params: &ClusterParams) -> Vec<OrientedBox> {
    if boxes.is_empty() {
        return Vec::new();
    }

    let mut uf = UnionFind::new(boxes.len());
    for i in 0..boxes.len() {
        for j in i + 1..boxes.len() {
            if adjacent(&boxes[i], &boxes[j], params) {
                uf.union(i as u32, j as u32);
            }
        }
    }

    // Group members per root, in first-member order.
    let mut groups: Vec<(u32, Vec<usize>)> = Vec::new();
    for i in 0..boxes.len() {
        let root = uf.find(i as u32);
        match groups.iter_mut().find(|(r, _)| *r == root) {
            Some((_, members)) => members.push(i),
            None => groups.push((root, vec![i])),
        }
    }

    groups
        .into_iter()
        .map(|(_, members)| {
            if members.len() == 1 {
                return boxes[members[0]];
            }
            let corners: Vec<Point> = members
                .iter()
                .flat_map(|&i| boxes[i].corner_points())
                .collect();
            // Non-empty input; the hull of >= 4 corners always fits a rect
            min_area_rect(&corners).unwrap_or(boxes[members[0]])
        })
        .collect()
}
