//! Static island obstacles
//!
//! An island is an irregular closed polygon around a fixed center. The outline
//! comes from two summed sine waves plus per-vertex jitter, all drawn from a
//! `Pcg32` seeded with the island's own seed, so the same seed always yields
//! the same coastline.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Edges shorter than this are skipped when searching for the push-out edge
const DEGENERATE_EDGE: f32 = 1.0e-3;

/// Push-out for a point inside an island
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IslandContact {
    /// Outward unit normal of the nearest edge
    pub normal: Vec2,
    /// Distance from the point to that edge
    pub depth: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Island {
    center: Vec2,
    vertices: Vec<Vec2>,
    bounding_radius: f32,
}

impl Island {
    pub fn new(center: Vec2, base_radius: f32, seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let base_radius = base_radius.abs();

        let count: usize = rng.random_range(16..=24);
        let step = TAU / count as f32;

        let freq1 = 2.0 + rng.random::<f32>() * 2.0;
        let freq2 = 4.0 + rng.random::<f32>() * 3.0;
        let phase1 = rng.random::<f32>() * TAU;
        let phase2 = rng.random::<f32>() * TAU;
        let amp1 = 0.2 + rng.random::<f32>() * 0.15;
        let amp2 = 0.1 + rng.random::<f32>() * 0.1;

        let mut vertices = Vec::with_capacity(count);
        let mut max_radius = 0.0f32;
        for i in 0..count {
            let angle = i as f32 * step;
            let jitter = (rng.random::<f32>() - 0.5) * 0.1;
            let variation = (1.0
                + amp1 * (freq1 * angle + phase1).sin()
                + amp2 * (freq2 * angle + phase2).sin()
                + jitter)
                .clamp(0.6, 1.4);

            let radius = base_radius * variation;
            vertices.push(center + Vec2::from_angle(angle) * radius);
            max_radius = max_radius.max(radius);
        }

        Self {
            center,
            vertices,
            bounding_radius: max_radius * 1.05,
        }
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// Outline in world space, counter-clockwise
    #[inline]
    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }

    #[inline]
    pub fn bounding_radius(&self) -> f32 {
        self.bounding_radius
    }

    fn edges(&self) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Even-odd ray cast toward +x
    pub fn contains_point(&self, point: Vec2) -> bool {
        if point.distance_squared(self.center) > self.bounding_radius * self.bounding_radius {
            return false;
        }

        let crossings = self
            .edges()
            .filter(|&(a, b)| {
                let straddles = (a.y <= point.y && b.y > point.y) || (b.y <= point.y && a.y > point.y);
                straddles && point.x < a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x)
            })
            .count();

        crossings % 2 == 1
    }

    /// Nearest-edge push-out for a point inside the island
    pub fn collision_response(&self, point: Vec2) -> Option<IslandContact> {
        if !self.contains_point(point) {
            return None;
        }

        let mut best: Option<IslandContact> = None;
        for (a, b) in self.edges() {
            let edge = b - a;
            let len = edge.length();
            if len < DEGENERATE_EDGE {
                continue;
            }
            let dir = edge / len;
            let t = (point - a).dot(dir).clamp(0.0, len);
            let closest = a + dir * t;
            let dist = point.distance(closest);

            if best.is_none_or(|c| dist < c.depth) {
                let mut normal = dir.perp();
                // Face away from the center
                if (closest + normal - self.center).length_squared()
                    < (closest - self.center).length_squared()
                {
                    normal = -normal;
                }
                best = Some(IslandContact { normal, depth: dist });
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_same_seed_same_outline() {
        let a = Island::new(Vec2::new(100.0, 100.0), 50.0, 42);
        let b = Island::new(Vec2::new(100.0, 100.0), 50.0, 42);
        assert_eq!(a, b);
        assert!((16..=24).contains(&a.vertices().len()));
    }

    #[test]
    fn test_center_inside_far_point_outside() {
        let island = Island::new(Vec2::new(300.0, 200.0), 60.0, 9);
        assert!(island.contains_point(island.center()));
        let far = island.center() + Vec2::new(island.bounding_radius() + 1.0, 0.0);
        assert!(!island.contains_point(far));
    }

    #[test]
    fn test_push_out_points_away_from_center() {
        let island = Island::new(Vec2::ZERO, 50.0, 5);
        // Just inside the coastline next to the first vertex (on the +x axis)
        let first = island.vertices()[0];
        let inner = first * 0.97;
        let contact = island.collision_response(inner).unwrap();
        assert!(contact.normal.x > 0.0);
        assert!(contact.depth <= first.length() * 0.03 + 1e-3);
        assert!((contact.normal.length() - 1.0).abs() < 1e-4);
        assert!(contact.depth >= 0.0);
    }

    #[test]
    fn test_no_response_outside() {
        let island = Island::new(Vec2::ZERO, 50.0, 5);
        assert!(island.collision_response(Vec2::new(200.0, 0.0)).is_none());
    }

    proptest! {
        #[test]
        fn outline_stays_within_bounding_radius(seed in any::<u64>(), r in 10.0f32..120.0) {
            let island = Island::new(Vec2::new(10.0, -20.0), r, seed);
            for v in island.vertices() {
                prop_assert!(v.distance(island.center()) <= island.bounding_radius());
                prop_assert!(v.distance(island.center()) >= r * 0.6 - 1e-3);
            }
        }

        #[test]
        fn interior_points_are_contained(seed in any::<u64>(), angle in 0.0f32..TAU, frac in 0.0f32..0.55) {
            let r = 60.0;
            let island = Island::new(Vec2::ZERO, r, seed);
            // Every vertex is at least 0.6 r out, so half that is safely inland
            let p = Vec2::from_angle(angle) * (r * frac);
            prop_assert!(island.contains_point(p));
        }
    }
}
