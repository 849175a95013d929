//! Arc-constrained gun turrets
//!
//! Angles are ship-relative: 0 = bow, ±π = stern. A front mount may swing
//! `π * turret_arc_size` either side of the bow; a rear mount the same amount
//! either side of the stern. Internally the turret works in "arc-local"
//! coordinates (angle measured from the mount's rest direction), where the
//! allowed range is the contiguous interval `[-arc, arc]`, so rotation can
//! never sweep through the forbidden half of the hull.

use std::f32::consts::PI;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;
use crate::{angle_between, local_to_world, normalize_angle, to_angle};

/// Tolerance for treating the desired angle as reachable
const REACHABLE_EPSILON: f32 = 0.01;
/// Tolerance for treating the turret as parked at an arc limit
const ARC_LIMIT_EPSILON: f32 = 0.05;

/// Which end of the hull the turret faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mount {
    Front,
    Rear,
}

impl Mount {
    /// Ship-relative angle the mount points at when centered
    #[inline]
    pub fn rest_angle(self) -> f32 {
        match self {
            Mount::Front => 0.0,
            Mount::Rear => PI,
        }
    }
}

/// Half-width of a mount's arc
#[inline]
pub fn arc_half_width(tuning: &Tuning) -> f32 {
    PI * tuning.turret_arc_size.clamp(0.0, 1.0)
}

/// A rotating gun mount owned by a ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turret {
    /// Position relative to ship center (hull-local, +x toward bow)
    pub offset: Vec2,
    pub mount: Mount,
    /// Current ship-relative angle
    angle: f32,
    /// Desired angle clamped into the arc
    target_angle: f32,
    /// Desired angle before clamping
    desired_angle: f32,
}

impl Turret {
    pub fn new(offset: Vec2, mount: Mount) -> Self {
        let rest = mount.rest_angle();
        Self {
            offset,
            mount,
            angle: rest,
            target_angle: rest,
            desired_angle: rest,
        }
    }

    /// Ship-relative angle
    #[inline]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    #[inline]
    pub fn target_angle(&self) -> f32 {
        self.target_angle
    }

    /// World-space barrel angle
    #[inline]
    pub fn world_angle(&self, ship_heading: f32) -> f32 {
        normalize_angle(self.angle + ship_heading)
    }

    /// World-space mount position
    #[inline]
    pub fn world_position(&self, ship_pos: Vec2, ship_heading: f32) -> Vec2 {
        local_to_world(ship_pos, ship_heading, self.offset)
    }

    /// Angle relative to this mount's rest direction
    #[inline]
    fn arc_local(&self, angle: f32) -> f32 {
        normalize_angle(angle - self.mount.rest_angle())
    }

    /// Clamp a ship-relative angle into this mount's arc
    pub fn clamp_to_arc(&self, angle: f32, tuning: &Tuning) -> f32 {
        let arc = arc_half_width(tuning);
        let local = self.arc_local(angle).clamp(-arc, arc);
        normalize_angle(self.mount.rest_angle() + local)
    }

    /// Whether a ship-relative angle lies inside the arc
    pub fn arc_contains(&self, angle: f32, tuning: &Tuning) -> bool {
        self.arc_local(angle).abs() <= arc_half_width(tuning) + 1.0e-4
    }

    /// Rotate toward `target_dir` (world space) by at most one frame's travel.
    /// A zero direction keeps the previous target.
    pub fn update(
        &mut self,
        dt: f32,
        ship_heading: f32,
        target_dir: Vec2,
        tuning: &Tuning,
        speed_multiplier: f32,
    ) {
        if target_dir.length_squared() > 0.01 {
            self.desired_angle = normalize_angle(to_angle(target_dir) - ship_heading);
            self.target_angle = self.clamp_to_arc(self.desired_angle, tuning);
        } else {
            // Arc size may have been reloaded since the target was chosen
            self.target_angle = self.clamp_to_arc(self.target_angle, tuning);
        }

        let arc = arc_half_width(tuning);
        let max_step = tuning.turret_rotation_speed * speed_multiplier * dt.max(0.0);
        let current = self.arc_local(self.angle).clamp(-arc, arc);
        let target = self.arc_local(self.target_angle).clamp(-arc, arc);

        let step = (target - current).clamp(-max_step, max_step);
        let next = (current + step).clamp(-arc, arc);
        self.angle = normalize_angle(self.mount.rest_angle() + next);
    }

    /// Aimed at the real target: the desired angle is reachable and the
    /// barrel is within tolerance of it
    pub fn is_aimed_at_target(&self, tuning: &Tuning) -> bool {
        let clamped = self.clamp_to_arc(self.desired_angle, tuning);
        if angle_between(self.desired_angle, clamped).abs() > REACHABLE_EPSILON {
            return false;
        }
        angle_between(self.angle, self.target_angle).abs() < tuning.turret_on_target_tolerance
    }

    /// Parked against either end of the arc
    pub fn is_at_arc_limit(&self, tuning: &Tuning) -> bool {
        let arc = arc_half_width(tuning);
        (self.arc_local(self.angle).abs() - arc).abs() < ARC_LIMIT_EPSILON
    }

    /// Aimed, or pinned at an arc limit with nowhere better to point
    pub fn is_on_target(&self, tuning: &Tuning) -> bool {
        self.is_aimed_at_target(tuning) || self.is_at_arc_limit(tuning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn settle(turret: &mut Turret, heading: f32, dir: Vec2, tuning: &Tuning) {
        for _ in 0..2000 {
            turret.update(1.0 / 60.0, heading, dir, tuning, 1.0);
        }
    }

    #[test]
    fn test_front_turret_tracks_reachable_target() {
        let tuning = Tuning::default();
        let mut turret = Turret::new(Vec2::new(10.0, 0.0), Mount::Front);
        settle(&mut turret, 0.0, Vec2::new(1.0, 1.0), &tuning);
        assert!((turret.angle() - PI / 4.0).abs() < 0.01);
        assert!(turret.is_aimed_at_target(&tuning));
        assert!(turret.is_on_target(&tuning));
    }

    #[test]
    fn test_front_turret_pins_at_limit_for_target_astern() {
        let tuning = Tuning::default();
        let mut turret = Turret::new(Vec2::new(10.0, 0.0), Mount::Front);
        // Slightly off dead astern so the nearest limit is well defined
        settle(&mut turret, 0.0, Vec2::new(-1.0, 0.05), &tuning);
        let arc = arc_half_width(&tuning);
        assert!((turret.angle() - arc).abs() < 0.01);
        assert!(!turret.is_aimed_at_target(&tuning));
        assert!(turret.is_at_arc_limit(&tuning));
        assert!(turret.is_on_target(&tuning));
    }

    #[test]
    fn test_rear_turret_faces_astern() {
        let tuning = Tuning::default();
        let mut turret = Turret::new(Vec2::new(-10.0, 0.0), Mount::Rear);
        assert!((turret.angle() - PI).abs() < 1e-6);
        settle(&mut turret, 0.0, Vec2::new(-1.0, -0.3), &tuning);
        assert!(turret.is_aimed_at_target(&tuning));
        assert!(turret.arc_contains(turret.angle(), &tuning));
    }

    #[test]
    fn test_rear_turret_swings_through_stern_not_bow() {
        let tuning = Tuning::default();
        let mut turret = Turret::new(Vec2::new(-10.0, 0.0), Mount::Rear);
        // Target on the port quarter, reachable; every intermediate angle stays in arc
        for _ in 0..600 {
            turret.update(1.0 / 60.0, 0.0, Vec2::new(-0.2, 1.0), &tuning, 1.0);
            assert!(turret.arc_contains(turret.angle(), &tuning));
        }
        for _ in 0..600 {
            turret.update(1.0 / 60.0, 0.0, Vec2::new(-0.2, -1.0), &tuning, 1.0);
            assert!(turret.arc_contains(turret.angle(), &tuning));
        }
    }

    #[test]
    fn test_rotation_rate_is_bounded() {
        let tuning = Tuning::default();
        let mut turret = Turret::new(Vec2::ZERO, Mount::Front);
        turret.update(0.1, 0.0, Vec2::new(0.0, 1.0), &tuning, 1.0);
        assert!((turret.angle() - tuning.turret_rotation_speed * 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_zero_direction_keeps_target() {
        let tuning = Tuning::default();
        let mut turret = Turret::new(Vec2::ZERO, Mount::Front);
        turret.update(0.1, 0.0, Vec2::new(0.0, 1.0), &tuning, 1.0);
        let target = turret.target_angle();
        turret.update(0.1, 0.0, Vec2::ZERO, &tuning, 1.0);
        assert_eq!(turret.target_angle(), target);
    }

    proptest! {
        #[test]
        fn turret_never_leaves_arc(
            front in any::<bool>(),
            steps in prop::collection::vec((-PI..PI, -PI..PI, 0.0f32..0.2), 1..80),
        ) {
            let tuning = Tuning::default();
            let mount = if front { Mount::Front } else { Mount::Rear };
            let mut turret = Turret::new(Vec2::new(5.0, 0.0), mount);
            for (heading, aim, dt) in steps {
                turret.update(dt, heading, Vec2::from_angle(aim), &tuning, 3.0);
                prop_assert!(turret.arc_contains(turret.angle(), &tuning));
            }
        }
    }
}
