//! Slowly drifting wind field
//!
//! Wind is a single vector for the whole arena: direction × strength, with
//! strength kept in `[wind_min_strength, 1]`.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::EPSILON;
use crate::to_angle;
use crate::tuning::Tuning;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    current: Vec2,
    target: Vec2,
    /// Seconds until the next target is picked
    change_timer: f32,
}

impl Wind {
    /// Fresh wind with a random direction and strength
    pub fn new(rng: &mut impl Rng, tuning: &Tuning) -> Self {
        let min = tuning.wind_min_strength.clamp(0.0, 1.0);
        let angle = rng.random_range(-std::f32::consts::PI..std::f32::consts::PI);
        let strength = rng.random_range(min..=1.0);
        let current = Vec2::from_angle(angle) * strength;
        Self {
            current,
            target: current,
            change_timer: tuning.wind_change_interval,
        }
    }

    /// Direction × strength
    #[inline]
    pub fn vector(&self) -> Vec2 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> Vec2 {
        self.target
    }

    #[inline]
    pub fn strength(&self) -> f32 {
        self.current.length()
    }

    pub fn update(&mut self, dt: f32, rng: &mut impl Rng, tuning: &Tuning) {
        let min = tuning.wind_min_strength.clamp(0.0, 1.0);

        self.change_timer -= dt;
        if self.change_timer <= 0.0 {
            self.change_timer = tuning.wind_change_interval.max(EPSILON);
            self.pick_target(rng, tuning, min);
        }

        let t = (tuning.wind_lerp_speed * dt).clamp(0.0, 1.0);
        self.current += (self.target - self.current) * t;
        self.current = clamp_strength(self.current, self.target, min);
    }

    fn pick_target(&mut self, rng: &mut impl Rng, tuning: &Tuning, min: f32) {
        let angle_change = tuning.wind_angle_change_max.abs();
        let strength_change = tuning.wind_strength_change_max.abs();

        let angle = to_angle(self.current) + rng.random_range(-angle_change..=angle_change);
        let strength = (self.current.length() + rng.random_range(-strength_change..=strength_change))
            .max(min)
            .min(1.0);

        self.target = Vec2::from_angle(angle) * strength;
        log::debug!("Wind target now {:.2} rad at {strength:.2}", angle);
    }
}

/// Keep a wind vector's length in `[min, 1]`. A collapsed vector takes the
/// target's direction.
fn clamp_strength(wind: Vec2, target: Vec2, min: f32) -> Vec2 {
    let len = wind.length();
    if len < EPSILON {
        let dir = target.try_normalize().unwrap_or(Vec2::X);
        return dir * min;
    }
    let clamped = len.max(min).min(1.0);
    wind * (clamped / len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_new_wind_in_range() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..50 {
            let wind = Wind::new(&mut rng, &tuning);
            assert!(wind.strength() >= tuning.wind_min_strength - 1e-4);
            assert!(wind.strength() <= 1.0 + 1e-4);
        }
    }

    #[test]
    fn test_target_changes_after_interval() {
        let tuning = Tuning {
            wind_change_interval: 1.0,
            wind_angle_change_max: 1.0,
            ..Default::default()
        };
        let mut rng = Pcg32::seed_from_u64(3);
        let mut wind = Wind::new(&mut rng, &tuning);
        let initial = wind.target();
        for _ in 0..70 {
            wind.update(1.0 / 60.0, &mut rng, &tuning);
        }
        assert_ne!(wind.target(), initial);
    }

    #[test]
    fn test_collapsed_vector_takes_target_direction() {
        let out = clamp_strength(Vec2::ZERO, Vec2::new(0.0, -0.5), 0.25);
        assert!((out - Vec2::new(0.0, -0.25)).length() < 1e-5);
    }

    proptest! {
        #[test]
        fn wind_strength_stays_in_range(
            seed in any::<u64>(),
            min in 0.0f32..1.0,
            dts in prop::collection::vec(0.0f32..5.0, 1..300),
        ) {
            let tuning = Tuning {
                wind_min_strength: min,
                wind_change_interval: 0.5,
                wind_lerp_speed: 2.0,
                wind_strength_change_max: 1.0,
                ..Default::default()
            };
            let mut rng = Pcg32::seed_from_u64(seed);
            let mut wind = Wind::new(&mut rng, &tuning);
            for dt in dts {
                wind.update(dt, &mut rng, &tuning);
                let s = wind.strength();
                prop_assert!(s >= min - 1e-3 && s <= 1.0 + 1e-3, "strength {s} outside [{min}, 1]");
            }
        }
    }
}
