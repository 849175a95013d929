//! Cosmetic wake: bubbles astern of moving hulls and funnel smoke
//!
//! Nothing here feeds back into gameplay. Ships keep their wake in a
//! `#[serde(skip)]` field and the match draws its randomness from a separate
//! effects RNG.

use glam::Vec2;
use rand::Rng;

use crate::local_to_world;
use crate::tuning::Tuning;

/// Hard caps so a long match can't grow the buffers without bound
pub const MAX_BUBBLES: usize = 512;
pub const MAX_SMOKE: usize = 256;

#[derive(Debug, Clone, Copy)]
pub struct Bubble {
    pub pos: Vec2,
    pub radius: f32,
    /// 1 at spawn, removed at 0
    pub alpha: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct SmokePuff {
    pub pos: Vec2,
    pub radius: f32,
    pub alpha: f32,
    /// Fixed rotation applied to the wind for this puff
    pub wind_offset: f32,
}

/// Snapshot of the hull the wake is trailing
#[derive(Debug, Clone, Copy)]
pub struct WakeSource {
    pub pos: Vec2,
    pub heading: f32,
    pub vel: Vec2,
    pub throttle: f32,
    pub length: f32,
    pub width: f32,
    /// 0 = pristine, 1 = no health left
    pub damage: f32,
    /// 1 while afloat, falls to 0 over the sink
    pub sink_factor: f32,
    pub alive: bool,
}

#[derive(Debug, Clone, Default)]
pub struct Wake {
    pub bubbles: Vec<Bubble>,
    pub smoke: Vec<SmokePuff>,
    bubble_timer: f32,
    smoke_timer: f32,
}

impl Wake {
    pub fn update(
        &mut self,
        dt: f32,
        source: &WakeSource,
        wind: Vec2,
        tuning: &Tuning,
        rng: &mut impl Rng,
    ) {
        self.update_bubbles(dt, source, tuning, rng);
        self.update_smoke(dt, source, wind, tuning, rng);
    }

    fn update_bubbles(&mut self, dt: f32, source: &WakeSource, tuning: &Tuning, rng: &mut impl Rng) {
        let fade = dt / tuning.bubble_fade_time.max(f32::EPSILON);
        self.bubbles.retain_mut(|b| {
            b.alpha -= fade;
            b.alpha > 0.0
        });

        let speed = source.vel.length();
        let visible = source.sink_factor > 0.0;
        let churning = speed > tuning.bubble_min_speed || (source.alive && source.throttle.abs() > 0.1);
        if !visible || !churning {
            return;
        }

        // Faster hulls leave a denser trail
        let interval = tuning.bubble_spawn_interval * (50.0 / speed.max(1.0));
        if interval <= 0.0 {
            return;
        }

        self.bubble_timer += dt;
        while self.bubble_timer >= interval {
            self.bubble_timer -= interval;
            let lateral = (rng.random::<f32>() - 0.5) * source.width * 0.8;
            let pos = local_to_world(
                source.pos,
                source.heading,
                Vec2::new(-source.length * 0.5, lateral),
            );
            let radius = tuning.bubble_min_radius + rng.random::<f32>() * tuning.bubble_radius_variation;
            if self.bubbles.len() < MAX_BUBBLES {
                self.bubbles.push(Bubble { pos, radius, alpha: 1.0 });
            }
        }
    }

    fn update_smoke(
        &mut self,
        dt: f32,
        source: &WakeSource,
        wind: Vec2,
        tuning: &Tuning,
        rng: &mut impl Rng,
    ) {
        let fade = dt / tuning.smoke_fade_time.max(f32::EPSILON);
        let drift = tuning.smoke_wind_strength * dt;
        self.smoke.retain_mut(|puff| {
            puff.alpha -= fade;
            puff.pos += Vec2::from_angle(puff.wind_offset).rotate(wind) * drift;
            puff.alpha > 0.0
        });

        if source.sink_factor <= 0.0 {
            return;
        }

        let damage = source.damage.clamp(0.0, 1.0);
        let interval = tuning.smoke_base_spawn_interval
            / ((1.0 + damage * tuning.smoke_damage_multiplier) * source.sink_factor);
        if !interval.is_finite() || interval <= 0.0 {
            return;
        }

        self.smoke_timer += dt;
        while self.smoke_timer >= interval {
            self.smoke_timer -= interval;

            // Light damage smokes from the funnel; heavy damage from all over
            let pos = if damage < 0.3 {
                source.pos
            } else {
                let local = Vec2::new(
                    (rng.random::<f32>() - 0.5) * source.length * 0.8,
                    (rng.random::<f32>() - 0.5) * source.width * 0.6,
                );
                local_to_world(source.pos, source.heading, local)
            };

            let radius = tuning.smoke_base_radius + damage * 2.0 + rng.random::<f32>() * 1.5;
            let alpha = (tuning.smoke_base_alpha + damage * 0.4) * source.sink_factor;
            let wind_offset = (rng.random::<f32>() - 0.5) * tuning.smoke_wind_angle_variation;

            if self.smoke.len() < MAX_SMOKE {
                self.smoke.push(SmokePuff { pos, radius, alpha, wind_offset });
            }
        }
    }
}
