//! Ship body: hull physics, turrets, firing, damage and sinking

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::control::{AimInput, ControlFrame};
use super::shell::Shell;
use super::turret::{Mount, Turret};
use super::wake::{Wake, WakeSource};
use crate::consts::EPSILON;
use crate::tuning::{ShipClass, Tuning};
use crate::{local_to_world, normalize_angle};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    /// Index in the match's ship list
    pub slot: usize,
    /// None = free-for-all
    pub team: Option<u8>,
    pub class: ShipClass,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Radians, 0 = +x
    pub heading: f32,
    pub angular_vel: f32,
    /// Last applied throttle (-1..1), for HUD and engine audio
    pub throttle: f32,
    /// Last applied rudder (-1..1)
    pub rudder: f32,
    pub length: f32,
    pub width: f32,
    pub health: f32,
    pub max_health: f32,
    pub turrets: [Turret; 4],
    /// Crosshair position relative to the hull center
    pub crosshair_offset: Vec2,
    sinking: bool,
    sink_timer: f32,
    reload_timer: f32,
    pending_shells: Vec<Shell>,
    #[serde(skip)]
    pub wake: Wake,
}

impl Ship {
    pub fn new(
        slot: usize,
        team: Option<u8>,
        class: ShipClass,
        pos: Vec2,
        heading: f32,
        tuning: &Tuning,
    ) -> Self {
        let stats = class.stats();
        let turrets = class.mount_offsets(tuning.ship_length).map(|(offset, front)| {
            Turret::new(offset, if front { Mount::Front } else { Mount::Rear })
        });
        let max_health = tuning.ship_max_health * stats.health;

        Self {
            slot,
            team,
            class,
            pos,
            vel: Vec2::ZERO,
            heading: normalize_angle(heading),
            angular_vel: 0.0,
            throttle: 0.0,
            rudder: 0.0,
            length: tuning.ship_length,
            width: tuning.ship_width,
            health: max_health,
            max_health,
            turrets,
            crosshair_offset: Vec2::from_angle(heading) * tuning.crosshair_start_distance,
            sinking: false,
            sink_timer: 0.0,
            reload_timer: 0.0,
            pending_shells: Vec::new(),
            wake: Wake::default(),
        }
    }

    #[inline]
    pub fn forward(&self) -> Vec2 {
        Vec2::from_angle(self.heading)
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    #[inline]
    pub fn crosshair_world(&self) -> Vec2 {
        self.pos + self.crosshair_offset
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.health > 0.0 && !self.sinking
    }

    #[inline]
    pub fn is_sinking(&self) -> bool {
        self.sinking
    }

    /// Able to affect the outcome of the match
    #[inline]
    pub fn is_fighting(&self) -> bool {
        self.is_alive()
    }

    /// Sunk all the way; kept in its slot but skipped by everything
    pub fn is_fully_sunk(&self, tuning: &Tuning) -> bool {
        self.sinking && self.sink_timer >= tuning.ship_sink_duration
    }

    /// 0 afloat, 1 fully sunk
    pub fn sink_progress(&self, tuning: &Tuning) -> f32 {
        if !self.sinking {
            0.0
        } else {
            (self.sink_timer / tuning.ship_sink_duration.max(EPSILON)).min(1.0)
        }
    }

    /// 0 = pristine, 1 = no health left
    pub fn damage_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            return 1.0;
        }
        (1.0 - self.health / self.max_health).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn health_fraction(&self) -> f32 {
        1.0 - self.damage_fraction()
    }

    /// Seconds until the guns are reloaded
    #[inline]
    pub fn reload_remaining(&self) -> f32 {
        self.reload_timer
    }

    /// Multiplier on speed and turn authority from accumulated damage
    pub fn damage_penalty(&self, tuning: &Tuning) -> f32 {
        (1.0 - self.damage_fraction() * tuning.ship_damage_penalty_max).max(0.05)
    }

    pub fn max_speed(&self, tuning: &Tuning) -> f32 {
        tuning.ship_max_speed * self.class.stats().speed * self.damage_penalty(tuning)
    }

    /// Longest shell range for this class
    pub fn max_range(&self, tuning: &Tuning) -> f32 {
        (tuning.max_shell_range * self.class.stats().range).max(tuning.min_shell_range)
    }

    pub fn is_crosshair_in_range(&self, tuning: &Tuning) -> bool {
        self.crosshair_offset.length() >= tuning.min_shell_range
    }

    /// Reloaded, crosshair beyond minimum range, every turret on target
    pub fn is_ready_to_fire(&self, tuning: &Tuning) -> bool {
        self.reload_timer <= 0.0
            && self.is_crosshair_in_range(tuning)
            && self.turrets.iter().all(|t| t.is_on_target(tuning))
    }

    /// Hull outline: back-left, front-left, front-right, back-right
    pub fn corners(&self) -> [Vec2; 4] {
        let hl = self.length * 0.5;
        let hw = self.width * 0.5;
        [
            Vec2::new(-hl, -hw),
            Vec2::new(hl, -hw),
            Vec2::new(hl, hw),
            Vec2::new(-hl, hw),
        ]
        .map(|c| local_to_world(self.pos, self.heading, c))
    }

    /// Shells fired since the last call
    pub fn take_pending_shells(&mut self) -> Vec<Shell> {
        std::mem::take(&mut self.pending_shells)
    }

    /// Place the crosshair at a world point, limited to max distance
    pub fn set_crosshair_position(&mut self, world: Vec2, tuning: &Tuning) {
        self.crosshair_offset = (world - self.pos).clamp_length_max(tuning.max_crosshair_distance);
    }

    /// Returns true when this hit started the sink
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if self.sinking {
            return false;
        }
        self.health -= amount.max(0.0);
        if self.health <= 0.0 {
            self.health = 0.0;
            self.sinking = true;
            self.sink_timer = 0.0;
            log::info!("Ship {} is sinking", self.slot);
            return true;
        }
        false
    }

    /// Separate from another hull and bounce off it (equal masses)
    pub fn apply_collision(
        &mut self,
        push_dir: Vec2,
        push_dist: f32,
        self_vel: Vec2,
        other_vel: Vec2,
        tuning: &Tuning,
    ) {
        let normal = push_dir.normalize_or_zero();
        self.pos += normal * push_dist;

        let relative = self_vel - other_vel;
        let closing = relative.dot(normal);
        if closing < 0.0 {
            let impulse = -(1.0 + tuning.collision_restitution) * closing * 0.5;
            self.vel = self_vel + normal * impulse;
            self.angular_vel += relative.dot(normal.perp()) * tuning.collision_angular_factor;
        }
    }

    pub fn update(
        &mut self,
        dt: f32,
        control: &ControlFrame,
        arena: Vec2,
        tuning: &Tuning,
        rng: &mut impl Rng,
    ) {
        if self.sinking {
            self.update_sinking(dt, arena, tuning);
        } else {
            self.reload_timer = (self.reload_timer - dt).max(0.0);
            self.steer(dt, control, tuning);
            self.pos += self.vel * dt;
            self.clamp_to_arena(arena, tuning);
            self.update_crosshair(dt, control.aim, arena, tuning);
            self.update_turrets(dt, tuning);

            if control.fire && self.is_ready_to_fire(tuning) && self.fire_shells(tuning, rng) {
                self.reload_timer = tuning.fire_interval * self.class.stats().reload;
            }
        }
    }

    /// Advance the cosmetic wake from the effects RNG
    pub fn update_wake(&mut self, dt: f32, wind: Vec2, tuning: &Tuning, fx_rng: &mut impl Rng) {
        let source = WakeSource {
            pos: self.pos,
            heading: self.heading,
            vel: self.vel,
            throttle: self.throttle,
            length: self.length,
            width: self.width,
            damage: self.damage_fraction(),
            sink_factor: 1.0 - self.sink_progress(tuning),
            alive: self.is_alive(),
        };
        self.wake.update(dt, &source, wind, tuning, fx_rng);
    }

    fn update_sinking(&mut self, dt: f32, arena: Vec2, tuning: &Tuning) {
        self.sink_timer = (self.sink_timer + dt).min(tuning.ship_sink_duration);
        self.throttle = 0.0;
        self.rudder = 0.0;
        self.vel *= tuning.ship_sink_velocity_decay;
        self.angular_vel *= tuning.ship_sink_angular_decay;
        self.heading = normalize_angle(self.heading + self.angular_vel * dt);
        self.pos += self.vel * dt;
        self.clamp_to_arena(arena, tuning);
    }

    fn steer(&mut self, dt: f32, control: &ControlFrame, tuning: &Tuning) {
        let stats = self.class.stats();
        let penalty = self.damage_penalty(tuning);
        let deadzone = tuning.input_deadzone;

        let throttle = control.move_input.y.clamp(-1.0, 1.0);
        let rudder = control.move_input.x.clamp(-1.0, 1.0);
        self.throttle = if throttle.abs() < deadzone { 0.0 } else { throttle };
        self.rudder = if rudder.abs() < deadzone { 0.0 } else { rudder };

        // Thrust
        let forward = self.forward();
        let accel = tuning.ship_max_speed / tuning.ship_accel_time.max(EPSILON) * stats.speed * penalty;
        self.vel += forward * self.throttle * accel * dt;

        // Drag, then the forward/reverse speed limits
        self.vel *= (1.0 - tuning.ship_drag * dt).max(0.0);
        let max_speed = self.max_speed(tuning);
        let limit = if self.vel.dot(forward) >= 0.0 {
            max_speed
        } else {
            max_speed * tuning.ship_reverse_speed_multiplier
        };
        self.vel = self.vel.clamp_length_max(limit.max(0.0));

        // Rudder: authority grows with speed; damaged hulls turn wider
        if self.rudder != 0.0 {
            let steerage = self.speed().max(tuning.ship_min_steerage_speed);
            let turn_radius =
                (self.length * tuning.ship_min_turn_radius_multiplier / penalty).max(EPSILON);
            self.angular_vel = self.rudder * steerage / turn_radius * stats.turn;
        } else {
            self.angular_vel *= tuning.ship_angular_damping;
        }
        self.heading = normalize_angle(self.heading + self.angular_vel * dt);
    }

    fn clamp_to_arena(&mut self, arena: Vec2, tuning: &Tuning) {
        let margin = self.length.max(self.width) * 0.5;
        let bounce = tuning.wall_bounce_multiplier;

        if self.pos.x < margin {
            self.pos.x = margin;
            self.vel.x = self.vel.x.abs() * bounce;
        } else if self.pos.x > arena.x - margin {
            self.pos.x = arena.x - margin;
            self.vel.x = -self.vel.x.abs() * bounce;
        }

        if self.pos.y < margin {
            self.pos.y = margin;
            self.vel.y = self.vel.y.abs() * bounce;
        } else if self.pos.y > arena.y - margin {
            self.pos.y = arena.y - margin;
            self.vel.y = -self.vel.y.abs() * bounce;
        }
    }

    fn update_crosshair(&mut self, dt: f32, aim: AimInput, arena: Vec2, tuning: &Tuning) {
        match aim {
            AimInput::Stick(stick) => {
                if stick.length_squared() > 0.01 {
                    self.crosshair_offset += stick * tuning.crosshair_speed * dt;
                }
            }
            AimInput::Point(world) => self.crosshair_offset = world - self.pos,
        }

        // Keep the crosshair on screen
        let margin = tuning.crosshair_edge_margin;
        let world = self.crosshair_world();
        let lo = Vec2::splat(margin);
        let hi = (arena - Vec2::splat(margin)).max(lo);
        self.crosshair_offset = world.clamp(lo, hi) - self.pos;

        self.crosshair_offset = self
            .crosshair_offset
            .clamp_length_max(tuning.max_crosshair_distance);
    }

    fn update_turrets(&mut self, dt: f32, tuning: &Tuning) {
        let crosshair = self.crosshair_world();
        let turret_speed = self.class.stats().turret_speed;
        for turret in &mut self.turrets {
            let mount = turret.world_position(self.pos, self.heading);
            let dir = (crosshair - mount).normalize_or_zero();
            turret.update(dt, self.heading, dir, tuning, turret_speed);
        }
    }

    /// One shell from every turret that is aimed. Returns whether any fired.
    fn fire_shells(&mut self, tuning: &Tuning, rng: &mut impl Rng) -> bool {
        let stats = self.class.stats();
        let crosshair = self.crosshair_world();
        let max_range = self.max_range(tuning);
        let damage = tuning.shell_damage * stats.damage;
        let spread = tuning.shell_spread.abs();
        let variation = tuning.shell_range_variation.abs();
        let mut fired = false;

        for turret in &self.turrets {
            if !turret.is_aimed_at_target(tuning) {
                continue;
            }
            let mount = turret.world_position(self.pos, self.heading);

            let range = mount.distance(crosshair).clamp(tuning.min_shell_range, max_range)
                * (1.0 + rng.random_range(-variation..=variation));
            let angle = turret.world_angle(self.heading) + rng.random_range(-spread..=spread);
            let vel = Vec2::from_angle(angle) * tuning.shell_speed()
                + self.vel * tuning.shell_ship_velocity_factor;

            self.pending_shells.push(Shell::new(
                mount,
                vel,
                self.slot,
                range,
                damage,
                tuning.shell_splash_radius,
            ));
            fired = true;
        }
        fired
    }
}
