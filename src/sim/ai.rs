//! Computer pilots
//!
//! An [`AiController`] drives one ship slot whenever no connected human owns
//! it. It emits the same [`ControlFrame`] a gamepad would.
//!
//! Movement priorities, highest first:
//! 1. Escape when beached against an arena edge
//! 2. Dodge incoming enemy shells
//! 3. Steer away from an edge the ship is about to run into
//! 4. Seek the wander target (re-picked on a timer, chosen by combat mode)

use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::control::{AimInput, BattleView, ControlFrame, ControlSource};
use super::island::Island;
use super::shell::Shell;
use super::ship::Ship;
use crate::tuning::Tuning;
use crate::{angle_between, to_angle};

/// Placement attempts before accepting a wander target near an island
const WANDER_ATTEMPTS: usize = 8;
/// Dodge urgency above which dodging overrides everything else
const URGENT_DODGE: f32 = 0.5;
/// Crosshair error (px) treated as "on the aim point"
const AIM_DEADBAND: f32 = 5.0;

/// Combat temperament, re-evaluated every frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AiMode {
    /// An enemy is badly hurt: close in and finish it
    Aggressive,
    #[default]
    Normal,
    /// Own health is low: keep away from enemies
    Scared,
}

impl AiMode {
    /// Throttle used while seeking the wander target
    fn cruise_throttle(self) -> f32 {
        match self {
            AiMode::Aggressive => 0.7,
            AiMode::Normal => 0.6,
            AiMode::Scared => 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiController {
    wander_target: Vec2,
    wander_timer: f32,
    /// Per-pilot scale (0.95..1.05) on ranges and tolerances
    personality: f32,
    mode: AiMode,
    last: ControlFrame,
}

impl AiController {
    pub fn new(rng: &mut impl Rng) -> Self {
        Self {
            wander_target: Vec2::ZERO,
            wander_timer: 0.0,
            personality: rng.random_range(0.95..=1.05),
            mode: AiMode::Normal,
            last: ControlFrame::NEUTRAL,
        }
    }

    #[inline]
    pub fn mode(&self) -> AiMode {
        self.mode
    }

    #[inline]
    pub fn personality(&self) -> f32 {
        self.personality
    }

    #[inline]
    pub fn wander_target(&self) -> Vec2 {
        self.wander_target
    }

    /// Output of the most recent frame
    #[inline]
    pub fn last_frame(&self) -> ControlFrame {
        self.last
    }

    fn determine_mode(me: &Ship, enemies: &[&Ship], tuning: &Tuning) -> AiMode {
        let health = me.health_fraction();
        if health < tuning.ai_scared_health {
            return AiMode::Scared;
        }
        if enemies
            .iter()
            .any(|e| e.health_fraction() < health * tuning.ai_aggressive_ratio)
        {
            return AiMode::Aggressive;
        }
        AiMode::Normal
    }

    /// Nearest enemy (ties to the lowest slot). Aggressive pilots take the
    /// weakest enemy in range instead.
    fn find_target<'a>(&self, me: &Ship, enemies: &[&'a Ship], tuning: &Tuning) -> Option<&'a Ship> {
        let nearest = enemies.iter().copied().fold(None::<&Ship>, |best, e| match best {
            Some(b) if b.pos.distance(me.pos) <= e.pos.distance(me.pos) => Some(b),
            _ => Some(e),
        });

        if self.mode == AiMode::Aggressive {
            let range = me.max_range(tuning) * self.personality;
            let weakest = enemies
                .iter()
                .copied()
                .filter(|e| e.pos.distance(me.pos) <= range)
                .fold(None::<&Ship>, |best, e| match best {
                    Some(b) if b.health <= e.health => Some(b),
                    _ => Some(e),
                });
            return weakest.or(nearest);
        }
        nearest
    }

    fn pick_wander_target(
        &mut self,
        me: &Ship,
        enemies: &[&Ship],
        target: Option<&Ship>,
        view: &BattleView<'_>,
        rng: &mut Pcg32,
    ) {
        let tuning = view.tuning;
        let margin = tuning.ai_wander_margin.max(0.0);
        let lo = Vec2::splat(margin).min(view.arena * 0.5);
        let hi = (view.arena - Vec2::splat(margin)).max(lo);

        let mut candidate = view.arena * 0.5;
        for _ in 0..WANDER_ATTEMPTS {
            candidate = match (self.mode, target) {
                (AiMode::Aggressive, Some(t)) => {
                    let dist = me.max_range(tuning) * 0.5 * self.personality;
                    t.pos + Vec2::from_angle(rng.random::<f32>() * 2.0 * PI) * dist
                }
                (AiMode::Scared, _) if !enemies.is_empty() => {
                    let flee = enemies
                        .iter()
                        .map(|e| (me.pos - e.pos).normalize_or_zero() / (me.pos.distance(e.pos) + 1.0))
                        .sum::<Vec2>()
                        .normalize_or_zero();
                    let jitter = Vec2::from_angle((rng.random::<f32>() - 0.5) * FRAC_PI_2);
                    me.pos + jitter.rotate(flee) * (150.0 + rng.random::<f32>() * 150.0)
                }
                _ => lo + Vec2::new(rng.random::<f32>(), rng.random::<f32>()) * (hi - lo),
            }
            .clamp(lo, hi);

            if !near_island(candidate, me.length, view.islands) {
                break;
            }
        }

        self.wander_target = candidate;
        self.wander_timer =
            tuning.ai_wander_interval + rng.random::<f32>() * tuning.ai_wander_interval_jitter.max(0.0);
    }

    fn update_movement(
        &mut self,
        dt: f32,
        me: &Ship,
        enemies: &[&Ship],
        target: Option<&Ship>,
        view: &BattleView<'_>,
        rng: &mut Pcg32,
    ) -> Vec2 {
        let tuning = view.tuning;
        let center = view.arena * 0.5;
        let speed = me.speed();

        // Beached: pinned against an edge, not moving, still pushing into it
        let edge = me.length * 0.5 + 1.0;
        let at_edge = me.pos.x < edge
            || me.pos.x > view.arena.x - edge
            || me.pos.y < edge
            || me.pos.y > view.arena.y - edge;
        let facing_out = me.forward().dot((center - me.pos).normalize_or_zero()) < 0.0;
        if at_edge && facing_out && speed < 0.5 && me.throttle.abs() > 0.3 {
            self.wander_target = center;
            self.wander_timer = 2.0;
            let turn = if rng.random::<bool>() { 1.0 } else { -1.0 };
            return Vec2::new(turn, -0.5);
        }

        let (dodge, urgency) = self.dodge_direction(me, view.shells, tuning);
        if urgency > URGENT_DODGE {
            let (dir, _) = avoid_edges(me, view.arena, tuning, dodge);
            return steer_toward(me.heading, dir, 1.0);
        }

        self.wander_timer -= dt;
        if self.wander_timer <= 0.0 {
            self.pick_wander_target(me, enemies, target, view, rng);
        }

        let to_target = self.wander_target - me.pos;
        let seek = to_target.normalize_or_zero();

        let (dir, edge_urgency) = avoid_edges(me, view.arena, tuning, seek);
        if edge_urgency > 0.0 {
            self.wander_target = center;
            let dir = avoid_islands(me, view.islands, dir);
            let mut out = steer_toward(me.heading, dir, self.mode.cruise_throttle());
            // Closing on the edge too fast: back the engines
            let (away, _) = avoid_edges(me, view.arena, tuning, Vec2::ZERO);
            if -me.vel.dot(away) > tuning.ai_brake_closing_speed {
                out.y = -1.0;
            }
            return out;
        }

        if to_target.length() < tuning.ai_stop_radius {
            return Vec2::ZERO;
        }
        let dir = avoid_islands(me, view.islands, seek);
        steer_toward(me.heading, dir, self.mode.cruise_throttle())
    }

    /// Combined sidestep away from enemy shells whose track passes close
    /// within the dodge window, and how urgent it is (0..1)
    fn dodge_direction(&self, me: &Ship, shells: &[Shell], tuning: &Tuning) -> (Vec2, f32) {
        let window = tuning.ai_dodge_window.max(f32::EPSILON);
        let mut total = Vec2::ZERO;
        let mut urgency = 0.0f32;

        for shell in shells {
            if !shell.is_alive() || shell.has_landed() || shell.owner == me.slot {
                continue;
            }
            let speed = shell.vel.length();
            if speed < 1.0 {
                continue;
            }
            let dir = shell.vel / speed;
            let along = (me.pos - shell.pos).dot(dir);
            if along < 0.0 {
                continue;
            }

            let closest = shell.pos + dir * along;
            let offset = me.pos - closest;
            let miss = offset.length();
            let danger = (me.length * 0.5 + shell.splash_radius + 30.0) * self.personality;
            let time_to_impact = along / speed;
            if miss >= danger || time_to_impact >= window {
                continue;
            }

            let shell_urgency = (1.0 - time_to_impact / window).max(1.0 - miss / danger);
            let sidestep = if miss > 0.1 { offset / miss } else { dir.perp() };
            total += sidestep * shell_urgency;
            urgency = urgency.max(shell_urgency);
        }

        (total.normalize_or_zero(), urgency)
    }

    /// Lead the target and walk the crosshair onto the predicted position
    fn update_aim(&self, me: &Ship, target: Option<&Ship>, dt: f32, tuning: &Tuning) -> (Vec2, bool) {
        let Some(target) = target else {
            return (Vec2::ZERO, false);
        };
        let distance = me.pos.distance(target.pos);
        let shell_speed = tuning.shell_speed();
        if distance < 0.01 || shell_speed <= 0.0 {
            return (Vec2::ZERO, false);
        }

        // Two-pass lead: flight time to the target, then to the predicted point
        let mut predicted = target.pos + target.vel * (distance / shell_speed);
        predicted = target.pos + target.vel * (me.pos.distance(predicted) / shell_speed);

        let error = predicted - me.crosshair_world();
        let error_len = error.length();
        let step = tuning.crosshair_speed * dt;
        let aim = if error_len <= AIM_DEADBAND || step <= 0.0 {
            Vec2::ZERO
        } else {
            (error / step).clamp_length_max(1.0)
        };

        let engage = me.max_range(tuning).min(tuning.ai_fire_distance) * self.personality;
        let fire = error_len < tuning.ai_crosshair_tolerance * self.personality
            && distance < engage
            && me.is_ready_to_fire(tuning);
        (aim, fire)
    }
}

impl ControlSource for AiController {
    fn control(&mut self, slot: usize, view: &BattleView<'_>, dt: f32, rng: &mut Pcg32) -> ControlFrame {
        let Some(me) = view.ships.get(slot).filter(|s| s.is_alive()) else {
            self.last = ControlFrame::NEUTRAL;
            return self.last;
        };

        let enemies: Vec<&Ship> = view
            .ships
            .iter()
            .filter(|s| s.slot != me.slot && s.is_alive() && is_enemy(me, s))
            .collect();

        let mode = Self::determine_mode(me, &enemies, view.tuning);
        if mode != self.mode {
            log::debug!("AI {slot} now {mode:?}");
            self.mode = mode;
        }
        let target = self.find_target(me, &enemies, view.tuning);

        let move_input = self.update_movement(dt, me, &enemies, target, view, rng);
        let (aim, fire) = self.update_aim(me, target, dt, view.tuning);

        self.last = ControlFrame {
            move_input,
            aim: AimInput::Stick(aim),
            fire,
        };
        self.last
    }
}

/// Free-for-all ships are everyone's enemy; otherwise teams decide
#[inline]
pub fn is_enemy(me: &Ship, other: &Ship) -> bool {
    match (me.team, other.team) {
        (Some(a), Some(b)) => a != b,
        _ => true,
    }
}

fn near_island(point: Vec2, clearance: f32, islands: &[Island]) -> bool {
    islands
        .iter()
        .any(|i| point.distance(i.center()) < i.bounding_radius() + clearance)
}

/// Turn toward `dir`; throttle only when roughly facing it
fn steer_toward(heading: f32, dir: Vec2, throttle: f32) -> Vec2 {
    if dir.length_squared() < 0.01 {
        return Vec2::new(0.0, 0.2);
    }
    let error = angle_between(heading, to_angle(dir));
    let rudder = (error * 2.0).clamp(-1.0, 1.0);
    let throttle = if error.abs() < FRAC_PI_2 { throttle.max(0.2) } else { 0.0 };
    Vec2::new(rudder, throttle)
}

/// Blend `desired` away from any edge the ship will reach within the
/// look-ahead. Returns the new direction and the urgency (0 = no danger).
fn avoid_edges(me: &Ship, arena: Vec2, tuning: &Tuning, desired: Vec2) -> (Vec2, f32) {
    let future = me.pos + me.vel * tuning.ai_look_ahead_time;
    let danger = me.length * 2.0 + me.speed() * 1.5;
    if danger <= 0.0 {
        return (desired, 0.0);
    }

    let mut away = Vec2::ZERO;
    let mut urgency = 0.0f32;
    if future.x < danger {
        away.x += 1.0;
        urgency = urgency.max(1.0 - future.x / danger);
    }
    if future.x > arena.x - danger {
        away.x -= 1.0;
        urgency = urgency.max(1.0 - (arena.x - future.x) / danger);
    }
    if future.y < danger {
        away.y += 1.0;
        urgency = urgency.max(1.0 - future.y / danger);
    }
    if future.y > arena.y - danger {
        away.y -= 1.0;
        urgency = urgency.max(1.0 - (arena.y - future.y) / danger);
    }

    let Some(away) = away.try_normalize() else {
        return (desired, 0.0);
    };
    let weight = (urgency * 2.0).clamp(0.0, 1.0);
    let blended = desired * (1.0 - weight) + away * weight;
    (blended.try_normalize().unwrap_or(away), urgency.max(f32::EPSILON))
}

/// Bend `desired` around islands the ship is close to or heading for
fn avoid_islands(me: &Ship, islands: &[Island], desired: Vec2) -> Vec2 {
    let heading_dir = me.vel.try_normalize().unwrap_or_else(|| me.forward());
    let mut away_sum = Vec2::ZERO;
    let mut max_urgency = 0.0f32;

    for island in islands {
        let to_island = island.center() - me.pos;
        let dist = to_island.length();
        let danger = island.bounding_radius() + me.length * 1.5;
        let Some(toward) = to_island.try_normalize() else {
            continue;
        };

        if dist < danger {
            let urgency = (1.0 - dist / danger).clamp(0.3, 1.0);
            away_sum -= toward * urgency;
            max_urgency = max_urgency.max(urgency);
        } else if dist < danger * 2.0 {
            let closing = heading_dir.dot(toward);
            if closing > 0.2 {
                let urgency = ((1.0 - (dist - danger) / danger) * closing).clamp(0.0, 1.0);
                let mut around = toward.perp();
                if around.dot(heading_dir) < 0.0 {
                    around = -around;
                }
                away_sum += (around - toward).normalize_or_zero() * urgency;
                max_urgency = max_urgency.max(urgency);
            }
        }
    }

    let Some(away) = away_sum.try_normalize() else {
        return desired;
    };
    let weight = max_urgency.min(0.95);
    (desired * (1.0 - weight) + away * weight).try_normalize().unwrap_or(away)
}
