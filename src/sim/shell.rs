//! Shell ballistics
//!
//! Shells have no steering. Landing time is fixed at launch as
//! `range / |initial velocity|`; wind only bends the track on the way.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::EPSILON;

/// Where a shell is in its life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShellPhase {
    Flying,
    /// Came down; waiting for the collision pass
    Landed,
    /// Hit or splashed; purged at end of frame
    Resolved,
}

/// A fired projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shell {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Slot of the ship that fired it
    pub owner: usize,
    pub damage: f32,
    pub splash_radius: f32,
    /// Seconds from launch to landing
    pub flight_time: f32,
    /// Seconds since launch
    pub elapsed: f32,
    phase: ShellPhase,
}

impl Shell {
    /// Launch a shell that comes down after travelling `range` at its initial speed
    pub fn new(
        pos: Vec2,
        vel: Vec2,
        owner: usize,
        range: f32,
        damage: f32,
        splash_radius: f32,
    ) -> Self {
        let speed = vel.length();
        let flight_time = if speed > EPSILON { range.max(0.0) / speed } else { 0.0 };
        Self {
            pos,
            vel,
            owner,
            damage,
            splash_radius,
            flight_time,
            elapsed: 0.0,
            phase: ShellPhase::Flying,
        }
    }

    #[inline]
    pub fn phase(&self) -> ShellPhase {
        self.phase
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.phase != ShellPhase::Resolved
    }

    #[inline]
    pub fn has_landed(&self) -> bool {
        self.phase == ShellPhase::Landed
    }

    /// Fraction of the flight completed (0..=1)
    pub fn progress(&self) -> f32 {
        if self.flight_time <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.flight_time).min(1.0)
        }
    }

    /// Mark as resolved (hit or splash). Irreversible.
    pub fn kill(&mut self) {
        self.phase = ShellPhase::Resolved;
    }

    /// Advance one frame. `wind_drift` is an acceleration.
    pub fn update(&mut self, dt: f32, wind_drift: Vec2) {
        if self.phase != ShellPhase::Flying {
            return;
        }

        // Land exactly at the flight time: integrate only the remaining slice
        let step = dt.min(self.flight_time - self.elapsed).max(0.0);
        self.vel += wind_drift * step;
        self.pos += self.vel * step;
        self.elapsed += dt;

        if self.elapsed >= self.flight_time {
            self.elapsed = self.elapsed.max(self.flight_time);
            self.phase = ShellPhase::Landed;
            self.vel = Vec2::ZERO;
        }
    }
}

/// Wind drift acceleration for shells: wind × base shell speed × max drift
#[inline]
pub fn wind_drift(wind: Vec2, shell_speed: f32, max_drift: f32) -> Vec2 {
    wind * shell_speed * max_drift
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(speed: f32, range: f32) -> Shell {
        Shell::new(Vec2::ZERO, Vec2::new(speed, 0.0), 0, range, 100.0, 4.0)
    }

    #[test]
    fn test_lands_exactly_at_flight_time() {
        let mut s = shell(100.0, 150.0);
        assert!((s.flight_time - 1.5).abs() < 1e-6);

        s.update(0.5, Vec2::ZERO);
        s.update(0.5, Vec2::ZERO);
        assert!(!s.has_landed());
        assert_eq!(s.phase(), ShellPhase::Flying);

        s.update(0.5, Vec2::ZERO);
        assert!(s.has_landed());
        assert!((s.pos.x - 150.0).abs() < 1e-3);
        assert_eq!(s.vel, Vec2::ZERO);
    }

    #[test]
    fn test_overshooting_frame_stops_at_range() {
        let mut s = shell(100.0, 150.0);
        s.update(1.0, Vec2::ZERO);
        s.update(1.0, Vec2::ZERO);
        assert!(s.has_landed());
        assert!((s.pos.x - 150.0).abs() < 1e-3);
    }

    #[test]
    fn test_landed_shell_is_frozen() {
        let mut s = shell(100.0, 50.0);
        s.update(1.0, Vec2::ZERO);
        let landed_at = s.pos;
        s.update(1.0, Vec2::new(50.0, 50.0));
        assert_eq!(s.pos, landed_at);
    }

    #[test]
    fn test_tailwind_extends_range() {
        let mut calm = shell(100.0, 150.0);
        let mut tail = shell(100.0, 150.0);
        for _ in 0..200 {
            calm.update(0.01, Vec2::ZERO);
            tail.update(0.01, Vec2::new(10.0, 0.0));
        }
        assert!(tail.pos.x > calm.pos.x);
    }

    #[test]
    fn test_kill_is_terminal() {
        let mut s = shell(100.0, 150.0);
        s.kill();
        assert!(!s.is_alive());
        s.update(1.0, Vec2::ZERO);
        assert_eq!(s.phase(), ShellPhase::Resolved);
    }

    #[test]
    fn test_stationary_shell_lands_immediately() {
        let mut s = Shell::new(Vec2::ONE, Vec2::ZERO, 1, 100.0, 10.0, 4.0);
        s.update(0.016, Vec2::ZERO);
        assert!(s.has_landed());
    }
}
