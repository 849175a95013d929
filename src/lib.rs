//! Heligoland - naval arcade battle combat core
//!
//! Core modules:
//! - `sim`: Frame simulation (ship physics, turrets, shells, wind, islands,
//!   collisions, AI pilots, match state machine)
//! - `tuning`: Data-driven game balance with hot-swap reload
//! - `audio`: Mapping of simulation events to panned sound cues

pub mod audio;
pub mod sim;
pub mod tuning;

pub use tuning::{ShipClass, Tuning, TuningError, TuningHandle};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Step used by the headless runner (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Frame deltas above this are clamped to avoid runaway integration after a stall
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Arena dimensions
    pub const ARENA_WIDTH: f32 = 1280.0;
    pub const ARENA_HEIGHT: f32 = 720.0;

    /// Maximum number of human players (input devices)
    pub const MAX_PLAYERS: usize = 4;

    /// Lengths below this are treated as zero
    pub const EPSILON: f32 = 1.0e-4;
}

/// Normalize angle to [-π, π]
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    if !angle.is_finite() {
        return 0.0;
    }
    while angle > PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Angle of a vector (atan2), 0 for the zero vector
#[inline]
pub fn to_angle(v: Vec2) -> f32 {
    if v.length_squared() < consts::EPSILON * consts::EPSILON {
        0.0
    } else {
        v.y.atan2(v.x)
    }
}

/// Rotate a body-local offset by `heading` and translate it to `origin`
#[inline]
pub fn local_to_world(origin: Vec2, heading: f32, local: Vec2) -> Vec2 {
    origin + Vec2::from_angle(heading).rotate(local)
}

/// Inverse of [`local_to_world`]
#[inline]
pub fn world_to_local(origin: Vec2, heading: f32, world: Vec2) -> Vec2 {
    Vec2::from_angle(-heading).rotate(world - origin)
}

/// Shortest signed angle from `from` to `to`, in [-π, π]
#[inline]
pub fn angle_between(from: f32, to: f32) -> f32 {
    normalize_angle(to - from)
}
