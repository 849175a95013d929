//! Control frames and the sources that produce them
//!
//! Human input and the AI both reduce to a [`ControlFrame`]: the ship never
//! knows who is steering it.

use glam::Vec2;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::island::Island;
use super::ship::Ship;
use super::shell::Shell;
use crate::tuning::Tuning;

/// How the crosshair is being driven
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AimInput {
    /// Stick deflection; moves the crosshair relative to the ship
    Stick(Vec2),
    /// Absolute world point (mouse); places the crosshair directly
    Point(Vec2),
}

impl Default for AimInput {
    fn default() -> Self {
        AimInput::Stick(Vec2::ZERO)
    }
}

/// One frame of steering for one ship
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlFrame {
    /// x = rudder (-1..1), y = throttle (+1 = ahead)
    pub move_input: Vec2,
    pub aim: AimInput,
    pub fire: bool,
}

impl ControlFrame {
    /// Hands off the wheel
    pub const NEUTRAL: ControlFrame = ControlFrame {
        move_input: Vec2::ZERO,
        aim: AimInput::Stick(Vec2::ZERO),
        fire: false,
    };
}

/// Reduced input from one human player's device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerInput {
    pub connected: bool,
    /// x = turn, y = throttle (+1 = ahead)
    pub move_input: Vec2,
    pub aim: AimInput,
    pub fire: bool,
    /// Title screen: -1 / +1 to step through ship classes
    pub cycle_ship: i32,
}

/// Read-only view of the battle handed to every control source
#[derive(Debug, Clone, Copy)]
pub struct BattleView<'a> {
    pub ships: &'a [Ship],
    pub shells: &'a [Shell],
    pub islands: &'a [Island],
    pub arena: Vec2,
    pub tuning: &'a Tuning,
}

/// Anything that can steer a ship
pub trait ControlSource {
    fn control(&mut self, slot: usize, view: &BattleView<'_>, dt: f32, rng: &mut Pcg32) -> ControlFrame;
}

/// Adapter from a device's [`PlayerInput`] to a [`ControlFrame`]
#[derive(Debug, Clone, Copy)]
pub struct HumanPilot<'a> {
    input: &'a PlayerInput,
}

impl<'a> HumanPilot<'a> {
    pub fn new(input: &'a PlayerInput) -> Self {
        Self { input }
    }
}

/// Zero out stick values inside the deadzone, per axis
#[inline]
pub fn apply_deadzone(v: Vec2, deadzone: f32) -> Vec2 {
    let axis = |a: f32| if a.abs() < deadzone { 0.0 } else { a.clamp(-1.0, 1.0) };
    Vec2::new(axis(v.x), axis(v.y))
}

impl ControlSource for HumanPilot<'_> {
    fn control(&mut self, _slot: usize, view: &BattleView<'_>, _dt: f32, _rng: &mut Pcg32) -> ControlFrame {
        let deadzone = view.tuning.input_deadzone;
        let aim = match self.input.aim {
            AimInput::Stick(stick) => AimInput::Stick(apply_deadzone(stick, deadzone)),
            point @ AimInput::Point(_) => point,
        };
        ControlFrame {
            move_input: apply_deadzone(self.input.move_input, deadzone),
            aim,
            fire: self.input.fire,
        }
    }
}
