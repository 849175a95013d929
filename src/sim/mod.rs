//! Battle simulation module
//!
//! All gameplay logic lives here. This module stays free of rendering and
//! platform concerns:
//! - Frame time clamped to a safe maximum
//! - Seeded RNG owned by the match
//! - Stable iteration order (by ship slot)
//! - Exact hull shapes supplied through [`ShapeOracle`]

pub mod ai;
pub mod collision;
pub mod control;
pub mod island;
pub mod mode;
pub mod shell;
pub mod ship;
pub mod state;
pub mod tick;
pub mod turret;
pub mod wake;
pub mod wind;

pub use ai::{AiController, AiMode};
pub use collision::{BoxOracle, HullOracle, ShapeOracle, ShellImpact, ShipContact};
pub use control::{AimInput, BattleView, ControlFrame, ControlSource, HumanPilot, PlayerInput};
pub use island::Island;
pub use mode::GameMode;
pub use shell::{Shell, ShellPhase};
pub use ship::Ship;
pub use state::{Explosion, ExplosionKind, GameEvent, MatchOutcome, MatchPhase, MatchState};
pub use tick::{TickInput, tick};
pub use turret::{Mount, Turret};
pub use wake::Wake;
pub use wind::Wind;
