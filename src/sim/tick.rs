//! Frame simulation tick
//!
//! Advances the match by one variable-length frame. Order within a battle frame:
//! controls, ships, wind, shells, shell impacts, hull contacts, island contacts,
//! explosions, then the win check.

use super::collision::{
    ShapeOracle, ShellImpact, resolve_island_contacts, resolve_ship_collisions, resolve_shell_hits,
};
use super::control::{BattleView, ControlFrame, ControlSource, HumanPilot, PlayerInput};
use super::shell::wind_drift;
use super::state::{ExplosionKind, GameEvent, MatchPhase, MatchState};
use crate::consts::*;
use crate::tuning::Tuning;

/// Input for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// One entry per human player device; missing or disconnected players are AI
    pub players: Vec<PlayerInput>,
    /// Title screen: -1 / +1 to step through game modes
    pub cycle_mode: i32,
}

impl TickInput {
    fn connected(&self, player: usize) -> Option<&PlayerInput> {
        self.players.get(player).filter(|p| p.connected)
    }
}

/// Advance the match by `dt` seconds
pub fn tick(state: &mut MatchState, input: &TickInput, oracle: &dyn ShapeOracle, dt: f32) {
    if !dt.is_finite() {
        return;
    }
    let dt = dt.clamp(0.0, MAX_FRAME_DT);
    let tuning = state.tuning().snapshot();
    state.frame += 1;
    state.clear_events();

    match state.phase {
        MatchPhase::Title => tick_title(state, input, &tuning),
        MatchPhase::Playing => {
            tick_battle(state, input, oracle, &tuning, dt, true);
            if let Some(outcome) = state.check_win() {
                state.end_match(outcome);
            }
        }
        MatchPhase::GameOver => {
            tick_battle(state, input, oracle, &tuning, dt, false);
            state.game_over_timer += dt;
            if state.game_over_timer >= tuning.game_over_return_delay {
                state.return_to_title();
            }
        }
    }
}

fn tick_title(state: &mut MatchState, input: &TickInput, tuning: &Tuning) {
    if input.cycle_mode != 0 {
        state.set_mode(state.mode.cycle(input.cycle_mode));
    }

    for player in 0..MAX_PLAYERS {
        let Some(device) = input.connected(player) else {
            continue;
        };
        if device.cycle_ship != 0 {
            let class = state.ship_classes[player].cycle(device.cycle_ship);
            state.ship_classes[player] = class;
            log::debug!("Player {player} picked {}", class.name());
            state.push_event(GameEvent::ShipClassChanged { player, class });
        }
    }

    let start = (0..MAX_PLAYERS).any(|p| input.connected(p).is_some_and(|d| d.fire));
    if start {
        state.start_match(tuning);
    }
}

/// One battle frame; `live` is false while GameOver lets things settle
fn tick_battle(
    state: &mut MatchState,
    input: &TickInput,
    oracle: &dyn ShapeOracle,
    tuning: &Tuning,
    dt: f32,
    live: bool,
) {
    let holding_fire = state.start_grace > 0.0;
    state.start_grace = (state.start_grace - dt).max(0.0);

    let frames = gather_controls(state, input, tuning, dt, live, holding_fire);

    let wind = state.wind.vector();
    for (ship, frame) in state.ships.iter_mut().zip(&frames) {
        ship.update(dt, frame, state.arena, tuning, &mut state.rng);
        ship.update_wake(dt, wind, tuning, &mut state.fx_rng);
        let fired = ship.take_pending_shells();
        if !fired.is_empty() {
            state.events.push(GameEvent::CannonFired {
                ship: ship.slot,
                pos: ship.pos,
                shells: fired.len(),
            });
            state.shells.extend(fired);
        }
    }

    state.wind.update(dt, &mut state.rng, tuning);

    let drift = wind_drift(state.wind.vector(), tuning.shell_speed(), tuning.wind_max_drift);
    for shell in &mut state.shells {
        shell.update(dt, drift);
    }

    let impacts = resolve_shell_hits(&mut state.shells, &mut state.ships, &state.islands, oracle);
    for impact in impacts {
        match impact {
            ShellImpact::Hit { pos, ship, owner, sank } => {
                state.add_explosion(pos, ExplosionKind::Hit, tuning);
                state.push_event(GameEvent::ShipHit { ship, owner, pos });
                if sank {
                    sink(state, ship, tuning);
                }
            }
            ShellImpact::Splash { pos } => {
                state.add_explosion(pos, ExplosionKind::Splash, tuning);
                state.push_event(GameEvent::ShellSplash { pos });
            }
            ShellImpact::Land { pos } => {
                state.add_explosion(pos, ExplosionKind::Land, tuning);
                state.push_event(GameEvent::ShellLanded { pos });
            }
        }
    }

    let contacts = resolve_ship_collisions(&mut state.ships, oracle, tuning);
    for contact in contacts {
        state.push_event(GameEvent::ShipCollision {
            a: contact.a,
            b: contact.b,
            pos: contact.point,
            impact_speed: contact.impact_speed,
        });
        if contact.sank_a {
            sink(state, contact.a, tuning);
        }
        if contact.sank_b {
            sink(state, contact.b, tuning);
        }
    }

    resolve_island_contacts(&mut state.ships, &state.islands, tuning);

    for explosion in &mut state.explosions {
        explosion.elapsed += dt;
    }
    state.explosions.retain(|e| !e.is_expired());
    state.shells.retain(|s| s.is_alive());
}

/// One control frame per ship slot, in slot order
fn gather_controls(
    state: &mut MatchState,
    input: &TickInput,
    tuning: &Tuning,
    dt: f32,
    live: bool,
    holding_fire: bool,
) -> Vec<ControlFrame> {
    let mode = state.mode;
    let view = BattleView {
        ships: &state.ships,
        shells: &state.shells,
        islands: &state.islands,
        arena: state.arena,
        tuning,
    };

    let mut frames = Vec::with_capacity(view.ships.len());
    for slot in 0..view.ships.len() {
        if !live {
            frames.push(ControlFrame::NEUTRAL);
            continue;
        }
        let human = mode.player_for_ship(slot).and_then(|p| input.connected(p));
        let mut frame = match (human, state.pilots.get_mut(slot)) {
            (Some(device), _) => HumanPilot::new(device).control(slot, &view, dt, &mut state.rng),
            (None, Some(pilot)) => pilot.control(slot, &view, dt, &mut state.rng),
            (None, None) => ControlFrame::NEUTRAL,
        };
        if holding_fire {
            frame.fire = false;
        }
        frames.push(frame);
    }
    frames
}

fn sink(state: &mut MatchState, slot: usize, tuning: &Tuning) {
    let Some(pos) = state.ships.get(slot).map(|s| s.pos) else {
        return;
    };
    state.add_explosion(pos, ExplosionKind::Sink, tuning);
    state.push_event(GameEvent::ShipSunk { ship: slot, pos });
}
