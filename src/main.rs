//! Heligoland headless runner
//!
//! Plays one all-AI match at a fixed 60 Hz step and logs what happens.
//!
//! Usage: `heligoland [mode] [tuning.json] [seed]`

use std::error::Error;

use heligoland::audio::{AudioDirector, NullAudio};
use heligoland::consts::*;
use heligoland::sim::{GameEvent, GameMode, HullOracle, MatchPhase, MatchState, TickInput, tick};
use heligoland::{Tuning, TuningHandle};

/// Simulated seconds before the run is cut off
const TIME_CAP: f32 = 900.0;

fn parse_mode(name: &str) -> Option<GameMode> {
    let wanted = name.to_ascii_lowercase().replace(['-', '_', ' '], "");
    match wanted.as_str() {
        "ffa" => Some(GameMode::FreeForAll),
        "1v1" => Some(GameMode::Duel),
        "2v2" => Some(GameMode::Teams),
        "6v6" => Some(GameMode::Battle),
        _ => GameMode::ALL
            .into_iter()
            .find(|m| m.name().to_ascii_lowercase().replace(' ', "") == wanted),
    }
}

fn log_event(event: &GameEvent) {
    match event {
        GameEvent::ShipSunk { ship, pos } => {
            log::info!("Ship {ship} sunk at ({:.0}, {:.0})", pos.x, pos.y)
        }
        GameEvent::ShipHit { ship, owner, .. } => log::debug!("Ship {owner} hit ship {ship}"),
        GameEvent::ShipCollision { a, b, impact_speed, .. } => {
            log::debug!("Ships {a} and {b} collided ({impact_speed:.1})")
        }
        GameEvent::CannonFired { ship, shells, .. } => log::trace!("Ship {ship} fired {shells}"),
        _ => {}
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let mode = match args.next() {
        Some(name) => parse_mode(&name).ok_or_else(|| format!("unknown mode `{name}`"))?,
        None => GameMode::default(),
    };
    let tuning = match args.next() {
        Some(path) => {
            log::info!("Loading tuning from {path}");
            Tuning::from_path(&path)?
        }
        None => Tuning::default(),
    };
    let seed = match args.next() {
        Some(seed) => seed.parse::<u64>()?,
        None => rand::random::<u64>(),
    };
    log::info!("Heligoland headless starting: {} (seed {seed})", mode.name());

    let handle = TuningHandle::new(tuning);
    let mut state = MatchState::new(seed, handle.clone());
    state.set_mode(mode);
    state.start_match(&handle.snapshot());

    let mut director = AudioDirector::new(seed);
    let mut sink = NullAudio;
    let input = TickInput::default();
    let mut elapsed = 0.0;

    while elapsed < TIME_CAP {
        tick(&mut state, &input, &HullOracle, SIM_DT);
        elapsed += SIM_DT;

        let events = state.drain_events();
        for event in &events {
            log_event(event);
        }
        director.update(
            SIM_DT,
            &events,
            state.engine_level(),
            state.arena.x,
            &handle.snapshot(),
            &mut sink,
        );

        if state.phase == MatchPhase::Title {
            break;
        }
    }

    match state.outcome {
        Some(outcome) => log::info!("Outcome after {elapsed:.1}s: {outcome:?}"),
        None => log::warn!("No result after {TIME_CAP:.0}s"),
    }
    if mode.is_team_mode() {
        log::info!("Team wins: {:?}", state.team_wins);
    } else {
        log::info!("Wins by ship: {:?}", state.player_wins);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("duel"), Some(GameMode::Duel));
        assert_eq!(parse_mode("Free-For-All"), Some(GameMode::FreeForAll));
        assert_eq!(parse_mode("6v6"), Some(GameMode::Battle));
        assert_eq!(parse_mode("chess"), None);
    }
}
