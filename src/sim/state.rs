//! Match state and core simulation types
//!
//! The match owns every mutable piece of the battle. The only shared object is
//! the [`TuningHandle`], read once per frame as an `Arc<Tuning>` snapshot.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ai::AiController;
use super::island::Island;
use super::mode::GameMode;
use super::shell::Shell;
use super::ship::Ship;
use super::wind::Wind;
use crate::consts::*;
use crate::tuning::{ShipClass, Tuning, TuningHandle};

/// Placement attempts per island before giving up on it
const ISLAND_ATTEMPTS: usize = 24;
/// Mixed into the match seed for the cosmetic effects stream
const FX_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Current phase of the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MatchPhase {
    /// Mode and ship selection
    #[default]
    Title,
    Playing,
    /// Result shown; ships still settle
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplosionKind {
    Hit,
    Splash,
    /// Shell came down on an island
    Land,
    Sink,
}

/// Expanding blast ring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Explosion {
    pub pos: Vec2,
    pub elapsed: f32,
    pub duration: f32,
    pub max_radius: f32,
    pub kind: ExplosionKind,
}

impl Explosion {
    pub fn new(pos: Vec2, kind: ExplosionKind, tuning: &Tuning) -> Self {
        let (duration, max_radius) = match kind {
            ExplosionKind::Hit => (tuning.explosion_duration, tuning.explosion_max_radius),
            ExplosionKind::Splash | ExplosionKind::Land => {
                (tuning.explosion_duration, tuning.explosion_max_radius * 0.5)
            }
            ExplosionKind::Sink => (tuning.sink_explosion_duration, tuning.sink_explosion_max_radius),
        };
        Self {
            pos,
            elapsed: 0.0,
            duration,
            max_radius,
            kind,
        }
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// 0..1 through the blast
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }

    pub fn radius(&self) -> f32 {
        self.max_radius * self.progress()
    }
}

/// How a match ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    /// Ship slot in free-for-all modes, team id in team modes
    Winner(usize),
    Draw,
}

impl MatchOutcome {
    pub fn winner_index(self) -> Option<usize> {
        match self {
            MatchOutcome::Winner(index) => Some(index),
            MatchOutcome::Draw => None,
        }
    }
}

/// Things that happened this frame (for audio and UI)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ModeChanged { mode: GameMode },
    ShipClassChanged { player: usize, class: ShipClass },
    MatchStarted { mode: GameMode },
    CannonFired { ship: usize, pos: Vec2, shells: usize },
    ShellSplash { pos: Vec2 },
    ShellLanded { pos: Vec2 },
    ShipHit { ship: usize, owner: usize, pos: Vec2 },
    ShipSunk { ship: usize, pos: Vec2 },
    ShipCollision { a: usize, b: usize, pos: Vec2, impact_speed: f32 },
    MatchEnded { outcome: MatchOutcome },
    ReturnedToTitle,
}

/// Complete match state
#[derive(Debug, Clone)]
pub struct MatchState {
    /// Seed for the match RNG
    pub seed: u64,
    pub mode: GameMode,
    pub phase: MatchPhase,
    /// Arena size in world units
    pub arena: Vec2,
    /// Ships by slot (sized from the mode at match start)
    pub ships: Vec<Ship>,
    pub shells: Vec<Shell>,
    pub explosions: Vec<Explosion>,
    pub islands: Vec<Island>,
    pub wind: Wind,
    /// One AI pilot per ship slot; used whenever no connected human owns the slot
    pub pilots: Vec<AiController>,
    /// Class picked by each human player on the title screen
    pub ship_classes: [ShipClass; MAX_PLAYERS],
    /// Wins by ship slot (free-for-all modes)
    pub player_wins: Vec<u32>,
    pub team_wins: [u32; 2],
    /// Seconds left before fire input is honored
    pub start_grace: f32,
    /// Seconds spent in GameOver
    pub game_over_timer: f32,
    pub outcome: Option<MatchOutcome>,
    pub matches_played: u32,
    /// Simulation frame counter
    pub frame: u64,
    /// Gameplay randomness: spread, AI, wind, islands, class rolls
    pub(crate) rng: Pcg32,
    /// Wake particles only; never touches gameplay
    pub(crate) fx_rng: Pcg32,
    pub(crate) events: Vec<GameEvent>,
    tuning: TuningHandle,
}

impl MatchState {
    pub fn new(seed: u64, tuning: TuningHandle) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let wind = Wind::new(&mut rng, &tuning.snapshot());
        Self {
            seed,
            mode: GameMode::default(),
            phase: MatchPhase::Title,
            arena: Vec2::new(ARENA_WIDTH, ARENA_HEIGHT),
            ships: Vec::new(),
            shells: Vec::new(),
            explosions: Vec::new(),
            islands: Vec::new(),
            wind,
            pilots: Vec::new(),
            ship_classes: [ShipClass::default(); MAX_PLAYERS],
            player_wins: Vec::new(),
            team_wins: [0; 2],
            start_grace: 0.0,
            game_over_timer: 0.0,
            outcome: None,
            matches_played: 0,
            frame: 0,
            rng,
            fx_rng: Pcg32::seed_from_u64(seed ^ FX_SEED_SALT),
            events: Vec::new(),
            tuning,
        }
    }

    #[inline]
    pub fn tuning(&self) -> &TuningHandle {
        &self.tuning
    }

    /// Events since the last drain, oldest first.
    ///
    /// Each [`tick`](super::tick::tick) discards events left undrained from the
    /// previous one, so hosts drain once per tick.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub(crate) fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Average |throttle| over living ships (0 when none)
    pub fn engine_level(&self) -> f32 {
        let (sum, count) = self
            .ships
            .iter()
            .filter(|s| s.is_alive())
            .fold((0.0, 0usize), |(sum, n), s| (sum + s.throttle.abs(), n + 1));
        if count == 0 { 0.0 } else { sum / count as f32 }
    }

    pub fn set_mode(&mut self, mode: GameMode) {
        if self.mode != mode {
            self.mode = mode;
            log::info!("Mode: {}", mode.name());
            self.push_event(GameEvent::ModeChanged { mode });
        }
    }

    pub fn add_explosion(&mut self, pos: Vec2, kind: ExplosionKind, tuning: &Tuning) {
        self.explosions.push(Explosion::new(pos, kind, tuning));
    }

    /// Spawn the mode's ships and reset everything transient
    pub fn start_match(&mut self, tuning: &Tuning) {
        let mode = self.mode;
        let count = mode.ship_count();

        self.ships.clear();
        for slot in 0..count {
            let Some((pos, heading)) = mode.start_pose(slot, self.arena) else {
                continue;
            };
            let class = match mode.player_for_ship(slot) {
                Some(player) => self.ship_classes[player],
                None => ShipClass::ALL[self.rng.random_range(0..ShipClass::ALL.len())],
            };
            self.ships
                .push(Ship::new(slot, mode.team_of(slot), class, pos, heading, tuning));
        }

        self.shells.clear();
        self.explosions.clear();
        self.wind = Wind::new(&mut self.rng, tuning);
        self.islands = self.place_islands(tuning);
        self.pilots = (0..count).map(|_| AiController::new(&mut self.rng)).collect();

        if self.player_wins.len() < count {
            self.player_wins.resize(count, 0);
        }
        self.start_grace = tuning.game_start_delay;
        self.game_over_timer = 0.0;
        self.outcome = None;
        self.matches_played += 1;
        self.phase = MatchPhase::Playing;

        log::info!(
            "Match {} started: {} with {} ships, {} islands",
            self.matches_played,
            mode.name(),
            count,
            self.islands.len()
        );
        self.push_event(GameEvent::MatchStarted { mode });
    }

    /// Islands clear of every spawn point and of each other
    fn place_islands(&mut self, tuning: &Tuning) -> Vec<Island> {
        let mut islands: Vec<Island> = Vec::new();
        let min_r = tuning.island_min_radius.max(1.0);
        let max_r = tuning.island_max_radius.max(min_r);
        let margin = Vec2::splat(max_r * 1.5).min(self.arena * 0.5);
        let span = (self.arena - margin * 2.0).max(Vec2::ZERO);
        let clearance = tuning.ship_length * 2.0;

        for _ in 0..tuning.island_count {
            for _ in 0..ISLAND_ATTEMPTS {
                let center = margin + Vec2::new(self.rng.random::<f32>(), self.rng.random::<f32>()) * span;
                let radius = min_r + self.rng.random::<f32>() * (max_r - min_r);
                let island = Island::new(center, radius, self.rng.random::<u64>());

                let reach = island.bounding_radius();
                let blocks_spawn = self.ships.iter().any(|s| s.pos.distance(center) < reach + clearance);
                let overlaps = islands.iter().any(|o| {
                    o.center().distance(center) < o.bounding_radius() + reach + clearance
                });
                if !blocks_spawn && !overlaps {
                    islands.push(island);
                    break;
                }
            }
        }
        islands
    }

    /// Decide whether the match is over
    pub fn check_win(&self) -> Option<MatchOutcome> {
        if self.mode.is_team_mode() {
            let mut fighting = [0usize; 2];
            for ship in self.ships.iter().filter(|s| s.is_fighting()) {
                if let Some(team) = ship.team {
                    fighting[usize::from(team).min(1)] += 1;
                }
            }
            match fighting {
                [0, 0] => Some(MatchOutcome::Draw),
                [0, _] => Some(MatchOutcome::Winner(1)),
                [_, 0] => Some(MatchOutcome::Winner(0)),
                _ => None,
            }
        } else {
            let mut fighting = self.ships.iter().filter(|s| s.is_fighting());
            match (fighting.next(), fighting.next()) {
                (None, _) => Some(MatchOutcome::Draw),
                (Some(last), None) => Some(MatchOutcome::Winner(last.slot)),
                _ => None,
            }
        }
    }

    /// Record the result and move to GameOver
    pub fn end_match(&mut self, outcome: MatchOutcome) {
        match outcome {
            MatchOutcome::Winner(index) if self.mode.is_team_mode() => {
                if let Some(wins) = self.team_wins.get_mut(index) {
                    *wins += 1;
                }
                log::info!("Team {index} wins");
            }
            MatchOutcome::Winner(slot) => {
                if self.player_wins.len() <= slot {
                    self.player_wins.resize(slot + 1, 0);
                }
                self.player_wins[slot] += 1;
                log::info!("Ship {slot} wins");
            }
            MatchOutcome::Draw => log::info!("Match drawn"),
        }
        self.outcome = Some(outcome);
        self.game_over_timer = 0.0;
        self.phase = MatchPhase::GameOver;
        self.push_event(GameEvent::MatchEnded { outcome });
    }

    pub fn return_to_title(&mut self) {
        self.ships.clear();
        self.shells.clear();
        self.explosions.clear();
        self.pilots.clear();
        self.islands.clear();
        self.phase = MatchPhase::Title;
        log::info!("Returned to title");
        self.push_event(GameEvent::ReturnedToTitle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(mode: GameMode) -> MatchState {
        let mut state = MatchState::new(7, TuningHandle::default());
        state.set_mode(mode);
        state
    }

    #[test]
    fn test_start_match_sizes_from_mode() {
        let tuning = Tuning::default();
        for mode in GameMode::ALL {
            let mut s = state(mode);
            s.start_match(&tuning);
            assert_eq!(s.ships.len(), mode.ship_count());
            assert_eq!(s.pilots.len(), mode.ship_count());
            assert_eq!(s.phase, MatchPhase::Playing);
            assert!(s.ships.iter().enumerate().all(|(i, ship)| ship.slot == i));
        }
    }

    #[test]
    fn test_human_slots_use_selected_class() {
        let tuning = Tuning::default();
        let mut s = state(GameMode::Battle);
        s.ship_classes[2] = ShipClass::Scout;
        s.start_match(&tuning);
        assert_eq!(s.ships[6].class, ShipClass::Scout);
        assert_eq!(s.ships[6].team, Some(1));
    }

    #[test]
    fn test_islands_clear_of_spawns() {
        let tuning = Tuning {
            island_count: 3,
            ..Default::default()
        };
        let mut s = state(GameMode::FreeForAll);
        s.start_match(&tuning);
        for island in &s.islands {
            for ship in &s.ships {
                assert!(!island.contains_point(ship.pos));
            }
        }
    }

    #[test]
    fn test_last_ship_standing_wins() {
        let tuning = Tuning::default();
        let mut s = state(GameMode::Triple);
        s.start_match(&tuning);
        assert_eq!(s.check_win(), None);
        s.ships[0].take_damage(f32::MAX);
        s.ships[2].take_damage(f32::MAX);
        assert_eq!(s.check_win(), Some(MatchOutcome::Winner(1)));
    }

    #[test]
    fn test_team_elimination() {
        let tuning = Tuning::default();
        let mut s = state(GameMode::Teams);
        s.start_match(&tuning);
        s.ships[2].take_damage(f32::MAX);
        assert_eq!(s.check_win(), None);
        s.ships[3].take_damage(f32::MAX);
        assert_eq!(s.check_win(), Some(MatchOutcome::Winner(0)));
    }

    #[test]
    fn test_end_match_counts_wins() {
        let tuning = Tuning::default();
        let mut s = state(GameMode::Teams);
        s.start_match(&tuning);
        s.end_match(MatchOutcome::Winner(1));
        assert_eq!(s.team_wins, [0, 1]);
        assert_eq!(s.phase, MatchPhase::GameOver);

        let mut s = state(GameMode::Duel);
        s.start_match(&tuning);
        s.end_match(MatchOutcome::Draw);
        assert_eq!(s.player_wins, vec![0, 0]);
        assert_eq!(s.outcome.and_then(|o| o.winner_index()), None);
    }

    #[test]
    fn test_engine_level_averages_living_ships() {
        let tuning = Tuning::default();
        let mut s = state(GameMode::Duel);
        assert_eq!(s.engine_level(), 0.0);
        s.start_match(&tuning);
        s.ships[0].throttle = 1.0;
        s.ships[1].throttle = -0.5;
        assert!((s.engine_level() - 0.75).abs() < 1e-6);
        s.ships[1].take_damage(f32::MAX);
        assert!((s.engine_level() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_explosion_grows_and_expires() {
        let tuning = Tuning::default();
        let mut e = Explosion::new(Vec2::ZERO, ExplosionKind::Sink, &tuning);
        assert_eq!(e.radius(), 0.0);
        e.elapsed = e.duration * 0.5;
        assert!((e.radius() - tuning.sink_explosion_max_radius * 0.5).abs() < 1e-4);
        e.elapsed = e.duration;
        assert!(e.is_expired());
    }

    #[test]
    fn test_events_drain_in_order() {
        let tuning = Tuning::default();
        let mut s = state(GameMode::Duel);
        s.start_match(&tuning);
        let events = s.drain_events();
        assert_eq!(events.first(), Some(&GameEvent::ModeChanged { mode: GameMode::Duel }));
        assert_eq!(events.last(), Some(&GameEvent::MatchStarted { mode: GameMode::Duel }));
        assert!(s.drain_events().is_empty());
    }
}
