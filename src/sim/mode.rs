//! Game modes and the pure mappings between ships, teams and players

use std::f32::consts::{FRAC_PI_2, FRAC_PI_6, PI};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_PLAYERS;
use crate::to_angle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    #[default]
    FreeForAll,
    /// 2v2
    Teams,
    /// 1v1
    Duel,
    Triple,
    /// 6v6
    Battle,
}

impl GameMode {
    pub const ALL: [GameMode; 5] = [
        GameMode::FreeForAll,
        GameMode::Teams,
        GameMode::Duel,
        GameMode::Triple,
        GameMode::Battle,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GameMode::FreeForAll => "Free For All",
            GameMode::Teams => "Teams",
            GameMode::Duel => "Duel",
            GameMode::Triple => "Triple",
            GameMode::Battle => "Battle",
        }
    }

    pub fn ship_count(self) -> usize {
        match self {
            GameMode::FreeForAll | GameMode::Teams => 4,
            GameMode::Duel => 2,
            GameMode::Triple => 3,
            GameMode::Battle => 12,
        }
    }

    #[inline]
    pub fn is_team_mode(self) -> bool {
        matches!(self, GameMode::Teams | GameMode::Battle)
    }

    /// Step through the mode list, wrapping at both ends
    pub fn cycle(self, direction: i32) -> Self {
        let len = Self::ALL.len() as i32;
        let index = Self::ALL.iter().position(|&m| m == self).unwrap_or(0) as i32;
        Self::ALL[(index + direction).rem_euclid(len) as usize]
    }

    /// Team of a ship slot; None in free-for-all modes or for a slot the mode doesn't have
    pub fn team_of(self, ship: usize) -> Option<u8> {
        if ship >= self.ship_count() {
            return None;
        }
        match self {
            GameMode::Teams => Some((ship / 2) as u8),
            GameMode::Battle => Some((ship / 6) as u8),
            _ => None,
        }
    }

    /// Human player who may drive this ship
    pub fn player_for_ship(self, ship: usize) -> Option<usize> {
        if ship >= self.ship_count() {
            return None;
        }
        match self {
            GameMode::Battle => match ship {
                0 | 1 => Some(ship),
                6 | 7 => Some(ship - 4),
                _ => None,
            },
            _ => (ship < MAX_PLAYERS).then_some(ship),
        }
    }

    /// Ship a human player drives, if the mode gives them one
    pub fn ship_for_player(self, player: usize) -> Option<usize> {
        if player >= MAX_PLAYERS {
            return None;
        }
        let ship = match self {
            GameMode::Battle if player >= 2 => player + 4,
            _ => player,
        };
        (ship < self.ship_count()).then_some(ship)
    }

    /// Spawn position and heading for a ship slot
    pub fn start_pose(self, ship: usize, arena: Vec2) -> Option<(Vec2, f32)> {
        if ship >= self.ship_count() {
            return None;
        }
        let center = arena * 0.5;
        let inset = Vec2::new(arena.x * 0.15, arena.y * 0.2);
        let facing_center = |pos: Vec2| (pos, to_angle(center - pos));

        let pose = match self {
            GameMode::FreeForAll => {
                let corner = match ship {
                    0 => Vec2::new(inset.x, inset.y),
                    1 => Vec2::new(arena.x - inset.x, inset.y),
                    2 => Vec2::new(inset.x, arena.y - inset.y),
                    _ => Vec2::new(arena.x - inset.x, arena.y - inset.y),
                };
                facing_center(corner)
            }
            // Team 0 down the left, team 1 down the right
            GameMode::Teams => {
                let x = if ship < 2 { inset.x } else { arena.x - inset.x };
                let y = if ship % 2 == 0 { inset.y } else { arena.y - inset.y };
                facing_center(Vec2::new(x, y))
            }
            GameMode::Duel => {
                if ship == 0 {
                    (Vec2::new(inset.x, center.y), 0.0)
                } else {
                    (Vec2::new(arena.x - inset.x, center.y), PI)
                }
            }
            GameMode::Triple => {
                let radius = arena.min_element() * 0.35;
                let angle = [-FRAC_PI_2, FRAC_PI_6, PI - FRAC_PI_6][ship];
                facing_center(center + Vec2::from_angle(angle) * radius)
            }
            // Two columns of three per side
            GameMode::Battle => {
                let k = ship % 6;
                let column = (k / 3) as f32;
                let row = (k % 3) as f32;
                let x = arena.x * 0.08 + column * arena.x * 0.07;
                let y = arena.y * (row + 1.0) / 4.0;
                if ship < 6 {
                    (Vec2::new(x, y), 0.0)
                } else {
                    (Vec2::new(arena.x - x, y), PI)
                }
            }
        };
        Some(pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARENA: Vec2 = Vec2::new(1280.0, 720.0);

    #[test]
    fn test_ship_counts() {
        let counts: Vec<usize> = GameMode::ALL.iter().map(|m| m.ship_count()).collect();
        assert_eq!(counts, vec![4, 4, 2, 3, 12]);
    }

    #[test]
    fn test_cycle_wraps() {
        assert_eq!(GameMode::FreeForAll.cycle(-1), GameMode::Battle);
        assert_eq!(GameMode::Battle.cycle(1), GameMode::FreeForAll);
        assert_eq!(GameMode::Teams.cycle(2), GameMode::Triple);
    }

    #[test]
    fn test_teams() {
        assert_eq!(GameMode::FreeForAll.team_of(2), None);
        assert_eq!(GameMode::Teams.team_of(1), Some(0));
        assert_eq!(GameMode::Teams.team_of(2), Some(1));
        assert_eq!(GameMode::Battle.team_of(5), Some(0));
        assert_eq!(GameMode::Battle.team_of(6), Some(1));
        assert_eq!(GameMode::Battle.team_of(12), None);
    }

    #[test]
    fn test_battle_human_slots() {
        let humans: Vec<usize> = (0..12)
            .filter(|&s| GameMode::Battle.player_for_ship(s).is_some())
            .collect();
        assert_eq!(humans, vec![0, 1, 6, 7]);
        assert_eq!(GameMode::Battle.ship_for_player(2), Some(6));
        assert_eq!(GameMode::Battle.ship_for_player(3), Some(7));
    }

    #[test]
    fn test_player_ship_mappings_are_inverse() {
        for mode in GameMode::ALL {
            for player in 0..MAX_PLAYERS {
                if let Some(ship) = mode.ship_for_player(player) {
                    assert_eq!(mode.player_for_ship(ship), Some(player));
                }
            }
        }
        assert_eq!(GameMode::Duel.ship_for_player(2), None);
        assert_eq!(GameMode::Triple.player_for_ship(3), None);
    }

    #[test]
    fn test_start_poses_inside_arena_and_distinct() {
        for mode in GameMode::ALL {
            let poses: Vec<Vec2> = (0..mode.ship_count())
                .map(|s| mode.start_pose(s, ARENA).unwrap().0)
                .collect();
            for (i, a) in poses.iter().enumerate() {
                assert!(a.x > 50.0 && a.x < ARENA.x - 50.0 && a.y > 50.0 && a.y < ARENA.y - 50.0);
                for b in &poses[i + 1..] {
                    assert!(a.distance(*b) > 60.0, "{mode:?} spawns overlap");
                }
            }
            assert!(mode.start_pose(mode.ship_count(), ARENA).is_none());
        }
    }

    #[test]
    fn test_duel_ships_face_each_other() {
        let (a, ha) = GameMode::Duel.start_pose(0, ARENA).unwrap();
        let (b, hb) = GameMode::Duel.start_pose(1, ARENA).unwrap();
        assert!(Vec2::from_angle(ha).dot(b - a) > 0.0);
        assert!(Vec2::from_angle(hb).dot(a - b) > 0.0);
    }
}
