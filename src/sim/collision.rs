//! Collision detection and response
//!
//! Two phases: a cheap broad test (radius rejection for shells, oriented-box
//! SAT for hulls), then exact confirmation through a [`ShapeOracle`]. The
//! oracle is injected so a renderer can answer with real sprite masks while
//! tests and the headless runner use an analytic silhouette.
//!
//! Resolvers mutate ships and shells in place and report what happened; the
//! frame tick turns those reports into explosions and events.

use glam::Vec2;

use super::island::Island;
use super::shell::Shell;
use super::ship::Ship;
use crate::tuning::Tuning;
use crate::{local_to_world, world_to_local};

/// Exact-shape confirmation for hulls
pub trait ShapeOracle {
    /// Does a landed shell at `point` strike the hull?
    fn check_ship_hit(&self, ship: &Ship, point: Vec2) -> bool;
    /// Do two hulls actually touch? Returns a contact point.
    fn check_ship_collision(&self, a: &Ship, b: &Ship) -> Option<Vec2>;
}

/// Hull outline stations sampled per side when testing hull contact
const HULL_SAMPLES: usize = 16;

/// Tapered hull: pointed bow over the forward 30%, slightly narrowed stern
#[derive(Debug, Clone, Copy, Default)]
pub struct HullOracle;

impl HullOracle {
    /// Half-beam at `x` along the hull (hull-local, +x toward bow)
    pub fn half_beam(ship: &Ship, x: f32) -> f32 {
        let half_len = ship.length * 0.5;
        let half_width = ship.width * 0.5;
        if half_len <= 0.0 || x.abs() > half_len {
            return 0.0;
        }
        let u = x / half_len;
        if u > 0.4 {
            half_width * (1.0 - (u - 0.4) / 0.6)
        } else if u < -0.7 {
            half_width * (0.7 + 0.3 * (u + 1.0) / 0.3)
        } else {
            half_width
        }
    }

    fn outline(ship: &Ship) -> impl Iterator<Item = Vec2> + '_ {
        let half_len = ship.length * 0.5;
        (0..=HULL_SAMPLES).flat_map(move |i| {
            let x = -half_len + ship.length * i as f32 / HULL_SAMPLES as f32;
            let y = Self::half_beam(ship, x);
            [Vec2::new(x, y), Vec2::new(x, -y)]
                .map(|local| local_to_world(ship.pos, ship.heading, local))
        })
    }
}

impl ShapeOracle for HullOracle {
    fn check_ship_hit(&self, ship: &Ship, point: Vec2) -> bool {
        let local = world_to_local(ship.pos, ship.heading, point);
        local.x.abs() <= ship.length * 0.5 && local.y.abs() <= Self::half_beam(ship, local.x)
    }

    fn check_ship_collision(&self, a: &Ship, b: &Ship) -> Option<Vec2> {
        if a.pos.distance(b.pos) > (a.length + b.length) * 0.5 {
            return None;
        }
        Self::outline(a)
            .find(|&p| self.check_ship_hit(b, p))
            .or_else(|| Self::outline(b).find(|&p| self.check_ship_hit(a, p)))
    }
}

/// Treats every hull as its full bounding box
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxOracle;

impl ShapeOracle for BoxOracle {
    fn check_ship_hit(&self, ship: &Ship, point: Vec2) -> bool {
        let local = world_to_local(ship.pos, ship.heading, point);
        local.x.abs() <= ship.length * 0.5 && local.y.abs() <= ship.width * 0.5
    }

    fn check_ship_collision(&self, a: &Ship, b: &Ship) -> Option<Vec2> {
        Some((a.pos + b.pos) * 0.5)
    }
}

/// Minimum-overlap axis of two intersecting boxes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SatContact {
    pub axis: Vec2,
    pub overlap: f32,
}

fn project(corners: &[Vec2; 4], axis: Vec2) -> (f32, f32) {
    corners.iter().fold((f32::MAX, f32::MIN), |(lo, hi), c| {
        let d = c.dot(axis);
        (lo.min(d), hi.max(d))
    })
}

/// Separating-axis test over the edge normals of two oriented boxes.
/// Corners are in order (each consecutive pair is an edge).
pub fn sat_overlap(a: &[Vec2; 4], b: &[Vec2; 4]) -> Option<SatContact> {
    let axes = [
        (a[1] - a[0]).perp(),
        (a[3] - a[0]).perp(),
        (b[1] - b[0]).perp(),
        (b[3] - b[0]).perp(),
    ];

    let mut best: Option<SatContact> = None;
    for axis in axes {
        let Some(axis) = axis.try_normalize() else {
            continue;
        };
        let (min_a, max_a) = project(a, axis);
        let (min_b, max_b) = project(b, axis);
        if max_a < min_b || max_b < min_a {
            return None;
        }
        let overlap = (max_a - min_b).min(max_b - min_a);
        if best.is_none_or(|c| overlap < c.overlap) {
            best = Some(SatContact { axis, overlap });
        }
    }
    best
}

/// What a landed shell did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShellImpact {
    Hit { pos: Vec2, ship: usize, owner: usize, sank: bool },
    Splash { pos: Vec2 },
    /// Came down on an island
    Land { pos: Vec2 },
}

/// Resolve every landed shell: damage the first hull it strikes, otherwise
/// splash or hit land. Landed shells are killed either way.
pub fn resolve_shell_hits(
    shells: &mut [Shell],
    ships: &mut [Ship],
    islands: &[Island],
    oracle: &dyn ShapeOracle,
) -> Vec<ShellImpact> {
    let mut impacts = Vec::new();

    for shell in shells.iter_mut().filter(|s| s.has_landed()) {
        let hit = ships.iter().position(|ship| {
            ship.is_alive()
                && ship.slot != shell.owner
                && shell.pos.distance(ship.pos) < ship.length * 0.5 + shell.splash_radius
                && oracle.check_ship_hit(ship, shell.pos)
        });

        let impact = match hit {
            Some(index) => {
                let ship = &mut ships[index];
                let sank = ship.take_damage(shell.damage);
                ShellImpact::Hit {
                    pos: shell.pos,
                    ship: ship.slot,
                    owner: shell.owner,
                    sank,
                }
            }
            None if islands.iter().any(|i| i.contains_point(shell.pos)) => {
                ShellImpact::Land { pos: shell.pos }
            }
            None => ShellImpact::Splash { pos: shell.pos },
        };

        impacts.push(impact);
        shell.kill();
    }

    impacts
}

/// A confirmed hull-on-hull contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShipContact {
    pub a: usize,
    pub b: usize,
    pub point: Vec2,
    /// Closing speed along the contact normal
    pub impact_speed: f32,
    pub sank_a: bool,
    pub sank_b: bool,
}

/// Mutable references to two distinct elements
fn pair_mut<T>(items: &mut [T], i: usize, j: usize) -> (&mut T, &mut T) {
    debug_assert!(i < j);
    let (head, tail) = items.split_at_mut(j);
    (&mut head[i], &mut tail[0])
}

/// SAT then oracle confirmation for every pair of visible hulls
pub fn resolve_ship_collisions(
    ships: &mut [Ship],
    oracle: &dyn ShapeOracle,
    tuning: &Tuning,
) -> Vec<ShipContact> {
    let mut contacts = Vec::new();

    for i in 0..ships.len() {
        for j in (i + 1)..ships.len() {
            let (a, b) = (&ships[i], &ships[j]);
            if a.is_fully_sunk(tuning) || b.is_fully_sunk(tuning) {
                continue;
            }
            let Some(sat) = sat_overlap(&a.corners(), &b.corners()) else {
                continue;
            };
            let Some(point) = oracle.check_ship_collision(a, b) else {
                continue;
            };

            // Normal points from A to B
            let normal = if (b.pos - a.pos).dot(sat.axis) < 0.0 { -sat.axis } else { sat.axis };
            let (vel_a, vel_b) = (a.vel, b.vel);
            let impact_speed = (vel_a - vel_b).dot(normal).max(0.0);
            let damage = impact_speed * tuning.collision_damage_scale;
            let push = sat.overlap * 0.5 + tuning.collision_push_buffer;

            let (a, b) = pair_mut(ships, i, j);
            let sank_a = a.take_damage(damage);
            let sank_b = b.take_damage(damage);
            a.apply_collision(-normal, push, vel_a, vel_b, tuning);
            b.apply_collision(normal, push, vel_b, vel_a, tuning);

            log::debug!("Ships {i} and {j} collided at {impact_speed:.2}");
            contacts.push(ShipContact {
                a: i,
                b: j,
                point,
                impact_speed,
                sank_a,
                sank_b,
            });
        }
    }

    contacts
}

/// Push any hull out of islands it has run into
pub fn resolve_island_contacts(ships: &mut [Ship], islands: &[Island], tuning: &Tuning) {
    for ship in ships.iter_mut().filter(|s| !s.is_fully_sunk(tuning)) {
        for island in islands {
            let reach = island.bounding_radius() + ship.length.max(ship.width) * 0.5;
            if ship.pos.distance(island.center()) > reach {
                continue;
            }

            let corners = ship.corners();
            let deepest = corners
                .iter()
                .chain(std::iter::once(&ship.pos))
                .filter_map(|&p| island.collision_response(p))
                .max_by(|a, b| a.depth.total_cmp(&b.depth));

            if let Some(contact) = deepest {
                ship.pos += contact.normal * (contact.depth + tuning.collision_push_buffer);
                let inward = ship.vel.dot(contact.normal);
                if inward < 0.0 {
                    ship.vel -= contact.normal * inward;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::ShipClass;

    fn square(center: Vec2) -> [Vec2; 4] {
        [
            center + Vec2::new(-0.5, -0.5),
            center + Vec2::new(0.5, -0.5),
            center + Vec2::new(0.5, 0.5),
            center + Vec2::new(-0.5, 0.5),
        ]
    }

    fn ship(slot: usize, pos: Vec2, heading: f32) -> Ship {
        Ship::new(slot, None, ShipClass::Cruiser, pos, heading, &Tuning::default())
    }

    struct NeverHit;

    impl ShapeOracle for NeverHit {
        fn check_ship_hit(&self, _: &Ship, _: Vec2) -> bool {
            false
        }
        fn check_ship_collision(&self, _: &Ship, _: &Ship) -> Option<Vec2> {
            None
        }
    }

    fn landed_shell(pos: Vec2, owner: usize) -> Shell {
        let mut shell = Shell::new(pos, Vec2::ZERO, owner, 0.0, 100.0, 4.0);
        shell.update(0.01, Vec2::ZERO);
        shell
    }

    #[test]
    fn test_sat_separated_squares() {
        assert!(sat_overlap(&square(Vec2::ZERO), &square(Vec2::new(3.0, 0.0))).is_none());
    }

    #[test]
    fn test_sat_overlapping_squares() {
        let contact = sat_overlap(&square(Vec2::ZERO), &square(Vec2::new(0.5, 0.0))).unwrap();
        assert!(contact.overlap >= 0.0);
        assert!((contact.overlap - 0.5).abs() < 1e-5);
        assert!((contact.axis.x.abs() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_hull_oracle_pointed_bow() {
        let s = ship(0, Vec2::new(100.0, 100.0), 0.0);
        let oracle = HullOracle;
        assert!(oracle.check_ship_hit(&s, Vec2::new(100.0, 105.0)));
        // Beside the bow tip: inside the box, outside the hull
        assert!(!oracle.check_ship_hit(&s, Vec2::new(123.0, 106.0)));
        assert!(BoxOracle.check_ship_hit(&s, Vec2::new(123.0, 106.0)));
    }

    #[test]
    fn test_shell_hits_enemy_not_owner() {
        let mut ships = vec![ship(0, Vec2::new(100.0, 100.0), 0.0), ship(1, Vec2::new(300.0, 100.0), 0.0)];
        let mut shells = vec![landed_shell(Vec2::new(100.0, 100.0), 0), landed_shell(Vec2::new(300.0, 100.0), 0)];
        let impacts = resolve_shell_hits(&mut shells, &mut ships, &[], &HullOracle);

        assert!(matches!(impacts[0], ShellImpact::Splash { .. }));
        assert!(matches!(impacts[1], ShellImpact::Hit { ship: 1, owner: 0, sank: false, .. }));
        assert_eq!(ships[0].health, ships[0].max_health);
        assert_eq!(ships[1].health, ships[1].max_health - 100.0);
        assert!(shells.iter().all(|s| !s.is_alive()));
    }

    #[test]
    fn test_flying_shell_is_ignored() {
        let mut ships = vec![ship(1, Vec2::new(300.0, 100.0), 0.0)];
        let mut shells = vec![Shell::new(Vec2::new(300.0, 100.0), Vec2::X * 10.0, 0, 100.0, 100.0, 4.0)];
        assert!(resolve_shell_hits(&mut shells, &mut ships, &[], &HullOracle).is_empty());
        assert!(shells[0].is_alive());
    }

    #[test]
    fn test_killing_shell_reports_sink() {
        let mut ships = vec![ship(1, Vec2::new(300.0, 100.0), 0.0)];
        ships[0].health = 50.0;
        let mut shells = vec![landed_shell(Vec2::new(300.0, 100.0), 0)];
        let impacts = resolve_shell_hits(&mut shells, &mut ships, &[], &HullOracle);
        assert!(matches!(impacts[0], ShellImpact::Hit { sank: true, .. }));
        assert!(ships[0].is_sinking());
    }

    #[test]
    fn test_shell_on_island_lands() {
        let island = Island::new(Vec2::new(500.0, 500.0), 50.0, 1);
        let mut shells = vec![landed_shell(Vec2::new(500.0, 500.0), 0)];
        let impacts = resolve_shell_hits(&mut shells, &mut [], &[island], &HullOracle);
        assert!(matches!(impacts[0], ShellImpact::Land { .. }));
    }

    #[test]
    fn test_ship_collision_pushes_apart_and_damages() {
        let tuning = Tuning::default();
        let mut ships = vec![ship(0, Vec2::new(100.0, 100.0), 0.0), ship(1, Vec2::new(140.0, 100.0), 0.0)];
        ships[0].vel = Vec2::new(3.0, 0.0);
        ships[1].vel = Vec2::new(-3.0, 0.0);

        let contacts = resolve_ship_collisions(&mut ships, &HullOracle, &tuning);
        assert_eq!(contacts.len(), 1);
        assert!((contacts[0].impact_speed - 6.0).abs() < 1e-4);
        assert!(ships[0].pos.x < 100.0);
        assert!(ships[1].pos.x > 140.0);
        assert!(ships[0].health < ships[0].max_health);
        assert!(ships[0].vel.x < 3.0 && ships[1].vel.x > -3.0);
    }

    #[test]
    fn test_oracle_veto_skips_response() {
        let tuning = Tuning::default();
        let mut ships = vec![ship(0, Vec2::new(100.0, 100.0), 0.0), ship(1, Vec2::new(140.0, 100.0), 0.0)];
        assert!(resolve_ship_collisions(&mut ships, &NeverHit, &tuning).is_empty());
        assert_eq!(ships[0].pos, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_ship_pushed_out_of_island() {
        let tuning = Tuning::default();
        let island = Island::new(Vec2::new(400.0, 400.0), 50.0, 3);
        let mut ships = vec![ship(0, Vec2::new(400.0, 400.0), 0.0)];
        ships[0].vel = Vec2::new(-2.0, 0.0);
        for _ in 0..20 {
            resolve_island_contacts(&mut ships, std::slice::from_ref(&island), &tuning);
        }
        assert!(!island.contains_point(ships[0].pos));
    }
}
