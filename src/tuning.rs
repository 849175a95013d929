//! Data-driven game balance
//!
//! Every constant the simulation reads lives in [`Tuning`]. The struct is a
//! flat key → value mapping (serde field names are the keys), so a reload can
//! be a partial JSON object naming only the values that changed.
//!
//! A running match holds a [`TuningHandle`] and takes one `Arc<Tuning>`
//! snapshot per frame; reloads swap the `Arc` and never disturb a frame that is
//! already in flight.

use std::sync::Arc;

use glam::Vec2;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors produced while ingesting tuning data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("tuning JSON could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("tuning overrides must be a JSON object")]
    NotAnObject,
    #[error("unknown tuning key `{0}`")]
    UnknownKey(String),
    #[error("invalid value for `{key}`: {source}")]
    InvalidValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("`{key}` out of range: {reason}")]
    OutOfRange { key: &'static str, reason: &'static str },
    #[error("tuning file could not be read: {0}")]
    Io(#[from] std::io::Error),
}

/// All tunable constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Ship physics ===
    pub ship_length: f32,
    pub ship_width: f32,
    pub ship_max_speed: f32,
    /// Seconds of full throttle to reach max speed from rest
    pub ship_accel_time: f32,
    /// Fraction of velocity shed per second
    pub ship_drag: f32,
    /// Min turn radius = length * this
    pub ship_min_turn_radius_multiplier: f32,
    /// Speed used for turn authority when slower than this (lets a stopped hull pivot)
    pub ship_min_steerage_speed: f32,
    /// Per-frame angular velocity factor with the rudder centered
    pub ship_angular_damping: f32,
    /// Max speed/turn reduction at 0% health
    pub ship_damage_penalty_max: f32,
    pub ship_reverse_speed_multiplier: f32,
    pub ship_sink_duration: f32,
    pub ship_sink_velocity_decay: f32,
    pub ship_sink_angular_decay: f32,
    pub ship_max_health: f32,
    /// Stick values inside this magnitude count as zero
    pub input_deadzone: f32,

    // === Turrets ===
    /// Radians per second
    pub turret_rotation_speed: f32,
    /// Arc = π * this on either side of the mount's rest direction
    pub turret_arc_size: f32,
    pub turret_on_target_tolerance: f32,

    // === Shells / firing ===
    pub fire_interval: f32,
    /// Shell speed = ship max speed * this
    pub shell_speed_multiplier: f32,
    pub shell_ship_velocity_factor: f32,
    pub shell_spread: f32,
    pub shell_range_variation: f32,
    pub shell_damage: f32,
    pub shell_splash_radius: f32,
    pub min_shell_range: f32,
    pub max_shell_range: f32,

    // === Crosshair ===
    pub crosshair_speed: f32,
    pub crosshair_start_distance: f32,
    pub max_crosshair_distance: f32,
    pub crosshair_edge_margin: f32,

    // === Wake (cosmetic) ===
    pub bubble_min_speed: f32,
    pub bubble_spawn_interval: f32,
    pub bubble_fade_time: f32,
    pub bubble_min_radius: f32,
    pub bubble_radius_variation: f32,
    pub smoke_fade_time: f32,
    pub smoke_wind_strength: f32,
    pub smoke_base_spawn_interval: f32,
    pub smoke_damage_multiplier: f32,
    pub smoke_base_radius: f32,
    pub smoke_base_alpha: f32,
    pub smoke_wind_angle_variation: f32,

    // === Explosions ===
    pub explosion_duration: f32,
    pub explosion_max_radius: f32,
    pub sink_explosion_duration: f32,
    pub sink_explosion_max_radius: f32,

    // === Wind ===
    pub wind_change_interval: f32,
    pub wind_lerp_speed: f32,
    pub wind_max_drift: f32,
    pub wind_min_strength: f32,
    pub wind_angle_change_max: f32,
    pub wind_strength_change_max: f32,

    // === Collision ===
    pub collision_restitution: f32,
    pub collision_angular_factor: f32,
    /// Damage per unit of closing speed
    pub collision_damage_scale: f32,
    /// Extra separation added when pushing colliding hulls apart
    pub collision_push_buffer: f32,
    pub wall_bounce_multiplier: f32,

    // === AI ===
    pub ai_wander_interval: f32,
    pub ai_wander_interval_jitter: f32,
    pub ai_wander_margin: f32,
    pub ai_look_ahead_time: f32,
    pub ai_fire_distance: f32,
    pub ai_crosshair_tolerance: f32,
    pub ai_stop_radius: f32,
    /// Closing speed toward an edge above which the AI brakes
    pub ai_brake_closing_speed: f32,
    /// Health fraction under which the AI turns scared
    pub ai_scared_health: f32,
    /// Enemy health fraction (relative to own) under which the AI turns aggressive
    pub ai_aggressive_ratio: f32,
    /// Seconds ahead an incoming shell is worth dodging
    pub ai_dodge_window: f32,

    // === Islands ===
    pub island_count: u32,
    pub island_min_radius: f32,
    pub island_max_radius: f32,

    // === Audio ===
    pub audio_gun_silence_duration: f32,
    pub audio_engine_base_volume: f32,
    pub audio_engine_throttle_boost: f32,
    pub audio_min_impact_for_sound: f32,

    // === Game flow ===
    /// Fire input is ignored for this long after a match starts
    pub game_start_delay: f32,
    /// Seconds in GameOver before returning to the title
    pub game_over_return_delay: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            ship_length: 50.0,
            ship_width: 15.0,
            ship_max_speed: 7.0,
            ship_accel_time: 20.0,
            ship_drag: 0.03,
            ship_min_turn_radius_multiplier: 2.0,
            ship_min_steerage_speed: 1.5,
            ship_angular_damping: 0.9,
            ship_damage_penalty_max: 0.2,
            ship_reverse_speed_multiplier: 0.4,
            ship_sink_duration: 30.0,
            ship_sink_velocity_decay: 0.98,
            ship_sink_angular_decay: 0.95,
            ship_max_health: 1000.0,
            input_deadzone: 0.1,

            turret_rotation_speed: 0.5,
            turret_arc_size: 0.75,
            turret_on_target_tolerance: 0.09,

            fire_interval: 15.0,
            shell_speed_multiplier: 5.0,
            shell_ship_velocity_factor: 0.25,
            shell_spread: 0.03,
            shell_range_variation: 0.05,
            shell_damage: 100.0,
            shell_splash_radius: 4.0,
            min_shell_range: 50.0,
            max_shell_range: 300.0,

            crosshair_speed: 150.0,
            crosshair_start_distance: 150.0,
            max_crosshair_distance: 300.0,
            crosshair_edge_margin: 10.0,

            bubble_min_speed: 0.5,
            bubble_spawn_interval: 0.02,
            bubble_fade_time: 10.0,
            bubble_min_radius: 1.5,
            bubble_radius_variation: 2.0,
            smoke_fade_time: 12.0,
            smoke_wind_strength: 30.0,
            smoke_base_spawn_interval: 0.0433,
            smoke_damage_multiplier: 4.0,
            smoke_base_radius: 1.5,
            smoke_base_alpha: 0.4,
            smoke_wind_angle_variation: 0.2,

            explosion_duration: 0.5,
            explosion_max_radius: 30.0,
            sink_explosion_duration: 1.0,
            sink_explosion_max_radius: 80.0,

            wind_change_interval: 60.0,
            wind_lerp_speed: 0.05,
            wind_max_drift: 0.02,
            wind_min_strength: 0.25,
            wind_angle_change_max: 0.524,
            wind_strength_change_max: 0.4,

            collision_restitution: 0.5,
            collision_angular_factor: 0.01,
            collision_damage_scale: 35.7,
            collision_push_buffer: 2.0,
            wall_bounce_multiplier: 0.3,

            ai_wander_interval: 3.0,
            ai_wander_interval_jitter: 2.0,
            ai_wander_margin: 150.0,
            ai_look_ahead_time: 2.0,
            ai_fire_distance: 400.0,
            ai_crosshair_tolerance: 30.0,
            ai_stop_radius: 40.0,
            ai_brake_closing_speed: 3.0,
            ai_scared_health: 0.25,
            ai_aggressive_ratio: 0.5,
            ai_dodge_window: 2.0,

            island_count: 2,
            island_min_radius: 40.0,
            island_max_radius: 70.0,

            audio_gun_silence_duration: 0.25,
            audio_engine_base_volume: 0.3,
            audio_engine_throttle_boost: 0.7,
            audio_min_impact_for_sound: 1.0,

            game_start_delay: 0.5,
            game_over_return_delay: 8.0,
        }
    }
}

impl Tuning {
    /// Parse a tuning object, filling missing keys with defaults
    pub fn from_json_str(json: &str) -> Result<Self, TuningError> {
        let mut tuning = Self::default();
        tuning.apply_json_str(json)?;
        Ok(tuning)
    }

    /// Defaults with the overrides from a JSON file applied
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, TuningError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Apply a JSON object of overrides on top of the current values
    pub fn apply_json_str(&mut self, json: &str) -> Result<(), TuningError> {
        match serde_json::from_str::<Value>(json)? {
            Value::Object(overrides) => self.apply_overrides(&overrides),
            _ => Err(TuningError::NotAnObject),
        }
    }

    /// Apply a flat key → value map. Either every key applies or none does.
    pub fn apply_overrides(&mut self, overrides: &Map<String, Value>) -> Result<(), TuningError> {
        let mut flat = self.to_flat_map()?;
        for (key, value) in overrides {
            let Some(slot) = flat.get_mut(key) else {
                return Err(TuningError::UnknownKey(key.clone()));
            };
            *slot = value.clone();

            // Check each key as it lands so the error can name it
            serde_json::from_value::<Tuning>(Value::Object(flat.clone()))
                .map_err(|source| TuningError::InvalidValue { key: key.clone(), source })?;
        }

        let updated: Tuning = serde_json::from_value(Value::Object(flat))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Every key with its current value
    pub fn to_flat_map(&self) -> Result<Map<String, Value>, TuningError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(TuningError::NotAnObject),
        }
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("ship_length", self.ship_length),
            ("ship_width", self.ship_width),
            ("ship_max_speed", self.ship_max_speed),
            ("ship_accel_time", self.ship_accel_time),
            ("ship_sink_duration", self.ship_sink_duration),
            ("ship_max_health", self.ship_max_health),
            ("fire_interval", self.fire_interval),
            ("shell_speed_multiplier", self.shell_speed_multiplier),
            ("min_shell_range", self.min_shell_range),
            ("explosion_duration", self.explosion_duration),
            ("sink_explosion_duration", self.sink_explosion_duration),
            ("wind_change_interval", self.wind_change_interval),
        ];
        for (key, value) in positive {
            if value <= 0.0 {
                return Err(TuningError::OutOfRange { key, reason: "must be positive" });
            }
        }
        if !(0.0..=1.0).contains(&self.wind_min_strength) {
            return Err(TuningError::OutOfRange {
                key: "wind_min_strength",
                reason: "must be within [0, 1]",
            });
        }
        if !(0.0..=1.0).contains(&self.turret_arc_size) {
            return Err(TuningError::OutOfRange {
                key: "turret_arc_size",
                reason: "must be within [0, 1]",
            });
        }
        if self.max_shell_range < self.min_shell_range {
            return Err(TuningError::OutOfRange {
                key: "max_shell_range",
                reason: "must not be below min_shell_range",
            });
        }
        if self.island_max_radius < self.island_min_radius {
            return Err(TuningError::OutOfRange {
                key: "island_max_radius",
                reason: "must not be below island_min_radius",
            });
        }
        Ok(())
    }

    /// Base shell muzzle speed (before ship velocity is added)
    #[inline]
    pub fn shell_speed(&self) -> f32 {
        self.ship_max_speed * self.shell_speed_multiplier
    }
}

/// Shared, hot-swappable tuning
#[derive(Debug, Clone)]
pub struct TuningHandle {
    current: Arc<RwLock<Arc<Tuning>>>,
}

impl Default for TuningHandle {
    fn default() -> Self {
        Self::new(Tuning::default())
    }
}

impl TuningHandle {
    pub fn new(tuning: Tuning) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(tuning))),
        }
    }

    /// The tuning in effect right now. Holders keep their snapshot across reloads.
    pub fn snapshot(&self) -> Arc<Tuning> {
        Arc::clone(&self.current.read())
    }

    /// Swap in a complete tuning set
    pub fn replace(&self, tuning: Tuning) {
        *self.current.write() = Arc::new(tuning);
        log::info!("Tuning replaced");
    }

    /// Edit a copy of the current tuning and swap it in
    pub fn update(&self, edit: impl FnOnce(&mut Tuning)) {
        let mut next = (*self.snapshot()).clone();
        edit(&mut next);
        self.replace(next);
    }

    /// Apply a partial JSON object on top of the current tuning.
    /// On error the current tuning stays in effect.
    pub fn reload_from_str(&self, json: &str) -> Result<(), TuningError> {
        let mut next = (*self.snapshot()).clone();
        if let Err(err) = next.apply_json_str(json) {
            log::warn!("Tuning reload rejected: {err}");
            return Err(err);
        }
        self.replace(next);
        Ok(())
    }
}

/// Hull classes selectable on the title screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShipClass {
    Scout,
    Frigate,
    #[default]
    Cruiser,
    Battleship,
}

/// A turret mount: offset along the hull (fraction of length) and facing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MountSpec {
    pub along: f32,
    pub front: bool,
}

/// Per-class multipliers applied on top of [`Tuning`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassStats {
    pub health: f32,
    pub speed: f32,
    pub turn: f32,
    pub reload: f32,
    pub range: f32,
    pub damage: f32,
    pub turret_speed: f32,
    pub mounts: [MountSpec; 4],
}

const fn mount(along: f32, front: bool) -> MountSpec {
    MountSpec { along, front }
}

impl ShipClass {
    pub const ALL: [ShipClass; 4] = [
        ShipClass::Scout,
        ShipClass::Frigate,
        ShipClass::Cruiser,
        ShipClass::Battleship,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShipClass::Scout => "Scout",
            ShipClass::Frigate => "Frigate",
            ShipClass::Cruiser => "Cruiser",
            ShipClass::Battleship => "Battleship",
        }
    }

    /// Step through the class list, wrapping at both ends
    pub fn cycle(self, direction: i32) -> Self {
        let len = Self::ALL.len() as i32;
        let index = Self::ALL.iter().position(|&c| c == self).unwrap_or(0) as i32;
        Self::ALL[(index + direction).rem_euclid(len) as usize]
    }

    pub fn stats(self) -> ClassStats {
        match self {
            // Fast and fragile, short range
            ShipClass::Scout => ClassStats {
                health: 0.6,
                speed: 1.4,
                turn: 1.25,
                reload: 0.5,
                range: 0.65,
                damage: 0.6,
                turret_speed: 1.4,
                mounts: [
                    mount(0.24, true),
                    mount(0.08, true),
                    mount(-0.14, false),
                    mount(-0.30, false),
                ],
            },
            ShipClass::Frigate => ClassStats {
                health: 0.8,
                speed: 1.15,
                turn: 1.15,
                reload: 0.85,
                range: 0.85,
                damage: 0.8,
                turret_speed: 1.15,
                mounts: [
                    mount(0.19, true),
                    mount(0.06, true),
                    mount(-0.28, false),
                    mount(-0.41, false),
                ],
            },
            ShipClass::Cruiser => ClassStats {
                health: 1.0,
                speed: 1.0,
                turn: 1.0,
                reload: 1.0,
                range: 1.0,
                damage: 1.0,
                turret_speed: 1.0,
                mounts: [
                    mount(0.35, true),
                    mount(0.12, true),
                    mount(-0.12, false),
                    mount(-0.35, false),
                ],
            },
            // Slow, long range, hits hard
            ShipClass::Battleship => ClassStats {
                health: 1.25,
                speed: 0.8,
                turn: 0.8,
                reload: 1.15,
                range: 1.15,
                damage: 1.2,
                turret_speed: 0.8,
                mounts: [
                    mount(0.29, true),
                    mount(0.185, true),
                    mount(-0.28, false),
                    mount(-0.41, false),
                ],
            },
        }
    }

    /// Mount offsets in hull-local coordinates for a hull of `length`
    pub fn mount_offsets(self, length: f32) -> [(Vec2, bool); 4] {
        self.stats()
            .mounts
            .map(|m| (Vec2::new(m.along * length, 0.0), m.front))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let tuning = Tuning::from_json_str(r#"{ "fire_interval": 4.0 }"#).unwrap();
        assert_eq!(tuning.fire_interval, 4.0);
        assert_eq!(tuning.ship_max_health, Tuning::default().ship_max_health);
    }

    #[test]
    fn test_unknown_key_rejected_and_nothing_applied() {
        let mut tuning = Tuning::default();
        let err = tuning
            .apply_json_str(r#"{ "fire_interval": 4.0, "warp_drive": 9 }"#)
            .unwrap_err();
        assert!(matches!(err, TuningError::UnknownKey(ref k) if k == "warp_drive"));
        assert_eq!(tuning, Tuning::default());
    }

    #[test]
    fn test_wrong_type_names_key() {
        let mut tuning = Tuning::default();
        let err = tuning.apply_json_str(r#"{ "shell_damage": "lots" }"#).unwrap_err();
        assert!(matches!(err, TuningError::InvalidValue { ref key, .. } if key == "shell_damage"));
    }

    #[test]
    fn test_non_object_rejected() {
        let mut tuning = Tuning::default();
        assert!(matches!(tuning.apply_json_str("[1, 2]"), Err(TuningError::NotAnObject)));
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut tuning = Tuning::default();
        let err = tuning.apply_json_str(r#"{ "wind_min_strength": 1.5 }"#).unwrap_err();
        assert!(matches!(err, TuningError::OutOfRange { key: "wind_min_strength", .. }));
    }

    #[test]
    fn test_flat_map_covers_every_key() {
        let map = Tuning::default().to_flat_map().unwrap();
        assert!(map.contains_key("turret_arc_size"));
        assert!(map.contains_key("game_over_return_delay"));
        assert!(map.values().all(|v| v.is_number()));
    }

    #[test]
    fn test_handle_snapshot_survives_reload() {
        let handle = TuningHandle::default();
        let before = handle.snapshot();
        handle.reload_from_str(r#"{ "ship_max_speed": 9.0 }"#).unwrap();
        assert_eq!(before.ship_max_speed, 7.0);
        assert_eq!(handle.snapshot().ship_max_speed, 9.0);
    }

    #[test]
    fn test_handle_failed_reload_keeps_current() {
        let handle = TuningHandle::default();
        assert!(handle.reload_from_str("{ not json").is_err());
        assert_eq!(*handle.snapshot(), Tuning::default());
    }

    #[test]
    fn test_draw_only_keys_are_unknown() {
        let err = Tuning::default()
            .apply_json_str(r#"{ "shell_radius": 2.0 }"#)
            .unwrap_err();
        assert!(matches!(err, TuningError::UnknownKey(ref key) if key == "shell_radius"));
        assert!(!Tuning::default().to_flat_map().unwrap().contains_key("shell_radius"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Tuning::from_path("/nonexistent/heligoland/tuning.json").unwrap_err();
        assert!(matches!(err, TuningError::Io(_)));
    }

    #[test]
    fn test_class_cycle_wraps() {
        assert_eq!(ShipClass::Scout.cycle(-1), ShipClass::Battleship);
        assert_eq!(ShipClass::Battleship.cycle(1), ShipClass::Scout);
        assert_eq!(ShipClass::Cruiser.cycle(0), ShipClass::Cruiser);
    }

    #[test]
    fn test_every_class_has_front_and_rear_mounts() {
        for class in ShipClass::ALL {
            let mounts = class.stats().mounts;
            assert!(mounts.iter().any(|m| m.front));
            assert!(mounts.iter().any(|m| !m.front));
        }
    }
}
