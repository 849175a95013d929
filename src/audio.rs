//! Audio direction
//!
//! Turns match events into panned sound cues. Playback itself belongs to the
//! host through [`AudioSink`]; the director only decides what plays, where and
//! how loud.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::sim::GameEvent;
use crate::tuning::Tuning;

/// Engine volume change per second while easing toward the target
const ENGINE_VOLUME_RATE: f32 = 2.0;
/// The engine loop sits under the effects
const ENGINE_MIX: f32 = 0.3;
/// Master volume steps (0 = mute)
pub const MAX_VOLUME_LEVEL: u8 = 10;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Turret salvo
    Cannon,
    /// Shell landing in open water
    Splash,
    /// Shell hit, shell on land, or a ship going down
    Explosion,
    /// Hull scraping hull
    Collision,
}

/// One sound to play
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoundCue {
    pub effect: SoundEffect,
    /// 0 = hard left, 1 = hard right
    pub pan: f32,
    pub gain: f32,
    pub pitch: f32,
}

/// Whatever actually makes noise
pub trait AudioSink {
    fn play(&mut self, cue: SoundCue);
    /// Continuous engine loop volume (0..1)
    fn set_engine_volume(&mut self, volume: f32);
}

/// Sink for headless runs
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, _cue: SoundCue) {}
    fn set_engine_volume(&mut self, _volume: f32) {}
}

/// Pan for a horizontal world position, kept away from the extremes (0.2..0.8)
pub fn pan_from_x(x: f32, width: f32) -> f32 {
    if width <= 0.0 || !x.is_finite() {
        return 0.5;
    }
    (0.2 + (x / width) * 0.6).clamp(0.0, 1.0)
}

/// Maps game events and engine load to sound cues
#[derive(Debug, Clone)]
pub struct AudioDirector {
    gun_silence: f32,
    engine_volume: f32,
    volume_level: u8,
    rng: Pcg32,
}

impl Default for AudioDirector {
    fn default() -> Self {
        Self::new(0)
    }
}

impl AudioDirector {
    pub fn new(seed: u64) -> Self {
        Self {
            gun_silence: 0.0,
            engine_volume: 0.0,
            volume_level: MAX_VOLUME_LEVEL / 2,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn set_volume_level(&mut self, level: u8) {
        self.volume_level = level.min(MAX_VOLUME_LEVEL);
        log::debug!("Master volume {}/{}", self.volume_level, MAX_VOLUME_LEVEL);
    }

    #[inline]
    pub fn volume_level(&self) -> u8 {
        self.volume_level
    }

    #[inline]
    pub fn master_volume(&self) -> f32 {
        f32::from(self.volume_level) / f32::from(MAX_VOLUME_LEVEL)
    }

    /// Smoothed engine volume before the master mix
    #[inline]
    pub fn engine_volume(&self) -> f32 {
        self.engine_volume
    }

    /// Engine target for a given average throttle
    pub fn engine_target(engine_level: f32, tuning: &Tuning) -> f32 {
        (tuning.audio_engine_base_volume + tuning.audio_engine_throttle_boost * engine_level.clamp(0.0, 1.0))
            .clamp(0.0, 1.0)
    }

    /// Advance timers and route this frame's events to the sink
    pub fn update(
        &mut self,
        dt: f32,
        events: &[GameEvent],
        engine_level: f32,
        arena_width: f32,
        tuning: &Tuning,
        sink: &mut dyn AudioSink,
    ) {
        self.gun_silence = (self.gun_silence - dt).max(0.0);

        let target = Self::engine_target(engine_level, tuning);
        let step = ENGINE_VOLUME_RATE * dt;
        self.engine_volume += (target - self.engine_volume).clamp(-step, step);
        sink.set_engine_volume(self.engine_volume * ENGINE_MIX * self.master_volume());

        for event in events {
            let (effect, x) = match *event {
                GameEvent::CannonFired { pos, .. } => {
                    // One gun sound at a time
                    if self.gun_silence > 0.0 {
                        continue;
                    }
                    self.gun_silence = tuning.audio_gun_silence_duration;
                    (SoundEffect::Cannon, pos.x)
                }
                GameEvent::ShellSplash { pos } => (SoundEffect::Splash, pos.x),
                GameEvent::ShellLanded { pos }
                | GameEvent::ShipHit { pos, .. }
                | GameEvent::ShipSunk { pos, .. } => (SoundEffect::Explosion, pos.x),
                GameEvent::ShipCollision { pos, impact_speed, .. } => {
                    if impact_speed < tuning.audio_min_impact_for_sound {
                        continue;
                    }
                    (SoundEffect::Collision, pos.x)
                }
                _ => continue,
            };
            let cue = self.cue(effect, x, arena_width);
            sink.play(cue);
        }
    }

    fn cue(&mut self, effect: SoundEffect, x: f32, arena_width: f32) -> SoundCue {
        SoundCue {
            effect,
            pan: pan_from_x(x, arena_width),
            gain: self.rng.random_range(0.85..=1.0) * self.master_volume(),
            pitch: self.rng.random_range(0.9..=1.1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[derive(Default)]
    struct Recorder {
        cues: Vec<SoundCue>,
        engine: f32,
    }

    impl AudioSink for Recorder {
        fn play(&mut self, cue: SoundCue) {
            self.cues.push(cue);
        }
        fn set_engine_volume(&mut self, volume: f32) {
            self.engine = volume;
        }
    }

    fn fired(x: f32) -> GameEvent {
        GameEvent::CannonFired {
            ship: 0,
            pos: Vec2::new(x, 100.0),
            shells: 2,
        }
    }

    #[test]
    fn test_pan_from_x() {
        assert!((pan_from_x(0.0, 1280.0) - 0.2).abs() < 1e-6);
        assert!((pan_from_x(640.0, 1280.0) - 0.5).abs() < 1e-6);
        assert!((pan_from_x(1280.0, 1280.0) - 0.8).abs() < 1e-6);
        assert_eq!(pan_from_x(100.0, 0.0), 0.5);
    }

    #[test]
    fn test_gun_sounds_are_silenced() {
        let tuning = Tuning::default();
        let mut director = AudioDirector::new(1);
        let mut sink = Recorder::default();

        director.update(0.01, &[fired(10.0), fired(1200.0)], 0.0, 1280.0, &tuning, &mut sink);
        assert_eq!(sink.cues.len(), 1);
        assert!(sink.cues[0].pan < 0.5);

        director.update(0.01, &[fired(10.0)], 0.0, 1280.0, &tuning, &mut sink);
        assert_eq!(sink.cues.len(), 1);

        director.update(tuning.audio_gun_silence_duration, &[fired(10.0)], 0.0, 1280.0, &tuning, &mut sink);
        assert_eq!(sink.cues.len(), 2);
    }

    #[test]
    fn test_soft_collisions_are_quiet() {
        let tuning = Tuning::default();
        let mut director = AudioDirector::new(1);
        let mut sink = Recorder::default();
        let bump = |impact_speed| GameEvent::ShipCollision {
            a: 0,
            b: 1,
            pos: Vec2::ZERO,
            impact_speed,
        };

        director.update(0.01, &[bump(tuning.audio_min_impact_for_sound * 0.5)], 0.0, 1280.0, &tuning, &mut sink);
        assert!(sink.cues.is_empty());
        director.update(0.01, &[bump(tuning.audio_min_impact_for_sound * 2.0)], 0.0, 1280.0, &tuning, &mut sink);
        assert_eq!(sink.cues[0].effect, SoundEffect::Collision);
    }

    #[test]
    fn test_engine_volume_eases_to_target() {
        let tuning = Tuning::default();
        let mut director = AudioDirector::new(1);
        let mut sink = NullAudio;
        let target = AudioDirector::engine_target(1.0, &tuning);

        director.update(0.1, &[], 1.0, 1280.0, &tuning, &mut sink);
        assert!(director.engine_volume() < target);
        for _ in 0..20 {
            director.update(0.1, &[], 1.0, 1280.0, &tuning, &mut sink);
        }
        assert!((director.engine_volume() - target).abs() < 1e-5);
    }

    #[test]
    fn test_muted_cues_have_no_gain() {
        let tuning = Tuning::default();
        let mut director = AudioDirector::new(1);
        director.set_volume_level(0);
        let mut sink = Recorder::default();
        director.update(0.01, &[GameEvent::ShellSplash { pos: Vec2::ZERO }], 1.0, 1280.0, &tuning, &mut sink);
        assert_eq!(sink.cues[0].gain, 0.0);
        assert_eq!(sink.engine, 0.0);
        director.set_volume_level(40);
        assert_eq!(director.volume_level(), MAX_VOLUME_LEVEL);
    }
}
