// Data-driven performance configuration.
//
// Every tunable constant lives in `ToyConfig`, optionally loaded from JSON.
// The engine never hard-codes physics or timing numbers; it reads them from
// here. `ToyConfig::default()` reproduces the original toy exactly.
//
// Parameters are grouped by subsystem:
// - `TransportParams`: tempo and render frame interval.
// - `SequencerParams` + `VoiceParams`: note sets and the ranges each voice's
//   Euclidean pattern is drawn from at startup.
// - `OrbParams`: bounding sphere, friction, bounce and impulse response.
// - `ChainParams`: which creature shapes chase each orb, plus per-shape
//   parameter groups (`TubeParams`, `RibbonParams`, `BeadParams`).
// - `AmbientParams`: dust field and camera drift.
//
// See also: `sim.rs` which owns the config through `SimulationContext`,
// `sequencer.rs`, `orb.rs`, `chain.rs`, `ambient.rs` which read it.
//
// **Critical constraint: determinism.** Config values feed straight into
// random draws. Two runs with the same seed and config are identical.

use crate::audio::NoteDuration;
use crate::error::ToyError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Geometry strategy for a chain follower. All three share the lag-chain
/// solve and differ only in how they emit vertices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainShape {
    /// Closed tube of rings whose radius undulates along the chain.
    Tube,
    /// Flat two-edge strip.
    Ribbon,
    /// Discrete shrinking spheres with a following-distance deadband.
    BeadChain,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransportParams {
    /// Quarter notes per minute. The sequencer clock ticks on sixteenths.
    pub tempo_bpm: u32,
    /// Milliseconds between render ticks.
    pub frame_interval_ms: u64,
}

/// One sequencer voice. `(beats, steps, phase)` are drawn once at startup,
/// each uniformly from its inclusive range.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoiceParams {
    pub name: String,
    pub notes: Vec<String>,
    pub beats: (i32, i32),
    pub steps: (i32, i32),
    pub phase: (i32, i32),
    /// Step length. `None` draws one from `SequencerParams::durations` at
    /// startup.
    pub step: Option<NoteDuration>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SequencerParams {
    pub voices: Vec<VoiceParams>,
    /// Velocities are drawn uniformly from `[0, velocity_max)`.
    pub velocity_max: f32,
    /// Note lengths the synth is asked to play, drawn uniformly per note.
    pub durations: Vec<NoteDuration>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrbParams {
    /// Radius of the bounding sphere every orb is confined to.
    pub sphere_radius: f32,
    /// Orbs spawn on a sphere of `sphere_radius * spawn_radius_fraction`.
    pub spawn_radius_fraction: f32,
    /// Full span of each initial velocity component (centered on zero).
    pub initial_speed: f32,
    /// Velocity multiplier applied every physics tick.
    pub friction: f32,
    /// Full span of each random component added on a wall bounce.
    pub bounce_jitter: f32,
    /// Extra velocity multiplier applied on a wall bounce.
    pub bounce_damping: f32,
    /// Impulse span per unit of note velocity.
    pub impulse_gain: f32,
    /// How long an orb glows after its note plays.
    pub glow_duration_ms: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TubeParams {
    pub segment_count: usize,
    pub segment_radius: f32,
    /// Vertices per ring.
    pub ring_samples: usize,
    /// Each tube draws its undulation frequency from `[low, high)`.
    pub frequency_range: (f32, f32),
    pub follow_rate: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RibbonParams {
    pub segment_count: usize,
    /// Vertical offset between the two ribbon edges.
    pub width: f32,
    pub follow_rate: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BeadParams {
    pub segment_count: usize,
    /// Radius step: bead `i` has radius `bead_radius * (segment_count - i)`.
    pub bead_radius: f32,
    /// Beads closer than this to their predecessor hold still.
    pub min_gap: f32,
    /// Latitude bands per bead sphere.
    pub sphere_rings: usize,
    /// Longitude slices per bead sphere.
    pub sphere_sectors: usize,
    pub follow_rate: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainParams {
    /// One follower per orb per entry.
    pub shapes: Vec<ChainShape>,
    /// Emissive intensity per unit of note velocity.
    pub pulse_gain: f32,
    pub pulse_duration_ms: u64,
    pub tube: TubeParams,
    pub ribbon: RibbonParams,
    pub beads: BeadParams,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AmbientParams {
    pub dust_count: usize,
    /// Dust base positions are uniform in a cube of this edge length.
    pub dust_spread: f32,
    /// Amplitude of the slow y/z sway of each dust mote.
    pub dust_sway: f32,
    /// Radians per render tick added to (and subtracted from) the camera
    /// group's rotation.
    pub camera_rotation_speed: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToyConfig {
    pub transport: TransportParams,
    pub sequencer: SequencerParams,
    pub orbs: OrbParams,
    pub chains: ChainParams,
    pub ambient: AmbientParams,
}

fn pentatonic(octave: u8) -> Vec<String> {
    ["C", "Eb", "F", "G", "Bb"]
        .iter()
        .map(|pc| format!("{pc}{octave}"))
        .collect()
}

impl Default for ToyConfig {
    fn default() -> Self {
        Self {
            transport: TransportParams {
                tempo_bpm: 120,
                frame_interval_ms: 16,
            },
            sequencer: SequencerParams {
                voices: vec![
                    VoiceParams {
                        name: "low".into(),
                        notes: pentatonic(4),
                        beats: (1, 7),
                        steps: (5, 10),
                        phase: (1, 7),
                        step: Some(NoteDuration::Eighth),
                    },
                    VoiceParams {
                        name: "high".into(),
                        notes: pentatonic(5),
                        beats: (1, 7),
                        steps: (5, 10),
                        phase: (1, 7),
                        step: None,
                    },
                ],
                velocity_max: 0.5,
                durations: NoteDuration::ALL.to_vec(),
            },
            orbs: OrbParams {
                sphere_radius: 5.0,
                spawn_radius_fraction: 0.5,
                initial_speed: 0.025,
                friction: 0.995,
                bounce_jitter: 0.07,
                bounce_damping: 0.5,
                impulse_gain: 0.3,
                glow_duration_ms: 500,
            },
            chains: ChainParams {
                shapes: vec![ChainShape::Tube],
                pulse_gain: 0.8,
                pulse_duration_ms: 500,
                tube: TubeParams {
                    segment_count: 10,
                    segment_radius: 0.2,
                    ring_samples: 8,
                    frequency_range: (0.01, 1.01),
                    follow_rate: 0.1,
                },
                ribbon: RibbonParams {
                    segment_count: 10,
                    width: 0.1,
                    follow_rate: 0.1,
                },
                beads: BeadParams {
                    segment_count: 5,
                    bead_radius: 0.05,
                    min_gap: 0.2,
                    sphere_rings: 6,
                    sphere_sectors: 8,
                    follow_rate: 0.05,
                },
            },
            ambient: AmbientParams {
                dust_count: 1000,
                dust_spread: 10.0,
                dust_sway: 5.0,
                camera_rotation_speed: 0.0001,
            },
        }
    }
}

impl ToyConfig {
    /// Parse and validate a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ToyError> {
        let config: ToyConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ToyError> {
        let json = std::fs::read_to_string(path).map_err(|source| ToyError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Reject values that would make a random range empty or geometry
    /// degenerate.
    pub fn validate(&self) -> Result<(), ToyError> {
        let invalid = |msg: String| Err(ToyError::InvalidConfig(msg));

        if self.transport.tempo_bpm == 0 {
            return invalid("transport.tempo_bpm must be positive".into());
        }
        if self.transport.frame_interval_ms == 0 {
            return invalid("transport.frame_interval_ms must be positive".into());
        }

        let seq = &self.sequencer;
        if seq.durations.is_empty() {
            return invalid("sequencer.durations is empty".into());
        }
        if !(0.0..=1.0).contains(&seq.velocity_max) {
            return invalid(format!(
                "sequencer.velocity_max {} outside [0, 1]",
                seq.velocity_max
            ));
        }
        for voice in &seq.voices {
            if voice.notes.is_empty() {
                return invalid(format!("voice '{}' has no notes", voice.name));
            }
            for (label, (low, high)) in [
                ("beats", voice.beats),
                ("steps", voice.steps),
                ("phase", voice.phase),
            ] {
                if low > high {
                    return invalid(format!(
                        "voice '{}' {label} range ({low}, {high}) is inverted",
                        voice.name
                    ));
                }
            }
        }

        let radius = self.orbs.sphere_radius;
        if radius.is_nan() || radius <= 0.0 {
            return invalid("orbs.sphere_radius must be positive".into());
        }

        let chains = &self.chains;
        let (f_low, f_high) = chains.tube.frequency_range;
        if f_low.is_nan() || f_high.is_nan() || f_low >= f_high {
            return invalid(format!(
                "chains.tube.frequency_range ({f_low}, {f_high}) is empty"
            ));
        }
        if chains.tube.ring_samples < 3 {
            return invalid("chains.tube.ring_samples must be at least 3".into());
        }
        if chains.beads.sphere_rings < 2 || chains.beads.sphere_sectors < 3 {
            return invalid("chains.beads sphere needs at least 2 rings and 3 sectors".into());
        }
        for (label, count) in [
            ("tube", chains.tube.segment_count),
            ("ribbon", chains.ribbon.segment_count),
            ("beads", chains.beads.segment_count),
        ] {
            if count == 0 {
                return invalid(format!("chains.{label}.segment_count must be positive"));
            }
        }

        Ok(())
    }

    /// Sixteenth-note length in milliseconds at the configured tempo.
    pub fn sixteenth_ms(&self) -> u64 {
        (60_000 / (self.transport.tempo_bpm as u64 * 4)).max(1)
    }
}
