// Generative step sequencer.
//
// Each voice owns a Euclidean pattern, a note set and a step length. At
// startup every voice draws its `(beats, steps, phase)` from the configured
// ranges and, if it has no fixed step length, a subdivision from the four
// note lengths. The patterns are then fixed for the whole performance and
// logged once.
//
// The host calls `tick` once per sixteenth note. A voice advances its cursor
// only on ticks that are a multiple of its step length; when the cursor lands
// on an onset it picks a note, a velocity and a duration, asks the audio sink
// to play it, and publishes the note on the bus. Voices run in config order
// within a tick, so the first voice's handlers always see its note before the
// second voice's.
//
// The sequencer never touches orbs or chains directly. Everything visual
// happens in the handlers that `publish` reaches.
//
// See also: `rhythm.rs` for pattern generation, `audio.rs` for the sink
// contract, `sim.rs` for the clock that drives `tick`.

use crate::audio::{AudioSink, NoteDuration};
use crate::context::SimulationContext;
use crate::rhythm::{self, RhythmPattern};
use crate::types::{NoteEvent, NoteName};
use orbweave_prng::SeededRng;
use serde::Serialize;
use tracing::info;

#[derive(Clone, Debug)]
pub struct Voice {
    pub name: String,
    pub notes: Vec<NoteName>,
    pub pattern: RhythmPattern,
    pub step: NoteDuration,
    /// Steps this voice has taken so far; the pattern cursor is this value
    /// modulo the pattern length.
    steps_taken: u64,
}

impl Voice {
    pub fn new(name: impl Into<String>, notes: Vec<NoteName>, pattern: RhythmPattern, step: NoteDuration) -> Self {
        Self {
            name: name.into(),
            notes,
            pattern,
            step,
            steps_taken: 0,
        }
    }

    /// Pattern position the next step will read.
    pub fn cursor(&self) -> usize {
        if self.pattern.is_empty() {
            0
        } else {
            (self.steps_taken % self.pattern.len() as u64) as usize
        }
    }
}

/// One note the sequencer played.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlayedNote {
    pub voice: usize,
    pub note: NoteName,
    pub velocity: f32,
    pub duration: NoteDuration,
    pub time_s: f64,
}

pub struct Sequencer {
    voices: Vec<Voice>,
    rng: SeededRng,
    velocity_max: f32,
    durations: Vec<NoteDuration>,
    /// Sixteenth-note ticks seen so far.
    clock: u64,
}

impl Sequencer {
    /// Draw every voice's pattern from the context's config.
    pub fn new(ctx: &mut SimulationContext) -> Self {
        let mut rng = ctx.fork_rng();
        let params = &ctx.config.sequencer;
        let mut voices = Vec::with_capacity(params.voices.len());
        for voice in &params.voices {
            let beats = rng.range_i32_inclusive(voice.beats.0, voice.beats.1);
            let steps = rng.range_i32_inclusive(voice.steps.0, voice.steps.1);
            let phase = rng.range_i32_inclusive(voice.phase.0, voice.phase.1);
            let step = match voice.step {
                Some(step) => step,
                None => rng
                    .choose(&NoteDuration::ALL)
                    .copied()
                    .unwrap_or(NoteDuration::Eighth),
            };
            let pattern = rhythm::generate(beats, steps, phase);
            info!(
                voice = %voice.name,
                beats,
                steps,
                phase,
                step = step.token(),
                "pattern {pattern}"
            );
            let notes = voice.notes.iter().map(|n| NoteName::new(n.as_str())).collect();
            voices.push(Voice::new(voice.name.clone(), notes, pattern, step));
        }

        Self::with_voices(voices, rng, params.velocity_max, params.durations.clone())
    }

    /// Build from explicit voices instead of drawing them.
    pub fn with_voices(
        voices: Vec<Voice>,
        rng: SeededRng,
        velocity_max: f32,
        durations: Vec<NoteDuration>,
    ) -> Self {
        Self {
            voices,
            rng,
            velocity_max,
            durations,
            clock: 0,
        }
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn clock(&self) -> u64 {
        self.clock
    }

    /// Advance one sixteenth note. Every onset is scheduled on `audio` at
    /// `time_s` and published on the context's bus, one event per onset.
    pub fn tick(&mut self, ctx: &mut SimulationContext, audio: &mut dyn AudioSink, time_s: f64) -> Vec<PlayedNote> {
        let mut played = Vec::new();
        for (index, voice) in self.voices.iter_mut().enumerate() {
            if self.clock % u64::from(voice.step.sixteenths()) != 0 {
                continue;
            }
            let cursor = voice.cursor();
            voice.steps_taken += 1;
            if !voice.pattern.is_active(cursor) {
                continue;
            }
            let Some(note) = self.rng.choose(&voice.notes).cloned() else {
                continue;
            };
            let velocity = self.rng.next_f32() * self.velocity_max;
            let duration = self
                .rng
                .choose(&self.durations)
                .copied()
                .unwrap_or(voice.step);

            audio.schedule_note(&note, duration, time_s, velocity);
            ctx.publish(&NoteEvent::new(note.clone(), velocity));
            played.push(PlayedNote {
                voice: index,
                note,
                velocity,
                duration,
                time_s,
            });
        }
        self.clock += 1;
        played
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RecordingAudio;
    use crate::config::ToyConfig;
    use crate::context::Stage;

    fn notes(names: &[&str]) -> Vec<NoteName> {
        names.iter().map(|&n| NoteName::new(n)).collect()
    }

    fn fixed(voices: Vec<Voice>) -> Sequencer {
        Sequencer::with_voices(voices, SeededRng::new(3), 0.5, NoteDuration::ALL.to_vec())
    }

    fn run(seq: &mut Sequencer, ctx: &mut SimulationContext, audio: &mut RecordingAudio, ticks: u64) -> Vec<PlayedNote> {
        let mut all = Vec::new();
        for t in 0..ticks {
            all.extend(seq.tick(ctx, audio, t as f64 * 0.125));
        }
        all
    }

    #[test]
    fn one_note_per_onset() {
        let mut ctx = SimulationContext::new(1, ToyConfig::default());
        let mut audio = RecordingAudio::new();
        let pattern = rhythm::generate(3, 8, 0);
        let mut seq = fixed(vec![Voice::new("a", notes(&["C4"]), pattern, NoteDuration::Eighth)]);

        // 32 sixteenths = 16 eighth-note steps = two pattern cycles.
        let played = run(&mut seq, &mut ctx, &mut audio, 32);
        assert_eq!(played.len(), 6);
        assert_eq!(audio.notes.len(), 6);
        // Pattern ..x..x.x, eighth steps: onsets on sixteenths 4, 10, 14.
        let times: Vec<f64> = played.iter().take(3).map(|p| p.time_s).collect();
        assert_eq!(times, vec![0.5, 1.25, 1.75]);
    }

    #[test]
    fn every_onset_is_published_once() {
        let mut ctx = SimulationContext::new(1, ToyConfig::default());
        ctx.bus.subscribe(|stage: &mut Stage, _ev: &NoteEvent| {
            stage.now_ms += 1;
            Ok(())
        });
        let mut audio = RecordingAudio::new();
        let mut seq = fixed(vec![Voice::new(
            "a",
            notes(&["C4", "G4"]),
            rhythm::generate(4, 4, 0),
            NoteDuration::Quarter,
        )]);
        let played = run(&mut seq, &mut ctx, &mut audio, 16);
        assert_eq!(played.len(), 4);
        assert_eq!(ctx.stage.now_ms, 4);
    }

    #[test]
    fn scheduled_notes_match_published_ones() {
        let mut ctx = SimulationContext::new(1, ToyConfig::default());
        let mut audio = RecordingAudio::new();
        let mut seq = fixed(vec![Voice::new(
            "a",
            notes(&["C4", "Eb4", "F4"]),
            rhythm::generate(5, 7, 2),
            NoteDuration::DottedEighth,
        )]);
        let played = run(&mut seq, &mut ctx, &mut audio, 64);
        assert_eq!(played.len(), audio.notes.len());
        for (p, s) in played.iter().zip(&audio.notes) {
            assert_eq!(p.note, s.note);
            assert_eq!(p.velocity, s.velocity);
            assert_eq!(p.duration, s.duration);
            assert!((0.0..0.5).contains(&p.velocity));
        }
    }

    #[test]
    fn voices_fire_in_order_within_a_tick() {
        let mut ctx = SimulationContext::new(1, ToyConfig::default());
        let mut audio = RecordingAudio::new();
        let all = rhythm::generate(1, 1, 0);
        let mut seq = fixed(vec![
            Voice::new("a", notes(&["C4"]), all.clone(), NoteDuration::Eighth),
            Voice::new("b", notes(&["C5"]), all, NoteDuration::Eighth),
        ]);
        let played = seq.tick(&mut ctx, &mut audio, 0.0);
        let order: Vec<&str> = played.iter().map(|p| p.note.as_str()).collect();
        assert_eq!(order, vec!["C4", "C5"]);
        assert_eq!(audio.notes[0].note.as_str(), "C4");
    }

    #[test]
    fn silent_voices_never_fire() {
        let mut ctx = SimulationContext::new(1, ToyConfig::default());
        let mut audio = RecordingAudio::new();
        let mut seq = fixed(vec![
            Voice::new("empty", notes(&["C4"]), rhythm::generate(3, 0, 0), NoteDuration::Eighth),
            Voice::new("rest", notes(&["C4"]), rhythm::generate(0, 5, 0), NoteDuration::Eighth),
            Voice::new("mute", Vec::new(), rhythm::generate(5, 5, 0), NoteDuration::Eighth),
        ]);
        assert!(run(&mut seq, &mut ctx, &mut audio, 100).is_empty());
        assert!(audio.notes.is_empty());
    }

    #[test]
    fn slower_steps_advance_the_cursor_less_often() {
        let mut ctx = SimulationContext::new(1, ToyConfig::default());
        let mut audio = RecordingAudio::new();
        let pattern = rhythm::generate(1, 5, 0);
        let mut seq = fixed(vec![
            Voice::new("quarter", notes(&["C4"]), pattern.clone(), NoteDuration::Quarter),
            Voice::new("dotted", notes(&["C5"]), pattern, NoteDuration::DottedQuarter),
        ]);
        run(&mut seq, &mut ctx, &mut audio, 24);
        // 24 sixteenths: 6 quarter steps, 4 dotted-quarter steps.
        assert_eq!(seq.voices()[0].cursor(), 1);
        assert_eq!(seq.voices()[1].cursor(), 4);
        assert_eq!(seq.clock(), 24);
    }

    #[test]
    fn default_voices_draw_within_ranges() {
        for seed in 0..20 {
            let mut ctx = SimulationContext::new(seed, ToyConfig::default());
            let seq = Sequencer::new(&mut ctx);
            assert_eq!(seq.voices().len(), 2);
            assert_eq!(seq.voices()[0].step, NoteDuration::Eighth);
            for voice in seq.voices() {
                assert!((5..=10).contains(&voice.pattern.len()));
                assert!((1..=7).contains(&voice.pattern.active_count()));
                assert_eq!(voice.notes.len(), 5);
            }
            assert_eq!(seq.voices()[1].notes[0].as_str(), "C5");
        }
    }

    #[test]
    fn same_seed_same_performance() {
        let play = |seed| {
            let mut ctx = SimulationContext::new(seed, ToyConfig::default());
            let mut seq = Sequencer::new(&mut ctx);
            let mut audio = RecordingAudio::new();
            run(&mut seq, &mut ctx, &mut audio, 200)
        };
        assert_eq!(play(42), play(42));
    }
}
