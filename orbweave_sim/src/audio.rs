// Boundary to the audio synthesis backend.
//
// The engine decides *when* and *what*; producing sound is someone else's
// job. `AudioSink` is the whole contract: schedule a note, start the
// transport. A sink failing to make sound is not an engine failure, so the
// trait has no error channel.
//
// `RecordingAudio` keeps every scheduled note in memory. The headless driver
// turns that log into a MIDI file, and tests use it to check what the
// sequencer asked for.

use crate::types::NoteName;
use serde::{Deserialize, Serialize};

/// Note length tokens understood by the synth backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteDuration {
    #[serde(rename = "4n")]
    Quarter,
    #[serde(rename = "4n.")]
    DottedQuarter,
    #[serde(rename = "8n")]
    Eighth,
    #[serde(rename = "8n.")]
    DottedEighth,
}

impl NoteDuration {
    pub const ALL: [NoteDuration; 4] = [
        NoteDuration::Quarter,
        NoteDuration::DottedQuarter,
        NoteDuration::Eighth,
        NoteDuration::DottedEighth,
    ];

    pub fn token(self) -> &'static str {
        match self {
            NoteDuration::Quarter => "4n",
            NoteDuration::DottedQuarter => "4n.",
            NoteDuration::Eighth => "8n",
            NoteDuration::DottedEighth => "8n.",
        }
    }

    /// Length in sixteenth notes, the sequencer's clock unit.
    pub fn sixteenths(self) -> u32 {
        match self {
            NoteDuration::Quarter => 4,
            NoteDuration::DottedQuarter => 6,
            NoteDuration::Eighth => 2,
            NoteDuration::DottedEighth => 3,
        }
    }
}

pub trait AudioSink {
    /// Sound `note` for `duration`, starting at `time_s` seconds on the
    /// transport clock.
    fn schedule_note(&mut self, note: &NoteName, duration: NoteDuration, time_s: f64, velocity: f32);

    fn start_transport(&mut self);
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn schedule_note(&mut self, _note: &NoteName, _duration: NoteDuration, _time_s: f64, _velocity: f32) {}

    fn start_transport(&mut self) {}
}

/// A note as handed to the audio backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduledNote {
    pub note: NoteName,
    pub duration: NoteDuration,
    pub time_s: f64,
    pub velocity: f32,
}

/// In-memory sink that logs every request.
#[derive(Clone, Debug, Default)]
pub struct RecordingAudio {
    pub notes: Vec<ScheduledNote>,
    pub transport_starts: u32,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioSink for RecordingAudio {
    fn schedule_note(&mut self, note: &NoteName, duration: NoteDuration, time_s: f64, velocity: f32) {
        self.notes.push(ScheduledNote {
            note: note.clone(),
            duration,
            time_s,
            velocity,
        });
    }

    fn start_transport(&mut self) {
        self.transport_starts += 1;
    }
}
