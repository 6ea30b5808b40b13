// MIDI output from a recorded performance.
//
// Converts the notes a `RecordingAudio` sink received into a Standard MIDI
// File so a headless run can be listened to. Track 0 carries the tempo; track
// 1 carries every note on channel 0. Note start times come from the
// transport clock in seconds and lengths from the note duration tokens, both
// converted to ticks at the performance tempo.
//
// Uses the `midly` crate for MIDI writing. Output is SMF Format 1
// (multi-track).

use crate::pitch::midi_pitch;
use midly::{
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, Track, TrackEvent, TrackEventKind,
    num::{u4, u7, u15, u24, u28},
};
use orbweave_sim::audio::ScheduledNote;
use std::path::Path;
use tracing::warn;

/// Ticks per quarter note in MIDI output.
const TICKS_PER_QUARTER: u16 = 480;

/// Ticks per sixteenth note, the sequencer's step unit.
const TICKS_PER_SIXTEENTH: u32 = TICKS_PER_QUARTER as u32 / 4;

/// Write `notes` to `path` as a MIDI file.
pub fn write_midi(notes: &[ScheduledNote], tempo_bpm: u32, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let smf = notes_to_smf(notes, tempo_bpm);
    let mut buf = Vec::new();
    smf.write(&mut buf)?;
    std::fs::write(path, &buf)?;
    Ok(())
}

/// Engine velocity in `[0, 1)` to a MIDI velocity. Zero would read as a
/// note-off, so audible notes never go below 1.
pub fn midi_velocity(velocity: f32) -> u8 {
    (velocity * 127.0).round().clamp(1.0, 127.0) as u8
}

fn seconds_to_ticks(time_s: f64, tempo_bpm: u32) -> u32 {
    let quarters = time_s * tempo_bpm as f64 / 60.0;
    (quarters * TICKS_PER_QUARTER as f64).round() as u32
}

/// Convert recorded notes to an in-memory SMF.
pub fn notes_to_smf(notes: &[ScheduledNote], tempo_bpm: u32) -> Smf<'static> {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::new(TICKS_PER_QUARTER)),
    ));

    // Track 0: tempo track
    let mut tempo_track: Track<'static> = Vec::new();
    let tempo_microseconds = 60_000_000 / tempo_bpm.max(1);
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(tempo_microseconds))),
    });
    tempo_track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(tempo_track);

    // Absolute-time events: (tick, is_on, key, velocity). Offs sort before
    // ons at the same tick so a repeated key retriggers cleanly.
    let mut events: Vec<(u32, bool, u8, u8)> = Vec::with_capacity(notes.len() * 2);
    for note in notes {
        let Some(key) = midi_pitch(note.note.as_str()) else {
            warn!(note = %note.note, "skipping note with no MIDI pitch");
            continue;
        };
        let start = seconds_to_ticks(note.time_s, tempo_bpm);
        let length = note.duration.sixteenths() * TICKS_PER_SIXTEENTH;
        events.push((start, true, key, midi_velocity(note.velocity)));
        events.push((start + length, false, key, 0));
    }
    events.sort_by_key(|&(tick, is_on, key, _)| (tick, is_on, key));

    let channel = u4::new(0);
    let mut track: Track<'static> = Vec::new();
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::TrackName(b"Orbweave")),
    });
    let mut last_tick = 0;
    for (tick, is_on, key, vel) in events {
        let message = if is_on {
            MidiMessage::NoteOn {
                key: u7::new(key),
                vel: u7::new(vel),
            }
        } else {
            MidiMessage::NoteOff {
                key: u7::new(key),
                vel: u7::new(0),
            }
        };
        track.push(TrackEvent {
            delta: u28::new(tick - last_tick),
            kind: TrackEventKind::Midi { channel, message },
        });
        last_tick = tick;
    }
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);

    smf
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbweave_sim::audio::NoteDuration;
    use orbweave_sim::types::NoteName;

    fn note(name: &str, time_s: f64, duration: NoteDuration, velocity: f32) -> ScheduledNote {
        ScheduledNote {
            note: NoteName::new(name),
            duration,
            time_s,
            velocity,
        }
    }

    fn midi_events(smf: &Smf<'_>) -> Vec<(u32, MidiMessage)> {
        let mut tick = 0;
        let mut out = Vec::new();
        for event in &smf.tracks[1] {
            tick += event.delta.as_int();
            if let TrackEventKind::Midi { message, .. } = event.kind {
                out.push((tick, message));
            }
        }
        out
    }

    #[test]
    fn notes_land_on_tempo_ticks() {
        let notes = vec![
            note("C4", 0.0, NoteDuration::Eighth, 0.25),
            note("G4", 0.5, NoteDuration::DottedQuarter, 0.49),
        ];
        let smf = notes_to_smf(&notes, 120);
        assert_eq!(smf.tracks.len(), 2);

        let events = midi_events(&smf);
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[0],
            (0, MidiMessage::NoteOn { key: u7::new(60), vel: u7::new(32) })
        );
        // An eighth is 240 ticks; half a second at 120 BPM is one quarter.
        assert_eq!(
            events[1],
            (240, MidiMessage::NoteOff { key: u7::new(60), vel: u7::new(0) })
        );
        assert_eq!(events[2].0, 480);
        assert_eq!(events[3].0, 480 + 720);
    }

    #[test]
    fn note_off_precedes_retrigger_at_same_tick() {
        let notes = vec![
            note("F4", 0.0, NoteDuration::Eighth, 0.3),
            note("F4", 0.25, NoteDuration::Eighth, 0.3),
        ];
        let events = midi_events(&notes_to_smf(&notes, 120));
        assert_eq!(events[1].0, 240);
        assert!(matches!(events[1].1, MidiMessage::NoteOff { .. }));
        assert!(matches!(events[2].1, MidiMessage::NoteOn { .. }));
    }

    #[test]
    fn unparseable_notes_are_skipped() {
        let notes = vec![note("nope", 0.0, NoteDuration::Quarter, 0.2)];
        assert!(midi_events(&notes_to_smf(&notes, 120)).is_empty());
    }

    #[test]
    fn velocity_never_reads_as_note_off() {
        assert_eq!(midi_velocity(0.0), 1);
        assert_eq!(midi_velocity(0.5), 64);
        assert_eq!(midi_velocity(1.0), 127);
    }

    #[test]
    fn smf_serializes() {
        let notes = vec![note("Bb5", 1.0, NoteDuration::Quarter, 0.1)];
        let mut buf = Vec::new();
        notes_to_smf(&notes, 90).write(&mut buf).unwrap();
        assert_eq!(&buf[..4], b"MThd");
    }
}
