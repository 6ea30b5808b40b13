// Orbweave headless driver.
//
// Runs a performance without an audio device or a renderer: the engine's
// notes are captured by a recording sink and written to MIDI, and frame
// snapshots can be dumped as JSON lines for inspection.
//
// Architecture:
// - pitch.rs: Note-name to MIDI key mapping (scientific pitch notation)
// - midi.rs: SMF output from recorded notes
//
// The `perform` binary (main.rs) wires these to `orbweave_sim::sim::Performance`.
// Output is deterministic given a seed.

pub mod midi;
pub mod pitch;
