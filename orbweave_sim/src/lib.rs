// orbweave_sim — generative sequencing and reactive animation engine.
//
// This crate contains everything that decides what the toy plays and how the
// scene moves: Euclidean rhythm generation, the note bus, the sequencer, the
// orb physics, chain followers and their geometry, and the headless driver
// that runs both host clocks. It has no audio or rendering dependencies;
// sound goes out through the `AudioSink` trait and geometry through plain
// `MeshData` buffers, so the whole engine can be tested, benchmarked, and
// run headless.
//
// Module overview:
// - `sim.rs`:       `Performance`: wires every component to one context, runs the two clocks.
// - `context.rs`:   `SimulationContext` + `Stage`: config, note bus, orb table, pulses, clock.
// - `bus.rs`:       `EventBus`: ordered, failure-isolating note dispatch.
// - `rhythm.rs`:    Euclidean `RhythmPattern` generation.
// - `sequencer.rs`: Voices stepping through patterns, scheduling audio, publishing notes.
// - `orb.rs`:       `OrbTable` + `OrbField`: bounded-sphere physics and note impulses.
// - `chain.rs`:     Lag-chain solve and `ChainFollower` creatures.
// - `mesh.rs`:      Tube, ribbon and bead geometry emitters into `MeshData`.
// - `pulse.rs`:     Expiring emissive highlights.
// - `ambient.rs`:   Dust field and camera drift.
// - `event.rs`:     `EventQueue` ordering the audio and render callbacks.
// - `audio.rs`:     `AudioSink` boundary, note durations, recording sink.
// - `config.rs`:    `ToyConfig`: every tunable parameter, JSON-loadable.
// - `error.rs`:     `ToyError`, `HandlerError`.
// - `vec3.rs`:      Minimal 3-vector math.
// - `types.rs`:     `NoteName`, `NoteEvent`, `ChainId`.
// - `prng`:         Re-exported from `orbweave_prng`: xoshiro256++ with SplitMix64 seeding.
//
// **Critical constraint: determinism.** A seed and a config fully determine a
// performance. All randomness comes from forks of one seeded PRNG, orbs are
// iterated in creation order, and the two clocks are merged through a
// totally ordered event queue. No system time, no OS entropy.

pub mod ambient;
pub mod audio;
pub mod bus;
pub mod chain;
pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod mesh;
pub mod orb;
pub use orbweave_prng as prng;
pub mod pulse;
pub mod rhythm;
pub mod sequencer;
pub mod sim;
pub mod types;
pub mod vec3;
