// Core identifier and event types shared across the engine.
//
// `NoteName` is the key that binds everything together: the sequencer
// publishes it, the orb table is indexed by it, and chain followers hold it
// as their non-owning reference to the orb they chase.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// A note identifier in scientific pitch notation, e.g. `"Eb4"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteName(String);

impl NoteName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NoteName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NoteName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One triggered note, alive only for the duration of a dispatch.
#[derive(Clone, Debug, PartialEq)]
pub struct NoteEvent {
    pub note: NoteName,
    /// Loudness in [0, 1).
    pub velocity: f32,
}

impl NoteEvent {
    pub fn new(note: NoteName, velocity: f32) -> Self {
        Self { note, velocity }
    }
}

/// Identifier of a chain follower, unique within one simulation context.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainId(pub u32);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainId({})", self.0)
    }
}
