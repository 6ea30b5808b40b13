// Time-limited emissive highlights.
//
// A note lights up its orb and every chain chasing that orb. Each highlight
// is a `Pulse` with an explicit expiry on the simulation clock instead of a
// fire-and-forget timer: handlers stamp `now_ms + duration`, the render tick
// sweeps expired entries, and readers treat anything past its expiry as
// dark even before the sweep runs. Re-triggering a key replaces its pulse,
// so the latest note always wins.
//
// Keys live in a `BTreeMap` so snapshots list pulses in a stable order.

use crate::types::{ChainId, NoteName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PulseKey {
    Orb(NoteName),
    Chain(ChainId),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pulse {
    pub intensity: f32,
    pub expires_at_ms: u64,
}

impl Pulse {
    pub fn is_live(&self, now_ms: u64) -> bool {
        now_ms < self.expires_at_ms
    }
}

#[derive(Clone, Debug, Default)]
pub struct PulseBoard {
    pulses: BTreeMap<PulseKey, Pulse>,
}

impl PulseBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Light `key` at `intensity` until `now_ms + duration_ms`.
    pub fn trigger(&mut self, key: PulseKey, intensity: f32, now_ms: u64, duration_ms: u64) {
        self.pulses.insert(
            key,
            Pulse {
                intensity,
                expires_at_ms: now_ms.saturating_add(duration_ms),
            },
        );
    }

    /// Current intensity of `key`; zero once expired or never triggered.
    pub fn intensity(&self, key: &PulseKey, now_ms: u64) -> f32 {
        match self.pulses.get(key) {
            Some(pulse) if pulse.is_live(now_ms) => pulse.intensity,
            _ => 0.0,
        }
    }

    /// Drop every pulse that has expired. Returns how many were removed.
    pub fn sweep(&mut self, now_ms: u64) -> usize {
        let before = self.pulses.len();
        self.pulses.retain(|_, pulse| pulse.is_live(now_ms));
        before - self.pulses.len()
    }

    pub fn len(&self) -> usize {
        self.pulses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pulses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PulseKey, &Pulse)> {
        self.pulses.iter()
    }
}
