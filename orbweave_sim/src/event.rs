// Host clock callbacks as a discrete event queue.
//
// A live host drives the engine from two independent callbacks: the audio
// transport fires once per sixteenth note and the renderer fires once per
// frame. The headless `Performance` reproduces that by scheduling both kinds
// of callback into a priority queue ordered by `(time_ms, sequence)` and
// draining it up to a target time. Empty stretches of time cost nothing.
//
// See also: `sim.rs` for the loop that drains the queue and reschedules each
// callback after it runs.
//
// **Critical constraint: determinism.** When an audio step and a render
// frame land on the same millisecond, the one scheduled first runs first.
// The `(time_ms, sequence)` key provides that total order.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// A callback scheduled for a point on the simulation clock. Field order is
/// the firing order: the derived `Ord` compares `time_ms`, then `sequence`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScheduledEvent {
    /// Milliseconds since the performance started.
    pub time_ms: u64,
    /// Tiebreak within one millisecond. Lower values fire first.
    pub sequence: u64,
    pub kind: ScheduledEventKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScheduledEventKind {
    /// One sixteenth-note tick of the transport.
    AudioStep,
    /// One render frame: physics, chain solve, geometry, pulse sweep.
    RenderFrame,
}

impl ScheduledEventKind {
    /// Period of this callback under `sixteenth_ms` and `frame_ms`.
    pub fn interval_ms(self, sixteenth_ms: u64, frame_ms: u64) -> u64 {
        match self {
            ScheduledEventKind::AudioStep => sixteenth_ms,
            ScheduledEventKind::RenderFrame => frame_ms,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EventQueue {
    pending: BinaryHeap<Reverse<ScheduledEvent>>,
    issued: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, time_ms: u64, kind: ScheduledEventKind) {
        let event = ScheduledEvent {
            time_ms,
            sequence: self.issued,
            kind,
        };
        self.issued += 1;
        self.pending.push(Reverse(event));
    }

    pub fn peek_time(&self) -> Option<u64> {
        self.pending.peek().map(|Reverse(e)| e.time_ms)
    }

    /// Pop the earliest event if it is due at or before `up_to_ms`.
    pub fn pop_if_ready(&mut self, up_to_ms: u64) -> Option<ScheduledEvent> {
        let due = self.peek_time()? <= up_to_ms;
        if due {
            self.pending.pop().map(|Reverse(e)| e)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
