// Explicit shared state for one performance.
//
// Everything the components used to reach through globals lives here: the
// config, the note bus, the mutable `Stage` that note handlers write, and the
// root PRNG. Components receive `&mut SimulationContext` at construction
// time to fork their own random stream and register bus handlers, then hold
// nothing shared afterwards.
//
// The bus and the stage are separate fields so a dispatch can borrow the bus
// mutably while handing handlers `&mut Stage`.
//
// See also: `bus.rs` for dispatch, `sim.rs` for the `Performance` that owns
// the context.

use crate::bus::{DispatchReport, EventBus};
use crate::config::ToyConfig;
use crate::orb::OrbTable;
use crate::pulse::PulseBoard;
use crate::types::{ChainId, NoteEvent};
use orbweave_prng::SeededRng;
use tracing::debug;

/// The state note handlers may touch.
#[derive(Clone, Debug, Default)]
pub struct Stage {
    pub orbs: OrbTable,
    pub pulses: PulseBoard,
    /// Simulation clock in milliseconds since the performance started.
    pub now_ms: u64,
}

pub struct SimulationContext {
    pub config: ToyConfig,
    pub bus: EventBus<Stage>,
    pub stage: Stage,
    rng: SeededRng,
    next_chain_id: u32,
}

impl SimulationContext {
    pub fn new(seed: u64, config: ToyConfig) -> Self {
        Self {
            config,
            bus: EventBus::new(),
            stage: Stage::default(),
            rng: SeededRng::new(seed),
            next_chain_id: 0,
        }
    }

    /// Independent random stream for one subsystem.
    pub fn fork_rng(&mut self) -> SeededRng {
        self.rng.fork()
    }

    pub fn allocate_chain_id(&mut self) -> ChainId {
        let id = ChainId(self.next_chain_id);
        self.next_chain_id += 1;
        id
    }

    /// Deliver a note to every handler, with the stage as their state.
    pub fn publish(&mut self, event: &NoteEvent) -> DispatchReport {
        let report = self.bus.publish(&mut self.stage, event);
        debug!(
            note = %event.note,
            velocity = event.velocity,
            invoked = report.invoked,
            failed = report.failed,
            "note dispatched"
        );
        report
    }
}
