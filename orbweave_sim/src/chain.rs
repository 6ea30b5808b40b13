// Chain followers: creatures that chase an orb.
//
// A `Chain` is a short run of points that lag behind a target. Every tick
// the head moves a fixed fraction of the way toward the target and each
// later point moves the same fraction toward the (already updated) point in
// front of it. The result is an exponential-lag trail that straightens out
// and bunches up behind a resting target.
//
// An optional deadband stops a trailing point from moving while it is closer
// than `min_gap` to the point in front of it, which keeps bead chains from
// collapsing into a single bead. The head always chases the target.
//
// `ChainFollower` binds a chain to an orb by note name (a lookup key, never
// a reference) and to a `ChainShape` that decides how the segments become
// geometry. It subscribes a highlight handler that lights its own emissive
// pulse when its orb's note plays. The pulse has no effect on motion.
//
// See also: `mesh.rs` for the geometry emitters, `orb.rs` for the orbs being
// chased, `sim.rs` which advances followers in parallel.

use crate::bus::SubscriptionId;
use crate::config::{ChainParams, ChainShape};
use crate::context::{SimulationContext, Stage};
use crate::mesh::{self, MeshData};
use crate::pulse::PulseKey;
use crate::types::{ChainId, NoteEvent, NoteName};
use crate::vec3::Vec3;
use smallvec::SmallVec;

/// Segment storage. Chains are short, so they usually stay inline.
pub type Segments = SmallVec<[Vec3; 16]>;

#[derive(Clone, Debug)]
pub struct Chain {
    pub segments: Segments,
    /// Fraction of the remaining distance covered per tick.
    pub follow_rate: f32,
    /// Trailing points closer than this to their leader hold still.
    pub min_gap: Option<f32>,
}

impl Chain {
    /// `count` points stacked at the origin.
    pub fn at_origin(count: usize, follow_rate: f32) -> Self {
        Self {
            segments: SmallVec::from_elem(Vec3::ZERO, count),
            follow_rate,
            min_gap: None,
        }
    }

    /// `count` points laid out along -X at `spacing`, with a following
    /// deadband of the same size.
    pub fn along_negative_x(count: usize, spacing: f32, follow_rate: f32) -> Self {
        Self {
            segments: (0..count)
                .map(|i| Vec3::new(-(i as f32) * spacing, 0.0, 0.0))
                .collect(),
            follow_rate,
            min_gap: Some(spacing),
        }
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Pull the head toward `target`, then each point toward its leader.
    pub fn solve(&mut self, target: Vec3) {
        let mut leader = target;
        for (i, seg) in self.segments.iter_mut().enumerate() {
            let held = i > 0 && self.min_gap.is_some_and(|gap| seg.distance(leader) < gap);
            if !held {
                *seg = seg.lerp(leader, self.follow_rate);
            }
            leader = *seg;
        }
    }

    /// Distances between neighbouring points, head first.
    pub fn gaps(&self) -> Vec<f32> {
        self.segments.windows(2).map(|w| w[0].distance(w[1])).collect()
    }
}

/// Per-shape geometry settings, fixed when the follower is attached.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Geometry {
    Tube {
        radius: f32,
        ring_samples: usize,
        frequency: f32,
    },
    Ribbon {
        width: f32,
    },
    Beads {
        radius_step: f32,
        rings: usize,
        sectors: usize,
    },
}

pub struct ChainFollower {
    id: ChainId,
    target: NoteName,
    shape: ChainShape,
    chain: Chain,
    geometry: Geometry,
    mesh: MeshData,
    subscription: SubscriptionId,
}

impl ChainFollower {
    /// Create a follower of `shape` chasing the orb for `target` and
    /// subscribe its highlight handler.
    pub fn attach(ctx: &mut SimulationContext, target: NoteName, shape: ChainShape) -> Self {
        let params: ChainParams = ctx.config.chains.clone();
        let id = ctx.allocate_chain_id();
        let (chain, geometry) = match shape {
            ChainShape::Tube => {
                let tube = &params.tube;
                let mut rng = ctx.fork_rng();
                let (low, high) = tube.frequency_range;
                (
                    Chain::at_origin(tube.segment_count, tube.follow_rate),
                    Geometry::Tube {
                        radius: tube.segment_radius,
                        ring_samples: tube.ring_samples,
                        frequency: rng.range_f32(low, high),
                    },
                )
            }
            ChainShape::Ribbon => (
                Chain::at_origin(params.ribbon.segment_count, params.ribbon.follow_rate),
                Geometry::Ribbon {
                    width: params.ribbon.width,
                },
            ),
            ChainShape::BeadChain => {
                let beads = &params.beads;
                (
                    Chain::along_negative_x(beads.segment_count, beads.min_gap, beads.follow_rate),
                    Geometry::Beads {
                        radius_step: beads.bead_radius,
                        rings: beads.sphere_rings,
                        sectors: beads.sphere_sectors,
                    },
                )
            }
        };

        let gain = params.pulse_gain;
        let duration_ms = params.pulse_duration_ms;
        let bound = target.clone();
        let subscription = ctx.bus.subscribe(move |stage: &mut Stage, event: &NoteEvent| {
            if event.note == bound {
                stage
                    .pulses
                    .trigger(PulseKey::Chain(id), event.velocity * gain, stage.now_ms, duration_ms);
            }
            Ok(())
        });

        let mut follower = Self {
            id,
            target,
            shape,
            chain,
            geometry,
            mesh: MeshData::new(),
            subscription,
        };
        follower.rebuild_mesh();
        follower
    }

    /// Solve toward the bound orb and regenerate geometry. A follower whose
    /// orb does not exist holds still.
    pub fn advance(&mut self, stage: &Stage) {
        let Some(target) = stage.orbs.position(self.target.as_str()) else {
            return;
        };
        self.chain.solve(target);
        self.rebuild_mesh();
    }

    fn rebuild_mesh(&mut self) {
        let segments = &self.chain.segments;
        match self.geometry {
            Geometry::Tube {
                radius,
                ring_samples,
                frequency,
            } => mesh::write_tube(&mut self.mesh, segments, radius, ring_samples, frequency),
            Geometry::Ribbon { width } => mesh::write_ribbon(&mut self.mesh, segments, width),
            Geometry::Beads {
                radius_step,
                rings,
                sectors,
            } => mesh::write_beads(&mut self.mesh, segments, radius_step, rings, sectors),
        }
    }

    /// Current emissive intensity from the pulse board.
    pub fn emissive(&self, stage: &Stage) -> f32 {
        stage.pulses.intensity(&PulseKey::Chain(self.id), stage.now_ms)
    }

    pub fn id(&self) -> ChainId {
        self.id
    }

    pub fn target(&self) -> &NoteName {
        &self.target
    }

    pub fn shape(&self) -> ChainShape {
        self.shape
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn mesh(&self) -> &MeshData {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut MeshData {
        &mut self.mesh
    }

    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }
}
