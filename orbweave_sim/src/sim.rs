// The performance: every component wired to one context and one clock.
//
// `Performance` owns the `SimulationContext` and the components built from
// it, in this order: the orb field (spawns orbs, subscribes impulses), the
// sequencer (draws patterns), one chain follower per orb per configured
// shape (each subscribes its highlight), then the ambient dust and camera.
// Subscription order is therefore orbs first, then chains in orb order,
// which is the order every note reaches them.
//
// ## Two clocks
//
// A live host calls `audio_tick` once per sixteenth note and `render_tick`
// once per frame, from independent callbacks. Headless runs use `step`,
// which schedules both callbacks into an `EventQueue` and drains it up to a
// target time, advancing `stage.now_ms` as it goes. Between render ticks any
// number of notes may arrive; handlers only nudge velocities and stamp
// pulses, so the next render tick picks everything up.
//
// A render tick runs the orb physics, then advances every chain follower
// against the read-only stage (in parallel: each follower only writes its
// own chain and mesh), then poses the dust, turns the camera and sweeps
// expired pulses.
//
// `start` may be called once. A second call is an error, so a host cannot
// accidentally double-schedule the transport.
//
// See also: `event.rs` for the queue, `context.rs` for the shared state,
// `sequencer.rs`, `orb.rs`, `chain.rs`, `ambient.rs` for the components.
//
// **Critical constraint: determinism.** Given a seed and a config, the notes,
// orb trajectories and geometry are identical on every run. All randomness
// comes from forks of the context's PRNG, made in construction order.

use crate::ambient::{CameraDrift, DustField};
use crate::audio::AudioSink;
use crate::chain::ChainFollower;
use crate::config::{ChainShape, ToyConfig};
use crate::context::{SimulationContext, Stage};
use crate::error::ToyError;
use crate::event::{EventQueue, ScheduledEventKind};
use crate::orb::OrbField;
use crate::pulse::PulseKey;
use crate::sequencer::{PlayedNote, Sequencer};
use crate::types::{ChainId, NoteName};
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

pub struct Performance {
    ctx: SimulationContext,
    orb_field: OrbField,
    sequencer: Sequencer,
    followers: Vec<ChainFollower>,
    dust: DustField,
    camera: CameraDrift,
    queue: EventQueue,
    started: bool,
    frames: u64,
}

/// What happened during one `step`.
#[derive(Clone, Debug, Default)]
pub struct StepResult {
    pub notes: Vec<PlayedNote>,
    pub frames: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrbSnapshot {
    pub note: NoteName,
    pub position: [f32; 3],
    pub glow: f32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChainSnapshot {
    pub id: ChainId,
    pub target: NoteName,
    pub shape: ChainShape,
    pub emissive: f32,
    pub head: [f32; 3],
    pub vertices: usize,
    pub triangles: usize,
}

/// Serializable view of one moment, for logs and headless inspection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub time_ms: u64,
    pub orbs: Vec<OrbSnapshot>,
    pub chains: Vec<ChainSnapshot>,
    pub camera: CameraDrift,
}

impl Performance {
    /// A performance with the default config.
    pub fn new(seed: u64) -> Self {
        Self::build(seed, ToyConfig::default())
    }

    pub fn with_config(seed: u64, config: ToyConfig) -> Result<Self, ToyError> {
        config.validate()?;
        Ok(Self::build(seed, config))
    }

    fn build(seed: u64, config: ToyConfig) -> Self {
        let mut ctx = SimulationContext::new(seed, config);
        let orb_field = OrbField::new(&mut ctx);
        let sequencer = Sequencer::new(&mut ctx);

        let targets: Vec<NoteName> = ctx.stage.orbs.iter().map(|orb| orb.id.clone()).collect();
        let shapes = ctx.config.chains.shapes.clone();
        let mut followers = Vec::with_capacity(targets.len() * shapes.len());
        for target in &targets {
            for &shape in &shapes {
                followers.push(ChainFollower::attach(&mut ctx, target.clone(), shape));
            }
        }

        let mut dust_rng = ctx.fork_rng();
        let dust = DustField::new(&ctx.config.ambient, &mut dust_rng);
        let camera = CameraDrift::new(ctx.config.ambient.camera_rotation_speed);

        Self {
            ctx,
            orb_field,
            sequencer,
            followers,
            dust,
            camera,
            queue: EventQueue::new(),
            started: false,
            frames: 0,
        }
    }

    /// Start the audio transport and schedule both clocks at the current
    /// time.
    pub fn start(&mut self, audio: &mut dyn AudioSink) -> Result<(), ToyError> {
        if self.started {
            return Err(ToyError::AlreadyStarted);
        }
        self.started = true;
        audio.start_transport();
        let now = self.ctx.stage.now_ms;
        self.queue.schedule(now, ScheduledEventKind::AudioStep);
        self.queue.schedule(now, ScheduledEventKind::RenderFrame);
        info!(
            orbs = self.ctx.stage.orbs.len(),
            chains = self.followers.len(),
            subscribers = self.ctx.bus.len(),
            tempo_bpm = self.ctx.config.transport.tempo_bpm,
            "performance started"
        );
        Ok(())
    }

    /// One sixteenth note of the sequencer, stamped at the current time.
    pub fn audio_tick(&mut self, audio: &mut dyn AudioSink) -> Vec<PlayedNote> {
        let time_s = self.ctx.stage.now_ms as f64 / 1000.0;
        self.sequencer.tick(&mut self.ctx, audio, time_s)
    }

    /// One render frame.
    pub fn render_tick(&mut self) {
        self.orb_field.advance(&mut self.ctx.stage.orbs);

        let stage = &self.ctx.stage;
        self.followers
            .par_iter_mut()
            .for_each(|follower| follower.advance(stage));

        let now = self.ctx.stage.now_ms;
        self.dust.update(now);
        self.camera.advance();
        self.ctx.stage.pulses.sweep(now);
        self.frames += 1;
    }

    /// Run both clocks until `target_ms`, processing every callback due at
    /// or before it. Does nothing but move the clock before `start`.
    pub fn step(&mut self, audio: &mut dyn AudioSink, target_ms: u64) -> StepResult {
        let mut result = StepResult::default();
        while self.ctx.stage.now_ms < target_ms {
            let next = self
                .queue
                .peek_time()
                .map_or(target_ms, |t| t.min(target_ms));
            self.ctx.stage.now_ms = next;

            while let Some(event) = self.queue.pop_if_ready(next) {
                match event.kind {
                    ScheduledEventKind::AudioStep => result.notes.extend(self.audio_tick(audio)),
                    ScheduledEventKind::RenderFrame => {
                        self.render_tick();
                        result.frames += 1;
                    }
                }
                let interval = event.kind.interval_ms(
                    self.ctx.config.sixteenth_ms(),
                    self.ctx.config.transport.frame_interval_ms,
                );
                self.queue.schedule(next + interval, event.kind);
            }
        }
        result
    }

    pub fn snapshot(&self) -> FrameSnapshot {
        let stage = &self.ctx.stage;
        let now = stage.now_ms;
        let orbs = stage
            .orbs
            .iter()
            .map(|orb| OrbSnapshot {
                note: orb.id.clone(),
                position: orb.position.to_array(),
                glow: stage.pulses.intensity(&PulseKey::Orb(orb.id.clone()), now),
            })
            .collect();
        let chains = self
            .followers
            .iter()
            .map(|f| ChainSnapshot {
                id: f.id(),
                target: f.target().clone(),
                shape: f.shape(),
                emissive: f.emissive(stage),
                head: f.chain().segments.first().map_or([0.0; 3], |s| s.to_array()),
                vertices: f.mesh().vertices.len(),
                triangles: f.mesh().triangle_count(),
            })
            .collect();
        FrameSnapshot {
            time_ms: now,
            orbs,
            chains,
            camera: self.camera,
        }
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn now_ms(&self) -> u64 {
        self.ctx.stage.now_ms
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn config(&self) -> &ToyConfig {
        &self.ctx.config
    }

    pub fn stage(&self) -> &Stage {
        &self.ctx.stage
    }

    pub fn context_mut(&mut self) -> &mut SimulationContext {
        &mut self.ctx
    }

    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    pub fn followers(&self) -> &[ChainFollower] {
        &self.followers
    }

    /// Mutable access for a render backend that clears dirty flags.
    pub fn followers_mut(&mut self) -> &mut [ChainFollower] {
        &mut self.followers
    }

    pub fn dust(&self) -> &DustField {
        &self.dust
    }

    pub fn camera(&self) -> &CameraDrift {
        &self.camera
    }
}
