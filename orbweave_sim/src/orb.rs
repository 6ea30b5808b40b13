// Orbs: one physically simulated point per note, confined to a sphere.
//
// `OrbTable` owns the orbs in creation order (a `Vec`, so physics iterates
// deterministically) with an `FxHashMap` from note name to slot for the
// lookups the impulse handler and chain followers do every tick.
//
// `OrbField` is the only writer. At construction it spawns one orb per
// distinct note across all sequencer voices and subscribes an impulse
// handler to the note bus. Each render tick `advance` integrates every orb:
//
//   1. position += velocity
//   2. velocity *= friction
//   3. outside the sphere: snap back onto the surface, reverse velocity, add
//      random jitter, then damp. Always in that order.
//
// A note kicks its orb with a random impulse scaled by the note's velocity
// and lights the orb's glow pulse.
//
// See also: `chain.rs` for the followers that chase orbs, `context.rs` for
// the `Stage` the table lives in.

use crate::bus::SubscriptionId;
use crate::config::OrbParams;
use crate::context::{SimulationContext, Stage};
use crate::pulse::PulseKey;
use crate::types::{NoteEvent, NoteName};
use crate::vec3::Vec3;
use orbweave_prng::SeededRng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};
use tracing::info;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Orb {
    pub id: NoteName,
    pub position: Vec3,
    pub velocity: Vec3,
}

#[derive(Clone, Debug, Default)]
pub struct OrbTable {
    orbs: Vec<Orb>,
    index: FxHashMap<NoteName, usize>,
}

impl OrbTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an orb. Returns `false` (and keeps the existing one) if an orb
    /// with the same note already exists.
    pub fn insert(&mut self, orb: Orb) -> bool {
        if self.index.contains_key(&orb.id) {
            return false;
        }
        self.index.insert(orb.id.clone(), self.orbs.len());
        self.orbs.push(orb);
        true
    }

    pub fn get(&self, note: &str) -> Option<&Orb> {
        self.index.get(note).map(|&slot| &self.orbs[slot])
    }

    pub fn get_mut(&mut self, note: &str) -> Option<&mut Orb> {
        self.index.get(note).map(|&slot| &mut self.orbs[slot])
    }

    pub fn position(&self, note: &str) -> Option<Vec3> {
        self.get(note).map(|orb| orb.position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Orb> {
        self.orbs.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Orb> {
        self.orbs.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.orbs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orbs.is_empty()
    }
}

/// One physics tick for one orb.
pub fn integrate(orb: &mut Orb, params: &OrbParams, rng: &mut SeededRng) {
    orb.position += orb.velocity;
    orb.velocity *= params.friction;

    if orb.position.length() > params.sphere_radius {
        orb.position = orb.position.normalize_or_zero() * params.sphere_radius;
        orb.velocity = -orb.velocity;
        orb.velocity += jitter(rng, params.bounce_jitter);
        orb.velocity *= params.bounce_damping;
    }
}

/// Apply a note impulse: each component gets `(u - 0.5) * velocity * gain`.
pub fn kick(orb: &mut Orb, note_velocity: f32, gain: f32, rng: &mut SeededRng) {
    orb.velocity += jitter(rng, note_velocity * gain);
}

fn jitter(rng: &mut SeededRng, span: f32) -> Vec3 {
    let x = rng.centered_f32(span);
    let y = rng.centered_f32(span);
    let z = rng.centered_f32(span);
    Vec3::new(x, y, z)
}

pub struct OrbField {
    params: OrbParams,
    rng: SeededRng,
    subscription: SubscriptionId,
}

/// Point at `radius` with azimuth `theta` around Z and polar angle `phi`
/// measured from +Z.
fn spherical_point(radius: f32, theta: f32, phi: f32) -> Vec3 {
    Vec3::new(
        radius * phi.sin() * theta.cos(),
        radius * phi.sin() * theta.sin(),
        radius * phi.cos(),
    )
}

impl OrbField {
    /// Spawn one orb per distinct note in the sequencer's voices and start
    /// listening for notes.
    pub fn new(ctx: &mut SimulationContext) -> Self {
        let params = ctx.config.orbs.clone();
        let mut rng = ctx.fork_rng();
        let spawn_radius = params.sphere_radius * params.spawn_radius_fraction;

        let notes: Vec<NoteName> = ctx
            .config
            .sequencer
            .voices
            .iter()
            .flat_map(|voice| voice.notes.iter().map(|n| NoteName::new(n.as_str())))
            .collect();
        for note in notes {
            if ctx.stage.orbs.get(note.as_str()).is_some() {
                continue;
            }
            let theta = rng.next_f32() * TAU;
            let phi = rng.next_f32() * PI;
            let position = spherical_point(spawn_radius, theta, phi);
            let velocity = jitter(&mut rng, params.initial_speed);
            ctx.stage.orbs.insert(Orb {
                id: note,
                position,
                velocity,
            });
        }
        info!(orbs = ctx.stage.orbs.len(), "orb field spawned");

        let mut impulse_rng = ctx.fork_rng();
        let gain = params.impulse_gain;
        let glow_ms = params.glow_duration_ms;
        let subscription = ctx.bus.subscribe(move |stage: &mut Stage, event: &NoteEvent| {
            let now_ms = stage.now_ms;
            if let Some(orb) = stage.orbs.get_mut(event.note.as_str()) {
                kick(orb, event.velocity, gain, &mut impulse_rng);
                stage
                    .pulses
                    .trigger(PulseKey::Orb(event.note.clone()), event.velocity, now_ms, glow_ms);
            }
            Ok(())
        });

        Self {
            params,
            rng,
            subscription,
        }
    }

    /// Integrate every orb once, in creation order.
    pub fn advance(&mut self, orbs: &mut OrbTable) {
        for orb in orbs.iter_mut() {
            integrate(orb, &self.params, &mut self.rng);
        }
    }

    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    pub fn params(&self) -> &OrbParams {
        &self.params
    }
}
