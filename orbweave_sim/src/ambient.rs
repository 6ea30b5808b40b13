// Background scenery: a drifting dust field and a slowly turning camera rig.
//
// Neither listens to notes. The dust motes sway on a clock derived from the
// simulation time, so their pose is a pure function of `now_ms` and each
// mote's index. The camera rig turns by a fixed amount per render frame.

use crate::config::AmbientParams;
use crate::vec3::Vec3;
use orbweave_prng::SeededRng;
use serde::Serialize;
use std::f32::consts::TAU;

/// Fixed non-uniform scale shared by every mote.
pub const DUST_SCALE: Vec3 = Vec3::new(0.1, 0.8, 0.5);

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DustMote {
    pub position: Vec3,
    pub rotation_y: f32,
}

#[derive(Clone, Debug)]
pub struct DustField {
    anchors: Vec<Vec3>,
    motes: Vec<DustMote>,
    sway: f32,
}

impl DustField {
    pub fn new(params: &AmbientParams, rng: &mut SeededRng) -> Self {
        let anchors: Vec<Vec3> = (0..params.dust_count)
            .map(|_| {
                let x = rng.centered_f32(params.dust_spread);
                let y = rng.centered_f32(params.dust_spread);
                let z = rng.centered_f32(params.dust_spread);
                Vec3::new(x, y, z)
            })
            .collect();
        let motes = anchors
            .iter()
            .map(|&position| DustMote {
                position,
                rotation_y: 0.0,
            })
            .collect();
        Self {
            anchors,
            motes,
            sway: params.dust_sway,
        }
    }

    /// Pose every mote for time `now_ms`.
    pub fn update(&mut self, now_ms: u64) {
        let t = now_ms as f32 * 0.0001;
        for (i, (mote, anchor)) in self.motes.iter_mut().zip(&self.anchors).enumerate() {
            let phase = t / 10.0 + i as f32;
            mote.position = Vec3::new(
                anchor.x,
                anchor.y + phase.sin() * self.sway,
                anchor.z + phase.cos() * self.sway,
            );
            mote.rotation_y = (t + i as f32).cos() * TAU;
        }
    }

    pub fn motes(&self) -> &[DustMote] {
        &self.motes
    }

    pub fn len(&self) -> usize {
        self.motes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motes.is_empty()
    }
}

/// Rotation of the group holding the camera, in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct CameraDrift {
    pub rotation_y: f32,
    pub rotation_z: f32,
    #[serde(skip)]
    speed: f32,
}

impl CameraDrift {
    pub fn new(speed: f32) -> Self {
        Self {
            rotation_y: 0.0,
            rotation_z: 0.0,
            speed,
        }
    }

    pub fn advance(&mut self) {
        self.rotation_y += self.speed;
        self.rotation_z -= self.speed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToyConfig;

    #[test]
    fn dust_starts_inside_the_cube() {
        let params = ToyConfig::default().ambient;
        let dust = DustField::new(&params, &mut SeededRng::new(5));
        assert_eq!(dust.len(), 1000);
        for mote in dust.motes() {
            for c in mote.position.to_array() {
                assert!(c.abs() <= 5.0);
            }
        }
    }

    #[test]
    fn dust_pose_is_a_function_of_time() {
        let params = ToyConfig::default().ambient;
        let mut a = DustField::new(&params, &mut SeededRng::new(5));
        let mut b = a.clone();
        a.update(10_000);
        a.update(25_000);
        b.update(25_000);
        assert_eq!(a.motes(), b.motes());
    }

    #[test]
    fn dust_sways_in_y_and_z_only() {
        let params = ToyConfig::default().ambient;
        let mut dust = DustField::new(&params, &mut SeededRng::new(5));
        let anchor = dust.motes()[3].position;
        dust.update(0);
        let mote = dust.motes()[3];
        assert_eq!(mote.position.x, anchor.x);
        assert!((mote.position.y - (anchor.y + 3.0f32.sin() * 5.0)).abs() < 1e-5);
        assert!((mote.position.z - (anchor.z + 3.0f32.cos() * 5.0)).abs() < 1e-5);
        assert!((mote.rotation_y - 3.0f32.cos() * TAU).abs() < 1e-5);
    }

    #[test]
    fn camera_turns_opposite_ways() {
        let mut camera = CameraDrift::new(0.0001);
        for _ in 0..10 {
            camera.advance();
        }
        assert!((camera.rotation_y - 0.001).abs() < 1e-7);
        assert!((camera.rotation_z + 0.001).abs() < 1e-7);
    }
}
