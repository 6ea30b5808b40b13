// Geometry buffers for chain followers.
//
// Each follower owns one `MeshData` and rewrites it completely after every
// chain solve: positions, normals, and a triangle index list, in the flat
// layout a GPU backend uploads directly. The buffer carries a dirty flag that
// every rewrite sets and the render backend clears with `take_dirty` after
// uploading.
//
// Three emitters, one per `ChainShape`:
// - `write_tube`: one ring of `ring_samples` vertices per segment. The ring
//   radius undulates as `radius * |sin(i * frequency)|` and pinches to zero
//   at both ends. Ring normals are the flat `(cos a, sin a, 0)` directions.
// - `write_ribbon`: two vertices per segment, the second raised by `width`.
// - `write_beads`: a UV sphere per segment, shrinking toward the tail.
//
// See also: `chain.rs` for the solve that produces segment positions.

use crate::vec3::Vec3;
use serde::Serialize;
use std::f32::consts::{PI, TAU};

#[derive(Clone, Debug, Default, Serialize)]
pub struct MeshData {
    pub vertices: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
    #[serde(skip)]
    dirty: bool,
}

impl MeshData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Report whether the buffers changed since the last call, and clear
    /// the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    fn begin(&mut self) {
        self.vertices.clear();
        self.normals.clear();
        self.indices.clear();
        self.dirty = true;
    }

    fn push(&mut self, position: Vec3, normal: Vec3) {
        self.vertices.push(position.to_array());
        self.normals.push(normal.to_array());
    }

    fn triangle(&mut self, a: usize, b: usize, c: usize) {
        self.indices.extend([a as u32, b as u32, c as u32]);
    }
}

/// Ring radius at chain index `i` of `count`.
pub fn tube_ring_radius(i: usize, count: usize, radius: f32, frequency: f32) -> f32 {
    if i == 0 || i + 1 == count {
        0.0
    } else {
        radius * (i as f32 * frequency).sin().abs()
    }
}

pub fn write_tube(mesh: &mut MeshData, segments: &[Vec3], radius: f32, ring_samples: usize, frequency: f32) {
    mesh.begin();
    let count = segments.len();
    for (i, seg) in segments.iter().enumerate() {
        let r = tube_ring_radius(i, count, radius, frequency);
        for j in 0..ring_samples {
            let a = TAU * j as f32 / ring_samples as f32;
            let (sin, cos) = a.sin_cos();
            mesh.push(
                Vec3::new(cos * r + seg.x, sin * r + seg.y, seg.z),
                Vec3::new(cos, sin, 0.0),
            );
        }
    }

    for i in 0..count.saturating_sub(1) {
        for j in 0..ring_samples {
            let current = i * ring_samples + j;
            let next = current + ring_samples;
            let wrapped = (j + 1) % ring_samples;
            let current_side = wrapped + i * ring_samples;
            let next_side = wrapped + (i + 1) * ring_samples;
            mesh.triangle(current, next, current_side);
            mesh.triangle(current_side, next, next_side);
        }
    }
}

pub fn write_ribbon(mesh: &mut MeshData, segments: &[Vec3], width: f32) {
    mesh.begin();
    let lift = Vec3::new(0.0, width, 0.0);
    for (i, seg) in segments.iter().enumerate() {
        let tangent = if i + 1 < segments.len() {
            segments[i + 1] - *seg
        } else if i > 0 {
            *seg - segments[i - 1]
        } else {
            Vec3::ZERO
        };
        let normal = tangent.cross(Vec3::UP).normalize_or_zero();
        mesh.push(*seg, normal);
        mesh.push(*seg + lift, normal);
    }

    for i in 0..segments.len().saturating_sub(1) {
        let top_left = 2 * i;
        let top_right = 2 * i + 1;
        let bottom_left = 2 * i + 2;
        let bottom_right = 2 * i + 3;
        mesh.triangle(top_left, bottom_left, top_right);
        mesh.triangle(bottom_left, bottom_right, top_right);
    }
}

/// Radius of bead `i` in a chain of `count`.
pub fn bead_radius(i: usize, count: usize, step: f32) -> f32 {
    step * (count - i) as f32
}

pub fn write_beads(mesh: &mut MeshData, segments: &[Vec3], radius_step: f32, rings: usize, sectors: usize) {
    mesh.begin();
    let count = segments.len();
    let stride = sectors + 1;
    for (i, center) in segments.iter().enumerate() {
        let radius = bead_radius(i, count, radius_step);
        let base = mesh.vertices.len();
        for ring in 0..=rings {
            let phi = PI * ring as f32 / rings as f32;
            for sector in 0..=sectors {
                let theta = TAU * sector as f32 / sectors as f32;
                let normal = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                mesh.push(*center + normal * radius, normal);
            }
        }
        for ring in 0..rings {
            for sector in 0..sectors {
                let a = base + ring * stride + sector;
                let b = a + stride;
                mesh.triangle(a, b, a + 1);
                mesh.triangle(a + 1, b, b + 1);
            }
        }
    }
}
