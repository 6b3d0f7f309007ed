// src/planting/grid.rs
//! Planting grid around a placement (deterministic for a given terrain).

use bevy::prelude::*;

use super::core::{Candidate, GridIndex, GridSpec, TerrainOracle};

/// Lay out `size²` cells centered on `spec.origin`, oriented by `spec.rotation`.
///
/// Rows advance along the rotated +Z ("forward"), columns along the rotated -X ("left").
/// Every cell's Y is replaced with the sampled ground height. Nothing is cached since the
/// aim position moves every frame.
pub fn generate_grid<T: TerrainOracle + ?Sized>(spec: &GridSpec, terrain: &T) -> Vec<Candidate> {
    let size = spec.size;
    let half = (size / 2) as f32;

    let left = spec.rotation * Vec3::NEG_X * spec.spacing;
    let forward = spec.rotation * Vec3::Z * spec.spacing;

    let mut row_origin = spec.origin - forward * half - left * half;
    let mut out = Vec::with_capacity(spec.cell_count());

    for x in 0..size {
        let mut pos = row_origin;
        for z in 0..size {
            pos.y = terrain.sample_height(pos.x, pos.z);
            out.push(Candidate { position: pos, index: GridIndex { x, z } });
            pos += left;
        }
        row_origin += forward;
    }
    out
}
