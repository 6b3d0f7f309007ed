// src/heightmap_data.rs
use bevy::math::{UVec2, Vec2};
use bevy::prelude::*;
use image::GrayImage;
use std::path::Path;

use crate::planting::core::TerrainOracle;

/// Terrain heights on a regular grid plus a per-sample "cultivated" flag.
#[derive(Resource, Clone)]
pub struct Heightmap {
    /// Size of the entire terrain in world units (X,Z)
    pub size: Vec2,
    /// World-space origin of the terrain (min corner)
    pub origin: Vec2,
    /// Samples per axis (>= 2)
    pub resolution: UVec2,
    /// Row-major heights in world units
    heights: Vec<f32>,
    /// Row-major, same layout as `heights`
    cultivated: Vec<bool>,
}

impl Heightmap {
    /// Build from a height function over world XZ, centered on (0,0).
    pub fn from_fn(size: Vec2, resolution: UVec2, f: impl Fn(f32, f32) -> f32) -> Self {
        let res = resolution.max(UVec2::splat(2));
        let origin = -size * 0.5;
        let step = size / (res - UVec2::ONE).as_vec2();

        let mut heights = Vec::with_capacity((res.x * res.y) as usize);
        for j in 0..res.y {
            for i in 0..res.x {
                let x = origin.x + i as f32 * step.x;
                let z = origin.y + j as f32 * step.y;
                heights.push(f(x, z));
            }
        }

        Self {
            size,
            origin,
            resolution: res,
            cultivated: vec![false; heights.len()],
            heights,
        }
    }

    pub fn flat(size: Vec2, resolution: UVec2, height: f32) -> Self {
        Self::from_fn(size, resolution, |_, _| height)
    }

    /// Grayscale image → heights in `0..=height_scale`, centered on (0,0).
    pub fn from_luma(img: &GrayImage, size: Vec2, height_scale: f32) -> Result<Self, HeightmapError> {
        if img.width() < 2 || img.height() < 2 {
            return Err(HeightmapError::TooSmall { width: img.width(), height: img.height() });
        }
        let resolution = UVec2::new(img.width(), img.height());
        let mut map = Self::flat(size, resolution, 0.0);
        for (i, px) in img.pixels().enumerate() {
            map.heights[i] = px[0] as f32 / 255.0 * height_scale;
        }
        Ok(map)
    }

    pub fn load_png(path: impl AsRef<Path>, size: Vec2, height_scale: f32) -> Result<Self, HeightmapError> {
        let img = image::open(path.as_ref())?.to_luma8();
        let map = Self::from_luma(&img, size, height_scale)?;
        info!(
            "Heightmap: loaded '{}' ({}x{} samples over {}x{} m)",
            path.as_ref().display(),
            map.resolution.x,
            map.resolution.y,
            size.x,
            size.y
        );
        Ok(map)
    }

    #[inline]
    fn step(&self) -> Vec2 {
        self.size / (self.resolution - UVec2::ONE).as_vec2()
    }

    #[inline]
    fn index(&self, i: u32, j: u32) -> usize {
        (j * self.resolution.x + i) as usize
    }

    #[inline]
    pub fn contains(&self, x: f32, z: f32) -> bool {
        let lx = x - self.origin.x;
        let lz = z - self.origin.y;
        lx >= 0.0 && lz >= 0.0 && lx <= self.size.x && lz <= self.size.y
    }

    /// Nearest sample to world XZ, if inside the terrain.
    pub fn nearest_sample(&self, x: f32, z: f32) -> Option<(u32, u32)> {
        if !self.contains(x, z) {
            return None;
        }
        let step = self.step();
        let i = (((x - self.origin.x) / step.x).round() as u32).min(self.resolution.x - 1);
        let j = (((z - self.origin.y) / step.y).round() as u32).min(self.resolution.y - 1);
        Some((i, j))
    }

    /// Bilinear height at world XZ. Returns None outside the terrain.
    pub fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        if !self.contains(x, z) {
            return None;
        }
        let step = self.step();
        let fx = (x - self.origin.x) / step.x;
        let fz = (z - self.origin.y) / step.y;

        let max_x = self.resolution.x - 1;
        let max_z = self.resolution.y - 1;
        let x0 = (fx.floor() as u32).min(max_x);
        let z0 = (fz.floor() as u32).min(max_z);
        let x1 = (x0 + 1).min(max_x);
        let z1 = (z0 + 1).min(max_z);
        let dx = fx - x0 as f32;
        let dz = fz - z0 as f32;

        let s00 = self.heights[self.index(x0, z0)];
        let s10 = self.heights[self.index(x1, z0)];
        let s01 = self.heights[self.index(x0, z1)];
        let s11 = self.heights[self.index(x1, z1)];

        let a = s00 * (1.0 - dx) + s10 * dx;
        let b = s01 * (1.0 - dx) + s11 * dx;
        Some(a * (1.0 - dz) + b * dz)
    }

    /// Hoe the ground: mark every sample within `radius` of `center` as cultivated.
    /// Returns how many samples changed.
    pub fn cultivate(&mut self, center: Vec3, radius: f32) -> usize {
        let step = self.step();
        let r2 = radius * radius;
        let span_x = (radius / step.x).ceil() as i64;
        let span_z = (radius / step.y).ceil() as i64;
        let Some((ci, cj)) = self.nearest_sample(center.x, center.z) else {
            return 0;
        };

        let mut changed = 0;
        for dj in -span_z..=span_z {
            for di in -span_x..=span_x {
                let i = ci as i64 + di;
                let j = cj as i64 + dj;
                if i < 0 || j < 0 || i >= self.resolution.x as i64 || j >= self.resolution.y as i64 {
                    continue;
                }
                let wx = self.origin.x + i as f32 * step.x;
                let wz = self.origin.y + j as f32 * step.y;
                let d2 = (wx - center.x) * (wx - center.x) + (wz - center.z) * (wz - center.z);
                if d2 > r2 {
                    continue;
                }
                let idx = self.index(i as u32, j as u32);
                if !self.cultivated[idx] {
                    self.cultivated[idx] = true;
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Row-major sample heights, for meshing.
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }
}

impl TerrainOracle for Heightmap {
    fn covers(&self, position: Vec3) -> bool {
        self.contains(position.x, position.z)
    }

    fn sample_height(&self, x: f32, z: f32) -> f32 {
        // Off-map cells fall back to sea level, like the old tile sampler did.
        self.height_at(x, z).unwrap_or(0.0)
    }

    fn is_cultivated(&self, position: Vec3) -> bool {
        self.nearest_sample(position.x, position.z)
            .map(|(i, j)| self.cultivated[self.index(i, j)])
            .unwrap_or(false)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum HeightmapError {
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("heightmap must be at least 2x2 samples, got {width}x{height}")]
    TooSmall { width: u32, height: u32 },
}
