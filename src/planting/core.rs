// src/planting/core.rs
//! Core types/traits for grid planting.
//! Host services (terrain, overlap queries, player state, spawning) only appear here as traits,
//! so everything in `grid`, `occupancy`, `executor` and `preview` runs without an ECS world.

use bevy::prelude::*; // Vec3, Quat, Entity
use serde::{Deserialize, Serialize};

use super::registry::PlantDef;

// ---------- Ids ----------

/// Index of a plant template in the catalog (stable during a session).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlantArchetypeId(pub u32);

/// Identity of the acting player. Stamped on planted instances as their creator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u64);

// ---------- Layers ----------

/// Collision layer of an occupying body.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    #[default]
    Default,
    StaticSolid,
    DefaultSmall,
    Piece,
    PieceNonsolid,
    Terrain,
    Ghost,
}

impl Layer {
    #[inline]
    pub const fn mask(self) -> LayerMask {
        LayerMask(1 << self as u32)
    }
}

/// Bitmask of layers (fast filter), same shape as the biome masks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: Self = Self(0);

    #[inline]
    pub const fn with(self, layer: Layer) -> Self {
        Self(self.0 | layer.mask().0)
    }

    #[inline]
    pub const fn contains(self, layer: Layer) -> bool {
        (self.0 & layer.mask().0) != 0
    }
}

/// Layers that block a plant from growing: anything solid, built, or small clutter.
pub const PLANT_SPACE_MASK: LayerMask = LayerMask::NONE
    .with(Layer::Default)
    .with(Layer::StaticSolid)
    .with(Layer::DefaultSmall)
    .with(Layer::Piece)
    .with(Layer::PieceNonsolid);

// ---------- Placement I/O ----------

/// One committed single placement, as reported by the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacementContext {
    pub success: bool,
    pub position: Vec3,
    pub rotation: Quat,
    pub archetype: PlantArchetypeId,
    /// Player entity that placed the original plant.
    pub planter: Entity,
}

/// Grid layout parameters, derived fresh for every batch or preview tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridSpec {
    pub origin: Vec3,
    pub rotation: Quat,
    /// Distance between neighbouring cells (meters).
    pub spacing: f32,
    /// Cells per side.
    pub size: u32,
}

impl GridSpec {
    pub const fn new(origin: Vec3, rotation: Quat, spacing: f32, size: u32) -> Self {
        Self { origin, rotation, spacing, size }
    }

    /// Cells are spaced so neighbouring footprints just touch.
    pub fn for_footprint(origin: Vec3, rotation: Quat, footprint_radius: f32, size: u32) -> Self {
        Self::new(origin, rotation, footprint_radius * 2.0, size)
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        (self.size as usize) * (self.size as usize)
    }
}

/// Row/column of a candidate (x = row along forward, z = column along left).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridIndex {
    pub x: u32,
    pub z: u32,
}

/// A height-corrected grid cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    pub position: Vec3,
    pub index: GridIndex,
}

/// Horizontal tolerance for "this cell is the original placement".
pub const ORIGIN_EPSILON: f32 = 1e-3;

/// True when `cell` sits on `origin` in the XZ plane. Height is ignored: the cell is
/// re-sampled from the terrain while the origin comes from the host's own ghost.
#[inline]
pub fn is_origin_cell(cell: Vec3, origin: Vec3) -> bool {
    let d = Vec2::new(cell.x - origin.x, cell.z - origin.z);
    d.length_squared() < ORIGIN_EPSILON * ORIGIN_EPSILON
}

/// Stamina and durability numbers of the equipped tool.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ToolUse {
    pub stamina_cost: f32,
    pub uses_durability: bool,
    pub durability_drain: f32,
}

/// Player-facing side effects the core asks the host to play.
#[derive(Clone, Debug, PartialEq)]
pub enum Feedback {
    /// Flash the stamina bar; the batch stopped for lack of stamina.
    NoStamina,
    /// Visual/sound effect for one planted cell.
    PlaceEffect { effect: String, position: Vec3, rotation: Quat },
}

// ---------- Traits: host services ----------

/// Terrain height + cultivation oracle.
pub trait TerrainOracle {
    /// Whether terrain data exists at this position at all.
    fn covers(&self, position: Vec3) -> bool;
    /// Ground height (Y) at world XZ.
    fn sample_height(&self, x: f32, z: f32) -> f32;
    fn is_cultivated(&self, position: Vec3) -> bool;
}

/// Overlap queries against occupying bodies.
pub trait SpatialOracle {
    /// Number of bodies on `layers` within `radius` of `position`.
    fn overlap_count(&self, position: Vec3, radius: f32, layers: LayerMask) -> usize;
}

/// The acting player's stamina, inventory, tool and statistics.
pub trait PlayerResources {
    fn actor(&self) -> ActorId;
    fn equipped_tool(&self) -> Option<ToolUse>;
    fn has_stamina(&self, amount: f32) -> bool;
    fn consume_stamina(&mut self, amount: f32);
    fn has_requirements(&self, template: &PlantDef) -> bool;
    fn consume_resources(&mut self, template: &PlantDef);
    /// Drains the equipped tool and returns the durability left.
    fn drain_tool_durability(&mut self, amount: f32) -> f32;
    fn record_build(&mut self);
}

/// Creates real plant instances.
pub trait ObjectSpawner {
    fn instantiate(
        &mut self,
        archetype: PlantArchetypeId,
        template: &PlantDef,
        position: Vec3,
        rotation: Quat,
        creator: ActorId,
    );
}

pub trait FeedbackSink {
    fn play(&mut self, feedback: Feedback);
}

/// The held batch-action modifier.
pub trait CapabilityInput {
    fn is_capability_key_held(&self) -> bool;
}

/// Everything a batch needs from the host in one borrow.
pub trait PlantingHost:
    TerrainOracle + SpatialOracle + PlayerResources + ObjectSpawner + FeedbackSink
{
}

impl<T> PlantingHost for T where
    T: TerrainOracle + SpatialOracle + PlayerResources + ObjectSpawner + FeedbackSink
{
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plant_space_mask_skips_ghost_and_terrain() {
        assert!(PLANT_SPACE_MASK.contains(Layer::Piece));
        assert!(PLANT_SPACE_MASK.contains(Layer::StaticSolid));
        assert!(!PLANT_SPACE_MASK.contains(Layer::Ghost));
        assert!(!PLANT_SPACE_MASK.contains(Layer::Terrain));
    }

    #[test]
    fn origin_cell_ignores_height() {
        let origin = Vec3::new(10.0, 2.0, -4.0);
        assert!(is_origin_cell(Vec3::new(10.0, 7.5, -4.0), origin));
        assert!(is_origin_cell(Vec3::new(10.0002, 2.0, -4.0001), origin));
        assert!(!is_origin_cell(Vec3::new(10.5, 2.0, -4.0), origin));
    }

    #[test]
    fn footprint_spacing_is_twice_the_radius() {
        let spec = GridSpec::for_footprint(Vec3::ZERO, Quat::IDENTITY, 0.75, 4);
        assert_eq!(spec.spacing, 1.5);
        assert_eq!(spec.cell_count(), 16);
    }
}
