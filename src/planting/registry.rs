// src/planting/registry.rs
//! Data-driven plant templates + loader.

use bevy::asset::{io::Reader, AssetLoader, LoadContext};
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::core::{Layer, PlantArchetypeId};

// ---------- Public plugin to register asset+loader ----------

pub struct PlantRegistryAssetPlugin;

impl Plugin for PlantRegistryAssetPlugin {
    fn build(&self, app: &mut App) {
        app.init_asset::<PlantRegistry>()
            .register_asset_loader(PlantRegistryLoader);
    }
}

// ---------- Prefab parts (data form) ----------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ShapeDef {
    Sphere { radius: f32 },
    Cylinder { radius: f32, height: f32 },
    Cuboid { size: [f32; 3] },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaterialDef {
    pub base_color: [f32; 4],
    /// Animated surface ripple (wind sway on leaves).
    #[serde(default)]
    pub ripple_distance: f32,
    /// Animated value noise on the surface.
    #[serde(default)]
    pub value_noise: f32,
}

/// Non-visual behaviour attached to a prefab part.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BehaviourDef {
    Collider { radius: f32 },
    RigidBody { mass: f32 },
    Joint { anchor: [f32; 3] },
    TerrainModifier { radius: f32 },
    GuidePoint,
    Light { color: [f32; 3], intensity: f32, range: f32 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartDef {
    pub name: String,
    pub shape: ShapeDef,
    /// Local offset from the plant root.
    #[serde(default)]
    pub offset: [f32; 3],
    #[serde(default)]
    pub material: Option<MaterialDef>,
    #[serde(default = "default_part_layer")]
    pub layer: Layer,
    #[serde(default = "default_true")]
    pub cast_shadows: bool,
    /// Only shown on previews (e.g. a footprint ring); disabled on real instances.
    #[serde(default)]
    pub ghost_only: bool,
    #[serde(default)]
    pub behaviours: Vec<BehaviourDef>,
}

fn default_part_layer() -> Layer {
    Layer::Piece
}
fn default_true() -> bool {
    true
}

// ---------- Plant template (data form) ----------

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceCost {
    pub item: String,
    pub amount: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlantDef {
    /// Unique human-readable name (used for lookup).
    pub name: String,

    /// Spacing radius between like plants. Templates without one never batch.
    #[serde(default)]
    pub grow_radius: Option<f32>,

    /// Materials consumed per placement.
    #[serde(default)]
    pub cost: Vec<ResourceCost>,

    /// Can only be placed on cultivated (hoed) ground.
    #[serde(default)]
    pub cultivated_only: bool,

    /// Repair "pieces" have no preview.
    #[serde(default)]
    pub repair: bool,

    /// Effect played on each placement.
    #[serde(default)]
    pub place_effect: Option<String>,

    #[serde(default)]
    pub parts: Vec<PartDef>,
}

impl PlantDef {
    /// Footprint radius used for grid spacing and occupancy checks.
    #[inline]
    pub fn footprint(&self) -> Option<f32> {
        self.grow_radius.filter(|r| *r > 0.0)
    }

    #[inline]
    pub fn is_batchable(&self) -> bool {
        self.footprint().is_some()
    }

    /// Largest collider of any part, with that part's layer.
    pub fn collision_extent(&self) -> Option<(f32, Layer)> {
        let mut best: Option<(f32, Layer)> = None;
        for part in &self.parts {
            for b in &part.behaviours {
                if let BehaviourDef::Collider { radius } = b {
                    let reach = Vec3::from(part.offset).length() + *radius;
                    if best.is_none_or(|(r, _)| reach > r) {
                        best = Some((reach, part.layer));
                    }
                }
            }
        }
        best
    }
}

// ---------- Runtime registry asset ----------

#[derive(Asset, TypePath, Clone, Debug, Default)]
pub struct PlantRegistry {
    /// Ordered list; index in this vector is the `PlantArchetypeId.0`.
    pub plants: Vec<PlantDef>,
    /// Name → index for quick lookups.
    pub name_to_index: HashMap<String, u32>,
}

impl PlantRegistry {
    /// Validate and index a list of templates.
    pub fn from_defs(defs: Vec<PlantDef>) -> Result<Self, PlantRegistryLoadError> {
        let mut name_to_index = HashMap::with_capacity(defs.len());
        for (i, def) in defs.iter().enumerate() {
            if let Some(r) = def.grow_radius {
                if !(r > 0.0 && r.is_finite()) {
                    return Err(PlantRegistryLoadError::InvalidRadius { name: def.name.clone(), radius: r });
                }
            }
            if let Some(prev) = name_to_index.insert(def.name.clone(), i as u32) {
                return Err(PlantRegistryLoadError::DuplicateName {
                    name: def.name.clone(),
                    first: prev,
                    second: i as u32,
                });
            }
        }
        Ok(Self { plants: defs, name_to_index })
    }

    pub fn from_ron_bytes(bytes: &[u8]) -> Result<Self, PlantRegistryLoadError> {
        let defs: Vec<PlantDef> =
            ron::de::from_bytes(bytes).map_err(|e| PlantRegistryLoadError::Ron(e.to_string()))?;
        Self::from_defs(defs)
    }

    pub fn index_of(&self, name: &str) -> Option<PlantArchetypeId> {
        self.name_to_index.get(name).map(|&i| PlantArchetypeId(i))
    }

    pub fn get(&self, id: PlantArchetypeId) -> Option<&PlantDef> {
        self.plants.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.plants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plants.is_empty()
    }
}

/// The registry the planting systems read; a copy of the loaded asset.
#[derive(Resource, Clone, Debug, Default, Deref)]
pub struct PlantCatalog(pub PlantRegistry);

// ---------- Asset loader for `.plants.ron` ----------

#[derive(Default)]
pub struct PlantRegistryLoader;

impl AssetLoader for PlantRegistryLoader {
    type Asset = PlantRegistry;
    type Settings = ();
    type Error = PlantRegistryLoadError;

    fn extensions(&self) -> &[&str] {
        &["plants.ron"]
    }

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        _load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes).await?;
        PlantRegistry::from_ron_bytes(&bytes)
    }
}

// ---------- Loader errors ----------

#[derive(thiserror::Error, Debug)]
pub enum PlantRegistryLoadError {
    #[error("I/O while reading plant registry: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(String),
    #[error("Duplicate plant name '{name}' (first idx {first}, second idx {second})")]
    DuplicateName { name: String, first: u32, second: u32 },
    #[error("Plant '{name}' has invalid grow radius {radius}")]
    InvalidRadius { name: String, radius: f32 },
}
