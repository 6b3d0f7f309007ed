// src/planting/ghost.rs
//! Preview ("ghost") blueprints: a plant prefab stripped down to inert visuals.

use bevy::prelude::*;

use super::core::{Layer, PlantArchetypeId};
use super::registry::{MaterialDef, PlantDef, ShapeDef};

/// One visual part of a preview proxy.
#[derive(Clone, Debug, PartialEq)]
pub struct ProxyPart {
    pub name: String,
    pub shape: ShapeDef,
    pub offset: Vec3,
    /// Own copy, never the template's.
    pub material: Option<MaterialDef>,
    pub layer: Layer,
    pub cast_shadows: bool,
}

/// Everything needed to spawn one preview proxy. Carries no creator, collider or
/// instance identity, so spawning it registers nothing with the world.
#[derive(Clone, Debug, PartialEq)]
pub struct ProxyBlueprint {
    pub archetype: PlantArchetypeId,
    pub name: String,
    pub parts: Vec<ProxyPart>,
}

/// Clone `template` into a preview blueprint.
///
/// Every behaviour is dropped (colliders and lights included), every part moves to the
/// ghost layer, materials are copied with their ripple/noise animation zeroed and shadows
/// are off. Ghost-only parts are kept, so the proxy shows them while real plants don't.
pub fn strip_for_preview(archetype: PlantArchetypeId, template: &PlantDef) -> ProxyBlueprint {
    let parts = template
        .parts
        .iter()
        .map(|part| {
            let dropped = part.behaviours.len();
            if dropped > 0 {
                trace!("ghost '{}': stripped {} behaviours from '{}'", template.name, dropped, part.name);
            }
            ProxyPart {
                name: part.name.clone(),
                shape: part.shape.clone(),
                offset: Vec3::from(part.offset),
                material: part.material.as_ref().map(still_material),
                layer: Layer::Ghost,
                cast_shadows: false,
            }
        })
        .collect();

    ProxyBlueprint { archetype, name: template.name.clone(), parts }
}

fn still_material(src: &MaterialDef) -> MaterialDef {
    MaterialDef { ripple_distance: 0.0, value_noise: 0.0, ..src.clone() }
}
