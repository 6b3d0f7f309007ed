//! Meshes, materials and lights for planted objects and preview proxies.
//! Kept out of `MassFarmingPlugin` so the planting logic runs headless.

use bevy::pbr::NotShadowCaster;
use bevy::prelude::*;

use super::ghost::ProxyPart;
use super::plugin::MassFarmingSet;
use super::registry::{BehaviourDef, MaterialDef, PartDef, PlantCatalog, PlantDef, ShapeDef};
use super::systems::PreviewProxy;
use crate::planter::PlantInstance;

/// Preview proxies are drawn at this opacity.
const GHOST_ALPHA: f32 = 0.45;

pub struct PlantVisualsPlugin;

impl Plugin for PlantVisualsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (attach_plant_visuals, attach_proxy_visuals).after(MassFarmingSet::Preview),
        );
    }
}

fn shape_mesh(shape: &ShapeDef) -> Mesh {
    match *shape {
        ShapeDef::Sphere { radius } => Sphere::new(radius).into(),
        ShapeDef::Cylinder { radius, height } => Cylinder::new(radius, height).into(),
        ShapeDef::Cuboid { size: [x, y, z] } => Cuboid::new(x, y, z).into(),
    }
}

fn color_of(material: Option<&MaterialDef>) -> Color {
    material.map_or(Color::srgb(0.4, 0.6, 0.3), |m| {
        let [r, g, b, a] = m.base_color;
        Color::srgba(r, g, b, a)
    })
}

/// Parts a planted instance shows. Ghost-only parts belong to the preview.
fn instance_parts(template: &PlantDef) -> impl Iterator<Item = &PartDef> {
    template.parts.iter().filter(|p| !p.ghost_only)
}

/// Real plants: one child per non-ghost part, plus any lights the parts carry.
pub fn attach_plant_visuals(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    catalog: Res<PlantCatalog>,
    added: Query<(Entity, &PlantInstance), Added<PlantInstance>>,
) {
    for (entity, plant) in &added {
        let Some(template) = catalog.get(plant.archetype) else {
            warn!("MassFarming: no template for {:?}, plant left invisible", plant.archetype);
            continue;
        };

        for part in instance_parts(template) {
            let mesh_h = meshes.add(shape_mesh(&part.shape));
            let mat_h = materials.add(StandardMaterial {
                base_color: color_of(part.material.as_ref()),
                perceptual_roughness: 0.8,
                ..Default::default()
            });

            let mut child = commands.spawn((
                Name::new(part.name.clone()),
                Mesh3d(mesh_h),
                MeshMaterial3d(mat_h),
                Transform::from_translation(Vec3::from(part.offset)),
                Visibility::Inherited,
                ChildOf(entity),
            ));
            if !part.cast_shadows {
                child.insert(NotShadowCaster);
            }
            spawn_part_lights(&mut commands, entity, part);
        }
    }
}

fn spawn_part_lights(commands: &mut Commands, parent: Entity, part: &PartDef) {
    for b in &part.behaviours {
        if let BehaviourDef::Light { color: [r, g, b], intensity, range } = *b {
            commands.spawn((
                PointLight { color: Color::srgb(r, g, b), intensity, range, ..default() },
                Transform::from_translation(Vec3::from(part.offset)),
                ChildOf(parent),
            ));
        }
    }
}

/// Preview proxies: translucent, shadowless copies of the blueprint parts.
pub fn attach_proxy_visuals(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    added: Query<(Entity, &PreviewProxy), Added<PreviewProxy>>,
) {
    for (entity, proxy) in &added {
        for part in &proxy.blueprint.parts {
            spawn_proxy_part(&mut commands, &mut meshes, &mut materials, entity, part);
        }
    }
}

fn spawn_proxy_part(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    parent: Entity,
    part: &ProxyPart,
) {
    let base = color_of(part.material.as_ref());
    let mat_h = materials.add(StandardMaterial {
        base_color: base.with_alpha(GHOST_ALPHA),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..Default::default()
    });

    let mut child = commands.spawn((
        Name::new(part.name.clone()),
        Mesh3d(meshes.add(shape_mesh(&part.shape))),
        MeshMaterial3d(mat_h),
        Transform::from_translation(part.offset),
        Visibility::Inherited,
        ChildOf(parent),
    ));
    if !part.cast_shadows {
        child.insert(NotShadowCaster);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planting::core::{Layer, PlantArchetypeId};
    use crate::planting::ghost::strip_for_preview;

    fn part(name: &str, ghost_only: bool) -> PartDef {
        PartDef {
            name: name.into(),
            shape: ShapeDef::Sphere { radius: 0.2 },
            offset: [0.0, 0.2, 0.0],
            material: None,
            layer: Layer::Piece,
            cast_shadows: true,
            ghost_only,
            behaviours: Vec::new(),
        }
    }

    #[test]
    fn footprint_ring_only_shows_on_the_preview() {
        let plant = PlantDef {
            name: "onion".into(),
            grow_radius: Some(0.5),
            cost: Vec::new(),
            cultivated_only: false,
            repair: false,
            place_effect: None,
            parts: vec![part("bulb", false), part("footprint_ring", true), part("leaves", false)],
        };

        let planted: Vec<_> = instance_parts(&plant).map(|p| p.name.as_str()).collect();
        assert_eq!(planted, ["bulb", "leaves"]);

        let proxy = strip_for_preview(PlantArchetypeId(0), &plant);
        let previewed: Vec<_> = proxy.parts.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(previewed, ["bulb", "footprint_ring", "leaves"]);
    }
}
