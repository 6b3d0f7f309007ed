//! What the host game does on its own: single placements, hoeing, stamina, effects.

use bevy::prelude::*;

use mass_farming::actions::{ActionState, PlayerAction};
use mass_farming::heightmap_data::Heightmap;
use mass_farming::planter::{BuildStats, EquippedTool, Inventory, Occupant, Planter, Stamina};
use mass_farming::planting::core::{Feedback, PlacementContext, PlantArchetypeId, TerrainOracle};
use mass_farming::planting::occupancy::has_grow_space;
use mass_farming::planting::plugin::{FeedbackEvent, PlacementCommitted, PlacementGhost, PlacementGhostReset};
use mass_farming::planting::registry::PlantCatalog;
use mass_farming::planting::systems::{spawn_plant, OccupancySnapshot};

use super::setup::SandboxSettings;

/// Hoe radius in meters.
pub const HOE_RADIUS: f32 = 1.0;
/// How long the stamina bar flashes after running dry.
pub const NO_STAMINA_FLASH_SECS: f32 = 0.6;

/// Set when a NoStamina feedback arrives; the HUD reads it.
#[derive(Resource, Default)]
pub struct StaminaFlash(pub Timer);

/// Short-lived effect entity.
#[derive(Component)]
pub struct Lifetime(pub Timer);

/// Tab cycles the selection; the first catalog load selects the starting plant.
pub fn select_plant(
    action_state: Res<ActionState>,
    settings: Res<SandboxSettings>,
    catalog: Res<PlantCatalog>,
    mut ghost: ResMut<PlacementGhost>,
    mut resets: EventWriter<PlacementGhostReset>,
) {
    if catalog.is_empty() {
        return;
    }
    let count = catalog.len() as u32;
    let next = match ghost.selected {
        None => Some(catalog.index_of(&settings.starting_plant).unwrap_or(PlantArchetypeId(0))),
        Some(PlantArchetypeId(i)) if i >= count => Some(PlantArchetypeId(0)),
        Some(PlantArchetypeId(i)) if action_state.pressed(PlayerAction::NextPlant) => {
            Some(PlantArchetypeId((i + 1) % count))
        }
        Some(_) => None,
    };
    if let Some(id) = next {
        ghost.selected = Some(id);
        resets.write(PlacementGhostReset);
        if let Some(def) = catalog.get(id) {
            info!("Sandbox: selected '{}'", def.name);
        }
    }
}

/// Left click: place one plant under the ghost, the way the game always does, then
/// report the commit so mass planting can follow up.
#[allow(clippy::too_many_arguments)]
pub fn place_single_plant(
    mut commands: Commands,
    action_state: Res<ActionState>,
    ghost: Res<PlacementGhost>,
    catalog: Res<PlantCatalog>,
    heightmap: Res<Heightmap>,
    occupants: Query<(&Transform, &Occupant)>,
    mut planters: Query<(&Planter, &mut Stamina, &mut Inventory, Option<&mut EquippedTool>, &mut BuildStats)>,
    mut commits: EventWriter<PlacementCommitted>,
    mut feedback: EventWriter<FeedbackEvent>,
) {
    if !action_state.pressed(PlayerAction::Place) || !ghost.active {
        return;
    }
    let (Some(planter_e), Some(archetype)) = (ghost.planter, ghost.selected) else { return; };
    let Some(template) = catalog.get(archetype) else { return; };
    let Ok((planter, mut stamina, mut inventory, mut tool, mut stats)) = planters.get_mut(planter_e) else { return; };

    let stamina_cost = tool.as_deref().map_or(0.0, |t| t.attack_stamina);
    let success = if tool.as_deref().is_some_and(EquippedTool::is_broken) {
        info!("Sandbox: {} is broken", tool.as_deref().map_or("tool", |t| t.name.as_str()));
        false
    } else if template.cultivated_only && !heightmap.is_cultivated(ghost.position) {
        info!("Sandbox: '{}' needs cultivated ground", template.name);
        false
    } else if !has_grow_space(&OccupancySnapshot::collect(&occupants), ghost.position, template) {
        info!("Sandbox: not enough space for '{}'", template.name);
        false
    } else if !inventory.has_all(&template.cost) {
        info!("Sandbox: missing materials for '{}'", template.name);
        false
    } else if !stamina.has(stamina_cost) {
        feedback.write(FeedbackEvent { planter: planter_e, feedback: Feedback::NoStamina });
        false
    } else {
        true
    };

    if success {
        spawn_plant(&mut commands, archetype, template, ghost.position, ghost.rotation, planter.id);
        inventory.remove_all(&template.cost);
        stamina.spend(stamina_cost);
        if let Some(tool) = tool.as_deref_mut().filter(|t| t.uses_durability) {
            tool.durability = (tool.durability - tool.durability_drain).max(0.0);
        }
        stats.builds += 1;
        if let Some(effect) = &template.place_effect {
            feedback.write(FeedbackEvent {
                planter: planter_e,
                feedback: Feedback::PlaceEffect {
                    effect: effect.clone(),
                    position: ghost.position,
                    rotation: ghost.rotation,
                },
            });
        }
    }

    commits.write(PlacementCommitted(PlacementContext {
        success,
        position: ghost.position,
        rotation: ghost.rotation,
        archetype,
        planter: planter_e,
    }));
}

/// Right click: hoe the ground under the ghost.
#[allow(clippy::too_many_arguments)]
pub fn cultivate_ground(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    action_state: Res<ActionState>,
    ghost: Res<PlacementGhost>,
    mut heightmap: ResMut<Heightmap>,
    mut planters: Query<(&mut Stamina, Option<&mut EquippedTool>)>,
    mut feedback: EventWriter<FeedbackEvent>,
) {
    if !action_state.pressed(PlayerAction::Cultivate) || !ghost.active {
        return;
    }
    let Some(planter_e) = ghost.planter else { return; };
    let Ok((mut stamina, mut tool)) = planters.get_mut(planter_e) else { return; };
    if tool.as_deref().is_some_and(EquippedTool::is_broken) {
        return;
    }
    let cost = tool.as_deref().map_or(0.0, |t| t.attack_stamina);
    if !stamina.has(cost) {
        feedback.write(FeedbackEvent { planter: planter_e, feedback: Feedback::NoStamina });
        return;
    }

    let changed = heightmap.cultivate(ghost.position, HOE_RADIUS);
    if changed == 0 {
        return;
    }
    stamina.spend(cost);
    if let Some(tool) = tool.as_deref_mut().filter(|t| t.uses_durability) {
        tool.durability = (tool.durability - tool.durability_drain).max(0.0);
    }
    debug!("Sandbox: cultivated {} samples at {:?}", changed, ghost.position);

    // Soil patch decal.
    let y = heightmap.sample_height(ghost.position.x, ghost.position.z);
    commands.spawn((
        Name::new("Soil"),
        Mesh3d(meshes.add(Cylinder::new(HOE_RADIUS, 0.04))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.30, 0.20, 0.12),
            perceptual_roughness: 1.0,
            ..Default::default()
        })),
        Transform::from_xyz(ghost.position.x, y + 0.01, ghost.position.z),
    ));
}

pub fn regen_stamina(time: Res<Time>, mut staminas: Query<&mut Stamina>) {
    for mut stamina in &mut staminas {
        stamina.recover(time.delta_secs());
    }
}

/// Present batch and single-placement feedback.
pub fn handle_feedback(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut events: EventReader<FeedbackEvent>,
    mut flash: ResMut<StaminaFlash>,
) {
    for ev in events.read() {
        match &ev.feedback {
            Feedback::NoStamina => {
                flash.0 = Timer::from_seconds(NO_STAMINA_FLASH_SECS, TimerMode::Once);
            }
            Feedback::PlaceEffect { effect, position, rotation } => {
                trace!("Sandbox: effect '{}' at {:?}", effect, position);
                commands.spawn((
                    Name::new(effect.clone()),
                    Mesh3d(meshes.add(Sphere::new(0.15))),
                    MeshMaterial3d(materials.add(StandardMaterial {
                        base_color: Color::srgba(0.85, 0.75, 0.5, 0.6),
                        alpha_mode: AlphaMode::Blend,
                        unlit: true,
                        ..Default::default()
                    })),
                    Transform::from_translation(*position + Vec3::Y * 0.2).with_rotation(*rotation),
                    Lifetime(Timer::from_seconds(0.4, TimerMode::Once)),
                ));
            }
        }
    }
}

pub fn expire_effects(
    mut commands: Commands,
    time: Res<Time>,
    mut flash: ResMut<StaminaFlash>,
    mut effects: Query<(Entity, &mut Lifetime, &mut Transform)>,
) {
    flash.0.tick(time.delta());
    for (entity, mut life, mut tf) in &mut effects {
        life.0.tick(time.delta());
        tf.scale = Vec3::splat(1.0 + life.0.fraction() * 2.0);
        if life.0.finished() {
            commands.entity(entity).despawn();
        }
    }
}
