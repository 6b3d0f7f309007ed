//! ECS side of mass planting: adapters that let the core talk to the world,
//! plus the systems the plugin schedules.

use bevy::prelude::*;

use super::core::{
    ActorId, CapabilityInput, Feedback, FeedbackSink, LayerMask, ObjectSpawner, PlantArchetypeId, PlayerResources,
    SpatialOracle, TerrainOracle, ToolUse,
};
use super::executor::{BatchOutcome, PlacementExecutor};
use super::ghost::ProxyBlueprint;
use super::plugin::{FeedbackEvent, PlacementCommitted, PlacementGhost, PlacementGhostReset, PreviewPool};
use super::preview::{AimTarget, PreviewTick, ProxyHost};
use super::registry::{PlantCatalog, PlantDef};
use crate::actions::ActionState;
use crate::config::MassFarmingConfig;
use crate::heightmap_data::Heightmap;
use crate::planter::{BuildStats, EquippedTool, Inventory, Occupant, PlantInstance, Planter, Stamina};

/// A preview proxy entity. Visuals are attached from the blueprint.
#[derive(Component, Clone, Debug)]
pub struct PreviewProxy {
    pub blueprint: ProxyBlueprint,
}

/// Spawn one real plant. Shared by batch planting and the host's single placement.
pub fn spawn_plant(
    commands: &mut Commands,
    archetype: PlantArchetypeId,
    template: &PlantDef,
    position: Vec3,
    rotation: Quat,
    creator: ActorId,
) -> Entity {
    let mut entity = commands.spawn((
        Name::new(template.name.clone()),
        PlantInstance { archetype, creator },
        Transform::from_translation(position).with_rotation(rotation),
        Visibility::default(),
    ));
    if let Some((radius, layer)) = template.collision_extent() {
        entity.insert(Occupant { radius, layer });
    }
    entity.id()
}

// ---------- Batch adapter ----------

/// Occupying bodies copied out of the world, queryable without holding a borrow.
#[derive(Clone, Debug, Default)]
pub struct OccupancySnapshot {
    bodies: Vec<(Vec3, Occupant)>,
}

impl OccupancySnapshot {
    pub fn collect<'a>(occupants: impl IntoIterator<Item = (&'a Transform, &'a Occupant)>) -> Self {
        Self { bodies: occupants.into_iter().map(|(tf, occ)| (tf.translation, *occ)).collect() }
    }

    pub fn push(&mut self, position: Vec3, occupant: Occupant) {
        self.bodies.push((position, occupant));
    }
}

impl SpatialOracle for OccupancySnapshot {
    fn overlap_count(&self, position: Vec3, radius: f32, layers: LayerMask) -> usize {
        self.bodies
            .iter()
            .filter(|(_, occ)| layers.contains(occ.layer))
            .filter(|(at, occ)| at.distance(position) < radius + occ.radius)
            .count()
    }
}

struct SpawnRequest {
    archetype: PlantArchetypeId,
    position: Vec3,
    rotation: Quat,
    creator: ActorId,
}

/// One player's view of the world for the length of a batch. Spawns and feedback
/// are buffered and applied after the batch; buffered plants already occupy space.
struct BatchWorld<'a> {
    terrain: &'a Heightmap,
    bodies: OccupancySnapshot,
    actor: ActorId,
    stamina: &'a mut Stamina,
    inventory: &'a mut Inventory,
    tool: Option<&'a mut EquippedTool>,
    stats: &'a mut BuildStats,
    spawned: Vec<SpawnRequest>,
    feedback: Vec<Feedback>,
}

impl TerrainOracle for BatchWorld<'_> {
    fn covers(&self, position: Vec3) -> bool {
        self.terrain.covers(position)
    }
    fn sample_height(&self, x: f32, z: f32) -> f32 {
        self.terrain.sample_height(x, z)
    }
    fn is_cultivated(&self, position: Vec3) -> bool {
        self.terrain.is_cultivated(position)
    }
}

impl SpatialOracle for BatchWorld<'_> {
    fn overlap_count(&self, position: Vec3, radius: f32, layers: LayerMask) -> usize {
        self.bodies.overlap_count(position, radius, layers)
    }
}

impl PlayerResources for BatchWorld<'_> {
    fn actor(&self) -> ActorId {
        self.actor
    }
    fn equipped_tool(&self) -> Option<ToolUse> {
        self.tool.as_deref().map(EquippedTool::usage)
    }
    fn has_stamina(&self, amount: f32) -> bool {
        self.stamina.has(amount)
    }
    fn consume_stamina(&mut self, amount: f32) {
        self.stamina.spend(amount);
    }
    fn has_requirements(&self, template: &PlantDef) -> bool {
        self.inventory.has_all(&template.cost)
    }
    fn consume_resources(&mut self, template: &PlantDef) {
        self.inventory.remove_all(&template.cost);
    }
    fn drain_tool_durability(&mut self, amount: f32) -> f32 {
        match self.tool.as_deref_mut() {
            Some(tool) => {
                tool.durability = (tool.durability - amount).max(0.0);
                tool.durability
            }
            None => f32::INFINITY,
        }
    }
    fn record_build(&mut self) {
        self.stats.builds += 1;
    }
}

impl ObjectSpawner for BatchWorld<'_> {
    fn instantiate(
        &mut self,
        archetype: PlantArchetypeId,
        template: &PlantDef,
        position: Vec3,
        rotation: Quat,
        creator: ActorId,
    ) {
        if let Some((radius, layer)) = template.collision_extent() {
            self.bodies.push(position, Occupant { radius, layer });
        }
        self.spawned.push(SpawnRequest { archetype, position, rotation, creator });
    }
}

impl FeedbackSink for BatchWorld<'_> {
    fn play(&mut self, feedback: Feedback) {
        self.feedback.push(feedback);
    }
}

// ---------- Preview adapter ----------

struct ProxyCommands<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
}

impl ProxyHost for ProxyCommands<'_, '_, '_> {
    type Handle = Entity;

    fn spawn_proxy(&mut self, blueprint: &ProxyBlueprint, at: Vec3) -> Entity {
        self.commands
            .spawn((
                Name::new(format!("{} (preview)", blueprint.name)),
                PreviewProxy { blueprint: blueprint.clone() },
                Transform::from_translation(at),
                Visibility::Hidden,
            ))
            .id()
    }

    fn despawn_proxy(&mut self, proxy: Entity) {
        if let Ok(mut e) = self.commands.get_entity(proxy) {
            e.try_despawn();
        }
    }

    fn set_proxy_active(&mut self, proxy: Entity, active: bool) {
        let visibility = if active { Visibility::Inherited } else { Visibility::Hidden };
        if let Ok(mut e) = self.commands.get_entity(proxy) {
            e.try_insert(visibility);
        }
    }

    fn place_proxy(&mut self, proxy: Entity, position: Vec3, rotation: Quat) {
        if let Ok(mut e) = self.commands.get_entity(proxy) {
            e.try_insert(Transform::from_translation(position).with_rotation(rotation));
        }
    }
}

// ---------- Systems ----------

/// Capture: remember the latest commit. Older unconsumed commits are overwritten.
pub fn capture_placement_commits(
    mut events: EventReader<PlacementCommitted>,
    mut executor: ResMut<PlacementExecutor>,
) {
    for ev in events.read() {
        executor.record_commit(ev.0);
    }
}

/// Execute: consume the pending commit and plant the rest of the grid.
#[allow(clippy::too_many_arguments)]
pub fn run_mass_placement(
    mut commands: Commands,
    mut executor: ResMut<PlacementExecutor>,
    config: Res<MassFarmingConfig>,
    catalog: Res<PlantCatalog>,
    actions: Res<ActionState>,
    terrain: Option<Res<Heightmap>>,
    occupants: Query<(&Transform, &Occupant)>,
    mut planters: Query<(&Planter, &mut Stamina, &mut Inventory, Option<&mut EquippedTool>, &mut BuildStats)>,
    mut feedback: EventWriter<FeedbackEvent>,
) {
    let Some(ctx) = executor.take_pending() else {
        return;
    };
    let Some(template) = catalog.get(ctx.archetype) else {
        warn!("MassFarming: commit for unknown archetype {:?}", ctx.archetype);
        return;
    };
    let Some(terrain) = terrain.as_deref() else {
        debug!("MassFarming: no terrain, batch skipped");
        return;
    };
    let Ok((planter, mut stamina, mut inventory, mut tool, mut stats)) = planters.get_mut(ctx.planter) else {
        warn!("MassFarming: commit from {:?} which is not a planter", ctx.planter);
        return;
    };

    let bodies = OccupancySnapshot::collect(&occupants);
    let mut world = BatchWorld {
        terrain,
        bodies,
        actor: planter.id,
        stamina: &mut stamina,
        inventory: &mut inventory,
        tool: tool.as_deref_mut(),
        stats: &mut stats,
        spawned: Vec::new(),
        feedback: Vec::new(),
    };

    let outcome = PlacementExecutor::execute(&ctx, template, &config, &*actions, &mut world);
    if let BatchOutcome::Skipped(reason) = outcome {
        trace!("MassFarming: batch not triggered ({:?})", reason);
    }

    let BatchWorld { spawned, feedback: played, .. } = world;
    for req in spawned {
        spawn_plant(&mut commands, req.archetype, template, req.position, req.rotation, req.creator);
    }
    for fx in played {
        feedback.write(FeedbackEvent { planter: ctx.planter, feedback: fx });
    }
}

/// Preview: a recreated host ghost invalidates every proxy.
pub fn reset_preview_on_ghost_change(
    mut commands: Commands,
    mut events: EventReader<PlacementGhostReset>,
    mut pool: ResMut<PreviewPool>,
) {
    if events.read().count() == 0 {
        return;
    }
    pool.destroy(&mut ProxyCommands { commands: &mut commands });
    debug!("MassFarming: preview pool reset");
}

/// Preview: move the ghost grid to follow the host ghost.
#[allow(clippy::too_many_arguments)]
pub fn update_preview_grid(
    mut commands: Commands,
    mut pool: ResMut<PreviewPool>,
    ghost: Res<PlacementGhost>,
    config: Res<MassFarmingConfig>,
    catalog: Res<PlantCatalog>,
    actions: Res<ActionState>,
    terrain: Option<Res<Heightmap>>,
    planters: Query<&Transform, With<Planter>>,
) {
    let Some(terrain) = terrain.as_deref() else {
        return;
    };

    let aim = ghost.selected.map(|archetype| {
        let template = catalog.get(archetype);
        AimTarget {
            active: ghost.active,
            position: ghost.position,
            rotation: ghost.rotation,
            archetype,
            footprint: template.and_then(PlantDef::footprint),
            template,
        }
    });
    let actor_position = ghost
        .planter
        .and_then(|e| planters.get(e).ok())
        .map_or(ghost.position, |tf| tf.translation);

    let tick = PreviewTick {
        aim,
        key_held: actions.is_capability_key_held(),
        grid_size: config.plant_grid_size,
        actor_position,
    };
    pool.tick(&tick, terrain, &mut ProxyCommands { commands: &mut commands });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::PlayerAction;
    use crate::planting::core::PlacementContext;
    use crate::planting::preview::PreviewState;
    use crate::planting::plugin::MassFarmingPlugin;
    use crate::planting::registry::PlantRegistry;
    use bevy::ecs::event::Events;
    use bevy::math::UVec2;

    const CATALOG: &str = r#"[
        (
            name: "carrot",
            grow_radius: Some(0.5),
            cost: [(item: "carrot_seeds", amount: 1)],
            parts: [
                (name: "leaves", shape: Sphere(radius: 0.2), behaviours: [Collider(radius: 0.2)]),
            ],
        ),
        (
            name: "turnip",
            grow_radius: Some(0.5),
            cost: [(item: "turnip_seeds", amount: 1)],
            cultivated_only: true,
            parts: [],
        ),
    ]"#;

    fn app(grid_size: u32) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins).add_plugins(MassFarmingPlugin);
        app.insert_resource(MassFarmingConfig { plant_grid_size: grid_size, ..default() });
        app.insert_resource(Heightmap::flat(Vec2::splat(64.0), UVec2::splat(65), 0.0));
        let registry = PlantRegistry::from_ron_bytes(CATALOG.as_bytes()).unwrap();
        app.insert_resource(PlantCatalog(registry));
        app
    }

    fn spawn_planter(app: &mut App, stamina: f32) -> Entity {
        app.world_mut()
            .spawn((
                Planter { id: ActorId(7) },
                Stamina::full(stamina, 0.0),
                Inventory::with_items([("carrot_seeds", 20), ("turnip_seeds", 20)]),
                EquippedTool::cultivator(),
                BuildStats::default(),
                Transform::default(),
            ))
            .id()
    }

    fn commit(app: &mut App, planter: Entity, archetype: PlantArchetypeId) {
        app.world_mut().resource_mut::<ActionState>().set(PlayerAction::MassAction, true);
        app.world_mut().send_event(PlacementCommitted(PlacementContext {
            success: true,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            archetype,
            planter,
        }));
        app.update();
    }

    fn plant_count(app: &mut App) -> usize {
        app.world_mut().query::<&PlantInstance>().iter(app.world()).count()
    }

    #[test]
    fn commit_plants_rest_of_grid() {
        let mut app = app(3);
        let planter = spawn_planter(&mut app, 100.0);
        commit(&mut app, planter, PlantArchetypeId(0));

        assert_eq!(plant_count(&mut app), 8);
        let world = app.world();
        assert_eq!(world.get::<Inventory>(planter).unwrap().count("carrot_seeds"), 12);
        assert_eq!(world.get::<BuildStats>(planter).unwrap().builds, 8);
        assert_eq!(world.get::<Stamina>(planter).unwrap().current, 60.0);
        assert_eq!(world.get::<EquippedTool>(planter).unwrap().durability, 192.0);
        assert!(app.world().resource::<PlacementExecutor>().pending().is_none());
    }

    #[test]
    fn spawned_plants_occupy_space() {
        let mut app = app(3);
        let planter = spawn_planter(&mut app, 100.0);
        commit(&mut app, planter, PlantArchetypeId(0));

        let mut q = app.world_mut().query::<(&PlantInstance, &Occupant)>();
        let occupants: Vec<_> = q.iter(app.world()).collect();
        assert_eq!(occupants.len(), 8);
        assert!(occupants.iter().all(|(p, o)| p.creator == ActorId(7) && (o.radius - 0.2).abs() < 1e-5));

        // Same spot again: everything but the origin is taken.
        commit(&mut app, planter, PlantArchetypeId(0));
        assert_eq!(plant_count(&mut app), 8);
    }

    #[test]
    fn released_hotkey_plants_nothing() {
        let mut app = app(3);
        let planter = spawn_planter(&mut app, 100.0);
        app.world_mut().send_event(PlacementCommitted(PlacementContext {
            success: true,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            archetype: PlantArchetypeId(0),
            planter,
        }));
        app.update();
        assert_eq!(plant_count(&mut app), 0);
    }

    #[test]
    fn exhausted_stamina_stops_and_reports() {
        let mut app = app(3);
        let planter = spawn_planter(&mut app, 12.0);
        commit(&mut app, planter, PlantArchetypeId(0));

        assert_eq!(plant_count(&mut app), 2);
        let events = app.world().resource::<Events<FeedbackEvent>>();
        let fx: Vec<_> = events.iter_current_update_events().cloned().collect();
        assert_eq!(fx, vec![FeedbackEvent { planter, feedback: Feedback::NoStamina }]);
    }

    #[test]
    fn cultivated_only_plants_need_hoed_ground() {
        let mut app = app(3);
        app.world_mut().resource_mut::<Heightmap>().cultivate(Vec3::new(0.0, 0.0, 1.0), 0.6);
        let planter = spawn_planter(&mut app, 100.0);
        commit(&mut app, planter, PlantArchetypeId(1));

        // Only the middle row's forward cell sits on the hoed patch.
        assert_eq!(plant_count(&mut app), 1);
        assert_eq!(app.world().get::<Inventory>(planter).unwrap().count("turnip_seeds"), 19);
    }

    #[test]
    fn preview_follows_ghost_while_held() {
        let mut app = app(3);
        let planter = spawn_planter(&mut app, 100.0);
        app.world_mut().resource_mut::<ActionState>().set(PlayerAction::MassAction, true);
        *app.world_mut().resource_mut::<PlacementGhost>() = PlacementGhost {
            planter: Some(planter),
            active: true,
            position: Vec3::new(4.0, 0.0, 4.0),
            rotation: Quat::IDENTITY,
            selected: Some(PlantArchetypeId(0)),
        };
        app.update();

        assert_eq!(app.world().resource::<PreviewPool>().state(), PreviewState::Active);
        let mut q = app.world_mut().query::<(&PreviewProxy, &Visibility)>();
        let proxies: Vec<_> = q.iter(app.world()).map(|(_, v)| *v).collect();
        assert_eq!(proxies.len(), 9);
        assert_eq!(proxies.iter().filter(|v| **v == Visibility::Hidden).count(), 1);
        // Proxies are not plants and take no space.
        assert_eq!(plant_count(&mut app), 0);

        app.world_mut().send_event(PlacementGhostReset);
        app.update();
        let mut q = app.world_mut().query::<&PreviewProxy>();
        // Reset despawns the pool; the same tick rebuilds it from scratch.
        assert_eq!(q.iter(app.world()).count(), 9);

        app.world_mut().resource_mut::<ActionState>().set(PlayerAction::MassAction, false);
        app.update();
        let mut q = app.world_mut().query::<&Visibility>();
        assert!(q.iter(app.world()).all(|v| *v != Visibility::Inherited));
    }
}
