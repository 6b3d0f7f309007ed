//! MassFarming plugin wiring (glue).
//! - Config, executor, preview pool and ghost resources
//! - Commit / reset / feedback events
//! - Capture -> Execute -> Preview system ordering
//! - Plant catalog asset loading (separate plugin, needs the asset server)

use bevy::prelude::*;

use super::core::{Feedback, PlacementContext, PlantArchetypeId};
use super::executor::PlacementExecutor;
use super::preview::PreviewManager;
use super::registry::{PlantCatalog, PlantRegistry, PlantRegistryAssetPlugin};
use super::systems::{
    capture_placement_commits, reset_preview_on_ghost_change, run_mass_placement, update_preview_grid,
};
use crate::actions::ActionState;
use crate::config::MassFarmingConfig;

/// Fired by the host after it finished placing one object the normal way.
#[derive(Event, Clone, Copy, Debug)]
pub struct PlacementCommitted(pub PlacementContext);

/// Fired by the host whenever its placement ghost is recreated (new selection, tool swap).
#[derive(Event, Clone, Copy, Debug, Default)]
pub struct PlacementGhostReset;

/// Feedback the host should present for one player.
#[derive(Event, Clone, Debug, PartialEq)]
pub struct FeedbackEvent {
    pub planter: Entity,
    pub feedback: Feedback,
}

/// The host's single placement ghost, mirrored every frame for the preview grid.
#[derive(Resource, Clone, Debug, Default)]
pub struct PlacementGhost {
    pub planter: Option<Entity>,
    /// False when the ghost is hidden or the aim is invalid.
    pub active: bool,
    pub position: Vec3,
    pub rotation: Quat,
    pub selected: Option<PlantArchetypeId>,
}

/// Preview proxies keyed by entity.
#[derive(Resource, Default, Deref, DerefMut)]
pub struct PreviewPool(pub PreviewManager<Entity>);

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum MassFarmingSet {
    /// Record commits fired by the host.
    Capture,
    /// Run at most one batch per pending commit.
    Execute,
    /// Refresh the ghost grid.
    Preview,
}

pub struct MassFarmingPlugin;

impl Plugin for MassFarmingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<MassFarmingConfig>()
            .init_resource::<ActionState>()
            .init_resource::<PlacementExecutor>()
            .init_resource::<PreviewPool>()
            .init_resource::<PlacementGhost>()
            .init_resource::<PlantCatalog>()
            .add_event::<PlacementCommitted>()
            .add_event::<PlacementGhostReset>()
            .add_event::<FeedbackEvent>()
            .configure_sets(
                Update,
                (MassFarmingSet::Capture, MassFarmingSet::Execute, MassFarmingSet::Preview).chain(),
            )
            .add_systems(Startup, log_config)
            .add_systems(Update, capture_placement_commits.in_set(MassFarmingSet::Capture))
            .add_systems(Update, run_mass_placement.in_set(MassFarmingSet::Execute))
            .add_systems(
                Update,
                (reset_preview_on_ghost_change, update_preview_grid)
                    .chain()
                    .in_set(MassFarmingSet::Preview),
            );
    }
}

fn log_config(config: Res<MassFarmingConfig>) {
    info!(
        "MassFarming: grid {}x{} ({} cells), ignore_stamina={}, ignore_placement_cost={}, hotkey={:?}/{:?}",
        config.plant_grid_size,
        config.plant_grid_size,
        config.cells_per_batch(),
        config.ignore_stamina,
        config.ignore_placement_cost,
        config.mass_action_hotkey,
        config.controller_hotkey
    );
}

// ---------- Catalog ----------

/// Where the catalog manifest lives.
#[derive(Resource, Clone)]
pub struct PlantCatalogSettings {
    pub catalog_path: String,
}

impl Default for PlantCatalogSettings {
    fn default() -> Self {
        Self { catalog_path: "plants/crops.plants.ron".to_string() }
    }
}

/// Handle to the loaded PlantRegistry asset.
#[derive(Resource, Default)]
pub struct PlantCatalogHandle(pub Handle<PlantRegistry>);

/// Loads the catalog manifest and mirrors it into [`PlantCatalog`], including hot reloads.
pub struct PlantCatalogPlugin;

impl Plugin for PlantCatalogPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(PlantRegistryAssetPlugin)
            .init_resource::<PlantCatalogSettings>()
            .init_resource::<PlantCatalogHandle>()
            .init_resource::<PlantCatalog>()
            .add_systems(Startup, load_catalog)
            .add_systems(Update, sync_catalog.before(MassFarmingSet::Capture));
    }
}

/// Startup: request loading the catalog manifest, store handle.
fn load_catalog(
    mut handle_res: ResMut<PlantCatalogHandle>,
    settings: Res<PlantCatalogSettings>,
    assets: Res<AssetServer>,
) {
    if handle_res.0.is_strong() {
        return;
    }
    handle_res.0 = assets.load(settings.catalog_path.as_str());
    info!("MassFarming: loading plant catalog from '{}'", settings.catalog_path);
}

/// Update: copy the registry into the catalog resource whenever it (re)loads.
fn sync_catalog(
    mut events: EventReader<AssetEvent<PlantRegistry>>,
    handle_res: Res<PlantCatalogHandle>,
    registries: Res<Assets<PlantRegistry>>,
    mut catalog: ResMut<PlantCatalog>,
) {
    for ev in events.read() {
        let (AssetEvent::LoadedWithDependencies { id } | AssetEvent::Modified { id }) = ev else {
            continue;
        };
        if *id != handle_res.0.id() {
            continue;
        }
        if let Some(registry) = registries.get(*id) {
            *catalog = PlantCatalog(registry.clone());
            if catalog.is_empty() {
                warn!("MassFarming: plant catalog is empty, nothing can be planted");
            } else {
                info!("MassFarming: plant catalog ready ({} plants)", catalog.len());
            }
        }
    }
}
