use bevy::prelude::*;

use mass_farming::{MassFarmingPlugin, PlantCatalogPlugin, PlantVisualsPlugin};

mod sandbox;

use sandbox::SandboxPlugin;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window { title: "MassFarming sandbox".into(), ..default() }),
            ..default()
        }))
        // planting logic, catalog loading, plant meshes
        .add_plugins((MassFarmingPlugin, PlantCatalogPlugin, PlantVisualsPlugin))
        // terrain, player, input, HUD
        .add_plugins(SandboxPlugin)
        .run();
}
