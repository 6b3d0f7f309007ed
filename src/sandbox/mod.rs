//! A small farm to try mass planting in: heightmap terrain, a player with a
//! cultivator, rocks in the way, and a HUD.

use bevy::prelude::*;

use mass_farming::planting::plugin::MassFarmingSet;

pub mod farming;
pub mod input;
pub mod setup;
pub mod state;
pub mod ui;

use farming::{
    cultivate_ground, expire_effects, handle_feedback, place_single_plant, regen_stamina, select_plant, StaminaFlash,
};
use input::{aim_ghost, camera_controller, follow_focus, hide_ghost, input_mapping_system, pause_toggle_system};
use setup::{load_config, load_terrain, SandboxSettings};
use state::GameState;
use ui::{despawn_pause_overlay, spawn_hud, spawn_pause_overlay, update_hud};

pub struct SandboxPlugin;

impl Plugin for SandboxPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<GameState>()
            .init_resource::<SandboxSettings>()
            .init_resource::<StaminaFlash>()
            .add_systems(PreStartup, (load_config, load_terrain))
            .add_systems(Startup, (setup::setup, spawn_hud))
            // pause-menu UI
            .add_systems(OnEnter(GameState::Paused), (spawn_pause_overlay, hide_ghost))
            .add_systems(OnExit(GameState::Paused), despawn_pause_overlay)
            .add_systems(Update, pause_toggle_system)
            // host side of placement, ahead of the mass planting sets
            .add_systems(
                Update,
                (
                    input_mapping_system,
                    camera_controller,
                    follow_focus,
                    aim_ghost,
                    select_plant,
                    (place_single_plant, cultivate_ground),
                    regen_stamina,
                )
                    .chain()
                    .before(MassFarmingSet::Capture)
                    .run_if(in_state(GameState::Running)),
            )
            .add_systems(
                Update,
                (handle_feedback, expire_effects, update_hud).chain().after(MassFarmingSet::Execute),
            );
    }
}
