use bevy::prelude::*;
use bevy::ui::BackgroundColor;

use mass_farming::actions::ActionState;
use mass_farming::planter::{BuildStats, EquippedTool, Inventory, Stamina};
use mass_farming::planting::core::CapabilityInput;
use mass_farming::planting::plugin::PlacementGhost;
use mass_farming::planting::registry::PlantCatalog;
use mass_farming::MassFarmingConfig;

use super::farming::StaminaFlash;
use super::setup::Player;

#[derive(Component)]
pub struct PauseOverlay;

#[derive(Component)]
pub struct HudText;

#[derive(Component)]
pub struct StaminaBar;

const BAR_COLOR: Color = Color::srgb(0.95, 0.8, 0.2);
const BAR_FLASH_COLOR: Color = Color::srgb(0.9, 0.15, 0.1);

pub fn spawn_hud(mut commands: Commands) {
    commands
        .spawn((
            Node {
                position_type: PositionType::Absolute,
                left: Val::Px(12.0),
                bottom: Val::Px(12.0),
                flex_direction: FlexDirection::Column,
                row_gap: Val::Px(6.0),
                ..default()
            },
            Name::new("Hud"),
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(""),
                TextFont { font_size: 16.0, ..default() },
                TextColor(Color::WHITE),
                HudText,
            ));
            // Stamina bar background + fill.
            parent
                .spawn((
                    Node { width: Val::Px(220.0), height: Val::Px(12.0), ..default() },
                    BackgroundColor(Color::linear_rgba(0.0, 0.0, 0.0, 0.6)),
                ))
                .with_children(|bar| {
                    bar.spawn((
                        Node { width: Val::Percent(100.0), height: Val::Percent(100.0), ..default() },
                        BackgroundColor(BAR_COLOR),
                        StaminaBar,
                    ));
                });
        });
}

#[allow(clippy::too_many_arguments)]
pub fn update_hud(
    config: Res<MassFarmingConfig>,
    catalog: Res<PlantCatalog>,
    ghost: Res<PlacementGhost>,
    action_state: Res<ActionState>,
    flash: Res<StaminaFlash>,
    players: Query<(&Stamina, &Inventory, Option<&EquippedTool>, &BuildStats), With<Player>>,
    mut text: Query<&mut Text, With<HudText>>,
    mut bar: Query<(&mut Node, &mut BackgroundColor), With<StaminaBar>>,
) {
    let Ok((stamina, inventory, tool, stats)) = players.single() else { return; };

    if let Ok((mut node, mut color)) = bar.single_mut() {
        node.width = Val::Percent(stamina.fraction() * 100.0);
        let flashing = flash.0.duration() > std::time::Duration::ZERO && !flash.0.finished();
        *color = BackgroundColor(if flashing { BAR_FLASH_COLOR } else { BAR_COLOR });
    }

    let Ok(mut text) = text.single_mut() else { return; };
    let def = ghost.selected.and_then(|id| catalog.get(id));
    let selected = def.map_or("(loading)", |def| def.name.as_str());
    let mode = match def {
        Some(def) if !def.is_batchable() => "single only".to_string(),
        _ if action_state.is_capability_key_held() => {
            format!("MASS {0}x{0} ({1})", config.plant_grid_size, config.cells_per_batch())
        }
        _ => "single".to_string(),
    };
    let tool_line = tool.map_or("no tool".to_string(), |t| {
        format!("{} {:.0}/{:.0}", t.name, t.durability, t.max_durability)
    });
    let mut items: Vec<_> = inventory.iter().map(|(name, n)| format!("{name} x{n}")).collect();
    items.sort();

    text.0 = format!(
        "Plant: {selected} [Tab]   Mode: {mode} [{:?}]\n{tool_line}   Builds: {}\n{}",
        config.mass_action_hotkey,
        stats.builds,
        items.join("  ")
    );
}

pub fn spawn_pause_overlay(mut commands: Commands) {
    commands
        .spawn((
            // Fullscreen transparent overlay node
            Node {
                position_type: PositionType::Absolute,
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(Color::linear_rgba(0.0, 0.0, 0.0, 0.7)),
            PauseOverlay,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new("Paused"),
                TextFont { font_size: 64.0, ..default() },
                TextLayout::new_with_justify(JustifyText::Center),
                TextColor(Color::WHITE),
            ));
        });
}

pub fn despawn_pause_overlay(mut commands: Commands, query: Query<Entity, With<PauseOverlay>>) {
    for entity in &query {
        commands.entity(entity).despawn();
    }
}
