use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::input::{keyboard::KeyCode, ButtonInput};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use mass_farming::actions::{ActionState, PlayerAction};
use mass_farming::heightmap_data::Heightmap;
use mass_farming::planting::core::TerrainOracle;
use mass_farming::planting::plugin::PlacementGhost;
use mass_farming::MassFarmingConfig;

use super::setup::{MainCamera, Player};
use super::state::GameState;

pub const MOVE_SPEED: f32 = 10.0;
pub const ROTATE_SPEED: f32 = 0.2;
pub const MAX_CAMERA_DT: f32 = 0.05; // never use a dt larger than 50ms
/// How far from the player the ghost may be placed.
pub const PLACE_REACH: f32 = 20.0;
/// Radians per second for Q/E.
pub const GHOST_TURN_SPEED: f32 = 1.5;

#[derive(Component)]
pub struct CameraOrbit {
    pub focus: Vec3,
    pub radius: f32,
    pub yaw: f32,
    pub pitch: f32,
}

pub fn input_mapping_system(
    keys: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    gamepads: Query<&Gamepad>,
    config: Res<MassFarmingConfig>,
    mut action_state: ResMut<ActionState>,
) {
    action_state.set(PlayerAction::MoveForward, keys.pressed(KeyCode::KeyW));
    action_state.set(PlayerAction::MoveBackward, keys.pressed(KeyCode::KeyS));
    action_state.set(PlayerAction::MoveLeft, keys.pressed(KeyCode::KeyA));
    action_state.set(PlayerAction::MoveRight, keys.pressed(KeyCode::KeyD));

    let pad_held = gamepads.iter().any(|pad| pad.pressed(config.controller_hotkey));
    action_state.set(PlayerAction::MassAction, keys.pressed(config.mass_action_hotkey) || pad_held);

    // One-shot actions fire on the frame they are pressed.
    action_state.set(PlayerAction::Place, mouse.just_pressed(MouseButton::Left));
    action_state.set(PlayerAction::Cultivate, mouse.just_pressed(MouseButton::Right));
    action_state.set(PlayerAction::NextPlant, keys.just_pressed(KeyCode::Tab));
    action_state.set(PlayerAction::RotateLeft, keys.pressed(KeyCode::KeyQ));
    action_state.set(PlayerAction::RotateRight, keys.pressed(KeyCode::KeyE));
}

pub fn pause_toggle_system(
    keys: Res<ButtonInput<KeyCode>>,
    mut next_state: ResMut<NextState<GameState>>,
    current_state: Res<State<GameState>>,
) {
    if keys.just_pressed(KeyCode::Escape) {
        if current_state.get() == &GameState::Running {
            next_state.set(GameState::Paused);
            info!("Paused game");
        } else if current_state.get() == &GameState::Paused {
            next_state.set(GameState::Running);
            info!("Resumed game");
        }
    }
}

pub fn camera_controller(
    time: Res<Time>,
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mut motion_evr: EventReader<MouseMotion>,
    mut scroll_evr: EventReader<MouseWheel>,
    action_state: Res<ActionState>,
    heightmap: Res<Heightmap>,
    mut query: Query<(&mut Transform, &mut CameraOrbit), With<MainCamera>>,
) {
    // 0) Clamp delta
    let dt = time.delta_secs().min(MAX_CAMERA_DT);

    let Ok((mut tf, mut orbit)) = query.single_mut() else { return; };

    // 1) Camera-relative movement
    let forward = Vec2::new(-orbit.yaw.cos(), -orbit.yaw.sin());
    let right = Vec2::new(-forward.y, forward.x);

    let mut dir = Vec2::ZERO;
    if action_state.pressed(PlayerAction::MoveForward) { dir += forward; }
    if action_state.pressed(PlayerAction::MoveBackward) { dir -= forward; }
    if action_state.pressed(PlayerAction::MoveLeft) { dir -= right; }
    if action_state.pressed(PlayerAction::MoveRight) { dir += right; }

    if dir != Vec2::ZERO {
        let delta = dir.normalize() * MOVE_SPEED * dt;
        let next = Vec3::new(orbit.focus.x + delta.x, orbit.focus.y, orbit.focus.z + delta.y);
        // Stay on the map.
        if heightmap.covers(next) {
            orbit.focus = next;
        }
    }

    // 2) Ground the focus Y
    orbit.focus.y = heightmap.sample_height(orbit.focus.x, orbit.focus.z);

    // 3) Zoom
    for ev in scroll_evr.read() {
        let amount = match ev.unit {
            MouseScrollUnit::Line => ev.y * 1.0,
            MouseScrollUnit::Pixel => ev.y * 0.02,
        };
        orbit.radius = (orbit.radius - amount).clamp(4.0, 80.0);
    }

    // 4) Orbit
    if mouse_buttons.pressed(MouseButton::Middle) {
        for ev in motion_evr.read() {
            orbit.yaw += ev.delta.x * ROTATE_SPEED * dt;
            orbit.pitch += ev.delta.y * ROTATE_SPEED * dt;
        }
    }

    orbit.pitch = orbit.pitch.clamp(0.1, std::f32::consts::FRAC_PI_2 - 0.01);

    // 5) Position camera
    let xz_radius = orbit.radius * orbit.pitch.cos();
    let offset = Vec3::new(
        xz_radius * orbit.yaw.cos(),
        orbit.radius * orbit.pitch.sin(),
        xz_radius * orbit.yaw.sin(),
    );

    tf.translation = orbit.focus + offset;

    // 6) Prevent underground camera
    let terrain_y = heightmap.sample_height(tf.translation.x, tf.translation.z);
    if tf.translation.y < terrain_y + 2.5 {
        tf.translation.y = terrain_y + 2.5;
    }

    tf.look_at(orbit.focus, Vec3::Y);
}

/// The player stands at the camera focus.
pub fn follow_focus(
    cameras: Query<&CameraOrbit, With<MainCamera>>,
    mut players: Query<&mut Transform, (With<Player>, Without<MainCamera>)>,
) {
    let Ok(orbit) = cameras.single() else { return; };
    for mut tf in &mut players {
        tf.translation = orbit.focus;
    }
}

/// First point where the ray dips below the terrain, refined by bisection.
pub fn raycast_terrain<T: TerrainOracle + ?Sized>(
    origin: Vec3,
    direction: Vec3,
    terrain: &T,
    max_distance: f32,
) -> Option<Vec3> {
    const STEP: f32 = 0.5;
    const REFINE: u32 = 16;

    let below = |t: f32| {
        let p = origin + direction * t;
        terrain.covers(p) && p.y <= terrain.sample_height(p.x, p.z)
    };

    let mut prev = 0.0;
    let mut t = STEP;
    while t <= max_distance {
        if below(t) {
            let (mut lo, mut hi) = (prev, t);
            for _ in 0..REFINE {
                let mid = (lo + hi) * 0.5;
                if below(mid) { hi = mid; } else { lo = mid; }
            }
            let hit = origin + direction * hi;
            return Some(Vec3::new(hit.x, terrain.sample_height(hit.x, hit.z), hit.z));
        }
        prev = t;
        t += STEP;
    }
    None
}

/// Move the host ghost under the cursor; Q/E turn it.
pub fn aim_ghost(
    time: Res<Time>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<MainCamera>>,
    players: Query<(Entity, &Transform), With<Player>>,
    heightmap: Res<Heightmap>,
    action_state: Res<ActionState>,
    mut ghost: ResMut<PlacementGhost>,
) {
    let Ok((player, player_tf)) = players.single() else { return; };
    ghost.planter = Some(player);

    let mut turn = 0.0;
    if action_state.pressed(PlayerAction::RotateLeft) { turn += 1.0; }
    if action_state.pressed(PlayerAction::RotateRight) { turn -= 1.0; }
    if turn != 0.0 {
        ghost.rotation = Quat::from_rotation_y(turn * GHOST_TURN_SPEED * time.delta_secs()) * ghost.rotation;
    }

    let hit = windows
        .single()
        .ok()
        .and_then(Window::cursor_position)
        .zip(cameras.single().ok())
        .and_then(|(cursor, (camera, cam_tf))| camera.viewport_to_world(cam_tf, cursor).ok())
        .and_then(|ray| raycast_terrain(ray.origin, *ray.direction, &*heightmap, 200.0));

    match hit {
        Some(point) if point.distance(player_tf.translation) <= PLACE_REACH => {
            ghost.active = true;
            ghost.position = point;
        }
        _ => ghost.active = false,
    }
}

/// While paused nothing is aimed.
pub fn hide_ghost(mut ghost: ResMut<PlacementGhost>) {
    ghost.active = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::math::UVec2;

    #[test]
    fn ray_hits_flat_ground() {
        let map = Heightmap::flat(Vec2::splat(100.0), UVec2::splat(11), 2.0);
        let hit = raycast_terrain(Vec3::new(0.0, 12.0, 0.0), Vec3::new(0.6, -0.8, 0.0), &map, 100.0).unwrap();
        // 10 m drop along a 0.8 slope → 7.5 m sideways.
        assert!((hit.x - 7.5).abs() < 0.01);
        assert_eq!(hit.y, 2.0);
    }

    #[test]
    fn ray_into_the_sky_misses() {
        let map = Heightmap::flat(Vec2::splat(100.0), UVec2::splat(11), 0.0);
        assert!(raycast_terrain(Vec3::new(0.0, 5.0, 0.0), Vec3::Y, &map, 100.0).is_none());
        // Off the map edge before touching the ground.
        let shallow = Vec3::new(1.0, -0.01, 0.0).normalize();
        assert!(raycast_terrain(Vec3::new(0.0, 5.0, 0.0), shallow, &map, 200.0).is_none());
    }
}
