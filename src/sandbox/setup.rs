use bevy::math::{UVec2, Vec2};
use bevy::prelude::*;
use bevy::render::mesh::{Indices, Mesh};
use bevy::render::render_asset::RenderAssetUsages;
use bevy::render::render_resource::PrimitiveTopology;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use mass_farming::heightmap_data::Heightmap;
use mass_farming::planter::{BuildStats, EquippedTool, Inventory, Occupant, Planter, Stamina};
use mass_farming::planting::core::{ActorId, Layer, TerrainOracle};
use mass_farming::MassFarmingConfig;

use super::input::CameraOrbit;

pub const CONFIG_PATH: &str = "assets/config/mass_farming.ron";

#[derive(Component)]
pub struct MainCamera;

#[derive(Component)]
pub struct Player;

/// World generation knobs for the sandbox.
#[derive(Resource, Clone)]
pub struct SandboxSettings {
    pub heightmap_path: String,
    /// Terrain extent in meters (square, centered on the origin).
    pub terrain_size: f32,
    pub height_scale: f32,
    pub rock_count: u32,
    pub world_seed: u64,
    /// Catalog name selected on first load.
    pub starting_plant: String,
}

impl Default for SandboxSettings {
    fn default() -> Self {
        Self {
            heightmap_path: "assets/heightmaps/farm.hmp.png".to_string(),
            terrain_size: 128.0,
            height_scale: 6.0,
            rock_count: 60,
            world_seed: 1337,
            starting_plant: "carrot".to_string(),
        }
    }
}

/// PreStartup: read user settings before the plugin logs them.
pub fn load_config(mut commands: Commands) {
    commands.insert_resource(MassFarmingConfig::load_or_default(CONFIG_PATH));
}

/// PreStartup: load the heightmap, or roll gentle hills when it is missing.
pub fn load_terrain(mut commands: Commands, settings: Res<SandboxSettings>) {
    let size = Vec2::splat(settings.terrain_size);
    let map = match Heightmap::load_png(&settings.heightmap_path, size, settings.height_scale) {
        Ok(map) => map,
        Err(err) => {
            warn!("Sandbox: {} ({}), using procedural terrain", settings.heightmap_path, err);
            procedural_terrain(size, settings.height_scale)
        }
    };
    commands.insert_resource(map);
}

fn procedural_terrain(size: Vec2, height_scale: f32) -> Heightmap {
    Heightmap::from_fn(size, UVec2::splat(129), |x, z| {
        let hills = (x * 0.045).sin() * (z * 0.035).cos();
        let ripples = (x * 0.21 + z * 0.17).sin() * 0.08;
        (hills * 0.5 + 0.5 + ripples) * height_scale
    })
}

/// Triangulate the heightmap samples as one mesh.
pub fn build_terrain_mesh(map: &Heightmap) -> Mesh {
    let res_x = map.resolution.x;
    let res_z = map.resolution.y;
    let dx = map.size.x / (res_x - 1) as f32;
    let dz = map.size.y / (res_z - 1) as f32;
    let heights = map.heights();

    // 1) Positions & UVs
    let mut positions = Vec::with_capacity((res_x * res_z) as usize);
    let mut uvs = Vec::with_capacity((res_x * res_z) as usize);
    for j in 0..res_z {
        for i in 0..res_x {
            let x = map.origin.x + i as f32 * dx;
            let z = map.origin.y + j as f32 * dz;
            positions.push([x, heights[(j * res_x + i) as usize], z]);
            uvs.push([i as f32 / (res_x - 1) as f32, j as f32 / (res_z - 1) as f32]);
        }
    }

    // 2) Indices (two tris per quad)
    let mut indices = Vec::with_capacity(((res_x - 1) * (res_z - 1) * 6) as usize);
    for j in 0..res_z - 1 {
        for i in 0..res_x - 1 {
            let a = j * res_x + i;
            let c = a + res_x;
            indices.extend_from_slice(&[a, c, a + 1, a + 1, c, c + 1]);
        }
    }

    // 3) Assemble the mesh
    let mut mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, uvs);
    mesh.insert_indices(Indices::U32(indices));
    mesh.compute_normals();
    mesh
}

pub fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    heightmap: Res<Heightmap>,
    settings: Res<SandboxSettings>,
) {
    // 1) Light
    commands.spawn((
        DirectionalLight { illuminance: 12_000.0, shadows_enabled: true, ..default() },
        Transform::from_xyz(30.0, 60.0, 20.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // 2) Camera
    let start = Vec3::new(0.0, heightmap.sample_height(0.0, 0.0), 0.0);
    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(start + Vec3::new(-10.0, 12.0, 10.0)).looking_at(start, Vec3::Y),
        MainCamera,
        CameraOrbit { focus: start, radius: 18.0, yaw: 0.8, pitch: 0.7 },
    ));

    // 3) Terrain
    commands.spawn((
        Mesh3d(meshes.add(build_terrain_mesh(&heightmap))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.36, 0.52, 0.24),
            perceptual_roughness: 0.95,
            ..Default::default()
        })),
        Transform::IDENTITY,
        Name::new("Terrain"),
    ));

    // 4) Player
    commands
        .spawn((
            Name::new("Player"),
            Player,
            Planter { id: ActorId(1) },
            Stamina::full(100.0, 6.0),
            Inventory::with_items([("carrot_seeds", 60), ("turnip_seeds", 40), ("onion_seeds", 25), ("barley", 30), ("wood", 20)]),
            EquippedTool::cultivator(),
            BuildStats::default(),
            Transform::from_translation(start),
            Visibility::default(),
        ))
        .with_children(|p| {
            p.spawn((
                Mesh3d(meshes.add(Capsule3d::new(0.35, 1.1))),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::srgb(0.8, 0.2, 0.2),
                    ..Default::default()
                })),
                Transform::from_xyz(0.0, 0.9, 0.0),
            ));
        });

    // 5) Rocks
    scatter_rocks(&mut commands, &mut meshes, &mut materials, &heightmap, &settings);
}

/// Seeded rock scatter. Rocks block planting and keep clear of the spawn point.
fn scatter_rocks(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
    heightmap: &Heightmap,
    settings: &SandboxSettings,
) {
    const SPAWN_CLEARANCE: f32 = 8.0;

    let mut rng = ChaCha8Rng::seed_from_u64(settings.world_seed);
    let half = settings.terrain_size * 0.5 - 2.0;
    let material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.45, 0.44, 0.42),
        perceptual_roughness: 1.0,
        ..Default::default()
    });

    let mut placed = 0;
    for _ in 0..settings.rock_count {
        let x = rng.random_range(-half..half);
        let z = rng.random_range(-half..half);
        if Vec2::new(x, z).length() < SPAWN_CLEARANCE {
            continue;
        }
        let radius = rng.random_range(0.3..1.2);
        let y = heightmap.sample_height(x, z);
        commands.spawn((
            Name::new("Rock"),
            Mesh3d(meshes.add(Sphere::new(radius))),
            MeshMaterial3d(material.clone()),
            Transform::from_xyz(x, y + radius * 0.4, z)
                .with_rotation(Quat::from_rotation_y(rng.random_range(0.0..std::f32::consts::TAU))),
            Occupant { radius, layer: Layer::StaticSolid },
        ));
        placed += 1;
    }
    info!("Sandbox: scattered {} rocks (seed {})", placed, settings.world_seed);
}
