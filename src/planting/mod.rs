pub mod core;
pub mod registry;
pub mod grid;
pub mod occupancy;
pub mod executor;
pub mod ghost;
pub mod preview;
pub mod plugin;
pub mod systems;
pub mod visuals;

pub use plugin::{MassFarmingPlugin, PlantCatalogPlugin};
pub use visuals::PlantVisualsPlugin;
