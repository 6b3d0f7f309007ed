//! Mass planting for a Bevy farming game.
//!
//! Hold the mass-action key while placing a plant and the placement is repeated
//! over an NxN grid around it, with preview ghosts shown while aiming.

pub mod actions;
pub mod config;
pub mod heightmap_data;
pub mod planter;
pub mod planting;

pub use config::MassFarmingConfig;
pub use planting::{MassFarmingPlugin, PlantCatalogPlugin, PlantVisualsPlugin};
