// src/planting/preview.rs
//! Preview grid: a pool of ghost proxies that follows the aim while the hotkey is held.

use bevy::prelude::*;

use super::core::{is_origin_cell, GridSpec, PlantArchetypeId, TerrainOracle};
use super::ghost::{strip_for_preview, ProxyBlueprint};
use super::grid::generate_grid;
use super::registry::PlantDef;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PreviewState {
    #[default]
    Hidden,
    Building,
    Active,
}

/// Spawns and moves preview proxies.
pub trait ProxyHost {
    type Handle: Copy;

    fn spawn_proxy(&mut self, blueprint: &ProxyBlueprint, at: Vec3) -> Self::Handle;
    fn despawn_proxy(&mut self, proxy: Self::Handle);
    fn set_proxy_active(&mut self, proxy: Self::Handle, active: bool);
    fn place_proxy(&mut self, proxy: Self::Handle, position: Vec3, rotation: Quat);
}

/// What the player is aiming this tick.
#[derive(Clone, Copy, Debug)]
pub struct AimTarget<'a> {
    pub active: bool,
    pub position: Vec3,
    pub rotation: Quat,
    pub archetype: PlantArchetypeId,
    /// Footprint of the aimed object; `None` means it never batches.
    pub footprint: Option<f32>,
    /// Prefab to build proxies from, if the catalog resolves one.
    pub template: Option<&'a PlantDef>,
}

/// Inputs for one preview tick.
#[derive(Clone, Copy, Debug)]
pub struct PreviewTick<'a> {
    pub aim: Option<AimTarget<'a>>,
    pub key_held: bool,
    pub grid_size: u32,
    /// Where freshly built proxies wait until their first grid assignment.
    pub actor_position: Vec3,
}

/// Owns the proxy pool. Invariant: `pool.len() == grid_size²` whenever non-empty.
#[derive(Debug)]
pub struct PreviewManager<H> {
    pool: Vec<H>,
    pool_archetype: Option<PlantArchetypeId>,
    state: PreviewState,
}

impl<H> Default for PreviewManager<H> {
    fn default() -> Self {
        Self { pool: Vec::new(), pool_archetype: None, state: PreviewState::Hidden }
    }
}

impl<H: Copy> PreviewManager<H> {
    pub fn state(&self) -> PreviewState {
        self.state
    }

    pub fn pool(&self) -> &[H] {
        &self.pool
    }

    /// Run one aim tick and return the state it ends in.
    pub fn tick<P, T>(&mut self, tick: &PreviewTick, terrain: &T, host: &mut P) -> PreviewState
    where
        P: ProxyHost<Handle = H> + ?Sized,
        T: TerrainOracle + ?Sized,
    {
        let Some(aim) = tick.aim.filter(|a| a.active) else {
            return self.hide(host);
        };
        if !tick.key_held {
            return self.hide(host);
        }
        let Some(radius) = aim.footprint else {
            return self.hide(host);
        };

        let required = (tick.grid_size as usize) * (tick.grid_size as usize);
        if self.needs_rebuild(required, aim.archetype) {
            self.state = PreviewState::Building;
            self.destroy(host);

            let Some(template) = aim.template.filter(|t| !t.repair) else {
                return self.hide(host);
            };
            let blueprint = strip_for_preview(aim.archetype, template);
            self.pool = (0..required).map(|_| host.spawn_proxy(&blueprint, tick.actor_position)).collect();
            self.pool_archetype = Some(aim.archetype);
            debug!("MassFarming: built {} preview proxies for '{}'", required, template.name);
        }

        let spec = GridSpec::for_footprint(aim.position, aim.rotation, radius, tick.grid_size);
        let cells = generate_grid(&spec, terrain);
        for (&proxy, cell) in self.pool.iter().zip(&cells) {
            if is_origin_cell(cell.position, aim.position) {
                host.set_proxy_active(proxy, false);
                continue;
            }
            host.place_proxy(proxy, cell.position, aim.rotation);
            host.set_proxy_active(proxy, true);
        }

        self.state = PreviewState::Active;
        self.state
    }

    /// Despawn every proxy; the next valid tick rebuilds.
    pub fn destroy<P>(&mut self, host: &mut P)
    where
        P: ProxyHost<Handle = H> + ?Sized,
    {
        for proxy in self.pool.drain(..) {
            host.despawn_proxy(proxy);
        }
        self.pool_archetype = None;
    }

    fn hide<P>(&mut self, host: &mut P) -> PreviewState
    where
        P: ProxyHost<Handle = H> + ?Sized,
    {
        for &proxy in &self.pool {
            host.set_proxy_active(proxy, false);
        }
        self.state = PreviewState::Hidden;
        self.state
    }

    fn needs_rebuild(&self, required: usize, archetype: PlantArchetypeId) -> bool {
        self.pool.is_empty() || self.pool.len() != required || self.pool_archetype != Some(archetype)
    }
}
