// src/planter.rs
//! Components the host game puts on players and placed objects so planting can
//! read and debit them.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::planting::core::{ActorId, Layer, PlantArchetypeId, ToolUse};
use crate::planting::registry::ResourceCost;

/// Marks a player that can plant.
#[derive(Component, Clone, Copy, Debug)]
pub struct Planter {
    pub id: ActorId,
}

#[derive(Component, Clone, Debug)]
pub struct Stamina {
    pub current: f32,
    pub max: f32,
    /// Per second.
    pub regen: f32,
}

impl Stamina {
    pub fn full(max: f32, regen: f32) -> Self {
        Self { current: max, max, regen }
    }

    #[inline]
    pub fn has(&self, amount: f32) -> bool {
        self.current >= amount
    }

    pub fn spend(&mut self, amount: f32) {
        self.current = (self.current - amount).max(0.0);
    }

    pub fn recover(&mut self, dt: f32) {
        self.current = (self.current + self.regen * dt).min(self.max);
    }

    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 { self.current / self.max } else { 0.0 }
    }
}

/// Item name → count.
#[derive(Component, Clone, Debug, Default)]
pub struct Inventory {
    items: HashMap<String, u32>,
}

impl Inventory {
    pub fn with_items<'a>(items: impl IntoIterator<Item = (&'a str, u32)>) -> Self {
        let mut inv = Self::default();
        for (name, n) in items {
            inv.add(name, n);
        }
        inv
    }

    pub fn count(&self, item: &str) -> u32 {
        self.items.get(item).copied().unwrap_or(0)
    }

    pub fn add(&mut self, item: &str, amount: u32) {
        *self.items.entry(item.to_string()).or_default() += amount;
    }

    pub fn has_all(&self, costs: &[ResourceCost]) -> bool {
        costs.iter().all(|c| self.count(&c.item) >= c.amount)
    }

    /// Removes what is there; callers check `has_all` first.
    pub fn remove_all(&mut self, costs: &[ResourceCost]) {
        for c in costs {
            if let Some(n) = self.items.get_mut(&c.item) {
                *n = n.saturating_sub(c.amount);
                if *n == 0 {
                    self.items.remove(&c.item);
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.items.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// The tool in the player's hand (the cultivator, for planting).
#[derive(Component, Clone, Debug)]
pub struct EquippedTool {
    pub name: String,
    pub attack_stamina: f32,
    pub uses_durability: bool,
    pub durability: f32,
    pub max_durability: f32,
    pub durability_drain: f32,
}

impl EquippedTool {
    pub fn cultivator() -> Self {
        Self {
            name: "cultivator".to_string(),
            attack_stamina: 5.0,
            uses_durability: true,
            durability: 200.0,
            max_durability: 200.0,
            durability_drain: 1.0,
        }
    }

    pub fn usage(&self) -> ToolUse {
        ToolUse {
            stamina_cost: self.attack_stamina,
            uses_durability: self.uses_durability,
            durability_drain: self.durability_drain,
        }
    }

    pub fn is_broken(&self) -> bool {
        self.uses_durability && self.durability <= 0.0
    }
}

/// Profile statistics.
#[derive(Component, Clone, Debug, Default)]
pub struct BuildStats {
    pub builds: u32,
}

/// A body that takes up space for grow checks.
#[derive(Component, Clone, Copy, Debug)]
pub struct Occupant {
    pub radius: f32,
    pub layer: Layer,
}

/// A real (non-preview) planted object.
#[derive(Component, Clone, Copy, Debug)]
pub struct PlantInstance {
    pub archetype: PlantArchetypeId,
    pub creator: ActorId,
}
