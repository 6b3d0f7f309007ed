// src/planting/occupancy.rs
//! Grow-space checks against the spatial oracle.

use bevy::prelude::*;

use super::core::{LayerMask, SpatialOracle, PLANT_SPACE_MASK};
use super::registry::PlantDef;

/// True iff nothing on `layers` sits within `footprint` of `position`.
/// No footprint means no spatial constraint.
pub fn has_space<S: SpatialOracle + ?Sized>(
    spatial: &S,
    position: Vec3,
    footprint: Option<f32>,
    layers: LayerMask,
) -> bool {
    match footprint {
        Some(radius) => spatial.overlap_count(position, radius, layers) == 0,
        None => true,
    }
}

/// `has_space` with the template's footprint on the plant space layers.
#[inline]
pub fn has_grow_space<S: SpatialOracle + ?Sized>(spatial: &S, position: Vec3, template: &PlantDef) -> bool {
    has_space(spatial, position, template.footprint(), PLANT_SPACE_MASK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planting::core::Layer;

    struct Bodies(Vec<(Vec3, Layer)>);

    impl SpatialOracle for Bodies {
        fn overlap_count(&self, position: Vec3, radius: f32, layers: LayerMask) -> usize {
            self.0
                .iter()
                .filter(|(p, l)| layers.contains(*l) && p.distance(position) <= radius)
                .count()
        }
    }

    fn plant(radius: Option<f32>) -> PlantDef {
        PlantDef {
            name: "barley".into(),
            grow_radius: radius,
            cost: Vec::new(),
            cultivated_only: false,
            repair: false,
            place_effect: None,
            parts: Vec::new(),
        }
    }

    #[test]
    fn occupant_inside_radius_blocks() {
        let bodies = Bodies(vec![(Vec3::new(0.3, 0.0, 0.0), Layer::Piece)]);
        assert!(!has_grow_space(&bodies, Vec3::ZERO, &plant(Some(0.5))));
        assert!(has_grow_space(&bodies, Vec3::new(2.0, 0.0, 0.0), &plant(Some(0.5))));
    }

    #[test]
    fn ghost_layer_never_blocks() {
        let bodies = Bodies(vec![(Vec3::ZERO, Layer::Ghost), (Vec3::ZERO, Layer::Terrain)]);
        assert!(has_grow_space(&bodies, Vec3::ZERO, &plant(Some(1.0))));
    }

    #[test]
    fn no_footprint_means_no_constraint() {
        let bodies = Bodies(vec![(Vec3::ZERO, Layer::StaticSolid)]);
        assert!(has_grow_space(&bodies, Vec3::ZERO, &plant(None)));
    }
}
