// src/planting/executor.rs
//! Batch planting: repeat one committed placement over the grid.

use bevy::prelude::*;

use super::core::{
    is_origin_cell, CapabilityInput, Feedback, FeedbackSink, GridSpec, ObjectSpawner, PlacementContext,
    PlantArchetypeId, PlantingHost, PlayerResources, TerrainOracle,
};
use super::grid::generate_grid;
use super::occupancy::has_grow_space;
use super::registry::PlantDef;
use crate::config::MassFarmingConfig;

/// Why a commit did not start a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotTriggered {
    PlacementFailed,
    NotBatchable,
    HotkeyReleased,
    NoTerrain,
}

/// Why a running batch stopped before the last cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchStop {
    NoStamina,
    MissingMaterials,
    ToolBroken,
}

/// Per-batch tally. Placements before a stop are kept.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub placed: u32,
    pub skipped_origin: u32,
    pub skipped_ground: u32,
    pub skipped_occupied: u32,
    pub stopped: Option<BatchStop>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchOutcome {
    Skipped(NotTriggered),
    Ran(BatchReport),
}

/// Holds the last committed single placement until the next tick consumes it.
#[derive(Resource, Debug, Default)]
pub struct PlacementExecutor {
    pending: Option<PlacementContext>,
}

impl PlacementExecutor {
    /// Store a commit, replacing any older one that was never consumed.
    pub fn record_commit(&mut self, ctx: PlacementContext) {
        self.pending = Some(ctx);
    }

    pub fn pending(&self) -> Option<&PlacementContext> {
        self.pending.as_ref()
    }

    pub fn take_pending(&mut self) -> Option<PlacementContext> {
        self.pending.take()
    }

    /// Plant copies of `template` over the grid around `ctx.position`.
    ///
    /// Per cell: ground type, duplicate origin and occupancy skip the cell; missing stamina,
    /// missing materials and a broken tool end the whole batch.
    pub fn execute<H, I>(
        ctx: &PlacementContext,
        template: &PlantDef,
        config: &MassFarmingConfig,
        input: &I,
        host: &mut H,
    ) -> BatchOutcome
    where
        H: PlantingHost + ?Sized,
        I: CapabilityInput + ?Sized,
    {
        if !ctx.success {
            return BatchOutcome::Skipped(NotTriggered::PlacementFailed);
        }
        let Some(radius) = template.footprint() else {
            return BatchOutcome::Skipped(NotTriggered::NotBatchable);
        };
        if !input.is_capability_key_held() {
            return BatchOutcome::Skipped(NotTriggered::HotkeyReleased);
        }
        if !host.covers(ctx.position) {
            return BatchOutcome::Skipped(NotTriggered::NoTerrain);
        }

        let spec = GridSpec::for_footprint(ctx.position, ctx.rotation, radius, config.plant_grid_size);
        let cells = generate_grid(&spec, &*host);

        let tool = host.equipped_tool();
        let stamina_cost = if config.ignore_stamina {
            0.0
        } else {
            tool.map_or(0.0, |t| t.stamina_cost)
        };
        let creator = host.actor();

        let mut report = BatchReport::default();
        for cell in cells {
            let pos = cell.position;

            if template.cultivated_only && !host.is_cultivated(pos) {
                report.skipped_ground += 1;
                continue;
            }
            if is_origin_cell(pos, ctx.position) {
                report.skipped_origin += 1;
                continue;
            }
            if !config.ignore_stamina && !host.has_stamina(stamina_cost) {
                host.play(Feedback::NoStamina);
                report.stopped = Some(BatchStop::NoStamina);
                break;
            }
            if !config.ignore_placement_cost && !host.has_requirements(template) {
                report.stopped = Some(BatchStop::MissingMaterials);
                break;
            }
            if !has_grow_space(&*host, pos, template) {
                report.skipped_occupied += 1;
                continue;
            }

            host.instantiate(ctx.archetype, template, pos, ctx.rotation, creator);
            if let Some(effect) = &template.place_effect {
                host.play(Feedback::PlaceEffect { effect: effect.clone(), position: pos, rotation: ctx.rotation });
            }
            host.record_build();
            report.placed += 1;

            host.consume_resources(template);
            if !config.ignore_stamina {
                host.consume_stamina(stamina_cost);
            }
            if let Some(tool) = tool.filter(|t| t.uses_durability) {
                if host.drain_tool_durability(tool.durability_drain) <= 0.0 {
                    report.stopped = Some(BatchStop::ToolBroken);
                    break;
                }
            }
        }

        log_report(ctx.archetype, template, &report);
        BatchOutcome::Ran(report)
    }
}

fn log_report(archetype: PlantArchetypeId, template: &PlantDef, report: &BatchReport) {
    debug!(
        "MassFarming: '{}' ({:?}) placed {} | skipped origin={} ground={} occupied={} | stop={:?}",
        template.name,
        archetype,
        report.placed,
        report.skipped_origin,
        report.skipped_ground,
        report.skipped_occupied,
        report.stopped
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planting::core::{ActorId, LayerMask, SpatialOracle, ToolUse};
    use crate::planting::registry::ResourceCost;

    struct Held(bool);
    impl CapabilityInput for Held {
        fn is_capability_key_held(&self) -> bool {
            self.0
        }
    }

    /// Flat world with scripted player state; records every side effect.
    struct MockHost {
        covered: bool,
        cultivated: Box<dyn Fn(Vec3) -> bool>,
        occupied: Vec<Vec3>,
        stamina: f32,
        seeds: u32,
        tool: Option<ToolUse>,
        durability: f32,
        builds: u32,
        spawned: Vec<(Vec3, ActorId)>,
        feedback: Vec<Feedback>,
        stamina_spent: f32,
        seeds_spent: u32,
    }

    impl MockHost {
        fn new() -> Self {
            Self {
                covered: true,
                cultivated: Box::new(|_: Vec3| true),
                occupied: Vec::new(),
                stamina: 1000.0,
                seeds: 1000,
                tool: Some(ToolUse { stamina_cost: 5.0, uses_durability: false, durability_drain: 1.0 }),
                durability: 100.0,
                builds: 0,
                spawned: Vec::new(),
                feedback: Vec::new(),
                stamina_spent: 0.0,
                seeds_spent: 0,
            }
        }
    }

    impl TerrainOracle for MockHost {
        fn covers(&self, _position: Vec3) -> bool {
            self.covered
        }
        fn sample_height(&self, _x: f32, _z: f32) -> f32 {
            0.0
        }
        fn is_cultivated(&self, position: Vec3) -> bool {
            (self.cultivated)(position)
        }
    }

    impl SpatialOracle for MockHost {
        fn overlap_count(&self, position: Vec3, radius: f32, _layers: LayerMask) -> usize {
            self.occupied
                .iter()
                .chain(self.spawned.iter().map(|(p, _)| p))
                .filter(|p| p.distance(position) < radius)
                .count()
        }
    }

    impl PlayerResources for MockHost {
        fn actor(&self) -> ActorId {
            ActorId(42)
        }
        fn equipped_tool(&self) -> Option<ToolUse> {
            self.tool
        }
        fn has_stamina(&self, amount: f32) -> bool {
            self.stamina >= amount
        }
        fn consume_stamina(&mut self, amount: f32) {
            self.stamina -= amount;
            self.stamina_spent += amount;
        }
        fn has_requirements(&self, template: &PlantDef) -> bool {
            template.cost.iter().all(|c| self.seeds >= c.amount)
        }
        fn consume_resources(&mut self, template: &PlantDef) {
            for c in &template.cost {
                let taken = c.amount.min(self.seeds);
                self.seeds -= taken;
                self.seeds_spent += taken;
            }
        }
        fn drain_tool_durability(&mut self, amount: f32) -> f32 {
            self.durability -= amount;
            self.durability
        }
        fn record_build(&mut self) {
            self.builds += 1;
        }
    }

    impl ObjectSpawner for MockHost {
        fn instantiate(
            &mut self,
            _archetype: PlantArchetypeId,
            _template: &PlantDef,
            position: Vec3,
            _rotation: Quat,
            creator: ActorId,
        ) {
            self.spawned.push((position, creator));
        }
    }

    impl FeedbackSink for MockHost {
        fn play(&mut self, feedback: Feedback) {
            self.feedback.push(feedback);
        }
    }

    fn seedling(radius: f32) -> PlantDef {
        PlantDef {
            name: "carrot".into(),
            grow_radius: Some(radius),
            cost: vec![ResourceCost { item: "carrot_seeds".into(), amount: 1 }],
            cultivated_only: false,
            repair: false,
            place_effect: None,
            parts: Vec::new(),
        }
    }

    fn commit() -> PlacementContext {
        PlacementContext {
            success: true,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            archetype: PlantArchetypeId(0),
            planter: Entity::PLACEHOLDER,
        }
    }

    fn grid(n: u32) -> MassFarmingConfig {
        MassFarmingConfig { plant_grid_size: n, ..Default::default() }
    }

    fn run(host: &mut MockHost, template: &PlantDef, config: &MassFarmingConfig) -> BatchReport {
        match PlacementExecutor::execute(&commit(), template, config, &Held(true), host) {
            BatchOutcome::Ran(r) => r,
            other => panic!("batch did not run: {:?}", other),
        }
    }

    #[test]
    fn three_by_three_places_eight_around_origin() {
        let mut host = MockHost::new();
        let report = run(&mut host, &seedling(2.0), &grid(3));

        assert_eq!(report.placed, 8);
        assert_eq!(report.skipped_origin, 1);
        assert_eq!(report.stopped, None);
        assert!(host.spawned.iter().all(|(p, _)| p.length() > 1.0));
        assert!(host.spawned.iter().all(|(_, who)| *who == ActorId(42)));
        assert_eq!(host.builds, 8);
    }

    #[test]
    fn debits_match_placed_cells() {
        let mut host = MockHost::new();
        let report = run(&mut host, &seedling(1.0), &grid(5));
        assert_eq!(report.placed, 24);
        assert_eq!(host.seeds_spent, 24);
        assert_eq!(host.stamina_spent, 24.0 * 5.0);
    }

    #[test]
    fn stamina_exhaustion_stops_batch_with_feedback() {
        let mut host = MockHost::new();
        host.stamina = 17.0; // enough for three plants at 5 each
        let report = run(&mut host, &seedling(1.0), &grid(3));

        assert_eq!(report.placed, 3);
        assert_eq!(report.stopped, Some(BatchStop::NoStamina));
        assert_eq!(host.feedback, vec![Feedback::NoStamina]);
        assert_eq!(host.seeds_spent, 3);
        assert_eq!(host.stamina_spent, 15.0);
    }

    #[test]
    fn missing_materials_stop_silently() {
        let mut host = MockHost::new();
        host.seeds = 2;
        let report = run(&mut host, &seedling(1.0), &grid(3));

        assert_eq!(report.placed, 2);
        assert_eq!(report.stopped, Some(BatchStop::MissingMaterials));
        assert!(host.feedback.is_empty());
        assert_eq!(host.stamina_spent, 10.0);
    }

    #[test]
    fn broken_tool_keeps_the_last_placement() {
        let mut host = MockHost::new();
        host.tool = Some(ToolUse { stamina_cost: 1.0, uses_durability: true, durability_drain: 10.0 });
        host.durability = 30.0;
        let report = run(&mut host, &seedling(1.0), &grid(3));

        assert_eq!(report.placed, 3);
        assert_eq!(report.stopped, Some(BatchStop::ToolBroken));
        assert_eq!(host.spawned.len(), 3);
        assert_eq!(host.durability, 0.0);
    }

    #[test]
    fn occupied_cells_are_skipped_not_fatal() {
        let mut host = MockHost::new();
        // Block the first cell of the first row: (2, 0, -2) for spacing 2.
        host.occupied.push(Vec3::new(2.0, 0.0, -2.0));
        let report = run(&mut host, &seedling(1.0), &grid(3));

        assert_eq!(report.skipped_occupied, 1);
        assert_eq!(report.placed, 7);
        assert!(host.spawned.iter().all(|(p, _)| p.distance(Vec3::new(2.0, 0.0, -2.0)) > 1.0));
        assert_eq!(host.seeds_spent, 7);
    }

    #[test]
    fn cultivated_only_skips_raw_ground() {
        let mut host = MockHost::new();
        host.cultivated = Box::new(|p: Vec3| p.x >= 0.0);
        let mut template = seedling(1.0);
        template.cultivated_only = true;
        let report = run(&mut host, &template, &grid(3));

        assert_eq!(report.skipped_ground, 3);
        assert_eq!(report.placed, 5);
        assert!(host.spawned.iter().all(|(p, _)| p.x >= 0.0));
    }

    #[test]
    fn stamina_bypass_plants_without_stamina() {
        let mut host = MockHost::new();
        host.stamina = 0.0;
        let config = MassFarmingConfig { plant_grid_size: 3, ignore_stamina: true, ..Default::default() };
        let report = run(&mut host, &seedling(1.0), &config);

        assert_eq!(report.placed, 8);
        assert_eq!(report.stopped, None);
        assert_eq!(host.stamina_spent, 0.0);
        assert!(host.feedback.is_empty());
    }

    #[test]
    fn cost_bypass_still_debits_held_seeds() {
        let mut host = MockHost::new();
        host.seeds = 100;
        let config = MassFarmingConfig { plant_grid_size: 3, ignore_placement_cost: true, ..Default::default() };
        let report = run(&mut host, &seedling(1.0), &config);

        assert_eq!(report.placed, 8);
        assert_eq!(host.seeds_spent, report.placed);
        assert_eq!(host.seeds, 92);
    }

    #[test]
    fn cost_bypass_plants_with_empty_pockets() {
        let mut host = MockHost::new();
        host.seeds = 3;
        let config = MassFarmingConfig { plant_grid_size: 3, ignore_placement_cost: true, ..Default::default() };
        let report = run(&mut host, &seedling(1.0), &config);

        assert_eq!(report.placed, 8);
        assert_eq!(report.stopped, None);
        assert_eq!(host.seeds_spent, 3);
        assert_eq!(host.seeds, 0);
    }

    #[test]
    fn stamina_shortfall_wins_over_missing_materials() {
        let mut host = MockHost::new();
        host.stamina = 7.0; // one plant at 5
        host.seeds = 1;
        let report = run(&mut host, &seedling(1.0), &grid(3));

        assert_eq!(report.placed, 1);
        assert_eq!(report.stopped, Some(BatchStop::NoStamina));
        assert_eq!(host.feedback, vec![Feedback::NoStamina]);
        assert_eq!(host.seeds_spent, 1);
    }

    #[test]
    fn place_effect_plays_per_cell() {
        let mut host = MockHost::new();
        let mut template = seedling(1.0);
        template.place_effect = Some("vfx_plant".into());
        let report = run(&mut host, &template, &grid(3));

        let effects = host
            .feedback
            .iter()
            .filter(|f| matches!(f, Feedback::PlaceEffect { .. }))
            .count();
        assert_eq!(effects as u32, report.placed);
    }

    #[test]
    fn gating_conditions_skip_the_batch() {
        let template = seedling(1.0);
        let config = grid(3);

        let mut host = MockHost::new();
        let mut failed = commit();
        failed.success = false;
        assert_eq!(
            PlacementExecutor::execute(&failed, &template, &config, &Held(true), &mut host),
            BatchOutcome::Skipped(NotTriggered::PlacementFailed)
        );

        assert_eq!(
            PlacementExecutor::execute(&commit(), &template, &config, &Held(false), &mut host),
            BatchOutcome::Skipped(NotTriggered::HotkeyReleased)
        );

        let mut bush = template.clone();
        bush.grow_radius = None;
        assert_eq!(
            PlacementExecutor::execute(&commit(), &bush, &config, &Held(true), &mut host),
            BatchOutcome::Skipped(NotTriggered::NotBatchable)
        );

        host.covered = false;
        assert_eq!(
            PlacementExecutor::execute(&commit(), &template, &config, &Held(true), &mut host),
            BatchOutcome::Skipped(NotTriggered::NoTerrain)
        );
        assert!(host.spawned.is_empty());
    }

    #[test]
    fn newer_commit_replaces_stale_one() {
        let mut exec = PlacementExecutor::default();
        let mut first = commit();
        first.position = Vec3::X;
        exec.record_commit(first);
        exec.record_commit(commit());

        assert_eq!(exec.take_pending().map(|c| c.position), Some(Vec3::ZERO));
        assert!(exec.take_pending().is_none());
    }
}
