/*!
Session: owns the static world built at load time and runs the fixed-step simulation.

Load pipeline (synchronous, completes before the first tick):
1. classify the scene graph,
2. synthesize colliders into the physics port,
3. select hub and destination platforms, link portals,
4. spawn the character at the hub.

Per tick: controller sweep, world-floor recovery, proximity scan. Pickup sensors are the only
part of the static world touched after load (disabled on collection, restored on respawn).
*/

use log::{info, warn};
use thiserror::Error;
use wayfarer_shared::{
    Classification, ClassifiedMesh, ColliderRecord, ColliderSynthesizer, ConfigError,
    MeshClassifier, PhysicsPort, PlatformLayout, PlatformSelector, Registries, SceneGraph,
    SensorTag, SynthesisReport, Vec3, constants::DESTINATION_COUNT,
};

use crate::{
    clock::FixedStepClock,
    config::GameConfig,
    controller::{CharacterController, MoveIntent, TickReport},
    events::{FocusTarget, GameEvent},
    interaction::InteractionDetector,
};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("scene produced no solid colliders")]
    EmptyWorld,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LoadStage {
    Classifying,
    Synthesizing,
    SelectingPlatforms,
    Ready,
}

pub struct Session<P: PhysicsPort> {
    config: GameConfig,
    physics: P,
    meshes: Vec<ClassifiedMesh>,
    registries: Registries,
    synthesizer: ColliderSynthesizer,
    synthesis: SynthesisReport,
    layout: PlatformLayout,
    controller: CharacterController,
    detector: InteractionDetector,
    clock: FixedStepClock,
    events: Vec<GameEvent>,
    score: u32,
    /// Jump edge sampled by `advance` but not yet delivered to a tick.
    pending_jump: bool,
    ticks: u64,
    last_tick: TickReport,
}

impl<P: PhysicsPort> Session<P> {
    pub fn load(scene: &SceneGraph, config: GameConfig, physics: P) -> Result<Self, LoadError> {
        Self::load_with_progress(scene, config, physics, |_, _| {})
    }

    /// Like [`Session::load`], reporting each stage with its completion fraction.
    pub fn load_with_progress(
        scene: &SceneGraph,
        config: GameConfig,
        mut physics: P,
        mut progress: impl FnMut(LoadStage, f32),
    ) -> Result<Self, LoadError> {
        config.validate()?;

        progress(LoadStage::Classifying, 0.0);
        let classifier = MeshClassifier::new(
            config.classifier.clone(),
            config.sensors.clone(),
            config.vocabulary.clone(),
        );
        let Classification {
            meshes,
            mut registries,
            ..
        } = classifier.classify(scene);

        progress(LoadStage::Synthesizing, 0.4);
        let mut synthesizer = ColliderSynthesizer::new(config.synthesis.clone());
        let synthesis = synthesizer.build(&meshes, &mut registries, &mut physics);
        if synthesizer.solid_count() == 0 {
            warn!("load failed: no solid colliders out of {} meshes", meshes.len());
            return Err(LoadError::EmptyWorld);
        }

        progress(LoadStage::SelectingPlatforms, 0.8);
        let layout = PlatformSelector::new(config.platforms.clone()).select(&meshes);
        registries.link_portals(DESTINATION_COUNT);

        let controller = CharacterController::new(config.controller.clone(), layout.hub.position);
        let detector = InteractionDetector::new(config.interaction.clone());
        let clock = FixedStepClock::new(&config.tick);

        info!(
            "session ready: {} meshes, {} colliders, spawn at {:?}",
            meshes.len(),
            synthesizer.records().len(),
            layout.hub.position
        );
        progress(LoadStage::Ready, 1.0);

        Ok(Self {
            config,
            physics,
            meshes,
            registries,
            synthesizer,
            synthesis,
            layout,
            controller,
            detector,
            clock,
            events: Vec::new(),
            score: 0,
            pending_jump: false,
            ticks: 0,
            last_tick: TickReport::default(),
        })
    }

    /// Feed one presentation frame. Runs as many fixed ticks as the clock allows; a jump edge in
    /// `intent` goes to the first of them (or waits for the next frame that runs a tick).
    pub fn advance(&mut self, frame_dt: f32, intent: &MoveIntent) -> u32 {
        self.pending_jump |= intent.jump_pressed;
        let steps = self.clock.advance(frame_dt);
        for _ in 0..steps {
            let tick_intent = MoveIntent {
                jump_pressed: std::mem::take(&mut self.pending_jump),
                ..*intent
            };
            self.tick(&tick_intent);
        }
        steps
    }

    /// Run exactly one fixed tick.
    pub fn tick(&mut self, intent: &MoveIntent) {
        let dt = self.clock.step();
        let feet = self.controller.feet_position();
        let ladder = self
            .registries
            .nearest_ladder(&feet, self.config.controller.ladder_tolerance);
        self.last_tick = self.controller.tick(&mut self.physics, intent, ladder, dt);

        if self.controller.position().y < self.config.controller.world_floor_y {
            warn!(
                "fell out of the world at {:?}, returning to hub",
                self.controller.position()
            );
            self.controller.teleport(self.layout.hub.position);
            self.events.push(GameEvent::FellOutOfWorld);
        }

        let outcome = self.detector.scan(
            self.controller.position(),
            self.controller.capsule(),
            &mut self.registries,
        );
        if !outcome.collected.is_empty() {
            for collected in &outcome.collected {
                if let Some(id) = collected.collider {
                    self.physics.set_collider_enabled(id, false);
                }
                self.score += 1;
                self.events.push(GameEvent::PickupCollected(collected.handle));
            }
            self.physics.commit();
        }
        if let Some(focus) = outcome.focus_changed {
            self.events.push(GameEvent::FocusChanged(focus));
        }

        self.ticks += 1;
    }

    /// Restore every collected pickup and reset the score.
    pub fn respawn_all(&mut self) {
        let restored = self.registries.respawn_all();
        for id in &restored {
            self.physics.set_collider_enabled(*id, true);
        }
        self.physics.commit();
        info!("respawned {} pickups", restored.len());
        self.score = 0;
        self.events.push(GameEvent::RespawnAll);
    }

    /// Use the current focus: portals teleport, NPCs emit [`GameEvent::Interacted`].
    /// Returns `false` when there is nothing to activate.
    pub fn activate_focus(&mut self) -> bool {
        match self.detector.focus() {
            Some(FocusTarget::Portal(handle)) => {
                let Some(destination) = self
                    .registries
                    .portals
                    .get(handle)
                    .and_then(|p| p.destination)
                else {
                    return false;
                };
                self.teleport_to_destination(destination)
            }
            Some(FocusTarget::Npc(handle)) => {
                self.events.push(GameEvent::Interacted(handle));
                true
            }
            None => false,
        }
    }

    pub fn teleport_to_hub(&mut self) {
        self.teleport(self.layout.hub.position);
    }

    /// Out-of-range indices are ignored.
    pub fn teleport_to_destination(&mut self, index: usize) -> bool {
        match self.layout.destinations.get(index) {
            Some(anchor) => {
                let to = anchor.position;
                self.teleport(to);
                true
            }
            None => false,
        }
    }

    fn teleport(&mut self, to: Vec3) {
        self.controller.teleport(to);
        self.events.push(GameEvent::Teleported { to });
    }

    /// Tags of enabled sensors currently touching the character.
    pub fn overlapping_sensors(&self) -> Vec<SensorTag> {
        self.physics
            .overlap_sensors(self.controller.position(), self.controller.capsule())
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn physics(&self) -> &P {
        &self.physics
    }

    pub fn meshes(&self) -> &[ClassifiedMesh] {
        &self.meshes
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    pub fn colliders(&self) -> &[ColliderRecord] {
        self.synthesizer.records()
    }

    pub fn synthesis_report(&self) -> &SynthesisReport {
        &self.synthesis
    }

    pub fn layout(&self) -> &PlatformLayout {
        &self.layout
    }

    pub fn controller(&self) -> &CharacterController {
        &self.controller
    }

    pub fn position(&self) -> Vec3 {
        self.controller.position()
    }

    pub fn velocity(&self) -> Vec3 {
        self.controller.velocity()
    }

    pub fn is_grounded(&self) -> bool {
        self.controller.is_grounded()
    }

    pub fn focus(&self) -> Option<FocusTarget> {
        self.detector.focus()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn last_tick(&self) -> &TickReport {
        &self.last_tick
    }

    /// Presentation interpolation factor between the last two ticks.
    pub fn alpha(&self) -> f32 {
        self.clock.alpha()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_shared::{FlatWorld, Material, MeshData, SceneNode, Transform};

    fn floor_scene() -> SceneGraph {
        SceneGraph::new(vec![
            SceneNode::mesh(
                "Plaza_Floor",
                MeshData::cuboid([20.0, 0.5, 20.0], Material::named("stone")),
            )
            .with_transform(Transform::from_translation(Vec3::new(0.0, -0.25, 0.0))),
        ])
    }

    #[test]
    fn progress_reports_every_stage_in_order() {
        let mut stages = Vec::new();
        let session = Session::load_with_progress(
            &floor_scene(),
            GameConfig::default(),
            FlatWorld::default(),
            |stage, fraction| stages.push((stage, fraction)),
        )
        .expect("load");

        let order: Vec<_> = stages.iter().map(|(s, _)| *s).collect();
        assert_eq!(
            order,
            vec![
                LoadStage::Classifying,
                LoadStage::Synthesizing,
                LoadStage::SelectingPlatforms,
                LoadStage::Ready
            ]
        );
        assert!(stages.windows(2).all(|w| w[0].1 < w[1].1));
        assert_eq!(session.ticks(), 0);
    }

    #[test]
    fn scene_without_solids_is_rejected() {
        let scene = SceneGraph::new(vec![SceneNode::group("Empty")]);
        let result = Session::load(&scene, GameConfig::default(), FlatWorld::default());
        assert!(matches!(result, Err(LoadError::EmptyWorld)));
    }

    #[test]
    fn invalid_config_is_rejected_before_loading() {
        let mut config = GameConfig::default();
        config.controller.double_jump_multiplier = 1.5;
        let result = Session::load(&floor_scene(), config, FlatWorld::default());
        assert!(matches!(result, Err(LoadError::Config(ConfigError::Invalid(_)))));
    }

    #[test]
    fn jump_edge_reaches_only_the_first_tick_of_a_frame() {
        let mut session =
            Session::load(&floor_scene(), GameConfig::default(), FlatWorld::default())
                .expect("load");
        for _ in 0..60 {
            session.tick(&MoveIntent::default());
        }
        assert!(session.is_grounded());

        let jump = MoveIntent {
            jump_pressed: true,
            ..MoveIntent::default()
        };
        // Three ticks in one frame; a repeated edge would also spend the air jump.
        assert_eq!(session.advance(3.0 / 60.0 + 1e-4, &jump), 3);
        assert_eq!(session.controller().state().jumps_used, 1);
    }

    #[test]
    fn jump_edge_waits_for_a_frame_that_ticks() {
        let mut session =
            Session::load(&floor_scene(), GameConfig::default(), FlatWorld::default())
                .expect("load");
        for _ in 0..60 {
            session.tick(&MoveIntent::default());
        }
        let jump = MoveIntent {
            jump_pressed: true,
            ..MoveIntent::default()
        };
        assert_eq!(session.advance(0.001, &jump), 0);
        assert_eq!(session.advance(1.0 / 60.0, &MoveIntent::default()), 1);
        assert!(session.last_tick().jump.is_some());
    }

    #[test]
    fn out_of_range_destination_is_ignored() {
        let mut session =
            Session::load(&floor_scene(), GameConfig::default(), FlatWorld::default())
                .expect("load");
        let before = session.position();
        assert!(!session.teleport_to_destination(DESTINATION_COUNT));
        assert_eq!(session.position(), before);
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn teleport_to_hub_resets_motion() {
        let mut session =
            Session::load(&floor_scene(), GameConfig::default(), FlatWorld::default())
                .expect("load");
        for _ in 0..30 {
            session.tick(&MoveIntent {
                forward: 1.0,
                ..MoveIntent::default()
            });
        }
        session.drain_events();

        session.teleport_to_hub();
        let hub = session.layout().hub.position;
        assert_eq!(session.position(), hub);
        assert_eq!(session.velocity(), Vec3::zeros());
        assert_eq!(session.drain_events(), vec![GameEvent::Teleported { to: hub }]);
    }

    #[test]
    fn activate_without_focus_does_nothing() {
        let mut session =
            Session::load(&floor_scene(), GameConfig::default(), FlatWorld::default())
                .expect("load");
        assert!(!session.activate_focus());
    }
}
