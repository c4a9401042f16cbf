use thiserror::Error;
use tracing::info;

use super::audio::SfxHandle;
use super::map::Tilemap;
use super::movement::Player;
use super::rendering::RenderTarget;

pub const DEFAULT_JUMP_SFX: SfxHandle = SfxHandle("jump");

/// Index into the scene registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(pub usize);

/// State owned by one scene. The machine hands it to the scene on every call.
#[derive(Debug, Clone)]
pub struct SceneState {
    pub player: Player,
    pub map: Tilemap,
    pub jump_sfx: SfxHandle,
    /// `Some` once the scene wants the machine to move to another scene.
    pub next_scene: Option<SceneId>,
}

impl Default for SceneState {
    fn default() -> Self {
        Self {
            player: Player::default(),
            map: Tilemap::default(),
            jump_sfx: DEFAULT_JUMP_SFX,
            next_scene: None,
        }
    }
}

pub trait Scene {
    fn name(&self) -> &'static str;
    /// Resets the scene's transient state. Runs right before the first
    /// update after every activation.
    fn initialise(&mut self, state: &mut SceneState);
    fn update(&mut self, fixed_dt_seconds: f32, state: &mut SceneState);
    fn render(&self, state: &SceneState, target: &mut dyn RenderTarget);
}

/// Forces `from -> to` when the player drops below `below_y`, whatever the
/// scene itself asked for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallThroughRule {
    pub from: SceneId,
    pub to: SceneId,
    pub below_y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SceneError {
    #[error("scene registry is empty")]
    EmptyRegistry,
    #[error("scene id {id} is not registered ({registered} scenes available)")]
    UnknownScene { id: usize, registered: usize },
    #[error("scene registry has been released")]
    Released,
}

struct SceneRuntime {
    scene: Box<dyn Scene>,
    state: SceneState,
    initialise_count: u32,
}

impl SceneRuntime {
    fn initialise(&mut self) {
        self.state.next_scene = None;
        let (scene, state) = (&mut self.scene, &mut self.state);
        scene.initialise(state);
        self.initialise_count = self.initialise_count.saturating_add(1);
    }
}

/// Fixed registry of scenes with exactly one active entry.
///
/// Registry entry 0 becomes active and is initialised on construction.
/// After [`SceneMachine::shutdown_all`] the registry keeps its entries with
/// reset state; updates and renders become no-ops and switches fail.
pub struct SceneMachine {
    scenes: Vec<SceneRuntime>,
    active: SceneId,
    fall_through: Option<FallThroughRule>,
    released: bool,
}

impl SceneMachine {
    pub fn new(
        scenes: Vec<Box<dyn Scene>>,
        fall_through: Option<FallThroughRule>,
    ) -> Result<Self, SceneError> {
        if scenes.is_empty() {
            return Err(SceneError::EmptyRegistry);
        }
        let registered = scenes.len();
        if let Some(rule) = fall_through {
            for id in [rule.from, rule.to] {
                if id.0 >= registered {
                    return Err(SceneError::UnknownScene { id: id.0, registered });
                }
            }
        }

        let mut machine = Self {
            scenes: scenes
                .into_iter()
                .map(|scene| SceneRuntime {
                    scene,
                    state: SceneState::default(),
                    initialise_count: 0,
                })
                .collect(),
            active: SceneId(0),
            fall_through,
            released: false,
        };
        machine.active_runtime_mut().initialise();
        info!(
            scene = machine.active_name(),
            id = machine.active.0,
            registered,
            "scene_initialised"
        );
        Ok(machine)
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn active_scene(&self) -> SceneId {
        self.active
    }

    pub fn active_name(&self) -> &'static str {
        self.active_runtime_ref().scene.name()
    }

    pub fn active_state(&self) -> &SceneState {
        &self.active_runtime_ref().state
    }

    pub fn active_state_mut(&mut self) -> &mut SceneState {
        &mut self.active_runtime_mut().state
    }

    /// How many times scene `id` has been initialised so far.
    pub fn initialise_count(&self, id: SceneId) -> Option<u32> {
        self.scenes.get(id.0).map(|runtime| runtime.initialise_count)
    }

    pub fn update_active(&mut self, fixed_dt_seconds: f32) {
        if self.released {
            return;
        }
        let runtime = self.active_runtime_mut();
        let (scene, state) = (&mut runtime.scene, &mut runtime.state);
        scene.update(fixed_dt_seconds, state);
    }

    pub fn render_active(&self, target: &mut dyn RenderTarget) {
        if self.released {
            return;
        }
        let runtime = self.active_runtime_ref();
        runtime.scene.render(&runtime.state, target);
    }

    /// The scene the machine should move to at the next iteration boundary.
    pub fn pending_transition(&self) -> Option<SceneId> {
        let state = self.active_state();
        let forced = self.fall_through.and_then(|rule| {
            (rule.from == self.active && state.player.position().y < rule.below_y)
                .then_some(rule.to)
        });
        forced.or(state.next_scene)
    }

    /// Activates `next_scene` and initialises it before anything else can
    /// reach it. Switching to the active scene restarts it.
    pub fn switch_to(&mut self, next_scene: SceneId) -> Result<(), SceneError> {
        if self.released {
            return Err(SceneError::Released);
        }
        let registered = self.scenes.len();
        if next_scene.0 >= registered {
            return Err(SceneError::UnknownScene {
                id: next_scene.0,
                registered,
            });
        }

        let previous = self.active;
        self.active = next_scene;
        self.active_runtime_mut().initialise();
        info!(
            from = previous.0,
            to = next_scene.0,
            scene = self.active_name(),
            "scene_switched"
        );
        Ok(())
    }

    /// Drops every scene's state. Calling it again does nothing.
    pub fn shutdown_all(&mut self) {
        if self.released {
            return;
        }
        for runtime in &mut self.scenes {
            runtime.state = SceneState::default();
            info!(scene = runtime.scene.name(), "scene_released");
        }
        self.released = true;
    }

    fn active_runtime_mut(&mut self) -> &mut SceneRuntime {
        &mut self.scenes[self.active.0]
    }

    fn active_runtime_ref(&self) -> &SceneRuntime {
        &self.scenes[self.active.0]
    }
}


#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::testing::{count, EventLog, ScriptedScene};
    use super::*;
    use crate::app::rendering::testing::RecordingTarget;

    fn machine_with(
        a: ScriptedScene,
        b: ScriptedScene,
        fall_through: Option<FallThroughRule>,
    ) -> SceneMachine {
        SceneMachine::new(vec![Box::new(a), Box::new(b)], fall_through).expect("machine")
    }

    #[test]
    fn empty_registry_is_rejected() {
        let result = SceneMachine::new(Vec::new(), None);
        assert!(matches!(result, Err(SceneError::EmptyRegistry)));
    }

    #[test]
    fn fall_through_rule_must_reference_registered_scenes() {
        let log = EventLog::default();
        let result = SceneMachine::new(
            vec![Box::new(ScriptedScene::new("A", &log))],
            Some(FallThroughRule {
                from: SceneId(0),
                to: SceneId(3),
                below_y: -10.0,
            }),
        );
        assert!(matches!(
            result,
            Err(SceneError::UnknownScene { id: 3, registered: 1 })
        ));
    }

    #[test]
    fn first_registry_entry_is_initialised_on_construction() {
        let log = EventLog::default();
        let machine = machine_with(
            ScriptedScene::new("A", &log),
            ScriptedScene::new("B", &log),
            None,
        );

        assert_eq!(machine.active_scene(), SceneId(0));
        assert_eq!(machine.active_name(), "A");
        assert_eq!(machine.initialise_count(SceneId(0)), Some(1));
        assert_eq!(machine.initialise_count(SceneId(1)), Some(0));
        assert_eq!(*log.borrow(), vec!["A:initialise".to_string()]);
    }

    #[test]
    fn scene_request_becomes_pending_transition() {
        let log = EventLog::default();
        let mut machine = machine_with(
            ScriptedScene::new("A", &log).requesting(2, SceneId(1)),
            ScriptedScene::new("B", &log),
            None,
        );

        machine.update_active(1.0 / 60.0);
        assert_eq!(machine.pending_transition(), None);
        machine.update_active(1.0 / 60.0);
        assert_eq!(machine.pending_transition(), Some(SceneId(1)));
    }

    #[test]
    fn switch_initialises_target_before_any_update() {
        let log = EventLog::default();
        let mut machine = machine_with(
            ScriptedScene::new("A", &log),
            ScriptedScene::new("B", &log),
            None,
        );

        machine.switch_to(SceneId(1)).expect("switch");
        machine.update_active(1.0 / 60.0);

        let events = log.borrow().clone();
        assert_eq!(events, vec!["A:initialise", "B:initialise", "B:update"]);
        assert_eq!(machine.active_state().next_scene, None);
    }

    #[test]
    fn switching_back_reinitialises_the_scene() {
        let log = EventLog::default();
        let mut machine = machine_with(
            ScriptedScene::new("A", &log),
            ScriptedScene::new("B", &log),
            None,
        );

        machine.active_state_mut().player.teleport(Vec2::new(9.0, 4.0));
        machine.switch_to(SceneId(1)).expect("switch");
        machine.switch_to(SceneId(0)).expect("switch back");

        assert_eq!(count(&log, "A:initialise"), 2);
        assert_eq!(machine.active_state().player.position(), Vec2::new(1.5, 1.5));
    }

    #[test]
    fn unknown_scene_id_fails_without_changing_active_scene() {
        let log = EventLog::default();
        let mut machine = machine_with(
            ScriptedScene::new("A", &log),
            ScriptedScene::new("B", &log),
            None,
        );

        let result = machine.switch_to(SceneId(7));
        assert_eq!(
            result,
            Err(SceneError::UnknownScene {
                id: 7,
                registered: 2
            })
        );
        assert_eq!(machine.active_scene(), SceneId(0));
    }

    #[test]
    fn fall_through_overrides_scene_request() {
        let log = EventLog::default();
        let mut machine = machine_with(
            ScriptedScene::new("A", &log),
            ScriptedScene::new("B", &log),
            Some(FallThroughRule {
                from: SceneId(0),
                to: SceneId(1),
                below_y: -10.0,
            }),
        );

        machine.active_state_mut().next_scene = Some(SceneId(0));
        machine.active_state_mut().player.teleport(Vec2::new(3.0, -10.5));
        assert_eq!(machine.pending_transition(), Some(SceneId(1)));
    }

    #[test]
    fn fall_through_only_applies_to_its_source_scene() {
        let log = EventLog::default();
        let mut machine = machine_with(
            ScriptedScene::new("A", &log),
            ScriptedScene::new("B", &log),
            Some(FallThroughRule {
                from: SceneId(0),
                to: SceneId(1),
                below_y: -10.0,
            }),
        );

        machine.switch_to(SceneId(1)).expect("switch");
        machine.active_state_mut().player.teleport(Vec2::new(3.0, -50.0));
        assert_eq!(machine.pending_transition(), None);
    }

    #[test]
    fn inactive_scene_does_not_advance() {
        let log = EventLog::default();
        let mut machine = machine_with(
            ScriptedScene::new("A", &log),
            ScriptedScene::new("B", &log),
            None,
        );

        machine.switch_to(SceneId(1)).expect("switch");
        for _ in 0..10 {
            machine.update_active(1.0 / 60.0);
        }

        assert_eq!(count(&log, "A:update"), 0);
        assert_eq!(count(&log, "B:update"), 10);
    }

    #[test]
    fn render_is_forwarded_to_the_active_scene_only() {
        let log = EventLog::default();
        let mut machine = machine_with(
            ScriptedScene::new("A", &log),
            ScriptedScene::new("B", &log),
            None,
        );
        machine.switch_to(SceneId(1)).expect("switch");

        let mut target = RecordingTarget::default();
        machine.render_active(&mut target);

        assert_eq!(count(&log, "B:render"), 1);
        assert_eq!(count(&log, "A:render"), 0);
        assert_eq!(target.quads.len(), 1);
    }

    #[test]
    fn shutdown_releases_every_scene() {
        let log = EventLog::default();
        let mut machine = machine_with(
            ScriptedScene::new("A", &log),
            ScriptedScene::new("B", &log),
            None,
        );

        machine.shutdown_all();
        machine.shutdown_all();

        assert!(machine.is_released());
        assert_eq!(machine.len(), 2);
        assert_eq!(machine.active_name(), "A");
        assert_eq!(machine.active_state().player.position(), Vec2::ZERO);
    }

    #[test]
    fn released_machine_ignores_render_update_and_switch() {
        let log = EventLog::default();
        let mut machine = machine_with(
            ScriptedScene::new("A", &log),
            ScriptedScene::new("B", &log),
            None,
        );
        machine.shutdown_all();

        let mut target = RecordingTarget::default();
        machine.render_active(&mut target);
        machine.update_active(1.0 / 60.0);

        assert!(target.quads.is_empty());
        assert_eq!(count(&log, "A:render"), 0);
        assert_eq!(count(&log, "A:update"), 0);
        assert_eq!(machine.switch_to(SceneId(1)), Err(SceneError::Released));
        assert_eq!(machine.active_scene(), SceneId(0));
    }
}
