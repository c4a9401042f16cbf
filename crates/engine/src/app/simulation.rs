use std::time::{Duration, Instant};

use glam::Vec2;
use tracing::{debug, warn};

use super::audio::AudioSink;
use super::camera::{CameraRig, MatrixSet};
use super::clock::{SimulationClock, StepPlan};
use super::effects::{EffectController, EffectKind};
use super::input::InputSnapshot;
use super::rendering::RenderTarget;
use super::scene::{SceneError, SceneId, SceneMachine};

pub const LANDING_SHAKE_SECONDS: f32 = 1.0;

/// What one call to [`Simulation::run_frame`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub plan: StepPlan,
    pub ticks_run: u32,
    /// Planned ticks withheld because a transition became pending mid-drain.
    pub ticks_skipped: u32,
    pub transition: Option<SceneId>,
}

impl FrameReport {
    fn idle() -> Self {
        Self {
            plan: StepPlan {
                raw_frame_delta: Duration::ZERO,
                ticks_to_run: 0,
                dropped_backlog: Duration::ZERO,
            },
            ticks_run: 0,
            ticks_skipped: 0,
            transition: None,
        }
    }
}

/// Everything the loop mutates, owned in one place.
///
/// A frame applies input, drains the fixed ticks owed by the clock (active
/// scene first, then the effect controller), recomputes the camera and then
/// performs at most one scene transition. Rendering reads the matrices left
/// by the last frame.
pub struct Simulation {
    scenes: SceneMachine,
    clock: SimulationClock,
    effects: EffectController,
    camera: CameraRig,
    audio: Box<dyn AudioSink>,
    matrices: MatrixSet,
    landing_shake: bool,
    terminated: bool,
}

impl Simulation {
    pub fn new(
        scenes: SceneMachine,
        clock: SimulationClock,
        camera: CameraRig,
        audio: Box<dyn AudioSink>,
    ) -> Self {
        let matrices = camera.matrices(scenes.active_state().player.position(), Vec2::ZERO, 1.0);
        Self {
            scenes,
            clock,
            effects: EffectController::new(),
            camera,
            audio,
            matrices,
            landing_shake: false,
            terminated: false,
        }
    }

    pub fn with_landing_shake(mut self, enabled: bool) -> Self {
        self.landing_shake = enabled;
        self
    }

    pub fn scenes(&self) -> &SceneMachine {
        &self.scenes
    }

    pub fn scenes_mut(&mut self) -> &mut SceneMachine {
        &mut self.scenes
    }

    pub fn effects(&self) -> &EffectController {
        &self.effects
    }

    pub fn effects_mut(&mut self) -> &mut EffectController {
        &mut self.effects
    }

    pub fn matrices(&self) -> MatrixSet {
        self.matrices
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Starts the frame clock at `now` so the first frame does not see the
    /// time spent on startup.
    pub fn start_clock(&mut self, now: Instant) {
        self.clock.reset(now);
    }

    /// Runs one real frame measured against the wall clock.
    pub fn run_frame(
        &mut self,
        input: &InputSnapshot,
        now: Instant,
    ) -> Result<FrameReport, SceneError> {
        if !self.accept_input(input) {
            return Ok(FrameReport::idle());
        }
        let plan = self.clock.advance_to(now);
        self.drain_and_transition(plan)
    }

    /// Same as [`Simulation::run_frame`] with an explicit frame delta.
    pub fn run_frame_with_delta(
        &mut self,
        input: &InputSnapshot,
        frame_dt: Duration,
    ) -> Result<FrameReport, SceneError> {
        if !self.accept_input(input) {
            return Ok(FrameReport::idle());
        }
        let plan = self.clock.advance_by(frame_dt);
        self.drain_and_transition(plan)
    }

    /// Draws the active scene. Does nothing once the simulation has
    /// terminated.
    pub fn render(&self, target: &mut dyn RenderTarget) {
        if self.terminated {
            return;
        }
        target.set_view_projection(self.matrices.view, self.matrices.projection);
        self.scenes.render_active(target);
    }

    pub fn shutdown(&mut self) {
        self.terminated = true;
        self.scenes.shutdown_all();
    }

    /// Returns false once quit has been observed; nothing ticks after that.
    fn accept_input(&mut self, input: &InputSnapshot) -> bool {
        if self.terminated {
            return false;
        }
        if input.quit_requested() {
            self.terminated = true;
            debug!(scene = self.scenes.active_name(), "quit_observed");
            return false;
        }

        let state = self.scenes.active_state_mut();
        state.player.apply_input(input);
        if input.jump_pressed() {
            let sfx = state.jump_sfx;
            if !state.player.request_jump(self.audio.as_mut(), sfx) {
                debug!("jump_rejected_airborne");
            }
        }
        true
    }

    fn drain_and_transition(&mut self, plan: StepPlan) -> Result<FrameReport, SceneError> {
        if !plan.dropped_backlog.is_zero() {
            warn!(
                dropped_backlog_ms = plan.dropped_backlog.as_secs_f64() * 1000.0,
                max_ticks_per_frame = self.clock.max_ticks_per_frame(),
                "sim_backlog_dropped"
            );
        }

        let fixed_dt = self.clock.fixed_step_seconds();
        let mut ticks_run = 0u32;
        let mut pending = None;
        while ticks_run < plan.ticks_to_run {
            let grounded_before = self.scenes.active_state().player.collided_bottom();
            self.scenes.update_active(fixed_dt);
            self.effects.update(fixed_dt);
            ticks_run += 1;

            let grounded_after = self.scenes.active_state().player.collided_bottom();
            if self.landing_shake && !grounded_before && grounded_after {
                self.effects.start(EffectKind::Shake, LANDING_SHAKE_SECONDS);
            }

            pending = self.scenes.pending_transition();
            if pending.is_some() {
                break;
            }
        }

        self.matrices = self.camera.matrices(
            self.scenes.active_state().player.position(),
            self.effects.view_offset(),
            self.effects.view_scale(),
        );

        if let Some(target) = pending {
            self.scenes.switch_to(target)?;
        }

        Ok(FrameReport {
            plan,
            ticks_run,
            ticks_skipped: plan.ticks_to_run - ticks_run,
            transition: pending,
        })
    }
}
