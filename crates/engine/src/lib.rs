//! Fixed-timestep driver for a scene-based 2D platformer.
//!
//! The [`Simulation`] owns the scene registry, the tick clock, the active
//! screen effect and the camera; [`run_app`] wraps it in a winit window with a
//! `pixels` framebuffer.

pub mod app;

pub use app::{
    clamp_intent, effect_offset, effect_scale, movement_intent, ndc_to_screen, run_app,
    AppError, AudioSink, CameraRig, CollisionOutcome, ContactFlags, Effect, EffectController,
    EffectKind, Facing, FallThroughRule, FrameCanvas, FrameReport, InputAction, InputSnapshot,
    LoopConfig, LoopMetricsSnapshot, MatrixSet, Player, RenderTarget, Renderer, Scene, SceneError,
    SceneId, SceneMachine, SceneState, SfxHandle, Simulation, SimulationClock, StepPlan, Tilemap,
    TilemapError, TracingAudio, Viewport, CAMERA_VERTICAL_OFFSET, DEFAULT_JUMP_SFX, GRAVITY,
    LANDING_SHAKE_SECONDS, LEVEL_LEFT_EDGE, SLOW_FRAME_ENV_VAR, TILE_EMPTY, VIEW_HALF_HEIGHT,
    VIEW_HALF_WIDTH,
};
pub use glam::{Mat4, Vec2, Vec3};
