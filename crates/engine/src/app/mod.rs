mod audio;
mod camera;
mod clock;
mod effects;
mod input;
mod loop_runner;
mod map;
mod metrics;
mod movement;
mod rendering;
mod scene;
mod simulation;

pub use audio::{AudioSink, SfxHandle, TracingAudio};
pub use camera::{
    CameraRig, MatrixSet, CAMERA_VERTICAL_OFFSET, LEVEL_LEFT_EDGE, VIEW_HALF_HEIGHT,
    VIEW_HALF_WIDTH,
};
pub use clock::{SimulationClock, StepPlan};
pub use effects::{effect_offset, effect_scale, Effect, EffectController, EffectKind};
pub use input::{InputAction, InputSnapshot};
pub use loop_runner::{run_app, AppError, LoopConfig, SLOW_FRAME_ENV_VAR};
pub use map::{CollisionOutcome, ContactFlags, Tilemap, TilemapError, TILE_EMPTY};
pub use metrics::LoopMetricsSnapshot;
pub use movement::{clamp_intent, movement_intent, Facing, Player, GRAVITY};
pub use rendering::{ndc_to_screen, FrameCanvas, RenderTarget, Renderer, Viewport};
pub use scene::{
    FallThroughRule, Scene, SceneError, SceneId, SceneMachine, SceneState, DEFAULT_JUMP_SFX,
};
pub use simulation::{FrameReport, Simulation, LANDING_SHAKE_SECONDS};
