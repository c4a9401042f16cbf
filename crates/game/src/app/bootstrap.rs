use engine::{
    AudioSink, FallThroughRule, LoopConfig, Scene, SceneError, SceneId, SceneMachine,
    TracingAudio,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::levels::{LevelError, LevelScene, LEVEL_A_JSON, LEVEL_B_JSON};

const FALL_THROUGH_Y: f32 = -10.0;

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error("failed to load level {level}: {source}")]
    Level {
        level: &'static str,
        #[source]
        source: LevelError,
    },
    #[error(transparent)]
    Scene(#[from] SceneError),
}

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scenes: SceneMachine,
    pub(crate) audio: Box<dyn AudioSink>,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Platformer Startup ===");

    let scenes = build_scene_machine()?;
    Ok(AppWiring {
        config: LoopConfig::default(),
        scenes,
        audio: Box::new(TracingAudio),
    })
}

/// LevelA is entry 0 and starts active; dropping out of it lands in LevelB.
pub(crate) fn build_scene_machine() -> Result<SceneMachine, BootstrapError> {
    let scenes: Vec<Box<dyn Scene>> = vec![
        Box::new(load_level("LevelA", LEVEL_A_JSON)?),
        Box::new(load_level("LevelB", LEVEL_B_JSON)?),
    ];
    let fall_through = FallThroughRule {
        from: SceneId(0),
        to: SceneId(1),
        below_y: FALL_THROUGH_Y,
    };
    Ok(SceneMachine::new(scenes, Some(fall_through))?)
}

fn load_level(level: &'static str, raw: &str) -> Result<LevelScene, BootstrapError> {
    LevelScene::from_json(level, raw).map_err(|source| BootstrapError::Level { level, source })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
