use tracing::debug;

/// Names a loaded sound effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SfxHandle(pub &'static str);

/// Fire-and-forget sound output.
pub trait AudioSink {
    fn play(&mut self, sfx: SfxHandle);
}

/// Sink used when no audio device is wired in; it only traces the trigger.
#[derive(Debug, Default)]
pub struct TracingAudio;

impl AudioSink for TracingAudio {
    fn play(&mut self, sfx: SfxHandle) {
        debug!(sfx = sfx.0, "sfx_played");
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Debug, Default)]
    pub(crate) struct RecordingAudio {
        pub(crate) played: Vec<SfxHandle>,
    }

    impl AudioSink for RecordingAudio {
        fn play(&mut self, sfx: SfxHandle) {
            self.played.push(sfx);
        }
    }
}
