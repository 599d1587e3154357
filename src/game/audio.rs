use scenegraph::EntityId;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("Audio cue {0} could not be loaded or played")]
    Unavailable(String),
}

/// Boundary to the audio subsystem. Cues are one-shot, non-looping and spatialized at
/// the given entity. Failures are recovered by the caller; a sequence never aborts
/// because a sound did not play.
pub trait AudioPlayer {
    fn play_spatial(&mut self, resource: &str, at: EntityId) -> Result<(), AudioError>;
}

/// Writes cue requests to the log instead of producing sound.
#[derive(Default)]
pub struct LogAudio;

impl AudioPlayer for LogAudio {
    fn play_spatial(&mut self, resource: &str, at: EntityId) -> Result<(), AudioError> {
        info!("Audio cue: {resource} at {at:?}");
        Ok(())
    }
}
