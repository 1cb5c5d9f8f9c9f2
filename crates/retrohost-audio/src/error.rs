//! Error types for retrohost-audio.

use thiserror::Error;

/// Error type for audio pipeline operations.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid audio format: {0}")]
    InvalidFormat(String),

    #[error("Resampler initialization failed: {0}")]
    ResamplerInit(String),

    #[error("Resampling failed: {0}")]
    Resample(String),

    #[error("Invalid device: {0}")]
    InvalidDevice(String),

    #[error("Failed to open audio device: {0}")]
    DeviceOpen(String),

    #[cfg(feature = "cpal")]
    #[error("Audio device not available")]
    DeviceNotAvailable(#[from] cpal::DefaultStreamConfigError),

    #[cfg(feature = "cpal")]
    #[error("Failed to query supported stream configs")]
    SupportedConfigs(#[from] cpal::SupportedStreamConfigsError),

    #[cfg(feature = "cpal")]
    #[error("Failed to build audio stream")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[cfg(feature = "cpal")]
    #[error("Failed to play audio stream")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[cfg(feature = "cpal")]
    #[error("Failed to enumerate devices")]
    DevicesError(#[from] cpal::DevicesError),

    #[cfg(feature = "cpal")]
    #[error("Failed to get device name")]
    DeviceNameError(#[from] cpal::DeviceNameError),
}

impl From<rubato::ResamplerConstructionError> for AudioError {
    fn from(e: rubato::ResamplerConstructionError) -> Self {
        AudioError::ResamplerInit(e.to_string())
    }
}

impl From<rubato::ResampleError> for AudioError {
    fn from(e: rubato::ResampleError) -> Self {
        AudioError::Resample(e.to_string())
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, AudioError>;
