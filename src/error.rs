//! Centralized error type for the retrohost umbrella crate.
//!
//! Wraps the host and audio errors so `?` propagates across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Host(#[from] retrohost_core::HostError),

    #[error("Audio: {0}")]
    Audio(#[from] retrohost_audio::AudioError),

    #[error("Config: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Host error taxonomy, when the failure came from the core host.
    pub fn host_kind(&self) -> Option<retrohost_core::ErrorKind> {
        match self {
            Error::Host(e) => Some(e.kind()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_error_transparent() {
        let err: Error = retrohost_core::HostError::NoCoreLoaded.into();
        assert_eq!(err.to_string(), "No core loaded");
        assert_eq!(err.host_kind(), Some(retrohost_core::ErrorKind::Usage));
    }

    #[test]
    fn test_audio_error_prefixed() {
        let err: Error = retrohost_audio::AudioError::InvalidConfig("bad".into()).into();
        assert!(err.to_string().starts_with("Audio: "));
        assert!(err.host_kind().is_none());
    }
}
