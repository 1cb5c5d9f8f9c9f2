//! Error types for core hosting.

use std::path::PathBuf;
use thiserror::Error;

/// Error taxonomy reported on the host event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The file could not be loaded as a shared library, or lacks entry points.
    CoreLoadError,
    /// The path does not name a shared library.
    CoreNotLibraryError,
    CoreNotFound,
    CoreAccessDenied,
    /// Some other filesystem error on the core path.
    CoreUnknownError,
    GameNotFound,
    GameAccessDenied,
    /// Filesystem error on the game path, or the core rejected the game.
    GameUnknownError,
    /// Save-state or SRAM failure.
    StateError,
    /// API misuse: wrong lifecycle state, unknown variable and the like.
    Usage,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::CoreLoadError => write!(f, "core load error"),
            ErrorKind::CoreNotLibraryError => write!(f, "core is not a library"),
            ErrorKind::CoreNotFound => write!(f, "core not found"),
            ErrorKind::CoreAccessDenied => write!(f, "core access denied"),
            ErrorKind::CoreUnknownError => write!(f, "core unknown error"),
            ErrorKind::GameNotFound => write!(f, "game not found"),
            ErrorKind::GameAccessDenied => write!(f, "game access denied"),
            ErrorKind::GameUnknownError => write!(f, "game unknown error"),
            ErrorKind::StateError => write!(f, "state error"),
            ErrorKind::Usage => write!(f, "usage error"),
        }
    }
}

/// Save-state failures.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Core does not support save states")]
    Unsupported,

    #[error("Core failed to serialize {size} bytes")]
    SerializeFailed { size: usize },

    #[error("Core rejected a {size} byte state")]
    Rejected { size: usize },

    #[error("State file {path} could not be accessed: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SRAM file {path} could not be accessed: {source}")]
    Sram {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum HostError {
    #[error("Core load failed: {path}\n  Reason: {reason}")]
    CoreLoad { path: PathBuf, reason: String },

    #[error("Core is missing required entry points: {}", missing.join(", "))]
    MissingSymbols { path: PathBuf, missing: Vec<String> },

    #[error("Not a shared library: {0}")]
    CoreNotLibrary(PathBuf),

    #[error("Core not found: {0}")]
    CoreNotFound(PathBuf),

    #[error("Core access denied: {0}")]
    CoreAccessDenied(PathBuf),

    #[error("Core file error: {path}: {source}")]
    CoreUnknown {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Game not found: {0}")]
    GameNotFound(PathBuf),

    #[error("Game access denied: {0}")]
    GameAccessDenied(PathBuf),

    #[error("Game load failed: {path}\n  Reason: {reason}")]
    GameUnknown { path: PathBuf, reason: String },

    #[error("A core is already loaded: {0}")]
    CoreAlreadyLoaded(PathBuf),

    #[error("No core loaded")]
    NoCoreLoaded,

    #[error("A game is already loaded: {0}")]
    GameAlreadyLoaded(PathBuf),

    #[error("Operation '{operation}' not allowed in state {state}")]
    InvalidState {
        operation: &'static str,
        state: crate::CoreState,
    },

    #[error("Unknown core variable: {0}")]
    UnknownVariable(String),

    #[error("Invalid value '{value}' for core variable '{key}'")]
    InvalidVariableValue { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Save state: {0}")]
    State(#[from] StateError),
}

impl HostError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HostError::CoreLoad { .. } | HostError::MissingSymbols { .. } => {
                ErrorKind::CoreLoadError
            }
            HostError::CoreNotLibrary(_) => ErrorKind::CoreNotLibraryError,
            HostError::CoreNotFound(_) => ErrorKind::CoreNotFound,
            HostError::CoreAccessDenied(_) => ErrorKind::CoreAccessDenied,
            HostError::CoreUnknown { .. } => ErrorKind::CoreUnknownError,
            HostError::GameNotFound(_) => ErrorKind::GameNotFound,
            HostError::GameAccessDenied(_) => ErrorKind::GameAccessDenied,
            HostError::GameUnknown { .. } => ErrorKind::GameUnknownError,
            HostError::State(_) => ErrorKind::StateError,
            HostError::CoreAlreadyLoaded(_)
            | HostError::NoCoreLoaded
            | HostError::GameAlreadyLoaded(_)
            | HostError::InvalidState { .. }
            | HostError::UnknownVariable(_)
            | HostError::InvalidVariableValue { .. }
            | HostError::InvalidConfig(_) => ErrorKind::Usage,
        }
    }
}

pub type Result<T> = std::result::Result<T, HostError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::CoreLoadError.to_string(), "core load error");
        assert_eq!(ErrorKind::CoreNotLibraryError.to_string(), "core is not a library");
        assert_eq!(ErrorKind::GameUnknownError.to_string(), "game unknown error");
        assert_eq!(ErrorKind::StateError.to_string(), "state error");
    }

    #[test]
    fn test_missing_symbols_lists_all_names() {
        let err = HostError::MissingSymbols {
            path: PathBuf::from("core.so"),
            missing: vec!["retro_run".into(), "retro_reset".into()],
        };
        assert!(err.to_string().contains("retro_run, retro_reset"));
        assert_eq!(err.kind(), ErrorKind::CoreLoadError);
    }

    #[test]
    fn test_state_error_maps_to_state_kind() {
        let err: HostError = StateError::Unsupported.into();
        assert_eq!(err.kind(), ErrorKind::StateError);
        assert!(err.to_string().contains("does not support"));

        let err: HostError = StateError::Rejected { size: 16 }.into();
        assert!(err.to_string().contains("16 byte"));
    }

    #[test]
    fn test_usage_errors() {
        assert_eq!(HostError::NoCoreLoaded.kind(), ErrorKind::Usage);
        let err = HostError::InvalidVariableValue {
            key: "speed".into(),
            value: "8x".into(),
        };
        assert!(err.to_string().contains("'8x'"));
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}
