//! Shared error type for loaders, animation config and presentation.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A required file does not exist.
    #[error("file not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed line in a mesh or material file. `line` is 1-based.
    #[error("{source_name}:{line}: {message}")]
    Parse {
        source_name: String,
        line: usize,
        message: String,
    },

    #[error("failed to load texture {}: {reason}", path.display())]
    TextureLoad { path: PathBuf, reason: String },

    /// Window, surface or device failure.
    #[error("presentation error: {0}")]
    Presentation(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CoreError {
    /// Maps an I/O error on `path` to `NotFound` or `Io`.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            CoreError::NotFound { path }
        } else {
            CoreError::Io { path, source }
        }
    }

    pub fn parse(source_name: impl Into<String>, line: usize, message: impl Into<String>) -> Self {
        CoreError::Parse {
            source_name: source_name.into(),
            line,
            message: message.into(),
        }
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound { .. })
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_not_found_maps_to_not_found() {
        let err = CoreError::from_io(
            "missing.obj",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "file not found: missing.obj");
    }

    #[test]
    fn other_io_errors_keep_source() {
        let err = CoreError::from_io(
            "locked.obj",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, CoreError::Io { .. }));
    }

    #[test]
    fn parse_error_reports_location() {
        let err = CoreError::parse("apple.obj", 12, "face has 2 corners");
        assert_eq!(err.to_string(), "apple.obj:12: face has 2 corners");
    }
}
