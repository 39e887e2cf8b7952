//! Errors surfaced by model loading.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    /// Source missing or unreadable.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Malformed OBJ/MTL line. `line` is 1-based.
    #[error("{file}:{line}: {message}")]
    Format {
        file: String,
        line: usize,
        message: String,
    },

    /// A face names a material that no loaded library defines.
    #[error("{file}:{line}: material '{name}' is not defined by any loaded material library")]
    MissingMaterial {
        file: String,
        line: usize,
        name: String,
    },

    /// More vertices or indices than a `u32` index buffer can address.
    #[error("{file}: {count} elements exceed the 32-bit index range")]
    TooLarge { file: String, count: usize },
}

impl AssetError {
    pub fn io(path: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn format(file: &str, line: usize, message: impl Into<String>) -> Self {
        Self::Format {
            file: file.to_string(),
            line,
            message: message.into(),
        }
    }

    /// Line number for errors tied to a source line.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Io { .. } | Self::TooLarge { .. } => None,
            Self::Format { line, .. } | Self::MissingMaterial { line, .. } => Some(*line),
        }
    }
}

pub type AssetResult<T> = Result<T, AssetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_error_mentions_file_and_line() {
        let err = AssetError::format("cube.obj", 7, "invalid x coordinate 'abc'");
        assert_eq!(err.to_string(), "cube.obj:7: invalid x coordinate 'abc'");
        assert_eq!(err.line(), Some(7));
    }

    #[test]
    fn io_error_has_no_line() {
        let err = AssetError::io("missing.obj", io::Error::from(io::ErrorKind::NotFound));
        assert!(err.line().is_none());
        assert!(err.to_string().starts_with("Failed to read missing.obj"));
    }
}
