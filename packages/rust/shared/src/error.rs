//! Error types for StylePress.
//!
//! Library crates use [`StylePressError`] via `thiserror`. Hard failures name
//! the unmet precondition; soft recoveries (fallback-to-prose, refinement
//! exhaustion) are surfaced through output metadata, never through errors.

use std::path::PathBuf;

/// Top-level error type for all StylePress operations.
#[derive(Debug, thiserror::Error)]
pub enum StylePressError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Input defect: missing required personality fields, empty input, or
    /// malformed data. Never defaulted silently.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A compiled rule referenced a variable the token resolver never
    /// produced. Treated as a correctness defect, not a stylistic choice.
    #[error("dangling style variable: {name}")]
    DanglingVariable { name: String },

    /// Generative or scoring collaborator failure (network, HTTP, decode).
    #[error("collaborator error: {0}")]
    Collaborator(String),

    /// Composition impossibility: neither extracted components nor a design
    /// personality were available.
    #[error("no brand source available: {detail}")]
    NoBrandSource { detail: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, StylePressError>;

impl StylePressError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a dangling-variable error for `name`.
    pub fn dangling(name: impl Into<String>) -> Self {
        Self::DanglingVariable { name: name.into() }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = StylePressError::validation("colors.primary is required");
        assert_eq!(err.to_string(), "validation error: colors.primary is required");

        let err = StylePressError::dangling("--sp-neutral-700");
        assert!(err.to_string().contains("--sp-neutral-700"));
    }

    #[test]
    fn no_brand_source_names_precondition() {
        let err = StylePressError::NoBrandSource {
            detail: "no extracted components for brand and no design personality supplied".into(),
        };
        assert!(err.to_string().contains("no extracted components"));
        assert!(err.to_string().contains("design personality"));
    }
}
