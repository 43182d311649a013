//! Fatal build error taxonomy.
//!
//! Every variant aborts the build; there is no recoverable tier. The dev
//! server catches errors from rebuilds and keeps serving the previous
//! output, but a failed `vela build` exits nonzero.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a build.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Malformed frontmatter or date, with source position.
    #[error("{file}:{line}:{col}: {message}")]
    Parse {
        file: String,
        line: usize,
        col: usize,
        message: String,
    },

    /// External renderer exited nonzero or could not be started.
    #[error("renderer failed for `{source_file}`: {detail}")]
    Renderer {
        source_file: PathBuf,
        detail: String,
    },

    /// The resolved page template is not in the template cache.
    #[error("template `{0}` not found in templates directory")]
    TemplateMissing(String),

    /// The source directory is missing or unreadable.
    #[error("source tree `{0}` is missing or unreadable")]
    SourceTree(PathBuf),
}

impl BuildError {
    /// Shorthand for a parse error at a known position.
    pub fn parse(file: &str, line: usize, col: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            file: file.to_owned(),
            line,
            col,
            message: message.into(),
        }
    }
}
