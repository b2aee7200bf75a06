//! Content error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or parsing a writing
#[derive(Debug, Error)]
pub enum ContentError {
    /// The slug is malformed or tries to escape the writings directory
    #[error("invalid slug `{0}`")]
    InvalidSlug(String),

    /// No writing matches the slug
    #[error("no writing named `{0}`")]
    NotFound(String),

    /// The front-matter block is missing or does not decode
    #[error("malformed front-matter: {0}")]
    MalformedFrontMatter(String),

    #[error("IO error when reading `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ContentError {
    /// Whether the error should be reported to the client as "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::InvalidSlug(_) | Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_content_error_display() {
        let err = ContentError::InvalidSlug("../secret".to_string());
        assert!(format!("{err}").contains("../secret"));

        let err = ContentError::Io {
            path: PathBuf::from("writings/hello.md"),
            source: Error::new(ErrorKind::PermissionDenied, "denied"),
        };
        let display = format!("{err}");
        assert!(display.contains("IO error"));
        assert!(display.contains("hello.md"));
    }

    #[test]
    fn test_not_found_classification() {
        assert!(ContentError::InvalidSlug("..".into()).is_not_found());
        assert!(ContentError::NotFound("missing".into()).is_not_found());
        assert!(!ContentError::MalformedFrontMatter("no closing delimiter".into()).is_not_found());
    }
}
