//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// A generative backend never initialized; calls fail without retrying setup.
    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A generative backend call failed at request time.
    #[error("Backend request failed: {0}")]
    Transport(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No movie selected")]
    NoSelection,

    #[error("Storyline not available for '{0}'")]
    MissingStoryline(String),

    #[error("Scrape error: {0}")]
    Scrape(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invariant violation: {0}")]
    Invariant(String),
}

impl Error {
    /// The message itself, without the variant's prefix.
    ///
    /// Backend failures carry the provider's text; everything else falls back
    /// to the full display form.
    pub fn message(&self) -> String {
        match self {
            Error::BackendUnavailable(message) | Error::Transport(message) => message.clone(),
            other => other.to_string(),
        }
    }

    /// True for the errors raised while validating a generation request.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidInput(_) | Error::NoSelection | Error::MissingStoryline(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_classified() {
        assert!(Error::NoSelection.is_validation());
        assert!(Error::InvalidInput("x".to_string()).is_validation());
        assert!(Error::MissingStoryline("Heat".to_string()).is_validation());
        assert!(!Error::Transport("boom".to_string()).is_validation());
        assert!(!Error::BackendUnavailable("no key".to_string()).is_validation());
    }

    #[test]
    fn test_backend_message_has_no_prefix() {
        assert_eq!(Error::Transport("quota exceeded".to_string()).message(), "quota exceeded");
        assert_eq!(
            Error::BackendUnavailable("no key".to_string()).message(),
            "no key"
        );
        assert_eq!(Error::NoSelection.message(), "No movie selected");
    }

    #[test]
    fn test_missing_storyline_message_names_movie() {
        let err = Error::MissingStoryline("Heat".to_string());
        assert_eq!(err.to_string(), "Storyline not available for 'Heat'");
    }
}
