use thiserror::Error;

/// Top-level error type for the Mentor system.
///
/// Each variant wraps a subsystem-specific error. Subsystem crates define their
/// own error types and implement `From<SubsystemError> for MentorError` so
/// that the `?` operator works seamlessly across crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MentorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Timed out waiting for {0}")]
    Timeout(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Payload too large: {size} bytes exceeds {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },
}

impl From<toml::de::Error> for MentorError {
    fn from(err: toml::de::Error) -> Self {
        MentorError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for MentorError {
    fn from(err: toml::ser::Error) -> Self {
        MentorError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for MentorError {
    fn from(err: serde_json::Error) -> Self {
        MentorError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Mentor operations.
pub type Result<T> = std::result::Result<T, MentorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MentorError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let mentor_err: MentorError = io_err.into();
        assert!(matches!(mentor_err, MentorError::Io(_)));
        assert!(mentor_err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_variants_constructible() {
        let errors: Vec<MentorError> = vec![
            MentorError::Config("test".into()),
            MentorError::Completion("test".into()),
            MentorError::Retrieval("test".into()),
            MentorError::Transcription("test".into()),
            MentorError::Synthesis("test".into()),
            MentorError::Session("test".into()),
            MentorError::Storage("test".into()),
            MentorError::Api("test".into()),
            MentorError::Serialization("test".into()),
            MentorError::Timeout("test".into()),
            MentorError::RateLimited,
            MentorError::PayloadTooLarge {
                size: 100,
                limit: 50,
            },
        ];
        assert_eq!(errors.len(), 12);
    }

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(MentorError, &str)> = vec![
            (
                MentorError::Config("bad key".to_string()),
                "Configuration error: bad key",
            ),
            (
                MentorError::Completion("model offline".to_string()),
                "Completion error: model offline",
            ),
            (
                MentorError::Retrieval("index empty".to_string()),
                "Retrieval error: index empty",
            ),
            (
                MentorError::Transcription("decode failed".to_string()),
                "Transcription error: decode failed",
            ),
            (
                MentorError::Synthesis("voice missing".to_string()),
                "Synthesis error: voice missing",
            ),
            (
                MentorError::Session("evicted".to_string()),
                "Session error: evicted",
            ),
            (
                MentorError::Storage("disk full".to_string()),
                "Storage error: disk full",
            ),
            (
                MentorError::Api("bad request".to_string()),
                "API error: bad request",
            ),
            (
                MentorError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
            (
                MentorError::Timeout("completion".to_string()),
                "Timed out waiting for completion",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_error_from_toml_de() {
        let bad_toml = "invalid = [[[";
        let err: std::result::Result<toml::Value, _> = toml::from_str(bad_toml);
        assert!(err.is_err());
        let mentor_err: MentorError = err.unwrap_err().into();
        assert!(matches!(mentor_err, MentorError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let bad_json = "{ invalid json }";
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str(bad_json);
        assert!(err.is_err());
        let mentor_err: MentorError = err.unwrap_err().into();
        assert!(matches!(mentor_err, MentorError::Serialization(_)));
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_ok() -> Result<i32> {
            Ok(42)
        }

        fn returns_err() -> Result<i32> {
            Err(MentorError::Config("fail".to_string()))
        }

        assert_eq!(returns_ok().unwrap(), 42);
        assert!(returns_err().is_err());
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let _value = io_result?;
            Ok("success".to_string())
        }

        assert_eq!(inner().unwrap(), "success");
    }

    #[test]
    fn test_error_debug_impl() {
        let err = MentorError::Completion("test debug".to_string());
        let debug_str = format!("{:?}", err);
        assert!(debug_str.contains("Completion"));
        assert!(debug_str.contains("test debug"));
    }

    #[test]
    fn test_payload_too_large_message() {
        let err = MentorError::PayloadTooLarge {
            size: 200,
            limit: 100,
        };
        assert_eq!(
            err.to_string(),
            "Payload too large: 200 bytes exceeds 100 bytes"
        );
    }
}
