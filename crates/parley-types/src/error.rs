use thiserror::Error;

/// Errors from repository operations (used by trait definitions in parley-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,
}

/// Failure kinds of one inference invocation, in classification priority
/// order. The first matching kind wins; a non-zero exit is a `Process`
/// failure regardless of what was written to stdout.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The external process could not be started at all.
    #[error("failed to spawn inference process: {0}")]
    Spawn(String),

    /// The process exited non-zero; stderr carries the diagnostics.
    #[error("inference process exited with code {code}: {stderr}")]
    Process { code: i32, stderr: String },

    /// The process exited zero but stdout was not the expected JSON shape.
    #[error("unparseable inference output: {output}")]
    Protocol { output: String },

    /// The process reported an error of its own via the JSON `error` field.
    #[error("model error: {0}")]
    Model(String),

    /// The bounded wait expired and the process was terminated.
    #[error("inference timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// Errors surfaced by the chat operation surface.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Bad caller request (e.g. empty message content).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Conversation absent or not owned by the caller -- deliberately
    /// indistinguishable, so existence of other users' data never leaks.
    #[error("conversation not found")]
    NotFound,

    #[error("inference failed: {0}")]
    Inference(#[from] InferenceError),

    #[error("storage error: {0}")]
    Storage(RepositoryError),
}

impl From<RepositoryError> for ChatError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => ChatError::NotFound,
            other => ChatError::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inference_error_display() {
        let err = InferenceError::Process {
            code: 1,
            stderr: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "inference process exited with code 1: boom");

        let err = InferenceError::Timeout { secs: 120 };
        assert_eq!(err.to_string(), "inference timed out after 120s");
    }

    #[test]
    fn test_repository_not_found_folds_into_chat_not_found() {
        let err: ChatError = RepositoryError::NotFound.into();
        assert!(matches!(err, ChatError::NotFound));

        let err: ChatError = RepositoryError::Query("syntax error".to_string()).into();
        assert!(matches!(err, ChatError::Storage(RepositoryError::Query(_))));
    }

    #[test]
    fn test_inference_error_wraps_into_chat_error() {
        let err: ChatError = InferenceError::Model("bad prompt".to_string()).into();
        match err {
            ChatError::Inference(InferenceError::Model(msg)) => assert_eq!(msg, "bad prompt"),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
