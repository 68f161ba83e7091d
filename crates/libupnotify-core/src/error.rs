use thiserror::Error;

/// Main error type for upnotify operations
#[derive(Debug, Error)]
pub enum UpnotifyError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("tracker API error: {0}")]
    Api(String),

    #[error("repository error: {0}")]
    Repo(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl UpnotifyError {
    /// Get the exit code for the CLI
    pub fn exit_code(&self) -> i32 {
        match self {
            UpnotifyError::InvalidArgs(_) => 2,
            UpnotifyError::NotFound(_) => 3,
            UpnotifyError::Repo(_) => 3,
            UpnotifyError::Api(_) => 1,
            UpnotifyError::Io(_) => 5,
            UpnotifyError::Internal(_) => 1,
        }
    }

    /// Whether this is a missing-object error, as opposed to a transport or
    /// service failure. The resolver treats both the same way; the CLI does
    /// not.
    pub fn is_not_found(&self) -> bool {
        matches!(self, UpnotifyError::NotFound(_))
    }
}
