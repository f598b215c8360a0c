//! Error taxonomy for output trees, cached reads and the remote side.

/// Errors raised while building, navigating or reading run outputs.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /* Structural errors */
    /// A description node is not a value, a list or an error, or lacks a required field.
    #[error("malformed output structure: {0}")]
    MalformedStructure(String),

    /// A tree or a coordinate list does not match the port's declared depth.
    #[error("depth mismatch: expected {expected}, found {found}")]
    DepthMismatch { expected: u32, found: u32 },

    /* Navigation errors */
    #[error("index {index} out of bounds for list of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A byte read was attempted on an error leaf or a list.
    #[error("not a data value")]
    NotADataValue,

    #[error("no such output port: {0}")]
    PortNotFound(String),

    /* Remote errors */
    #[error("not found: {0}")]
    NotFound(String),
    #[error("access forbidden: {0}")]
    Forbidden(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("internal server error: {0}")]
    InternalServerError(String),
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors reported by the remote side rather than by local checks.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::Forbidden(_)
                | Error::Unauthorized
                | Error::InternalServerError(_)
                | Error::UnexpectedResponse(_)
                | Error::Transport(_)
        )
    }
}

/// Crate result type.
pub type Result<T> = core::result::Result<T, Error>;
