use thiserror::Error;

/// Errors surfaced by the request/response types.
///
/// Cache-Control parsing never produces one of these: unknown or odd
/// directives are kept as-is.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("the HTTP status code \"{0}\" is not valid")]
    InvalidStatusCode(u16),

    #[error("invalid method override \"{0}\"")]
    MalformedMethodOverride(String),

    #[error("conflicting forwarded headers: {0}")]
    ConflictingHeaders(String),

    #[error("could not decode request body: {0}")]
    BodyDecode(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HttpError>;
