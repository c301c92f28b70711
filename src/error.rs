use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegisterError {
    /// Resolution found no candidate for the document number.
    #[error("no register entry found for {0}")]
    NotFound(String),

    /// The register answered with its web application firewall challenge page.
    #[error("blocked by web application firewall while requesting {0}")]
    Blocked(String),

    #[error("malformed XML document: {0}")]
    MalformedDocument(String),

    /// A mandatory part of the decoded document is missing or has the wrong shape.
    #[error("unexpected document shape: {0}")]
    UnexpectedShape(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("expected link not found: {0}")]
    MissingLink(String),

    #[error("unknown value for \"format\" parameter: {0}")]
    UnknownFormat(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RegisterError>;
