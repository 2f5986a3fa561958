use thiserror::Error;

/// Every failure the codec, parser, loader, writer and game model can report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid coordinate '{token}'")]
    InvalidCoordinate { token: String },

    #[error("invalid game format: {message}")]
    InvalidGameFormat { message: String },

    #[error("invalid move color '{tag}' (expected 'W' or 'B')")]
    InvalidMoveColor { tag: String },

    #[error("invalid move token '{token}'")]
    InvalidMoveToken { token: String },

    #[error("unsupported feature: {feature}")]
    UnsupportedFeature { feature: &'static str },

    #[error("precondition violated: {message}")]
    PreconditionViolation { message: String },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl Error {
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Error::InvalidGameFormat {
            message: message.into(),
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Error::PreconditionViolation {
            message: message.into(),
        }
    }

    /// Machine-readable code, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidCoordinate { .. } => "invalid-coordinate",
            Error::InvalidGameFormat { .. } => "invalid-game-format",
            Error::InvalidMoveColor { .. } => "invalid-move-color",
            Error::InvalidMoveToken { .. } => "invalid-move-token",
            Error::UnsupportedFeature { .. } => "unsupported-feature",
            Error::PreconditionViolation { .. } => "precondition-violation",
            Error::InvalidConfiguration { .. } => "invalid-configuration",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
