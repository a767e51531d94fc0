// File: src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GuesserError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error while {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("binary encoding error while {context}: {source}")]
    Bincode {
        context: String,
        #[source]
        source: bincode::Error,
    },
    #[error("invalid grammar: {message}")]
    InvalidGrammar { message: String },
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl GuesserError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn bincode(context: impl Into<String>, source: bincode::Error) -> Self {
        Self::Bincode {
            context: context.into(),
            source,
        }
    }

    pub(crate) fn invalid_grammar(message: impl Into<String>) -> Self {
        Self::InvalidGrammar {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GuesserError>;
