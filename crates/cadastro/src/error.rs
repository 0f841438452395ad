//! Error types for the application layer.

use thiserror::Error;

/// Errors returned by persistence and auth services.
///
/// Services never panic past their boundary; every failure ends up here and
/// the pages show [`user_message`](ServiceError::user_message) in an alert.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The request could not be sent or the connection failed.
    #[error("{message}: {source}")]
    Request {
        /// Message for the operation that failed.
        message: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message for the operation that failed.
        message: String,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The server rejected the credentials or the token expired.
    #[error("not authorized (HTTP {status})")]
    Unauthorized {
        /// HTTP status code (401 or 403).
        status: u16,
    },

    /// No record exists with the given id.
    #[error("record {id} not found")]
    NotFound {
        /// Requested id.
        id: u64,
    },

    /// A response or record could not be decoded.
    #[error("{message}: {detail}")]
    Decode {
        /// Message for the operation that failed.
        message: String,
        /// Decoder error text.
        detail: String,
    },

    /// The service URL could not be built.
    #[error("invalid service url: {0}")]
    Url(#[from] url::ParseError),
}

impl ServiceError {
    /// Returns the message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Request { message, .. }
            | Self::Status { message, .. }
            | Self::Decode { message, .. } => message.clone(),
            Self::Unauthorized { .. } => "Sessão expirada. Faça login novamente.".to_string(),
            Self::NotFound { .. } => "Registro não encontrado.".to_string(),
            Self::Url(_) => "Endereço do servidor inválido.".to_string(),
        }
    }

    /// Creates a decode error for `message`.
    pub fn decode(message: impl Into<String>, detail: impl ToString) -> Self {
        Self::Decode {
            message: message.into(),
            detail: detail.to_string(),
        }
    }

    /// Returns true if logging in again may fix the error.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

/// Errors loading [`Config`](crate::Config).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid api url: {0}")]
    Url(#[from] url::ParseError),
}

/// A specialized [`Result`] type for service calls.
pub type Result<T> = std::result::Result<T, ServiceError>;
