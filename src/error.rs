use thiserror::Error;

use crate::form::FieldError;

/// Fallback shown when the prediction endpoint fails without an `error` field
pub const PREDICTION_FALLBACK: &str = "Prediction failed";

#[derive(Debug, Error)]
pub enum ClientError {
    /// Backend root endpoint unreachable or not 2xx
    #[error("Cannot connect to API at {url}. Make sure the prediction server is running.")]
    Connectivity { url: String },

    #[error("Failed to load model configuration: {message}")]
    Config { message: String },

    #[error("Unsupported feature type '{kind}' for field '{feature}'")]
    UnsupportedFeature { feature: String, kind: String },

    /// Message is shown verbatim (server-supplied when available)
    #[error("{message}")]
    Prediction { message: String },

    #[error(transparent)]
    Validation(#[from] FieldError),

    #[error("Failed to initialize application: {0}")]
    Initialization(Box<ClientError>),
}

impl ClientError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn prediction(message: impl Into<String>) -> Self {
        Self::Prediction { message: message.into() }
    }

    /// Wrap a startup failure; already-wrapped errors pass through unchanged
    pub fn initialization(err: ClientError) -> Self {
        match err {
            ClientError::Initialization(_) => err,
            other => ClientError::Initialization(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialization_message() {
        let err = ClientError::initialization(ClientError::config("Failed to load configuration"));
        assert_eq!(
            err.to_string(),
            "Failed to initialize application: Failed to load model configuration: Failed to load configuration"
        );

        // No double wrapping
        let twice = ClientError::initialization(err);
        assert!(!twice.to_string().contains("initialize application: Failed to initialize"));
    }

    #[test]
    fn test_prediction_message_is_verbatim() {
        assert_eq!(ClientError::prediction("bad input").to_string(), "bad input");
    }
}
