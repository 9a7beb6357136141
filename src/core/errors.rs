use crate::core::types::ExchangeId;
use thiserror::Error;

/// Message shown to the caller for any transport, format or unexpected failure
pub const UNAVAILABLE_MESSAGE: &str = "Exchange temporarily unavailable - please try again";

#[derive(Error, Debug)]
pub enum ExchangeError {
    #[error("No credentials stored for {0}")]
    CredentialsMissing(ExchangeId),

    #[error("Signing error: {0}")]
    Signing(#[from] SigningError),

    #[error("Order rejected: {0}")]
    SizingRejected(#[from] SizingError),

    #[error("Exchange error: {code} - {message}")]
    Business { code: String, message: String },

    /// Non-JSON body, unreachable host or connection failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON-bodied non-2xx response not yet classified by the venue adapter
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: u16,
        body: serde_json::Value,
    },

    #[error("Unexpected response format: {0}")]
    InvalidResponse(String),

    #[error("Re-authentication required: {0}")]
    ReauthRequired(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Key store error: {0}")]
    KeyStore(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::core::config::ConfigError),
}

impl ExchangeError {
    /// Caller-facing rendering. Raw response bodies never reach this string.
    pub fn user_message(&self) -> String {
        match self {
            Self::CredentialsMissing(exchange) => {
                format!("No API credentials configured for {}", exchange.display_name())
            }
            Self::Signing(_) => {
                "Stored credentials are malformed - please re-enter your API keys".to_string()
            }
            Self::SizingRejected(e) => e.to_string(),
            Self::Business { message, .. } => message.clone(),
            Self::ReauthRequired(_) => {
                "Your exchange connection has expired - please reconnect".to_string()
            }
            Self::InvalidParameters(msg) | Self::Unsupported(msg) => msg.clone(),
            Self::Transport(_)
            | Self::HttpStatus { .. }
            | Self::InvalidResponse(_)
            | Self::KeyStore(_)
            | Self::Config(_) => UNAVAILABLE_MESSAGE.to_string(),
        }
    }

    pub fn business(code: impl ToString, message: impl Into<String>) -> Self {
        Self::Business {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Malformed key material. Kept apart from exchange rejections so callers can
/// tell "credentials malformed" from "exchange refused the request".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    #[error("Invalid base64 secret: {0}")]
    InvalidSecret(String),

    #[error("Invalid PEM: {0}")]
    InvalidPem(String),

    #[error("Invalid EC private key: {0}")]
    InvalidKey(String),

    #[error("Request body has no nonce")]
    MissingNonce,

    #[error("System time error: {0}")]
    Clock(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizingError {
    #[error("Amount {amount} is below the exchange minimum order value of {min_notional}")]
    BelowMinimum {
        amount: rust_decimal::Decimal,
        min_notional: rust_decimal::Decimal,
    },

    #[error(
        "Order value {notional} after rounding to {precision} decimals is below the exchange minimum of {min_notional}"
    )]
    BelowMinimumAfterRounding {
        notional: rust_decimal::Decimal,
        min_notional: rust_decimal::Decimal,
        precision: u32,
    },

    #[error("Invalid sizing input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_render_generic_message() {
        let err = ExchangeError::Transport("<html>502 Bad Gateway</html>".to_string());
        assert_eq!(err.user_message(), UNAVAILABLE_MESSAGE);
        assert!(!err.user_message().contains("html"));

        let err = ExchangeError::HttpStatus {
            status: 500,
            body: serde_json::json!({"internal": "trace"}),
        };
        assert_eq!(err.user_message(), UNAVAILABLE_MESSAGE);
    }

    #[test]
    fn test_business_errors_pass_through_verbatim() {
        let err = ExchangeError::business(-2010, "Account has insufficient balance");
        assert_eq!(err.user_message(), "Account has insufficient balance");
    }

    #[test]
    fn test_signing_errors_are_distinct() {
        let err: ExchangeError = SigningError::InvalidPem("no header".to_string()).into();
        assert!(matches!(err, ExchangeError::Signing(_)));
        assert!(err.user_message().contains("malformed"));
    }
}
