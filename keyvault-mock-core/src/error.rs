//! Key Vault error types and formatting

use serde::Serialize;
use thiserror::Error;

/// Message the service sends when a request carries no token at all
pub const MISSING_TOKEN_MESSAGE: &str = "Request is missing a Bearer or PoP token.";

/// Key Vault error codes the mock can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Unauthorized,
    SecretNotFound,
    BadParameter,
    NotFound,
    MethodNotAllowed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthorized => "Unauthorized",
            Self::SecretNotFound => "SecretNotFound",
            Self::BadParameter => "BadParameter",
            Self::NotFound => "NotFound",
            Self::MethodNotAllowed => "MethodNotAllowed",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::SecretNotFound | Self::NotFound => 404,
            Self::BadParameter => 400,
            Self::MethodNotAllowed => 405,
        }
    }
}

/// Key Vault style error
#[derive(Debug, Error)]
#[error("{}: {message}", .code.as_str())]
pub struct VaultError {
    pub code: ErrorCode,
    pub message: String,
}

impl VaultError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The challenge error returned when no authorization header is present
    pub fn unauthorized() -> Self {
        Self::new(ErrorCode::Unauthorized, MISSING_TOKEN_MESSAGE)
    }

    pub fn secret_not_found(name: &str) -> Self {
        Self::new(
            ErrorCode::SecretNotFound,
            format!(
                "A secret with (name/id) {name} was not found in this key vault. \
                 If you recently deleted this secret you may be able to recover it \
                 using the correct recovery command."
            ),
        )
    }

    pub fn bad_parameter(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadParameter, message)
    }

    pub fn not_found(path: &str) -> Self {
        Self::new(ErrorCode::NotFound, format!("No route matches path {path}"))
    }

    pub fn method_not_allowed(method: &str) -> Self {
        Self::new(
            ErrorCode::MethodNotAllowed,
            format!("Method {method} is not supported for secrets"),
        )
    }

    pub fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Format as the `{"error":{"code":..,"message":..}}` envelope
    pub fn to_json(&self) -> String {
        #[derive(Serialize)]
        struct Envelope<'a> {
            error: Inner<'a>,
        }

        #[derive(Serialize)]
        struct Inner<'a> {
            code: &'a str,
            message: &'a str,
        }

        let envelope = Envelope {
            error: Inner {
                code: self.code.as_str(),
                message: &self.message,
            },
        };

        serde_json::to_string(&envelope).unwrap_or_else(|_| {
            format!(
                r#"{{"error":{{"code":"{}","message":"{}"}}}}"#,
                self.code.as_str(),
                self.message
            )
        })
    }
}
