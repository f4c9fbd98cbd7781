use reqwest::StatusCode;
use thiserror::Error;

use crate::validation::FieldErrors;

/// SubManager Errors.
#[derive(Debug, Error)]
pub enum SubManagerError {
    /// The base URL of the API could not be parsed.
    #[error("Invalid API URL: {0}")]
    InvalidBaseUrl(String),

    /// The configuration could not be loaded or is invalid.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// One or more form fields failed validation.
    /// Raised locally before any request, or from a 400 response carrying a field map.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    /// Failed to send a request to the SubManager API.
    #[error("Server connection error")]
    RequestFailed,

    /// Failed to decode SubManager API response.
    #[error("Failed to decode SubManager API response.")]
    FailedToDecode,

    /// The auth response did not contain an `authenticationToken`.
    #[error("The server did not return an authentication token.")]
    MissingToken,

    /// No token is stored. The user has to log in first.
    #[error("You are not logged in.")]
    NotAuthenticated,

    /// The stored token was rejected by `/auth/validateToken`.
    #[error("Your session has expired. Please log in again.")]
    InvalidToken,

    /// The payment has already been marked as paid.
    #[error("Payment {0} has already been processed.")]
    AlreadyProcessed(i64),

    /// The token file could not be read or written.
    #[error("Failed to access the token store: {0}")]
    TokenStore(#[from] std::io::Error),

    /// The SubManager API returned a 400: Bad Request status code.
    #[error("Bad request.")]
    BadRequest,
    /// The SubManager API returned a 401: Unauthorized status code.
    /// This means that the bearer token is missing, expired or malformed.
    #[error("Unauthorized.")]
    Unauthorized,
    /// The SubManager API returned a 403: Forbidden status code.
    /// This means that the resource belongs to another user.
    #[error("Forbidden.")]
    Forbidden,
    /// The SubManager API returned a 404: Not Found status code.
    #[error("Not found.")]
    NotFound,
    /// The SubManager API returned a server error.
    /// This is a catch-all for unusual error cases.
    #[error("Server error ({0}).")]
    ServerError(u16),
}

impl SubManagerError {
    /// Maps a non-success status code to an error.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::BAD_REQUEST => SubManagerError::BadRequest,
            StatusCode::UNAUTHORIZED => SubManagerError::Unauthorized,
            StatusCode::FORBIDDEN => SubManagerError::Forbidden,
            StatusCode::NOT_FOUND => SubManagerError::NotFound,
            _ => SubManagerError::ServerError(status.as_u16()),
        }
    }

    /// Whether the error belongs to the "network/parse failure" category.
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            SubManagerError::RequestFailed
                | SubManagerError::FailedToDecode
                | SubManagerError::MissingToken
                | SubManagerError::BadRequest
                | SubManagerError::Unauthorized
                | SubManagerError::Forbidden
                | SubManagerError::NotFound
                | SubManagerError::ServerError(_)
        )
    }

    /// The message shown to the user.
    pub fn user_message(&self) -> String {
        if self.is_connection_error() {
            "Server connection error".to_string()
        } else {
            self.to_string()
        }
    }
}
