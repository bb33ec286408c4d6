//! Remote access error types.

use std::fmt;

use thiserror::Error;

/// Result type for remote access operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Status line shown when the API cannot be reached.
pub const CONNECTION_FAILED: &str = "Impossible to connect to the EMSODEV DMP API";

/// Status line shown while a password is missing.
pub const PASSWORD_REQUIRED: &str = "Password is required to download data from EMSODEV";

/// Non-success HTTP statuses returned by the EMSODEV DMP API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiStatus {
    /// 401
    Unauthorized,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 500
    ServerError,
    /// Any other code.
    Unknown(u16),
}

impl ApiStatus {
    /// Classifies an HTTP status code other than 200.
    #[must_use]
    pub fn from_code(code: u16) -> Self {
        match code {
            401 => ApiStatus::Unauthorized,
            403 => ApiStatus::Forbidden,
            404 => ApiStatus::NotFound,
            500 => ApiStatus::ServerError,
            other => ApiStatus::Unknown(other),
        }
    }
}

impl fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ApiStatus::Unauthorized => "Unauthorized to use the EMSODEV DMP API",
            ApiStatus::Forbidden => "Forbidden",
            ApiStatus::NotFound => "Not Found",
            ApiStatus::ServerError => "EMSODEV API internal error",
            ApiStatus::Unknown(_) => "Unknown EMSODEV DMP API error",
        };
        f.write_str(message)
    }
}

/// Remote access error types.
#[derive(Error, Debug)]
pub enum Error {
    /// No HTTP status was received.
    #[error("Impossible to connect to the EMSODEV DMP API: {0}")]
    Connection(String),

    /// The API answered with a non-success status.
    #[error("{0}")]
    Status(ApiStatus),

    /// The response body did not have the expected shape.
    #[error("invalid API response: {0}")]
    Decode(String),

    /// A date string could not be parsed.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// An operation needs a selection that has not been made.
    #[error("no {0} selected")]
    NoSelection(&'static str),

    /// No password has been entered yet.
    #[error("Password is required to download data from EMSODEV")]
    PasswordRequired,

    /// A download worker is still running.
    #[error("a download is already in progress")]
    DownloadInProgress,

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] mooda_core::Error),
}

impl Error {
    /// True for HTTP 401.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Status(ApiStatus::Unauthorized))
    }

    /// Short message for the status bar.
    #[must_use]
    pub fn status_message(&self) -> String {
        match self {
            Error::Connection(_) => CONNECTION_FAILED.to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(ApiStatus::from_code(401), ApiStatus::Unauthorized);
        assert_eq!(ApiStatus::from_code(418), ApiStatus::Unknown(418));
        assert_eq!(
            Error::Status(ApiStatus::ServerError).status_message(),
            "EMSODEV API internal error"
        );
        assert_eq!(
            Error::Connection("dns".into()).status_message(),
            CONNECTION_FAILED
        );
        assert!(Error::Status(ApiStatus::Unauthorized).is_unauthorized());
    }
}
