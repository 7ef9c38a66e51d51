use std::fmt;
use std::time::Duration;

use miette::Diagnostic;
use oauth2::HttpClientError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the Strava token endpoint, e.g.
/// `{"message": "Bad Request", "errors": [{"resource": "RefreshToken", ...}]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<FaultError>,
}

impl oauth2::ErrorResponse for OAuth2ErrorResponse {}

impl fmt::Display for OAuth2ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "OAuth2 error: {message}")?,
            None => write!(f, "OAuth2 error occurred")?,
        }
        for error in &self.errors {
            write!(f, " ({error})")?;
        }
        Ok(())
    }
}

/// A single entry of the `errors` array in a Strava fault.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FaultError {
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl fmt::Display for FaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}: {}",
            self.resource.as_deref().unwrap_or("?"),
            self.field.as_deref().unwrap_or("?"),
            self.code.as_deref().unwrap_or("?")
        )
    }
}

/// The error document Strava returns for any unsuccessful API call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fault {
    pub message: String,
    #[serde(default)]
    pub errors: Vec<FaultError>,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if !self.errors.is_empty() {
            let details: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
            write!(f, " [{}]", details.join(", "))?;
        }
        Ok(())
    }
}

/// Errors that can occur when interacting with the Strava API.
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("error making request: {0}")]
    #[diagnostic(
        code(strava_rename::request_error),
        help("Check your network connection and Strava API availability")
    )]
    Request(#[source] reqwest::Error),

    #[error("error decoding response: {0}")]
    #[diagnostic(
        code(strava_rename::deserialization_error),
        help("The API returned data in an unexpected format")
    )]
    DeserializationError(#[source] serde_json::Error, Option<String>),

    #[error("{status_code} - {body}")]
    #[diagnostic(
        code(strava_rename::not_found),
        help("Verify that the {entity} exists and that you have permission to access it")
    )]
    NotFound {
        entity: String,
        url: String,
        status_code: reqwest::StatusCode,
        body: String,
    },

    /// The access token was rejected, usually because it expired or lacks the
    /// `activity:read_all` / `activity:write` scope.
    #[error("{status_code} - {body}")]
    #[diagnostic(
        code(strava_rename::unauthorized),
        help("Refresh the access token and check that it was granted the activity scopes")
    )]
    Unauthorized {
        status_code: reqwest::StatusCode,
        url: String,
        fault: Option<Fault>,
        body: String,
    },

    /// Any other non-success status returned by the API.
    #[error("{status_code} - {body}")]
    #[diagnostic(
        code(strava_rename::api_error),
        help("Review the fault returned by the Strava API")
    )]
    Api {
        status_code: reqwest::StatusCode,
        url: String,
        fault: Option<Fault>,
        body: String,
    },

    /// Rate limit exceeded (HTTP 429 Too Many Requests)
    #[error("{status_code} - {body}")]
    #[diagnostic(
        code(strava_rename::rate_limit_exceeded),
        help("The Strava API rate limit has been exceeded. Wait for the current 15-minute window to end.")
    )]
    RateLimitExceeded {
        retry_after: Option<Duration>,
        status_code: reqwest::StatusCode,
        url: String,
        body: String,
    },

    #[error("endpoint could not be parsed as a URL")]
    #[diagnostic(
        code(strava_rename::invalid_endpoint),
        help("Check that the API base URL is correctly formatted")
    )]
    InvalidEndpoint,

    /// An error returned during the `OAuth2` refresh-token exchange.
    #[error("oauth2 error: {0}")]
    #[diagnostic(
        code(strava_rename::oauth2_error),
        help("Verify STRAVA_CLIENT_ID, STRAVA_CLIENT_SECRET and STRAVA_REFRESH_TOKEN")
    )]
    OAuth2(oauth2::RequestTokenError<HttpClientError<reqwest::Error>, OAuth2ErrorResponse>),

    #[error("environment variable {0} is not set")]
    #[diagnostic(
        code(strava_rename::missing_env),
        help("Add the variable to your environment or to the .env file")
    )]
    MissingEnv(&'static str),

    #[error("invalid activity id: {0:?}")]
    #[diagnostic(
        code(strava_rename::invalid_activity_id),
        help("Activity ids are positive integers, as shown in the activity URL")
    )]
    InvalidActivityId(String),
}

impl Error {
    /// The HTTP status attached to this error, if it came from a response.
    #[must_use]
    pub fn status_code(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Request(e) => e.status(),
            Self::NotFound { status_code, .. }
            | Self::Unauthorized { status_code, .. }
            | Self::Api { status_code, .. }
            | Self::RateLimitExceeded { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Self::Request(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::DeserializationError(e, None)
    }
}

impl From<oauth2::RequestTokenError<HttpClientError<reqwest::Error>, OAuth2ErrorResponse>>
    for Error
{
    fn from(
        e: oauth2::RequestTokenError<HttpClientError<reqwest::Error>, OAuth2ErrorResponse>,
    ) -> Self {
        Self::OAuth2(e)
    }
}

/// Type alias for results from this crate.
///
/// This is already a Miette diagnostic result due to the implementation of
/// the Diagnostic trait for the Error type.
pub type Result<O> = std::result::Result<O, Error>;
