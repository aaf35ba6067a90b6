//! Error handling

use axum::response::IntoResponse;
use tracing::info;

/// Errors that end a web request, as opposed to ones shown to the user as a flash.
#[derive(Debug)]
pub enum PostsmithError {
    /// When you didn't do the right thing
    BadRequest,
    /// Missing or invalid session / CSRF token
    Unauthorized,
    /// When a requested resource is not found
    NotFound(String),
    /// When an internal server error occurs
    InternalServerError(String),
}

impl std::fmt::Display for PostsmithError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest => write!(f, "Bad request"),
            Self::Unauthorized => write!(f, "Unauthorized"),
            Self::NotFound(what) => write!(f, "Not found: {what}"),
            Self::InternalServerError(message) => write!(f, "Internal server error: {message}"),
        }
    }
}

impl std::error::Error for PostsmithError {}

impl From<std::io::Error> for PostsmithError {
    fn from(err: std::io::Error) -> Self {
        PostsmithError::InternalServerError(err.to_string())
    }
}

impl From<axum::http::Error> for PostsmithError {
    fn from(err: axum::http::Error) -> Self {
        PostsmithError::InternalServerError(err.to_string())
    }
}

impl From<tower_sessions::session::Error> for PostsmithError {
    fn from(err: tower_sessions::session::Error) -> Self {
        PostsmithError::InternalServerError(err.to_string())
    }
}

impl IntoResponse for PostsmithError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            PostsmithError::BadRequest => {
                info!("Bad request received");
                (axum::http::StatusCode::BAD_REQUEST, "Bad Request")
            }
            PostsmithError::Unauthorized => {
                info!("Unauthorized request received");
                (
                    axum::http::StatusCode::UNAUTHORIZED,
                    "Unauthorized: invalid or missing session.",
                )
            }
            PostsmithError::NotFound(what) => {
                info!("404 {what}");
                (axum::http::StatusCode::NOT_FOUND, "Not Found")
            }
            PostsmithError::InternalServerError(message) => {
                tracing::error!("Internal server error: {}", message);
                (
                    axum::http::StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                )
            }
        };
        let mut response = axum::response::Response::new(axum::body::Body::from(body));
        *response.status_mut() = status;
        response
    }
}
