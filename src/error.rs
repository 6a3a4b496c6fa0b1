use axum::{http::StatusCode, response::{Html, IntoResponse, Response}};
use thiserror::Error;

use crate::res;

pub type AppResult<T> = Result<T, AppError>;

/// Application-wide error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("oauth error: {0}")]
    OAuth(String),

    #[error("{0} not found")]
    NotFound(&'static str),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(what) => {
                (StatusCode::NOT_FOUND, Html(res::sorry_page(what))).into_response()
            }
            err => {
                tracing::error!(error = %err, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "something went wrong").into_response()
            }
        }
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::OAuth(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::OAuth(err.to_owned())
    }
}

impl<E, R> From<oauth2::RequestTokenError<E, R>> for AppError
where
    E: core::error::Error + Send + Sync + 'static,
    R: oauth2::ErrorResponse + Send + Sync + 'static,
{
    fn from(err: oauth2::RequestTokenError<E, R>) -> Self {
        AppError::OAuth(err.to_string())
    }
}
