//! A small JSON API for recording and listing expenses.
//!
//! The API exposes two endpoints, one for listing every expense and one for
//! adding a new expense. Both are protected by a shared bearer token and
//! backed by a SQLite database.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use tokio::signal;

mod app_state;
mod auth;
mod cors;
mod db;
mod endpoints;
mod expense;
mod logging;
mod routing;
#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{ApiKey, AuthorizationHeader, parse_authorization_header};
pub use db::initialize as initialize_db;
pub use expense::{Expense, NewExpense};
pub use logging::{LOG_BODY_LENGTH_LIMIT, REQUEST_BODY_LIMIT, logging_middleware};
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum Error {
    /// The request had no `Authorization` header, or the header did not use
    /// the bearer scheme.
    #[error("Missing or invalid authorization")]
    MissingAuthorization,

    /// The bearer token did not match the configured API key.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// The endpoint does not support the request's HTTP method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The request body was empty, was not JSON, or was not a JSON object
    /// with at least one field.
    #[error("Invalid JSON input")]
    InvalidJson,

    /// A required field was absent or empty. Holds the field name.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A text field was given an array or object. Holds the field name.
    #[error("Invalid value for field: {0}")]
    InvalidField(&'static str),

    /// No route matches the requested path.
    #[error("Not found")]
    NotFound,

    /// Inserting an expense failed. Holds the underlying database error text.
    #[error("Database error: {0}")]
    InsertFailed(String),

    /// Reading the expenses failed. Holds the underlying database error text.
    #[error("Failed to fetch expenses: {0}")]
    FetchFailed(String),

    /// An unhandled/unexpected SQL error.
    ///
    /// Handlers convert this into [Error::InsertFailed] or
    /// [Error::FetchFailed] so the client sees which operation failed.
    #[error("{0}")]
    Sql(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        tracing::error!("an SQL error occurred: {}", value);
        Error::Sql(value.to_string())
    }
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingAuthorization | Error::InvalidApiKey => StatusCode::UNAUTHORIZED,
            Error::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Error::InvalidJson | Error::MissingField(_) | Error::InvalidField(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::InsertFailed(_)
            | Error::FetchFailed(_)
            | Error::Sql(_)
            | Error::DatabaseLockError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Reword a database error as a failed insert. Other errors pass through.
    fn into_insert_error(self) -> Self {
        match self {
            Error::Sql(detail) => Error::InsertFailed(detail),
            Error::DatabaseLockError => Error::InsertFailed(Error::DatabaseLockError.to_string()),
            error => error,
        }
    }

    /// Reword a database error as a failed fetch. Other errors pass through.
    fn into_fetch_error(self) -> Self {
        match self {
            Error::Sql(detail) => Error::FetchFailed(detail),
            Error::DatabaseLockError => Error::FetchFailed(Error::DatabaseLockError.to_string()),
            error => error,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!("An unexpected error occurred: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
