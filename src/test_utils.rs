#![allow(missing_docs)]

use axum::{body::Body, http::Response};
use rusqlite::Connection;
use serde_json::Value;

use crate::{AppState, auth::ApiKey};

pub(crate) const TEST_API_KEY: &str = "hunter2";

/// App state backed by a fresh in-memory database and [TEST_API_KEY].
pub(crate) fn get_test_app_state() -> AppState {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");
    let api_key = ApiKey::new(TEST_API_KEY).expect("Could not create API key.");

    AppState::new(connection, api_key).expect("Could not create app state.")
}

pub(crate) async fn read_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not read response body");

    serde_json::from_slice(&body).expect("Response body is not JSON")
}
