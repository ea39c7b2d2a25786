//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, auth::ApiKey, db::initialize};

/// The state of the REST server.
///
/// Built once at startup and cloned into each handler by axum. Nothing in it
/// changes after construction.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The shared secret clients must send as a bearer token.
    pub api_key: ApiKey,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the expense table
    /// if it does not exist yet.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_connection: Connection, api_key: ApiKey) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            api_key,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}
