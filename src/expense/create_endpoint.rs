//! The endpoint for adding an expense.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    body::Bytes,
    extract::{FromRef, State},
    http::Method,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    expense::{NewExpense, create_expense},
};

/// The state needed for adding an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateExpenseEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The body of a successful add expense response.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ExpenseAddedResponse {
    pub success: bool,
    pub message: String,
}

/// Handle a request to add an expense.
///
/// Only `POST` is allowed. The body must be a JSON object holding the
/// expense's fields; see [NewExpense::from_json_body].
pub async fn create_expense_endpoint(
    State(state): State<CreateExpenseEndpointState>,
    method: Method,
    body: Bytes,
) -> Result<Json<ExpenseAddedResponse>, Error> {
    if method != Method::POST {
        return Err(Error::MethodNotAllowed);
    }

    let new_expense = NewExpense::from_json_body(&body).inspect_err(|error| {
        tracing::debug!("Rejected new expense: {error}");
    })?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError.into_insert_error()
    })?;

    create_expense(&new_expense, OffsetDateTime::now_utc(), &connection)
        .map_err(Error::into_insert_error)?;

    tracing::info!("Added expense {}", new_expense.id);

    Ok(Json(ExpenseAddedResponse {
        success: true,
        message: "Expense added successfully".to_owned(),
    }))
}
