//! The endpoint for listing expenses.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::Method,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    expense::{Expense, get_all_expenses},
};

/// The state needed for listing expenses.
#[derive(Debug, Clone)]
pub struct ListExpensesEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ListExpensesEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Return every expense, most recent date first. Only `GET` is allowed.
pub async fn list_expenses_endpoint(
    State(state): State<ListExpensesEndpointState>,
    method: Method,
) -> Result<Json<Vec<Expense>>, Error> {
    if method != Method::GET {
        return Err(Error::MethodNotAllowed);
    }

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError.into_fetch_error()
    })?;

    get_all_expenses(&connection)
        .map(Json)
        .map_err(Error::into_fetch_error)
}

#[cfg(test)]
mod list_expenses_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json,
        extract::State,
        http::{Method, StatusCode},
        response::IntoResponse,
    };
    use rusqlite::Connection;
    use serde_json::json;
    use time::{OffsetDateTime, macros::date};

    use crate::{
        expense::{NewExpense, create_expense, create_expense_table},
        test_utils::read_json,
    };

    use super::{ListExpensesEndpointState, list_expenses_endpoint};

    fn get_expense_state() -> ListExpensesEndpointState {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        create_expense_table(&connection).expect("Could not create expense table");

        ListExpensesEndpointState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn insert_expense(state: &ListExpensesEndpointState, id: &str, date: &str) {
        let new_expense = NewExpense {
            id: id.to_owned(),
            description: "Groceries".to_owned(),
            category: "Food".to_owned(),
            amount: 52.1,
            date: date.to_owned(),
            status: "approved".to_owned(),
            notes: Some("weekly shop".to_owned()),
        };

        create_expense(
            &new_expense,
            OffsetDateTime::now_utc(),
            &state.db_connection.lock().unwrap(),
        )
        .expect("Could not create test expense");
    }

    #[tokio::test]
    async fn empty_table_gives_empty_list() {
        let state = get_expense_state();

        let response = list_expenses_endpoint(State(state), Method::GET)
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn lists_expenses_newest_first() {
        let state = get_expense_state();
        insert_expense(&state, "old", "2023-05-01");
        insert_expense(&state, "new", "2024-05-01");

        let Json(expenses) = list_expenses_endpoint(State(state), Method::GET)
            .await
            .expect("Could not list expenses");

        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[0].id, "new");
        assert_eq!(expenses[0].date, date!(2024 - 05 - 01));
        assert_eq!(expenses[1].id, "old");
    }

    #[tokio::test]
    async fn every_column_is_serialized() {
        let state = get_expense_state();
        insert_expense(&state, "1", "2024-05-01");

        let response = list_expenses_endpoint(State(state), Method::GET)
            .await
            .into_response();

        let body = read_json(response).await;
        let expense = &body[0];
        assert_eq!(expense["id"], "1");
        assert_eq!(expense["description"], "Groceries");
        assert_eq!(expense["category"], "Food");
        assert_eq!(expense["amount"], 52.1);
        assert_eq!(expense["date"], "2024-05-01");
        assert_eq!(expense["status"], "approved");
        assert_eq!(expense["notes"], "weekly shop");
        assert!(expense["created_at"].is_string());
    }

    #[tokio::test]
    async fn other_methods_are_not_allowed() {
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::PATCH] {
            let response = list_expenses_endpoint(State(get_expense_state()), method)
                .await
                .into_response();

            assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(
                read_json(response).await,
                json!({ "error": "Method not allowed" })
            );
        }
    }

    #[tokio::test]
    async fn query_failure_is_internal_error() {
        let state = ListExpensesEndpointState {
            db_connection: Arc::new(Mutex::new(Connection::open_in_memory().unwrap())),
        };

        let response = list_expenses_endpoint(State(state), Method::GET)
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_json(response).await;
        assert_eq!(
            body["error"],
            "Failed to fetch expenses: no such table: expense"
        );
    }
}
