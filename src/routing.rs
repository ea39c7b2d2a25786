//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    extract::FromRef,
    middleware,
    response::{IntoResponse, Response},
    routing::any,
};

use crate::{
    AppState, Error,
    auth::{AuthState, auth_guard},
    cors::cors_middleware,
    endpoints,
    expense::{create_expense_endpoint, list_expenses_endpoint},
};

/// Return a router with all the app's routes.
///
/// The expense routes accept every method so that authentication runs before
/// the handlers check the method. Unknown paths skip authentication and get a
/// JSON 404.
pub fn build_router(state: AppState) -> Router {
    let auth_state = AuthState::from_ref(&state);

    Router::new()
        .route(endpoints::EXPENSES, any(list_expenses_endpoint))
        .route(endpoints::ADD_EXPENSE, any(create_expense_endpoint))
        .route_layer(middleware::from_fn_with_state(auth_state, auth_guard))
        .fallback(get_404_not_found)
        .layer(middleware::from_fn(cors_middleware))
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    Error::NotFound.into_response()
}
