//! The API endpoints URIs.

/// The route for listing every expense.
pub const EXPENSES: &str = "/expenses";
/// The route for adding an expense.
pub const ADD_EXPENSE: &str = "/add_expense";
