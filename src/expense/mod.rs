//! Recording and listing expenses.

mod create_endpoint;
mod db;
mod domain;
mod list_endpoint;

pub use create_endpoint::create_expense_endpoint;
pub use db::{create_expense, create_expense_table, get_all_expenses};
pub use domain::{Expense, NewExpense};
pub use list_endpoint::list_expenses_endpoint;
