//! Database operations for expenses.

use rusqlite::{Connection, Row, named_params};
use time::OffsetDateTime;

use crate::{
    Error,
    expense::{Expense, NewExpense},
};

/// Insert `new_expense`, stamped with `created_at`, as a single statement.
///
/// # Errors
/// Returns an error if the ID already exists, the date is not a valid
/// `YYYY-MM-DD` date, or there is some other SQL error.
pub fn create_expense(
    new_expense: &NewExpense,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO expense (id, description, category, amount, date, status, notes, created_at)
        VALUES (:id, :description, :category, :amount, :date, :status, :notes, :created_at);",
        named_params! {
            ":id": new_expense.id,
            ":description": new_expense.description,
            ":category": new_expense.category,
            ":amount": new_expense.amount,
            ":date": new_expense.date,
            ":status": new_expense.status,
            ":notes": new_expense.notes,
            ":created_at": created_at,
        },
    )?;

    Ok(())
}

/// Retrieve all expenses, most recent date first.
pub fn get_all_expenses(connection: &Connection) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(
            "SELECT id, description, category, amount, date, status, notes, created_at
            FROM expense
            ORDER BY date DESC;",
        )?
        .query_map([], map_row)?
        .map(|maybe_expense| maybe_expense.map_err(|error| error.into()))
        .collect()
}

/// Initialize the expense table and indexes.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense (
            id TEXT PRIMARY KEY NOT NULL,
            description TEXT NOT NULL,
            category TEXT NOT NULL,
            amount REAL NOT NULL,
            date TEXT NOT NULL CHECK (date IS date(date)),
            status TEXT NOT NULL DEFAULT 'pending',
            notes TEXT,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_expense_date ON expense(date);",
    )?;

    Ok(())
}

fn map_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        description: row.get(1)?,
        category: row.get(2)?,
        amount: row.get(3)?,
        date: row.get(4)?,
        status: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
    })
}
