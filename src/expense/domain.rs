//! Core expense types and the rules for turning a JSON payload into a new expense.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::{Date, OffsetDateTime};

use crate::Error;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// The status given to expenses created without one.
pub const DEFAULT_STATUS: &str = "pending";

/// The fields a new expense must have, in the order they are checked.
pub const REQUIRED_FIELDS: [&str; 5] = ["id", "description", "category", "amount", "date"];

/// An expense as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The caller-supplied identifier, unique across all expenses.
    pub id: String,
    /// What the money was spent on.
    pub description: String,
    /// A free-form category, e.g. "Food".
    pub category: String,
    /// The amount spent.
    pub amount: f64,
    /// The day the expense happened.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// A free-form status, "pending" unless the creator gave one.
    pub status: String,
    /// Optional notes.
    pub notes: Option<String>,
    /// When the expense was added.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// A validated expense that has not been inserted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// The caller-supplied identifier.
    pub id: String,
    /// What the money was spent on.
    pub description: String,
    /// A free-form category.
    pub category: String,
    /// The amount spent.
    pub amount: f64,
    /// The day of the expense as given by the caller.
    ///
    /// The database rejects text that is not a `YYYY-MM-DD` calendar date.
    pub date: String,
    /// The status, defaulting to [DEFAULT_STATUS].
    pub status: String,
    /// Optional notes.
    pub notes: Option<String>,
}

impl NewExpense {
    /// Build a new expense from a raw request body.
    ///
    /// Required fields are checked in the order of [REQUIRED_FIELDS] and the
    /// first missing one is reported.
    ///
    /// # Errors
    /// - [Error::InvalidJson] if `body` is not JSON or decodes to an empty value.
    /// - [Error::MissingField] if a required field is absent or empty. A
    ///   non-empty value that is not an object has no fields, so `id` is missing.
    /// - [Error::InvalidField] if a field holds an array or object, or the
    ///   amount is not finite.
    pub fn from_json_body(body: &[u8]) -> Result<Self, Error> {
        let value = serde_json::from_slice::<Value>(body).map_err(|error| {
            tracing::debug!("Could not parse expense JSON: {error}");
            Error::InvalidJson
        })?;

        if is_empty(&value) {
            return Err(Error::InvalidJson);
        }

        let fields = match value {
            Value::Object(fields) => fields,
            _ => Map::new(),
        };

        for field in REQUIRED_FIELDS {
            match fields.get(field) {
                Some(value) if !is_empty(value) => {}
                _ => return Err(Error::MissingField(field)),
            }
        }

        Ok(Self {
            id: required_text(&fields, "id")?,
            description: required_text(&fields, "description")?,
            category: required_text(&fields, "category")?,
            amount: coerce_amount(&fields["amount"])?,
            date: required_text(&fields, "date")?,
            status: optional_text(&fields, "status")?.unwrap_or_else(|| DEFAULT_STATUS.to_owned()),
            notes: optional_text(&fields, "notes")?,
        })
    }
}

/// Whether a JSON value counts as not filled in.
///
/// `null`, `false`, `""`, `"0"`, zero and empty arrays or objects are empty.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty() || text == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

fn required_text(fields: &Map<String, Value>, field: &'static str) -> Result<String, Error> {
    optional_text(fields, field)?.ok_or(Error::MissingField(field))
}

/// Read a scalar field as text. Absent and `null` fields give `None`.
fn optional_text(
    fields: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, Error> {
    match fields.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(Value::Number(number)) => Ok(Some(number.to_string())),
        Some(Value::Bool(true)) => Ok(Some("1".to_owned())),
        Some(Value::Bool(false)) => Ok(Some(String::new())),
        Some(Value::Array(_) | Value::Object(_)) => Err(Error::InvalidField(field)),
    }
}

/// Convert an amount given as a number or as text to a float.
///
/// Text is read up to the end of its leading number, so `"4.50 NZD"` is 4.5,
/// and text without a leading number is 0.
fn coerce_amount(value: &Value) -> Result<f64, Error> {
    let amount = match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => parse_leading_number(text),
        Value::Bool(flag) => {
            if *flag {
                1.0
            } else {
                0.0
            }
        }
        Value::Null => 0.0,
        Value::Array(_) | Value::Object(_) => return Err(Error::InvalidField("amount")),
    };

    if amount.is_finite() {
        Ok(amount)
    } else {
        Err(Error::InvalidField("amount"))
    }
}

fn parse_leading_number(text: &str) -> f64 {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let count_digits = |from: usize| {
        bytes[from..]
            .iter()
            .take_while(|byte| byte.is_ascii_digit())
            .count()
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let integer_digits = count_digits(end);
    end += integer_digits;

    let mut fraction_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        fraction_digits = count_digits(end + 1);
        end += 1 + fraction_digits;
    }

    if integer_digits + fraction_digits == 0 {
        return 0.0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exponent_end = end + 1;
        if matches!(bytes.get(exponent_end), Some(b'+' | b'-')) {
            exponent_end += 1;
        }

        let exponent_digits = count_digits(exponent_end);
        if exponent_digits > 0 {
            end = exponent_end + exponent_digits;
        }
    }

    text[..end].parse().unwrap_or(0.0)
}
