use std::sync::Arc;

use tokio_postgres::{Row, SimpleQueryMessage};

use crate::error::DriverError;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Map a tokio-postgres error onto the server's message and SQLSTATE.
pub(crate) fn driver_error(err: &tokio_postgres::Error) -> DriverError {
    match err.as_db_error() {
        Some(db) => DriverError::new(db.message()).with_code(db.code().code()),
        None => DriverError::new(err.to_string()),
    }
}

/// Extracts a `RowValues` from a `tokio_postgres` Row at the given index.
///
/// # Errors
/// Returns `DriverError` if the column cannot be decoded.
pub fn postgres_extract_value(row: &Row, idx: usize) -> Result<RowValues, DriverError> {
    row.try_get::<_, RowValues>(idx).map_err(|e| driver_error(&e))
}

/// Build a result set from rows of an extended-protocol query.
///
/// # Errors
/// Returns `DriverError` from value extraction.
pub fn build_result_set_from_rows(rows: &[Row]) -> Result<ResultSet, DriverError> {
    let mut result_set = ResultSet::with_capacity(rows.len());
    if let Some(row) = rows.first() {
        let cols: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
        result_set.set_column_names(Arc::new(cols));
    }

    for row in rows {
        let col_count = row.columns().len();
        let mut row_values = Vec::with_capacity(col_count);
        for idx in 0..col_count {
            row_values.push(postgres_extract_value(row, idx)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

/// Build a result set from simple-query messages. Every value is text or `Null`.
///
/// Column names come from the first row; with several statements, rows of all of
/// them are collected.
#[must_use]
pub fn build_result_set_from_messages(messages: &[SimpleQueryMessage]) -> ResultSet {
    let mut result_set = ResultSet::default();
    let mut affected = 0usize;

    for message in messages {
        match message {
            SimpleQueryMessage::Row(row) => {
                if result_set.get_column_names().is_none() {
                    let cols: Vec<String> =
                        row.columns().iter().map(|c| c.name().to_string()).collect();
                    result_set.set_column_names(Arc::new(cols));
                }
                let row_values = (0..row.len())
                    .map(|idx| {
                        row.get(idx)
                            .map_or(RowValues::Null, |text| RowValues::Text(text.to_owned()))
                    })
                    .collect();
                result_set.add_row_values(row_values);
            }
            SimpleQueryMessage::CommandComplete(rows) => {
                affected += usize::try_from(*rows).unwrap_or(usize::MAX);
            }
            _ => {}
        }
    }

    if result_set.is_empty() {
        result_set.rows_affected = affected;
    }
    result_set
}
