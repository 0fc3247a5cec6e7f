//! Generic record operations against a bookkeeping table.
//!
//! Identifiers are quoted into the SQL text; every value travels as a positional
//! parameter.

use crate::adapter::ConnectionAdapter;
use crate::criteria::{Criteria, FieldMap, build_where};
use crate::driver::PgDriver;
use crate::error::QueryError;
use crate::quoting::{TableRef, quote_identifier};
use crate::results::ResultSet;
use crate::types::{QueryAndParams, RowValues};

fn require_criteria(criteria: &Criteria) -> Result<(), QueryError> {
    if criteria.is_empty() {
        return Err(QueryError::InvalidStatement(
            "criteria must name at least one field".to_string(),
        ));
    }
    Ok(())
}

fn require_values(values: &FieldMap) -> Result<(), QueryError> {
    if values.is_empty() {
        return Err(QueryError::InvalidStatement(
            "at least one field value is required".to_string(),
        ));
    }
    Ok(())
}

fn quoted_list<'a>(fields: impl Iterator<Item = &'a str>, separator: &str) -> String {
    fields
        .map(quote_identifier)
        .collect::<Vec<_>>()
        .join(separator)
}

/// `SELECT EXISTS(...)` against `information_schema.tables`.
#[must_use]
pub fn table_exists_query(table_name: &str, schema: Option<&str>) -> QueryAndParams {
    let mut criteria = Criteria::new().with("table_name", table_name);
    if let Some(schema) = schema.filter(|s| !s.is_empty()) {
        criteria.insert("table_schema", schema);
    }
    let clause = build_where(&criteria, 1);
    let catalog = TableRef::new("tables").in_schema("information_schema");
    QueryAndParams::new(
        format!("SELECT EXISTS(SELECT 1 FROM {catalog} WHERE {})", clause.sql()),
        clause.args,
    )
}

/// `SELECT EXISTS(SELECT 1 FROM <table> WHERE <criteria>)`.
///
/// # Errors
/// Returns [`QueryError::InvalidStatement`] for empty criteria.
pub fn record_exists_query(
    criteria: &Criteria,
    table: &TableRef,
) -> Result<QueryAndParams, QueryError> {
    require_criteria(criteria)?;
    let clause = build_where(criteria, 1);
    Ok(QueryAndParams::new(
        format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE {})", clause.sql()),
        clause.args,
    ))
}

/// `SELECT <fields> FROM <table> WHERE <criteria>`.
///
/// # Errors
/// Returns [`QueryError::InvalidStatement`] for an empty projection or empty criteria.
pub fn select_query(
    field_names: &[&str],
    criteria: &Criteria,
    table: &TableRef,
) -> Result<QueryAndParams, QueryError> {
    if field_names.is_empty() {
        return Err(QueryError::InvalidStatement(
            "at least one field must be selected".to_string(),
        ));
    }
    require_criteria(criteria)?;
    let clause = build_where(criteria, 1);
    Ok(QueryAndParams::new(
        format!(
            "SELECT {} FROM {table} WHERE {}",
            quoted_list(field_names.iter().copied(), ", "),
            clause.sql()
        ),
        clause.args,
    ))
}

/// `INSERT INTO <table> (<fields>) VALUES ($1..$N)`.
///
/// # Errors
/// Returns [`QueryError::InvalidStatement`] when `values` is empty.
pub fn insert_query(values: &FieldMap, table: &TableRef) -> Result<QueryAndParams, QueryError> {
    require_values(values)?;
    let placeholders = (1..=values.len())
        .map(|n| format!("${n}"))
        .collect::<Vec<_>>()
        .join(",");
    let args = values.iter().map(|(_, value)| value.clone()).collect();
    Ok(QueryAndParams::new(
        format!(
            "INSERT INTO {table} ({}) VALUES ({placeholders})",
            quoted_list(values.fields(), ",")
        ),
        args,
    ))
}

/// `UPDATE <table> SET "f" = $1, ... WHERE <criteria>`, criteria numbered after the SET list.
///
/// # Errors
/// Returns [`QueryError::InvalidStatement`] when `values` or `criteria` is empty.
pub fn update_query(
    values: &FieldMap,
    criteria: &Criteria,
    table: &TableRef,
) -> Result<QueryAndParams, QueryError> {
    require_values(values)?;
    require_criteria(criteria)?;
    let assignments = build_where(values, 1);
    let clause = build_where(criteria, assignments.next_index);
    let sql = format!(
        "UPDATE {table} SET {} WHERE {}",
        assignments.predicates.join(", "),
        clause.sql()
    );
    let mut args = assignments.args;
    args.extend(clause.args);
    Ok(QueryAndParams::new(sql, args))
}

/// `true` only for a boolean true (or the text literal `t`) in the first column of the first row.
fn exists_flag(result: &ResultSet) -> bool {
    result
        .first_value()
        .and_then(RowValues::as_bool)
        .unwrap_or(false)
}

impl<D: PgDriver> ConnectionAdapter<D> {
    /// Whether `table_name` exists, optionally within `schema`.
    ///
    /// # Errors
    /// Returns [`QueryError`] if the lookup itself fails; a missing table is `Ok(false)`.
    pub async fn table_exists(
        &mut self,
        table_name: &str,
        schema: Option<&str>,
    ) -> Result<bool, QueryError> {
        let query = table_exists_query(table_name, schema);
        let result = self.execute_parameterized(&query).await?;
        Ok(exists_flag(&result))
    }

    /// Whether any row of `table` matches every criterion.
    ///
    /// # Errors
    /// Returns [`QueryError`] for empty criteria or a failed query.
    pub async fn record_exists(
        &mut self,
        criteria: &Criteria,
        table: &TableRef,
    ) -> Result<bool, QueryError> {
        let query = record_exists_query(criteria, table)?;
        let result = self.execute_parameterized(&query).await?;
        Ok(exists_flag(&result))
    }

    /// Values of `field_names`, in that order, from the first row matching `criteria`.
    ///
    /// `Ok(None)` when no row matches.
    ///
    /// # Errors
    /// Returns [`QueryError`] for an empty projection, empty criteria or a failed query.
    pub async fn get_record_values(
        &mut self,
        field_names: &[&str],
        criteria: &Criteria,
        table: &TableRef,
    ) -> Result<Option<Vec<RowValues>>, QueryError> {
        let query = select_query(field_names, criteria, table)?;
        let result = self.execute_parameterized(&query).await?;
        Ok(result.results.into_iter().next().map(|row| row.into_values()))
    }

    /// Insert one row built from `values`.
    ///
    /// # Errors
    /// Returns [`QueryError`] for empty values or a failed insert.
    pub async fn insert_record(
        &mut self,
        values: &FieldMap,
        table: &TableRef,
    ) -> Result<(), QueryError> {
        let query = insert_query(values, table)?;
        self.execute_parameterized(&query).await?;
        Ok(())
    }

    /// Set `values` on every row matching `criteria`.
    ///
    /// # Errors
    /// Returns [`QueryError`] for empty values, empty criteria or a failed update.
    pub async fn update_record(
        &mut self,
        values: &FieldMap,
        criteria: &Criteria,
        table: &TableRef,
    ) -> Result<(), QueryError> {
        let query = update_query(values, criteria, table)?;
        self.execute_parameterized(&query).await?;
        Ok(())
    }
}
