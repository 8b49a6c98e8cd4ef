//! JSON document CRUD over the per-collection tables.
//!
//! Every collection table has the same shape: `id`, a JSON `body`, and the
//! `created_at`/`updated_at` timestamps kept outside the body so callers
//! cannot overwrite them.

use rusqlite::{params, types::ToSql, OptionalExtension, Row};
use serde_json::{Map, Value};

use super::{Database, DatabaseError};
use crate::gateway::filter::{DocumentFilter, FieldCondition, SortOrder};

/// A raw document row from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRow {
    pub id: String,
    pub body: String,
    pub created_at: String,
    pub updated_at: String,
}

impl DocumentRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            body: row.get("body")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

/// Rejects anything that is not a plain `[A-Za-z0-9_]` identifier.
///
/// Table and field names are interpolated into SQL and JSON paths.
fn validate_identifier(name: &str) -> Result<(), DatabaseError> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(DatabaseError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

fn json_param(value: &Value) -> Box<dyn ToSql> {
    match value {
        Value::String(s) => Box::new(s.clone()),
        // json_extract yields 1/0 for JSON booleans.
        Value::Bool(b) => Box::new(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Box::new(i),
            None => Box::new(n.as_f64().unwrap_or_default()),
        },
        other => Box::new(other.to_string()),
    }
}

fn order_clause(order: SortOrder) -> &'static str {
    match order {
        SortOrder::NewestFirst => "ORDER BY created_at DESC, rowid DESC",
        SortOrder::NameAscending => "ORDER BY json_extract(body, '$.name') ASC, rowid ASC",
    }
}

/// Inserts a new document row.
pub fn insert(db: &Database, table: &str, row: &DocumentRow) -> Result<(), DatabaseError> {
    validate_identifier(table)?;
    db.with_conn(|conn| {
        conn.execute(
            &format!(
                "INSERT INTO {} (id, body, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
                table
            ),
            params![row.id, row.body, row.created_at, row.updated_at],
        )?;
        Ok(())
    })
}

/// Finds a document by its ID.
pub fn find_by_id(db: &Database, table: &str, id: &str) -> Result<Option<DocumentRow>, DatabaseError> {
    validate_identifier(table)?;
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                &format!("SELECT * FROM {} WHERE id = ?1", table),
                params![id],
                DocumentRow::from_row,
            )
            .optional()?;
        Ok(row)
    })
}

/// Queries documents matching every condition of the filter.
///
/// `default_order` applies when the filter carries no ordering of its own.
pub fn query(
    db: &Database,
    table: &str,
    filter: &DocumentFilter,
    default_order: SortOrder,
) -> Result<Vec<DocumentRow>, DatabaseError> {
    validate_identifier(table)?;

    let mut conditions = Vec::new();
    let mut param_values: Vec<Box<dyn ToSql>> = Vec::new();

    for condition in &filter.conditions {
        match condition {
            FieldCondition::Equals { field, value } => {
                validate_identifier(field)?;
                if value.is_null() {
                    conditions.push(format!("json_extract(body, '$.{}') IS NULL", field));
                } else {
                    param_values.push(json_param(value));
                    conditions.push(format!(
                        "json_extract(body, '$.{}') = ?{}",
                        field,
                        param_values.len()
                    ));
                }
            }
            FieldCondition::ArrayContains { field, key, value } => {
                validate_identifier(field)?;
                param_values.push(json_param(value));
                let element = match key {
                    Some(key) => {
                        validate_identifier(key)?;
                        format!("json_extract(json_each.value, '$.{}')", key)
                    }
                    None => "json_each.value".to_string(),
                };
                conditions.push(format!(
                    "EXISTS (SELECT 1 FROM json_each(body, '$.{}') WHERE {} = ?{})",
                    field,
                    element,
                    param_values.len()
                ));
            }
        }
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "SELECT id, body, created_at, updated_at FROM {} {} {}",
        table,
        where_clause,
        order_clause(filter.order.unwrap_or(default_order))
    );

    db.with_conn(|conn| {
        let params_ref: Vec<&dyn ToSql> = param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let rows: Vec<DocumentRow> = stmt
            .query_map(params_ref.as_slice(), DocumentRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Shallow-merges `patch` into the stored body and refreshes `updated_at`.
///
/// Returns the updated row, or `None` when no document has that id.
pub fn merge(
    db: &Database,
    table: &str,
    id: &str,
    patch: &Map<String, Value>,
    updated_at: &str,
) -> Result<Option<DocumentRow>, DatabaseError> {
    validate_identifier(table)?;
    db.with_conn(|conn| {
        let existing = conn
            .query_row(
                &format!("SELECT * FROM {} WHERE id = ?1", table),
                params![id],
                DocumentRow::from_row,
            )
            .optional()?;

        let Some(mut row) = existing else {
            return Ok(None);
        };

        let mut body: Map<String, Value> = serde_json::from_str(&row.body)?;
        for (key, value) in patch {
            body.insert(key.clone(), value.clone());
        }
        row.body = serde_json::to_string(&body)?;
        row.updated_at = updated_at.to_string();

        conn.execute(
            &format!("UPDATE {} SET body = ?2, updated_at = ?3 WHERE id = ?1", table),
            params![row.id, row.body, row.updated_at],
        )?;
        Ok(Some(row))
    })
}

/// Deletes a document. Returns whether a row was removed.
pub fn delete(db: &Database, table: &str, id: &str) -> Result<bool, DatabaseError> {
    validate_identifier(table)?;
    db.with_conn(|conn| {
        let affected = conn.execute(&format!("DELETE FROM {} WHERE id = ?1", table), params![id])?;
        Ok(affected > 0)
    })
}
