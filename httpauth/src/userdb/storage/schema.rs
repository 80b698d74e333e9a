use sqlx::{Pool, Postgres, Row, Sqlite};

use crate::userdb::errors::UserError;

/// Table names are interpolated into SQL, so only plain identifiers pass.
pub(super) fn validate_table_name(table_name: &str) -> Result<(), UserError> {
    let valid = !table_name.is_empty()
        && table_name.len() <= 63
        && table_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !table_name.starts_with(|c: char| c.is_ascii_digit());

    if valid {
        Ok(())
    } else {
        Err(UserError::InvalidData(format!(
            "Invalid table name '{table_name}'"
        )))
    }
}

/// Compare the actual columns of a table against the expected (name, type)
/// pairs. Missing columns and type mismatches fail; extra columns only warn.
fn compare_columns(
    table_name: &str,
    expected_columns: &[(&str, &str)],
    actual_columns: &[(String, String)],
) -> Result<(), UserError> {
    for (expected_name, expected_type) in expected_columns {
        match actual_columns
            .iter()
            .find(|(name, _)| name == expected_name)
        {
            Some((_, actual_type)) if actual_type.eq_ignore_ascii_case(expected_type) => {}
            Some((_, actual_type)) => {
                return Err(UserError::Storage(format!(
                    "Schema validation failed: Column '{expected_name}' has type '{actual_type}' but expected '{expected_type}'"
                )));
            }
            None => {
                return Err(UserError::Storage(format!(
                    "Schema validation failed: Missing column '{expected_name}'"
                )));
            }
        }
    }

    for (actual_name, _) in actual_columns {
        if !expected_columns
            .iter()
            .any(|(name, _)| *name == actual_name)
        {
            tracing::warn!(
                "Extra column '{}' found in table '{}'",
                actual_name,
                table_name
            );
        }
    }

    Ok(())
}

pub(super) async fn validate_sqlite_table_schema(
    pool: &Pool<Sqlite>,
    table_name: &str,
    expected_columns: &[(&str, &str)],
) -> Result<(), UserError> {
    let rows = sqlx::query(&format!("PRAGMA table_info({table_name})"))
        .fetch_all(pool)
        .await?;

    if rows.is_empty() {
        return Err(UserError::Storage(format!(
            "Schema validation failed: Table '{table_name}' does not exist"
        )));
    }

    let actual_columns: Vec<(String, String)> = rows
        .iter()
        .map(|row| (row.get::<String, _>("name"), row.get::<String, _>("type")))
        .collect();

    compare_columns(table_name, expected_columns, &actual_columns)
}

pub(super) async fn validate_postgres_table_schema(
    pool: &Pool<Postgres>,
    table_name: &str,
    expected_columns: &[(&str, &str)],
) -> Result<(), UserError> {
    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT FROM information_schema.tables WHERE table_name = $1)",
    )
    .bind(table_name)
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Err(UserError::Storage(format!(
            "Schema validation failed: Table '{table_name}' does not exist"
        )));
    }

    let rows = sqlx::query(
        "SELECT column_name, data_type FROM information_schema.columns
         WHERE table_name = $1 ORDER BY column_name",
    )
    .bind(table_name)
    .fetch_all(pool)
    .await?;

    let actual_columns: Vec<(String, String)> = rows
        .iter()
        .map(|row| {
            (
                row.get::<String, _>("column_name"),
                row.get::<String, _>("data_type"),
            )
        })
        .collect();

    compare_columns(table_name, expected_columns, &actual_columns)
}
