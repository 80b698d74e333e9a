use sqlx::{Pool, Sqlite};

use crate::userdb::{errors::UserError, types::UserData};

use super::schema::validate_sqlite_table_schema;

pub(super) async fn create_tables_sqlite(
    pool: &Pool<Sqlite>,
    table_name: &str,
) -> Result<(), UserError> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table_name} (
            username TEXT PRIMARY KEY NOT NULL,
            email TEXT NOT NULL,
            hash BLOB NOT NULL,
            role TEXT NOT NULL
        )
        "#
    ))
    .execute(pool)
    .await?;

    Ok(())
}

pub(super) async fn validate_user_tables_sqlite(
    pool: &Pool<Sqlite>,
    table_name: &str,
) -> Result<(), UserError> {
    let expected_columns = [
        ("username", "TEXT"),
        ("email", "TEXT"),
        ("hash", "BLOB"),
        ("role", "TEXT"),
    ];

    validate_sqlite_table_schema(pool, table_name, &expected_columns).await
}

pub(super) async fn get_user_sqlite(
    pool: &Pool<Sqlite>,
    table_name: &str,
    username: &str,
) -> Result<Option<UserData>, UserError> {
    Ok(sqlx::query_as::<_, UserData>(&format!(
        r#"
        SELECT username, email, hash, role FROM {table_name} WHERE username = ?
        "#
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?)
}

pub(super) async fn get_all_users_sqlite(
    pool: &Pool<Sqlite>,
    table_name: &str,
) -> Result<Vec<UserData>, UserError> {
    Ok(sqlx::query_as::<_, UserData>(&format!(
        r#"
        SELECT username, email, hash, role FROM {table_name}
        "#
    ))
    .fetch_all(pool)
    .await?)
}

pub(super) async fn upsert_user_sqlite(
    pool: &Pool<Sqlite>,
    table_name: &str,
    user: &UserData,
) -> Result<(), UserError> {
    sqlx::query(&format!(
        r#"
        INSERT INTO {table_name} (username, email, hash, role)
        VALUES (?, ?, ?, ?)
        ON CONFLICT (username) DO UPDATE SET
            email = excluded.email,
            hash = excluded.hash,
            role = excluded.role
        "#
    ))
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.hash)
    .bind(&user.role)
    .execute(pool)
    .await?;

    Ok(())
}

pub(super) async fn delete_user_sqlite(
    pool: &Pool<Sqlite>,
    table_name: &str,
    username: &str,
) -> Result<(), UserError> {
    let result = sqlx::query(&format!(
        r#"
        DELETE FROM {table_name} WHERE username = ?
        "#
    ))
    .bind(username)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(UserError::DeleteMissing(username.to_string()));
    }
    Ok(())
}
