use sqlx::{Pool, Postgres};

use crate::userdb::{errors::UserError, types::UserData};

use super::schema::validate_postgres_table_schema;

pub(super) async fn create_tables_postgres(
    pool: &Pool<Postgres>,
    table_name: &str,
) -> Result<(), UserError> {
    sqlx::query(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table_name} (
            username TEXT PRIMARY KEY,
            email TEXT NOT NULL,
            hash BYTEA NOT NULL,
            role TEXT NOT NULL
        )
        "#
    ))
    .execute(pool)
    .await?;

    Ok(())
}

pub(super) async fn validate_user_tables_postgres(
    pool: &Pool<Postgres>,
    table_name: &str,
) -> Result<(), UserError> {
    let expected_columns = [
        ("username", "text"),
        ("email", "text"),
        ("hash", "bytea"),
        ("role", "text"),
    ];

    validate_postgres_table_schema(pool, table_name, &expected_columns).await
}

pub(super) async fn get_user_postgres(
    pool: &Pool<Postgres>,
    table_name: &str,
    username: &str,
) -> Result<Option<UserData>, UserError> {
    Ok(sqlx::query_as::<_, UserData>(&format!(
        r#"
        SELECT username, email, hash, role FROM {table_name} WHERE username = $1
        "#
    ))
    .bind(username)
    .fetch_optional(pool)
    .await?)
}

pub(super) async fn get_all_users_postgres(
    pool: &Pool<Postgres>,
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

pub(super) async fn upsert_user_postgres(
    pool: &Pool<Postgres>,
    table_name: &str,
    user: &UserData,
) -> Result<(), UserError> {
    sqlx::query(&format!(
        r#"
        INSERT INTO {table_name} (username, email, hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (username) DO UPDATE SET
            email = EXCLUDED.email,
            hash = EXCLUDED.hash,
            role = EXCLUDED.role
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

pub(super) async fn delete_user_postgres(
    pool: &Pool<Postgres>,
    table_name: &str,
    username: &str,
) -> Result<(), UserError> {
    let result = sqlx::query(&format!(
        r#"
        DELETE FROM {table_name} WHERE username = $1
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
