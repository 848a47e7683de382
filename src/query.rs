//! Statement building and execution for the session table.
//!
//! One function per statement, generic over [`ConnectionTrait`] so the same
//! code runs against the pooled connection, an adopted connection, or a
//! transaction. All statements are built with sea-query against the
//! configured identifiers and rendered per-backend; driver errors normalize
//! to [`SessionStoreError::Query`].

use sea_orm::sea_query::{Alias, Expr, OnConflict, Query};
use sea_orm::{ConnectionTrait, DbErr};

use crate::config::SchemaConfig;
use crate::error::{Result, SessionStoreError};
use crate::schema::{data_col, expired, expires_col, id_col, not_expired, table_iden};

/// A raw session row as stored: expiration in whole Unix seconds and the
/// JSON payload text (nullable in user-managed tables).
pub(crate) struct SessionRow {
    pub expires: i64,
    pub data: Option<String>,
}

fn query_err(err: DbErr) -> SessionStoreError {
    SessionStoreError::Query(err.to_string())
}

/// Fetch a single row by primary key. No expiry filter here; the caller
/// applies lazy expiration itself.
pub(crate) async fn fetch_session<C: ConnectionTrait>(
    conn: &C,
    schema: &SchemaConfig,
    session_id: &str,
) -> Result<Option<SessionRow>> {
    let stmt = Query::select()
        .column(expires_col(schema))
        .column(data_col(schema))
        .from(table_iden(schema))
        .and_where(Expr::col(id_col(schema)).eq(session_id))
        .to_owned();

    let row = conn
        .query_one(conn.get_database_backend().build(&stmt))
        .await
        .map_err(query_err)?;

    row.map(|row| {
        Ok(SessionRow {
            expires: row
                .try_get("", schema.column_names.expires.as_str())
                .map_err(query_err)?,
            data: row
                .try_get("", schema.column_names.data.as_str())
                .map_err(query_err)?,
        })
    })
    .transpose()
}

/// Whether a row with the given primary key exists at all.
pub(crate) async fn session_exists<C: ConnectionTrait>(
    conn: &C,
    schema: &SchemaConfig,
    session_id: &str,
) -> Result<bool> {
    let stmt = Query::select()
        .column(id_col(schema))
        .from(table_iden(schema))
        .and_where(Expr::col(id_col(schema)).eq(session_id))
        .limit(1)
        .to_owned();

    let row = conn
        .query_one(conn.get_database_backend().build(&stmt))
        .await
        .map_err(query_err)?;
    Ok(row.is_some())
}

/// Plain insert, failing on a primary-key conflict.
pub(crate) async fn insert_session<C: ConnectionTrait>(
    conn: &C,
    schema: &SchemaConfig,
    session_id: &str,
    expires: i64,
    payload: &str,
) -> Result<()> {
    let stmt = Query::insert()
        .into_table(table_iden(schema))
        .columns([id_col(schema), expires_col(schema), data_col(schema)])
        .values_panic([
            Expr::val(session_id).into(),
            Expr::val(expires).into(),
            Expr::val(payload).into(),
        ])
        .to_owned();

    conn.execute(conn.get_database_backend().build(&stmt))
        .await
        .map_err(query_err)?;
    Ok(())
}

/// Insert-or-update keyed by the primary key, refreshing both `expires` and
/// `data`. Renders as `ON CONFLICT ... DO UPDATE` on PostgreSQL/SQLite and
/// `ON DUPLICATE KEY UPDATE` on MySQL.
pub(crate) async fn upsert_session<C: ConnectionTrait>(
    conn: &C,
    schema: &SchemaConfig,
    session_id: &str,
    expires: i64,
    payload: &str,
) -> Result<()> {
    let stmt = Query::insert()
        .into_table(table_iden(schema))
        .columns([id_col(schema), expires_col(schema), data_col(schema)])
        .values_panic([
            Expr::val(session_id).into(),
            Expr::val(expires).into(),
            Expr::val(payload).into(),
        ])
        .on_conflict(
            OnConflict::column(id_col(schema))
                .update_columns([expires_col(schema), data_col(schema)])
                .to_owned(),
        )
        .to_owned();

    conn.execute(conn.get_database_backend().build(&stmt))
        .await
        .map_err(query_err)?;
    Ok(())
}

/// Update only the `expires` column. Returns the number of matched rows;
/// zero means the session no longer exists, which the caller treats as
/// success.
pub(crate) async fn update_expiry<C: ConnectionTrait>(
    conn: &C,
    schema: &SchemaConfig,
    session_id: &str,
    expires: i64,
) -> Result<u64> {
    let stmt = Query::update()
        .table(table_iden(schema))
        .value(expires_col(schema), Expr::val(expires))
        .and_where(Expr::col(id_col(schema)).eq(session_id))
        .to_owned();

    let result = conn
        .execute(conn.get_database_backend().build(&stmt))
        .await
        .map_err(query_err)?;
    Ok(result.rows_affected())
}

/// Delete a row by primary key; absence is not an error.
pub(crate) async fn delete_session<C: ConnectionTrait>(
    conn: &C,
    schema: &SchemaConfig,
    session_id: &str,
) -> Result<()> {
    let stmt = Query::delete()
        .from_table(table_iden(schema))
        .and_where(Expr::col(id_col(schema)).eq(session_id))
        .to_owned();

    conn.execute(conn.get_database_backend().build(&stmt))
        .await
        .map_err(query_err)?;
    Ok(())
}

/// Count rows that have not expired as of `now`.
pub(crate) async fn count_sessions<C: ConnectionTrait>(
    conn: &C,
    schema: &SchemaConfig,
    now: i64,
) -> Result<u64> {
    let stmt = Query::select()
        .expr_as(Expr::col(id_col(schema)).count(), Alias::new("count"))
        .from(table_iden(schema))
        .and_where(not_expired(schema, now))
        .to_owned();

    let row = conn
        .query_one(conn.get_database_backend().build(&stmt))
        .await
        .map_err(query_err)?;

    let count: i64 = match row {
        Some(row) => row.try_get("", "count").map_err(query_err)?,
        None => 0,
    };
    Ok(count.max(0) as u64)
}

/// Fetch `(session_id, payload)` for every row not expired as of `now`.
pub(crate) async fn fetch_active_sessions<C: ConnectionTrait>(
    conn: &C,
    schema: &SchemaConfig,
    now: i64,
) -> Result<Vec<(String, Option<String>)>> {
    let stmt = Query::select()
        .column(id_col(schema))
        .column(data_col(schema))
        .from(table_iden(schema))
        .and_where(not_expired(schema, now))
        .to_owned();

    let rows = conn
        .query_all(conn.get_database_backend().build(&stmt))
        .await
        .map_err(query_err)?;

    rows.into_iter()
        .map(|row| {
            let session_id: String = row
                .try_get("", schema.column_names.session_id.as_str())
                .map_err(query_err)?;
            let data: Option<String> = row
                .try_get("", schema.column_names.data.as_str())
                .map_err(query_err)?;
            Ok((session_id, data))
        })
        .collect()
}

/// Delete every row unconditionally.
pub(crate) async fn delete_all_sessions<C: ConnectionTrait>(
    conn: &C,
    schema: &SchemaConfig,
) -> Result<u64> {
    let stmt = Query::delete().from_table(table_iden(schema)).to_owned();

    let result = conn
        .execute(conn.get_database_backend().build(&stmt))
        .await
        .map_err(query_err)?;
    Ok(result.rows_affected())
}

/// Delete every row expired before `now`, returning how many were removed.
pub(crate) async fn delete_expired_sessions<C: ConnectionTrait>(
    conn: &C,
    schema: &SchemaConfig,
    now: i64,
) -> Result<u64> {
    let stmt = Query::delete()
        .from_table(table_iden(schema))
        .and_where(expired(schema, now))
        .to_owned();

    let result = conn
        .execute(conn.get_database_backend().build(&stmt))
        .await
        .map_err(query_err)?;
    Ok(result.rows_affected())
}
