//! Idempotent DDL for the session table.

use sea_orm::sea_query::{Alias, ColumnDef, Expr, Query, Table};
use sea_orm::{ConnectionTrait, DatabaseBackend};
use tracing::{debug, info};

use crate::config::SchemaConfig;
use crate::error::{Result, SessionStoreError};

pub(crate) fn table_iden(schema: &SchemaConfig) -> Alias {
    Alias::new(schema.table_name.as_str())
}

pub(crate) fn id_col(schema: &SchemaConfig) -> Alias {
    Alias::new(schema.column_names.session_id.as_str())
}

pub(crate) fn expires_col(schema: &SchemaConfig) -> Alias {
    Alias::new(schema.column_names.expires.as_str())
}

pub(crate) fn data_col(schema: &SchemaConfig) -> Alias {
    Alias::new(schema.column_names.data.as_str())
}

/// Create the session table if it does not already exist.
///
/// Layout: `(session_id VARCHAR(128) PRIMARY KEY, expires BIGINT NOT NULL,
/// data TEXT)`, with `MEDIUMTEXT` on MySQL so payloads past 64 KiB survive.
/// Concurrent store instances may race to create the same table; a DDL
/// failure is therefore followed by an existence probe and treated as success
/// when the table turned out to be there. Any other failure surfaces as
/// [`SessionStoreError::Schema`].
pub(crate) async fn ensure_session_table<C: ConnectionTrait>(
    conn: &C,
    schema: &SchemaConfig,
) -> Result<()> {
    debug!(table = %schema.table_name, "ensuring session table exists");

    let mut data_def = ColumnDef::new(data_col(schema));
    if conn.get_database_backend() == DatabaseBackend::MySql {
        data_def.custom(Alias::new("MEDIUMTEXT"));
    } else {
        data_def.text();
    }

    let stmt = Table::create()
        .table(table_iden(schema))
        .if_not_exists()
        .col(
            ColumnDef::new(id_col(schema))
                .string_len(128)
                .not_null()
                .primary_key(),
        )
        .col(ColumnDef::new(expires_col(schema)).big_integer().not_null())
        .col(&mut data_def)
        .to_owned();

    match conn.execute(conn.get_database_backend().build(&stmt)).await {
        Ok(_) => {
            info!(table = %schema.table_name, "session table ready");
            Ok(())
        }
        Err(ddl_err) => {
            if table_exists(conn, schema).await {
                debug!(
                    table = %schema.table_name,
                    "session table created concurrently, continuing"
                );
                Ok(())
            } else {
                Err(SessionStoreError::Schema(ddl_err.to_string()))
            }
        }
    }
}

async fn table_exists<C: ConnectionTrait>(conn: &C, schema: &SchemaConfig) -> bool {
    let probe = Query::select()
        .column(id_col(schema))
        .from(table_iden(schema))
        .limit(1)
        .to_owned();
    conn.query_one(conn.get_database_backend().build(&probe))
        .await
        .is_ok()
}

/// Expression selecting rows that have not expired as of `now`.
pub(crate) fn not_expired(schema: &SchemaConfig, now: i64) -> sea_orm::sea_query::SimpleExpr {
    Expr::col(expires_col(schema)).gte(now)
}

/// Expression selecting rows that expired before `now`.
pub(crate) fn expired(schema: &SchemaConfig, now: i64) -> sea_orm::sea_query::SimpleExpr {
    Expr::col(expires_col(schema)).lt(now)
}
