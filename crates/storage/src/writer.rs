use sqlx::any::{Any, AnyArguments};
use sqlx::query::Query;
use sqlx::Connection;
use tracing::{debug, info};

use usersplit_core::{FieldValue, Frame};

use crate::connector::Database;
use crate::error::StorageError;
use crate::schema::{create_table_sql, drop_table_sql, insert_sql, rows_per_batch};

/// Replace `table` with the contents of `frame`.
///
/// Drops the table if it exists, recreates it from the frame's inferred
/// column kinds and inserts every row. Row labels are not stored. The inserts
/// run in one transaction; nothing spans more than this one table.
///
/// Returns the number of rows written.
pub async fn replace_table(db: &Database, table: &str, frame: &Frame) -> Result<usize, StorageError> {
    if frame.column_count() == 0 {
        return Err(StorageError::EmptySchema(table.to_string()));
    }

    let kinds = frame.column_kinds();
    let mut conn = db.connect().await?;

    sqlx::query(&drop_table_sql(table)).execute(&mut conn).await?;
    sqlx::query(&create_table_sql(table, frame.columns(), &kinds))
        .execute(&mut conn)
        .await?;

    let mut tx = conn.begin().await?;
    for chunk in frame.rows().chunks(rows_per_batch(frame.column_count())) {
        let sql = insert_sql(table, frame.columns(), chunk.len());
        let mut query = sqlx::query(&sql);
        for row in chunk {
            for (cell, kind) in row.iter().zip(&kinds) {
                query = bind_value(query, cell.coerce(*kind));
            }
        }
        query.execute(&mut *tx).await?;
        debug!(table = %table, rows = chunk.len(), "Inserted batch");
    }
    tx.commit().await?;

    info!(table = %table, rows = frame.row_count(), "Table replaced");
    Ok(frame.row_count())
}

fn bind_value<'q>(
    query: Query<'q, Any, AnyArguments<'q>>,
    value: FieldValue,
) -> Query<'q, Any, AnyArguments<'q>> {
    match value {
        FieldValue::Text(s) => query.bind(s),
        FieldValue::Integer(i) => query.bind(i),
        FieldValue::Float(f) => query.bind(f),
        FieldValue::Boolean(b) => query.bind(b),
        FieldValue::Null => query.bind(Option::<String>::None),
    }
}
