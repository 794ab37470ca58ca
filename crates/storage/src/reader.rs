use sqlx::any::AnyRow;
use sqlx::{Column, Executor, Row, Statement};
use tracing::{debug, info};

use usersplit_core::{FieldValue, Frame};

use crate::connector::Database;
use crate::error::StorageError;
use crate::schema::{select_all_sql, top_n_sql};

/// Run `sql` on a fresh connection and collect the result as a [`Frame`].
///
/// Column names come from the result set, or from the prepared statement when
/// the result is empty.
pub async fn query_frame(db: &Database, sql: &str) -> Result<Frame, StorageError> {
    let mut conn = db.connect().await?;
    let rows: Vec<AnyRow> = sqlx::query(sql).fetch_all(&mut conn).await?;

    let columns: Vec<String> = match rows.first() {
        Some(row) => row.columns().iter().map(|c| c.name().to_string()).collect(),
        None => {
            let stmt = (&mut conn).prepare(sql).await?;
            stmt.columns().iter().map(|c| c.name().to_string()).collect()
        }
    };

    let mut cells = Vec::with_capacity(rows.len());
    for row in &rows {
        cells.push(
            (0..columns.len())
                .map(|i| decode_cell(row, i, &columns[i]))
                .collect::<Result<Vec<_>, _>>()?,
        );
    }

    debug!(sql = %sql, rows = cells.len(), "Query returned");
    Ok(Frame::new(columns, cells)?)
}

/// `SELECT *` of one table.
pub async fn read_table(db: &Database, table: &str) -> Result<Frame, StorageError> {
    let frame = query_frame(db, &select_all_sql(table)).await?;
    info!(table = %table, rows = frame.row_count(), "Table read");
    Ok(frame)
}

/// Most recent `n` rows of each table by `order_column`, combined with
/// UNION ALL. Each table's rows stay in descending order, tables in the order
/// given.
pub async fn top_n_union(
    db: &Database,
    tables: &[&str],
    order_column: &str,
    n: usize,
) -> Result<Frame, StorageError> {
    let mut parts = Vec::with_capacity(tables.len());
    for table in tables {
        parts.push(query_frame(db, &top_n_sql(table, order_column, n)).await?);
    }
    Ok(Frame::concat(&parts.iter().collect::<Vec<_>>()))
}

/// Decode one cell, trying integer, float, boolean, text and finally raw
/// bytes read as UTF-8. Drivers report some text columns as blobs.
fn decode_cell(row: &AnyRow, idx: usize, column: &str) -> Result<FieldValue, StorageError> {
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return Ok(v.map(FieldValue::Integer).unwrap_or(FieldValue::Null));
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return Ok(v.map(FieldValue::Float).unwrap_or(FieldValue::Null));
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
        return Ok(v.map(FieldValue::Boolean).unwrap_or(FieldValue::Null));
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return Ok(v.map(FieldValue::Text).unwrap_or(FieldValue::Null));
    }
    match row.try_get::<Option<Vec<u8>>, _>(idx) {
        Ok(v) => Ok(v
            .map(|bytes| FieldValue::Text(String::from_utf8_lossy(&bytes).into_owned()))
            .unwrap_or(FieldValue::Null)),
        Err(e) => Err(StorageError::Decode {
            column: column.to_string(),
            reason: e.to_string(),
        }),
    }
}
