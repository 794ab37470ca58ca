//! Flatten nested JSON records into a [`Frame`].

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::info;

use usersplit_core::{FieldValue, Frame};

use crate::error::IngestError;
use crate::source::UserSource;

/// Separator between nested key segments (`dob.age`).
pub const KEY_SEPARATOR: char = '.';

/// Flatten every record into one row.
///
/// - nested objects become dotted columns (`registered.date`)
/// - columns are ordered by first appearance across all records
/// - a key absent from a record is `Null` in that row
/// - arrays are kept as their JSON text
/// - cells are narrowed to their column's kind across all records
///
/// Fails if a record is not a JSON object.
pub fn normalize_records(records: &[Value]) -> Result<Frame, IngestError> {
    let mut columns: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut sparse_rows: Vec<Vec<(usize, FieldValue)>> = Vec::with_capacity(records.len());

    for (i, record) in records.iter().enumerate() {
        let obj = record
            .as_object()
            .ok_or_else(|| IngestError::Shape(format!("record {} is not a JSON object", i)))?;

        let mut flat = Vec::new();
        flatten_object(None, obj, &mut flat);

        let cells = flat
            .into_iter()
            .map(|(key, value)| {
                let pos = *positions.entry(key.clone()).or_insert_with(|| {
                    columns.push(key);
                    columns.len() - 1
                });
                (pos, value)
            })
            .collect();
        sparse_rows.push(cells);
    }

    let width = columns.len();
    let rows = sparse_rows
        .into_iter()
        .map(|cells| {
            let mut row = vec![FieldValue::Null; width];
            for (pos, value) in cells {
                row[pos] = value;
            }
            row
        })
        .collect();

    let mut frame = Frame::new(columns, rows)?;
    frame.unify_kinds();
    Ok(frame)
}

fn flatten_object(prefix: Option<&str>, obj: &Map<String, Value>, out: &mut Vec<(String, FieldValue)>) {
    for (key, value) in obj {
        let name = match prefix {
            Some(p) => format!("{}{}{}", p, KEY_SEPARATOR, key),
            None => key.clone(),
        };
        match value {
            Value::Object(inner) => flatten_object(Some(&name), inner, out),
            other => out.push((name, FieldValue::from_json(other))),
        }
    }
}

/// Fetch from `source` and flatten into a frame.
pub async fn get_users_frame(source: &dyn UserSource) -> Result<Frame, IngestError> {
    let records = source.fetch_records().await?;
    let frame = normalize_records(&records)?;
    info!(
        rows = frame.row_count(),
        columns = frame.column_count(),
        "Users normalized"
    );
    Ok(frame)
}
