//! Split the users frame into disjoint subsets and write each as a table.

use tracing::{info, warn};

use usersplit_core::{CoreError, FieldValue, Frame};
use usersplit_storage::{replace_table, Database};

use crate::error::PipelineError;
use crate::tables::{TableNames, TableReport, DECADE_TABLES};

pub const GENDER_COLUMN: &str = "gender";
pub const AGE_COLUMN: &str = "dob.age";

const DECADE_WIDTH: i64 = 10;

/// Group rows into `bucket_count` frames by the bucket `key_fn` assigns.
///
/// Row order and labels are preserved within each bucket. Rows mapped to
/// `None` or to a bucket past the end belong to no frame.
pub fn partition_by<F>(frame: &Frame, bucket_count: usize, key_fn: F) -> Vec<Frame>
where
    F: Fn(&[FieldValue]) -> Option<usize>,
{
    let mut positions: Vec<Vec<usize>> = vec![Vec::new(); bucket_count];
    for (pos, row) in frame.rows().iter().enumerate() {
        if let Some(bucket) = key_fn(row).and_then(|b| positions.get_mut(b)) {
            bucket.push(pos);
        }
    }
    positions.iter().map(|p| frame.select_rows(p)).collect()
}

#[derive(Debug, Clone)]
pub struct GenderSplit {
    pub female: Frame,
    pub male: Frame,
}

/// Rows whose gender is exactly `"female"` or `"male"`. Anything else,
/// null included, lands in neither.
pub fn split_by_gender(frame: &Frame) -> Result<GenderSplit, CoreError> {
    let idx = frame
        .column_index(GENDER_COLUMN)
        .ok_or_else(|| CoreError::ColumnNotFound(GENDER_COLUMN.to_string()))?;

    let mut parts = partition_by(frame, 2, |row| match row[idx].as_str() {
        Some("female") => Some(0),
        Some("male") => Some(1),
        _ => None,
    });
    let male = parts.pop().unwrap_or_else(|| Frame::empty(frame.columns().to_vec()));
    let female = parts.pop().unwrap_or_else(|| Frame::empty(frame.columns().to_vec()));

    let excluded = frame.row_count() - female.row_count() - male.row_count();
    if excluded > 0 {
        warn!(excluded, "Rows with another gender value skipped");
    }
    Ok(GenderSplit { female, male })
}

/// Zero-based decade of `age`, or `None` outside `[0, 100)`.
pub fn decade_of(age: i64) -> Option<usize> {
    if (0..DECADE_WIDTH * DECADE_TABLES as i64).contains(&age) {
        Some((age / DECADE_WIDTH) as usize)
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct DecadeSplit {
    /// Ten frames, ages 0–9 first.
    pub decades: Vec<Frame>,
    /// Rows whose age fell outside every decade.
    pub out_of_range: usize,
}

/// Cast the age column to integers and bucket rows by decade.
pub fn split_by_decade(frame: &Frame) -> Result<DecadeSplit, CoreError> {
    let mut aged = frame.clone();
    aged.cast_integer(AGE_COLUMN)?;
    let idx = aged
        .column_index(AGE_COLUMN)
        .ok_or_else(|| CoreError::ColumnNotFound(AGE_COLUMN.to_string()))?;

    let decades = partition_by(&aged, DECADE_TABLES, |row| match &row[idx] {
        FieldValue::Integer(age) => decade_of(*age),
        _ => None,
    });

    let kept: usize = decades.iter().map(Frame::row_count).sum();
    let out_of_range = aged.row_count() - kept;
    if out_of_range > 0 {
        warn!(out_of_range, "Rows with age outside [0, 100) skipped");
    }
    Ok(DecadeSplit {
        decades,
        out_of_range,
    })
}

pub async fn create_and_load_gender_tables(
    db: &Database,
    names: &TableNames,
    frame: &Frame,
) -> Result<Vec<TableReport>, PipelineError> {
    let split = split_by_gender(frame)?;

    let mut reports = Vec::with_capacity(2);
    for (table, part) in [(names.female(), &split.female), (names.male(), &split.male)] {
        let rows = replace_table(db, &table, part).await?;
        reports.push(TableReport { table, rows });
    }

    info!(
        female = split.female.row_count(),
        male = split.male.row_count(),
        "Gender tables loaded"
    );
    Ok(reports)
}

pub async fn create_and_load_decade_tables(
    db: &Database,
    names: &TableNames,
    frame: &Frame,
) -> Result<Vec<TableReport>, PipelineError> {
    let split = split_by_decade(frame)?;

    let mut reports = Vec::with_capacity(DECADE_TABLES);
    for (i, part) in split.decades.iter().enumerate() {
        let table = names.decade(i + 1);
        let rows = replace_table(db, &table, part).await?;
        reports.push(TableReport { table, rows });
    }

    info!(
        tables = reports.len(),
        skipped = split.out_of_range,
        "Decade tables loaded"
    );
    Ok(reports)
}
