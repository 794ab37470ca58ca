//! Derived datasets built by reading the stored tables back.
//!
//! Every step here reads from the database after the writes it depends on
//! have committed; nothing is taken from in-memory frames of earlier stages.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use usersplit_core::{CoreError, Frame};
use usersplit_storage::{read_table, replace_table, top_n_union, Database};

use crate::error::PipelineError;
use crate::export::write_records_json;
use crate::tables::{TableNames, TableReport};

pub const REGISTERED_COLUMN: &str = "registered.date";

/// One exported file and where its rows came from.
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub path: PathBuf,
    pub sources: Vec<TableReport>,
    pub rows: usize,
}

/// Most recent `n` registrations of each gender table, written as the top
/// table. At most `2 * n` rows.
pub async fn build_top_table(
    db: &Database,
    names: &TableNames,
    n: usize,
) -> Result<TableReport, PipelineError> {
    let female = names.female();
    let male = names.male();
    let top = top_n_union(db, &[female.as_str(), male.as_str()], REGISTERED_COLUMN, n).await?;

    debug!("Most recent registrations:\n{}", top);

    let table = names.top();
    let rows = replace_table(db, &table, &top).await?;
    info!(table = %table, rows, per_gender = n, "Top table built");
    Ok(TableReport { table, rows })
}

/// Concatenate, drop exact duplicates, then number rows afresh.
pub fn union_distinct(left: &Frame, right: &Frame) -> Result<Frame, CoreError> {
    Frame::concat(&[left, right]).drop_duplicates().reset_index()
}

/// Concatenate keeping every row, then number rows afresh.
pub fn union_all(left: &Frame, right: &Frame) -> Result<Frame, CoreError> {
    Frame::concat(&[left, right]).reset_index()
}

pub async fn export_union_distinct(
    db: &Database,
    left_table: &str,
    right_table: &str,
    path: &Path,
) -> Result<ExportReport, PipelineError> {
    export_combined(db, left_table, right_table, path, union_distinct).await
}

pub async fn export_union_all(
    db: &Database,
    left_table: &str,
    right_table: &str,
    path: &Path,
) -> Result<ExportReport, PipelineError> {
    export_combined(db, left_table, right_table, path, union_all).await
}

async fn export_combined(
    db: &Database,
    left_table: &str,
    right_table: &str,
    path: &Path,
    combine: fn(&Frame, &Frame) -> Result<Frame, CoreError>,
) -> Result<ExportReport, PipelineError> {
    let left = read_table(db, left_table).await?;
    let right = read_table(db, right_table).await?;

    let combined = combine(&left, &right)?;
    write_records_json(&combined, path).await?;

    Ok(ExportReport {
        path: path.to_path_buf(),
        sources: vec![
            TableReport {
                table: left_table.to_string(),
                rows: left.row_count(),
            },
            TableReport {
                table: right_table.to_string(),
                rows: right.row_count(),
            },
        ],
        rows: combined.row_count(),
    })
}
