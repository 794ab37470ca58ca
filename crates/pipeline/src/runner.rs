use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use usersplit_core::Config;
use usersplit_ingest::{get_users_frame, RandomUserClient, UserSource};
use usersplit_storage::Database;

use crate::error::PipelineError;
use crate::partition::{create_and_load_decade_tables, create_and_load_gender_tables};
use crate::reconcile::{build_top_table, export_union_all, export_union_distinct, ExportReport};
use crate::tables::{TableNames, TableReport};

pub const FIRST_EXPORT_FILE: &str = "first.json";
pub const SECOND_EXPORT_FILE: &str = "second.json";

/// Decade table combined with the top table in `first.json` (ages 40–49).
pub const FIRST_EXPORT_DECADE: usize = 5;
/// Decade table combined with the top table in `second.json` (ages 10–19).
pub const SECOND_EXPORT_DECADE: usize = 2;

/// Summary of one complete run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub fetched: usize,
    pub columns: usize,
    pub gender_tables: Vec<TableReport>,
    pub decade_tables: Vec<TableReport>,
    pub top_table: TableReport,
    pub first_export: ExportReport,
    pub second_export: ExportReport,
}

/// The whole run in its fixed order: fetch, gender tables, decade tables,
/// top table, first export, second export.
pub struct Pipeline {
    config: Config,
    db: Database,
    names: TableNames,
    source: Box<dyn UserSource>,
}

impl Pipeline {
    pub fn new(config: Config, source: Box<dyn UserSource>) -> Result<Self, PipelineError> {
        let db = Database::from_settings(&config.database)?;
        let names = TableNames::new(config.output.table_prefix.clone());
        Ok(Self {
            config,
            db,
            names,
            source,
        })
    }

    /// Pipeline reading from the randomuser.me API described by `config.source`.
    pub fn with_api(config: Config) -> Result<Self, PipelineError> {
        let client = RandomUserClient::new(&config.source)?;
        Self::new(config, Box::new(client))
    }

    pub fn table_names(&self) -> &TableNames {
        &self.names
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let started_at = Utc::now();
        let start = Instant::now();
        info!(database = %self.db.redacted_url(), prefix = %self.names.prefix(), "Run started");

        let users = get_users_frame(self.source.as_ref()).await?;

        let gender_tables = create_and_load_gender_tables(&self.db, &self.names, &users).await?;
        let decade_tables = create_and_load_decade_tables(&self.db, &self.names, &users).await?;
        let top_table = build_top_table(&self.db, &self.names, self.config.output.top_n).await?;

        let output_dir = &self.config.output.output_dir;
        let first_export = export_union_distinct(
            &self.db,
            &top_table.table,
            &self.names.decade(FIRST_EXPORT_DECADE),
            &output_dir.join(FIRST_EXPORT_FILE),
        )
        .await?;
        let second_export = export_union_all(
            &self.db,
            &top_table.table,
            &self.names.decade(SECOND_EXPORT_DECADE),
            &output_dir.join(SECOND_EXPORT_FILE),
        )
        .await?;

        let report = RunReport {
            started_at,
            elapsed_ms: start.elapsed().as_millis() as u64,
            fetched: users.row_count(),
            columns: users.column_count(),
            gender_tables,
            decade_tables,
            top_table,
            first_export,
            second_export,
        };
        info!(
            fetched = report.fetched,
            first_rows = report.first_export.rows,
            second_rows = report.second_export.rows,
            elapsed_ms = report.elapsed_ms,
            "Run complete"
        );
        Ok(report)
    }
}
