use serde::Serialize;

/// Number of age-decade tables (`_1` … `_10`).
pub const DECADE_TABLES: usize = 10;

/// Suffix of the table holding the most recent registrations per gender.
pub const TOP_TABLE_SUFFIX: &str = "20";

/// Names of every table a run writes, all sharing one prefix.
#[derive(Debug, Clone)]
pub struct TableNames {
    prefix: String,
}

impl TableNames {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn female(&self) -> String {
        format!("{}_female", self.prefix)
    }

    pub fn male(&self) -> String {
        format!("{}_male", self.prefix)
    }

    /// Table of decade `number`, counted from 1: `_1` holds ages 0–9,
    /// `_10` ages 90–99.
    pub fn decade(&self, number: usize) -> String {
        format!("{}_{}", self.prefix, number)
    }

    pub fn top(&self) -> String {
        format!("{}_{}", self.prefix, TOP_TABLE_SUFFIX)
    }
}

/// Rows written to one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub table: String,
    pub rows: usize,
}
