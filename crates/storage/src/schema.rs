//! SQL text builders shared by the writer and the reader.
//!
//! Statements use back-tick identifiers and `?` placeholders, which MySQL and
//! SQLite both accept.

use usersplit_core::ColumnKind;

/// Upper bound on bind parameters per statement (SQLite allows 32766,
/// MySQL 65535).
pub const MAX_BIND_PARAMS: usize = 10_000;

pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

pub fn drop_table_sql(table: &str) -> String {
    format!("DROP TABLE IF EXISTS {}", quote_ident(table))
}

pub fn create_table_sql(table: &str, columns: &[String], kinds: &[ColumnKind]) -> String {
    let defs: Vec<String> = columns
        .iter()
        .zip(kinds)
        .map(|(col, kind)| format!("{} {}", quote_ident(col), kind.sql_type()))
        .collect();
    format!("CREATE TABLE {} ({})", quote_ident(table), defs.join(", "))
}

/// Multi-row insert with one `?` per cell.
pub fn insert_sql(table: &str, columns: &[String], row_count: usize) -> String {
    let cols: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
    let tuple = format!("({})", vec!["?"; columns.len()].join(", "));
    let values = vec![tuple.as_str(); row_count].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES {}",
        quote_ident(table),
        cols.join(", "),
        values
    )
}

/// Rows per insert statement so that cells stay under [`MAX_BIND_PARAMS`].
pub fn rows_per_batch(column_count: usize) -> usize {
    (MAX_BIND_PARAMS / column_count.max(1)).max(1)
}

pub fn select_all_sql(table: &str) -> String {
    format!("SELECT * FROM {}", quote_ident(table))
}

/// Top `n` rows of `table` by `order_column`, most recent first.
pub fn top_n_sql(table: &str, order_column: &str, n: usize) -> String {
    format!(
        "SELECT * FROM {} ORDER BY {} DESC LIMIT {}",
        quote_ident(table),
        quote_ident(order_column),
        n
    )
}
