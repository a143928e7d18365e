use std::path::Path;

use metrics::counter;

use super::{InternalEvent, error_type};

#[derive(Debug)]
pub struct TableLoaded<'a> {
    pub table: &'static str,
    pub path: &'a Path,
    pub entries: usize,
    pub skipped: usize,
}

impl InternalEvent for TableLoaded<'_> {
    fn emit(self) {
        info!(
            message = "Table loaded.",
            table = self.table,
            path = %self.path.display(),
            entries = self.entries,
            skipped = self.skipped,
        );
        counter!("table_entries_loaded_total", "table" => self.table)
            .increment(self.entries as u64);
    }
}

#[derive(Debug)]
pub struct TableHeaderSkipped {
    pub table: &'static str,
    pub row: u64,
}

impl InternalEvent for TableHeaderSkipped {
    fn emit(self) {
        debug!(
            message = "Skipping header row.",
            table = self.table,
            row = self.row,
        );
    }
}

#[derive(Debug)]
pub struct TableRowSkipped {
    pub table: &'static str,
    pub row: u64,
    pub reason: &'static str,
}

impl InternalEvent for TableRowSkipped {
    fn emit(self) {
        debug!(
            message = "Skipping malformed row.",
            table = self.table,
            row = self.row,
            reason = self.reason,
            error_type = error_type::PARSER_FAILED,
        );
        counter!(
            "table_rows_skipped_total",
            "table" => self.table,
            "reason" => self.reason,
        )
        .increment(1);
    }
}
