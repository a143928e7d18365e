//! The user-supplied `(port, protocol) -> tag` classification table.

use std::{collections::HashMap, fs::File, io, path::Path};

use csv::StringRecord;

use crate::{
    Port,
    csv_file::{CsvRows, LoadError},
    internal_events::{TableHeaderSkipped, TableLoaded, TableRowSkipped},
    parse_number,
};

const TABLE: &str = "lookup_table";

/// First column name that marks the optional header row.
pub const HEADER_FIELD: &str = "dstport";

/// Tags keyed by protocol name first and destination port second, so the same
/// port can carry different tags under different protocols.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LookupTable {
    protocols: HashMap<String, HashMap<Port, String>>,
}

impl LookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the table from a CSV file of `port,protocol,tag` rows.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::from_rows(CsvRows::<File>::from_path(path)?)
    }

    pub fn from_rows<R: io::Read>(mut rows: CsvRows<R>) -> Result<Self, LoadError> {
        let mut table = Self::new();
        let mut record = StringRecord::new();
        let mut skipped = 0;

        rows.read_first_row(&mut record)?;
        // Only the first field is checked, so a headerless file whose first
        // port column is literally "dstport" loses that row as well.
        if record
            .get(0)
            .is_some_and(|field| field.eq_ignore_ascii_case(HEADER_FIELD))
        {
            emit!(TableHeaderSkipped {
                table: TABLE,
                row: rows.row(),
            });
        } else if !table.insert_record(&record, rows.row()) {
            skipped += 1;
        }

        while rows.read_row(&mut record)? {
            if !table.insert_record(&record, rows.row()) {
                skipped += 1;
            }
        }

        emit!(TableLoaded {
            table: TABLE,
            path: rows.path(),
            entries: table.len(),
            skipped,
        });

        Ok(table)
    }

    /// Adds data row number `row`. Returns `false` when the row is malformed
    /// and was ignored.
    fn insert_record(&mut self, record: &StringRecord, row: u64) -> bool {
        let reason = match (record.get(0), record.get(1), record.get(2)) {
            (Some(port), Some(protocol), Some(tag)) => match parse_number(port) {
                Some(port) => {
                    self.insert(protocol, port, tag);
                    return true;
                }
                None => "invalid_port",
            },
            _ => "too_few_fields",
        };

        emit!(TableRowSkipped {
            table: TABLE,
            row,
            reason,
        });
        false
    }

    /// Maps `(protocol, port)` to `tag`, replacing any earlier tag for the
    /// same pair. The protocol is trimmed and lowercased; the tag is trimmed
    /// but keeps its case.
    pub fn insert(&mut self, protocol: &str, port: Port, tag: &str) -> Option<String> {
        self.protocols
            .entry(protocol.trim().to_lowercase())
            .or_default()
            .insert(port, tag.trim().to_owned())
    }

    /// Looks up the tag for a lowercase protocol name and destination port.
    pub fn get(&self, protocol: &str, port: Port) -> Option<&str> {
        self.protocols
            .get(protocol)
            .and_then(|ports| ports.get(&port))
            .map(String::as_str)
    }

    /// Number of `(protocol, port)` entries.
    pub fn len(&self) -> usize {
        self.protocols.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
