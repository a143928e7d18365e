#![deny(unused_allocation)]
#![deny(unused_assignments)]
#![deny(unused_comparisons)]

//! Tag network flow-log records by destination port and protocol.
//!
//! The pipeline is strictly linear: load the [`LookupTable`], load the
//! [`ProtocolMap`], scan the flow log through an [`Aggregator`], and write
//! the report.

#[macro_use]
extern crate tracing;

#[macro_use]
pub mod internal_events;

pub mod aggregate;
pub mod app;
pub mod cli;
pub mod csv_file;
pub mod flow_log;
pub mod lookup_table;
pub mod protocol_map;
pub mod report;
pub mod trace;

pub use aggregate::{Aggregator, Counts, UNTAGGED};
pub use flow_log::FlowRecord;
pub use lookup_table::LookupTable;
pub use protocol_map::ProtocolMap;

/// A destination port as it appears in flow logs and lookup tables. Any
/// integer that fits is accepted, including negative and out-of-range values.
pub type Port = i64;

/// An IANA-style protocol number as it appears in flow logs.
pub type ProtocolNumber = i64;

/// Parses a decimal integer field, ignoring surrounding whitespace.
pub(crate) fn parse_number<T: std::str::FromStr>(field: &str) -> Option<T> {
    field.trim().parse().ok()
}

pub fn get_version() -> String {
    let pkg_version = env!("CARGO_PKG_VERSION");
    let target = std::env::consts::ARCH;
    format!("{pkg_version} ({target} {})", std::env::consts::OS)
}
