//! Structured diagnostics emitted while the pipeline runs.
//!
//! Every event writes a `tracing` record and bumps the matching `metrics`
//! counter. Without an installed recorder the counters are no-ops.

pub trait InternalEvent: Sized {
    fn emit(self);
}

pub fn emit(event: impl InternalEvent) {
    event.emit();
}

#[macro_export]
macro_rules! emit {
    ($event:expr) => {
        $crate::internal_events::emit($event)
    };
}

pub mod error_type {
    pub const READER_FAILED: &str = "reader_failed";
    pub const WRITER_FAILED: &str = "writer_failed";
    pub const PARSER_FAILED: &str = "parser_failed";
}

pub mod error_stage {
    pub const LOOKUP_TABLE: &str = "lookup_table";
    pub const PROTOCOL_NUMBERS: &str = "protocol_numbers";
    pub const FLOW_LOG: &str = "flow_log";
    pub const REPORT: &str = "report";
}

// Modules that require emit! macro so they need to be defined after the macro.
mod app;
mod flow_log;
mod report;
mod table;

pub use self::app::*;
pub use self::flow_log::*;
pub use self::report::*;
pub use self::table::*;
