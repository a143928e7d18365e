use std::path::Path;

use metrics::counter;

use super::InternalEvent;
use crate::flow_log::SkipReason;

#[derive(Debug)]
pub struct FlowLogLineSkipped {
    pub line: u64,
    pub reason: SkipReason,
}

impl InternalEvent for FlowLogLineSkipped {
    fn emit(self) {
        // Blank lines and comments are expected noise.
        if self.reason.is_malformed() {
            debug!(
                message = "Skipping malformed flow log line.",
                line = self.line,
                reason = %self.reason,
            );
        } else {
            trace!(
                message = "Skipping flow log line.",
                line = self.line,
                reason = %self.reason,
            );
        }
        counter!(
            "flow_log_lines_skipped_total",
            "reason" => self.reason.as_str(),
        )
        .increment(1);
    }
}

#[derive(Debug)]
pub struct FlowLogProcessed<'a> {
    pub path: &'a Path,
    pub records: u64,
    pub skipped: u64,
}

impl InternalEvent for FlowLogProcessed<'_> {
    fn emit(self) {
        info!(
            message = "Flow log processed.",
            path = %self.path.display(),
            records = self.records,
            skipped = self.skipped,
        );
        counter!("flow_log_records_processed_total").increment(self.records);
    }
}
