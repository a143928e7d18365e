use std::path::Path;

use metrics::counter;

use super::InternalEvent;

#[derive(Debug)]
pub struct ReportWritten<'a> {
    pub path: &'a Path,
    pub tags: usize,
    pub combinations: usize,
}

impl InternalEvent for ReportWritten<'_> {
    fn emit(self) {
        info!(
            message = "Report written.",
            path = %self.path.display(),
            tags = self.tags,
            combinations = self.combinations,
        );
        counter!("reports_written_total").increment(1);
    }
}
