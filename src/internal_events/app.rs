use metrics::counter;

use super::InternalEvent;

#[derive(Debug)]
pub struct StageFailed<'a> {
    pub stage: &'static str,
    pub error_type: &'static str,
    pub error: &'a crate::app::Error,
}

impl InternalEvent for StageFailed<'_> {
    fn emit(self) {
        // Reported to the user by the caller.
        debug!(
            message = "Pipeline stage failed.",
            error = %self.error,
            error_type = self.error_type,
            stage = self.stage,
        );
        counter!(
            "component_errors_total",
            "error_type" => self.error_type,
            "stage" => self.stage,
        )
        .increment(1);
    }
}
