//! Counters for token refreshes and API requests
//!
//! - `keeper_token_refresh_total` (counter): labels `trigger`, `outcome`
//! - `keeper_api_requests_total` (counter): labels `method`, `status`
//!
//! Calls are no-ops until the embedding application installs a recorder.

/// What caused a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    /// Local expiry check before sending
    Proactive,
    /// Server answered 401
    Reactive,
    /// Caller asked explicitly
    Manual,
    /// `RefreshScheduler` timer fired
    Scheduled,
}

impl RefreshTrigger {
    pub fn label(self) -> &'static str {
        match self {
            RefreshTrigger::Proactive => "proactive",
            RefreshTrigger::Reactive => "reactive",
            RefreshTrigger::Manual => "manual",
            RefreshTrigger::Scheduled => "scheduled",
        }
    }
}

pub fn record_refresh(trigger: RefreshTrigger, success: bool) {
    let outcome = if success { "success" } else { "error" };
    metrics::counter!("keeper_token_refresh_total", "trigger" => trigger.label(), "outcome" => outcome)
        .increment(1);
}

/// `status` is the HTTP status, or "transport" when no response came back.
pub fn record_request(method: &str, status: &str) {
    metrics::counter!("keeper_api_requests_total", "method" => method.to_string(), "status" => status.to_string())
        .increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

    fn isolated_recorder() -> (PrometheusRecorder, PrometheusHandle) {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        (recorder, handle)
    }

    #[test]
    fn record_functions_do_not_panic_without_recorder() {
        record_refresh(RefreshTrigger::Proactive, true);
        record_request("GET", "200");
    }

    #[test]
    fn refresh_counter_carries_trigger_and_outcome() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_refresh(RefreshTrigger::Reactive, true);
        record_refresh(RefreshTrigger::Scheduled, false);

        let output = handle.render();
        assert!(output.contains("keeper_token_refresh_total"));
        assert!(output.contains("trigger=\"reactive\""));
        assert!(output.contains("trigger=\"scheduled\""));
        assert!(output.contains("outcome=\"error\""));
    }

    #[test]
    fn request_counter_carries_method_and_status() {
        let (recorder, handle) = isolated_recorder();
        let _guard = metrics::set_default_local_recorder(&recorder);

        record_request("DELETE", "404");
        record_request("GET", "transport");

        let output = handle.render();
        assert!(output.contains("keeper_api_requests_total"));
        assert!(output.contains("method=\"DELETE\""));
        assert!(output.contains("status=\"404\""));
        assert!(output.contains("status=\"transport\""));
    }
}
