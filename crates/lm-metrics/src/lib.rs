use std::sync::OnceLock;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::{info, warn};

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder once per process.
///
/// Nothing listens on its own port; the API renders the handle on
/// `GET /metrics`. Returns `None` when another recorder was installed first.
pub fn init_metrics() -> Option<&'static PrometheusHandle> {
    if let Some(existing) = PROMETHEUS_HANDLE.get() {
        return Some(existing);
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = PROMETHEUS_HANDLE.set(handle);
            info!("installed prometheus recorder");
            PROMETHEUS_HANDLE.get()
        }
        Err(err) => {
            warn!(error = %err, "failed to install prometheus recorder");
            PROMETHEUS_HANDLE.get()
        }
    }
}

/// Text exposition of every recorded metric, if the recorder is installed.
pub fn render() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(PrometheusHandle::render)
}

/// One finished search: `lm_search_total{kind,path}` and the result count.
pub fn record_search(kind: &str, path: &str, results: usize) {
    counter!(
        "lm_search_total",
        "kind" => kind.to_owned(),
        "path" => path.to_owned()
    )
    .increment(1);
    histogram!("lm_search_results", "kind" => kind.to_owned()).record(results as f64);
}

/// Workers picked for a new-job notification.
pub fn record_notification_targets(targets: usize) {
    counter!("lm_notification_requests_total").increment(1);
    histogram!("lm_notification_targets").record(targets as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_without_recorder_is_a_noop() {
        record_search("worker", "fallback", 3);
        record_notification_targets(0);
    }

    #[test]
    fn init_is_idempotent() {
        let first = init_metrics().map(|h| h as *const PrometheusHandle);
        let second = init_metrics().map(|h| h as *const PrometheusHandle);
        assert_eq!(first, second);

        record_search("job", "semantic", 2);
        let rendered = render().unwrap_or_default();
        if first.is_some() {
            assert!(rendered.contains("lm_search_total"));
        }
    }
}
