use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;
use crate::db::types::SubmissionStatus;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled || PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

pub(crate) fn record_submission_transition(to: SubmissionStatus) {
    metrics::counter!("submission_transitions_total", "to" => to.as_db_str()).increment(1);
}

pub(crate) fn record_quiz_answers(answered: usize, correct: usize) {
    metrics::counter!("quiz_answers_total", "outcome" => "correct").increment(correct as u64);
    metrics::counter!("quiz_answers_total", "outcome" => "wrong")
        .increment(answered.saturating_sub(correct) as u64);
}
