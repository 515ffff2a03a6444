use lazy_static::lazy_static;
use prometheus::{register_histogram_vec, HistogramVec};

lazy_static! {
    /// Latency of provider calls by operation (chat, vision, embedding) and outcome.
    pub static ref LLM_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "llm_request_duration_seconds",
        "LLM provider request duration segmented by operation and outcome",
        &["operation", "outcome"],
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    )
    .expect("failed to register llm_request_duration_seconds");
}

pub(crate) fn observe(operation: &str, outcome: &str, elapsed_secs: f64) {
    LLM_REQUEST_DURATION_SECONDS
        .with_label_values(&[operation, outcome])
        .observe(elapsed_secs);
}
