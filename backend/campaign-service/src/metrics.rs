//! Prometheus metrics for campaign-service.
//!
//! Exposes retrieval and enrichment collectors and the `/metrics` handler.
//! Pool gauges come from `db-pool`, provider latency from `llm-client`.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram, register_int_counter_vec, Encoder, Histogram, IntCounterVec, TextEncoder,
};

lazy_static! {
    /// Retrieval requests by the mode that produced the context (vector, keyword, none).
    pub static ref RETRIEVAL_TOTAL: IntCounterVec = register_int_counter_vec!(
        "wiki_retrieval_total",
        "Wiki retrievals segmented by retrieval mode",
        &["mode"]
    )
    .expect("failed to register wiki_retrieval_total");

    /// Embedding generation attempts for wiki documents (success/error).
    pub static ref EMBEDDING_TOTAL: IntCounterVec = register_int_counter_vec!(
        "wiki_embedding_total",
        "Wiki document embedding attempts segmented by outcome",
        &["result"]
    )
    .expect("failed to register wiki_embedding_total");

    /// Number of areas stored per map analysis.
    pub static ref MAP_ANALYSIS_AREAS: Histogram = register_histogram!(
        "map_analysis_areas",
        "Areas extracted per map analysis",
        vec![0.0, 1.0, 5.0, 10.0, 20.0, 50.0, 100.0]
    )
    .expect("failed to register map_analysis_areas");
}

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
