use std::time::Duration;

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, TextEncoder,
};

static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "library_service_http_requests_total",
            "Total HTTP requests handled by library-service",
        ),
        &["method", "status"],
    )
    .expect("failed to create library_service_http_requests_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register library_service_http_requests_total");
    counter
});

static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    let histogram = HistogramVec::new(
        HistogramOpts::new(
            "library_service_http_request_duration_seconds",
            "Time to first response byte for library-service",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
        ]),
        &["method", "status"],
    )
    .expect("failed to create library_service_http_request_duration_seconds");
    prometheus::default_registry()
        .register(Box::new(histogram.clone()))
        .expect("failed to register library_service_http_request_duration_seconds");
    histogram
});

static STREAM_RESPONSES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new(
            "library_service_stream_responses_total",
            "Stream responses by status (200, 206, 416)",
        ),
        &["status"],
    )
    .expect("failed to create library_service_stream_responses_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register library_service_stream_responses_total");
    counter
});

static STREAM_BYTES_PLANNED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    let counter = IntCounter::new(
        "library_service_stream_bytes_planned_total",
        "Body bytes promised by Content-Length on stream responses",
    )
    .expect("failed to create library_service_stream_bytes_planned_total");
    prometheus::default_registry()
        .register(Box::new(counter.clone()))
        .expect("failed to register library_service_stream_bytes_planned_total");
    counter
});

pub fn observe_http_request(method: &str, status: u16, elapsed: Duration) {
    let status_label = status.to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, &status_label])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, &status_label])
        .observe(elapsed.as_secs_f64());
}

pub fn record_stream_response(status: u16, planned_bytes: u64) {
    STREAM_RESPONSES_TOTAL
        .with_label_values(&[&status.to_string()])
        .inc();
    STREAM_BYTES_PLANNED_TOTAL.inc_by(planned_bytes);
}

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
