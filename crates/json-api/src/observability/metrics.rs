//! Prometheus metrics collection and exposition endpoint.

use std::sync::OnceLock;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
    core::Collector,
};
use salvo::{
    Request, Response, handler,
    http::{
        StatusCode,
        header::{CONTENT_TYPE, HeaderValue},
    },
};
use tracing::error;

#[derive(Debug)]
struct Metrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration_seconds: HistogramVec,
    requests_in_flight: IntGauge,
    handshake_attempts_total: IntCounterVec,
    claim_tokens_total: IntCounterVec,
    registrations_total: IntCounterVec,
}

static METRICS: OnceLock<Option<Metrics>> = OnceLock::new();

#[derive(Debug)]
pub(super) struct InFlightRequestGuard {
    tracked: bool,
}

impl InFlightRequestGuard {
    pub(super) fn track() -> Self {
        if let Some(metrics) = metrics() {
            metrics.requests_in_flight.inc();
            return Self { tracked: true };
        }

        Self { tracked: false }
    }
}

impl Drop for InFlightRequestGuard {
    fn drop(&mut self) {
        if self.tracked
            && let Some(metrics) = metrics()
        {
            metrics.requests_in_flight.dec();
        }
    }
}

pub(super) fn observe_request(method: &str, route: &str, status_code: u16, duration_seconds: f64) {
    let Some(metrics) = metrics() else {
        return;
    };

    let status_class = status_class(status_code);
    let status_code = status_code.to_string();

    metrics
        .requests_total
        .with_label_values(&[method, route, status_class, status_code.as_str()])
        .inc();

    metrics
        .request_duration_seconds
        .with_label_values(&[method, route])
        .observe(duration_seconds);
}

/// Count one handshake request against a candidate domain.
pub(super) fn observe_handshake_attempt(scheme: &str, outcome: &str) {
    if let Some(metrics) = metrics() {
        metrics
            .handshake_attempts_total
            .with_label_values(&[scheme, outcome])
            .inc();
    }
}

/// Count a claim token being issued or rejected.
pub(super) fn observe_claim_token(result: &str) {
    if let Some(metrics) = metrics() {
        metrics.claim_tokens_total.with_label_values(&[result]).inc();
    }
}

/// Count a finished registration by outcome and the stage it ended in.
pub(super) fn observe_registration(outcome: &str, stage: &str) {
    if let Some(metrics) = metrics() {
        metrics
            .registrations_total
            .with_label_values(&[outcome, stage])
            .inc();
    }
}

#[handler]
pub(crate) async fn metrics_handler(_req: &mut Request, res: &mut Response) {
    let Some(metrics) = metrics() else {
        res.status_code(StatusCode::INTERNAL_SERVER_ERROR);
        return;
    };

    let encoder = TextEncoder::new();
    let metric_families = metrics.registry.gather();

    let mut encoded = Vec::new();

    if let Err(source) = encoder.encode(&metric_families, &mut encoded) {
        error!("failed to encode metrics response: {source}");
        res.status_code(StatusCode::INTERNAL_SERVER_ERROR);

        return;
    }

    let content_type = match HeaderValue::from_str(encoder.format_type()) {
        Ok(value) => value,
        Err(source) => {
            error!("failed to encode metrics content type header: {source}");
            res.status_code(StatusCode::INTERNAL_SERVER_ERROR);

            return;
        }
    };

    res.headers_mut().insert(CONTENT_TYPE, content_type);
    res.render(String::from_utf8_lossy(&encoded).into_owned());
}

fn metrics() -> Option<&'static Metrics> {
    METRICS.get_or_init(build_metrics).as_ref()
}

fn counter(name: &str, help: &str, labels: &[&str]) -> Option<IntCounterVec> {
    match IntCounterVec::new(Opts::new(name, help), labels) {
        Ok(metric) => Some(metric),
        Err(source) => {
            error!("failed to create {name} metric: {source}");
            None
        }
    }
}

fn register<C>(registry: &Registry, metric: &C) -> Option<()>
where
    C: Collector + Clone + 'static,
{
    match registry.register(Box::new(metric.clone())) {
        Ok(()) => Some(()),
        Err(source) => {
            error!("failed to register metric: {source}");
            None
        }
    }
}

fn build_metrics() -> Option<Metrics> {
    let registry = Registry::new();

    let requests_total = counter(
        "sitebind_json_http_requests_total",
        "Total HTTP requests partitioned by method, route, status class, and status code.",
        &["method", "route", "status_class", "status_code"],
    )?;

    let request_duration_seconds = match HistogramVec::new(
        HistogramOpts::new(
            "sitebind_json_http_request_duration_seconds",
            "HTTP request duration in seconds partitioned by method and route.",
        )
        .buckets(vec![
            0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "route"],
    ) {
        Ok(metric) => metric,
        Err(source) => {
            error!("failed to create request_duration metric: {source}");
            return None;
        }
    };

    let requests_in_flight = match IntGauge::with_opts(Opts::new(
        "sitebind_json_http_requests_in_flight",
        "Current number of in-flight HTTP requests.",
    )) {
        Ok(metric) => metric,
        Err(source) => {
            error!("failed to create in-flight gauge metric: {source}");
            return None;
        }
    };

    let handshake_attempts_total = counter(
        "sitebind_json_handshake_attempts_total",
        "Domain handshake requests partitioned by scheme and outcome.",
        &["scheme", "outcome"],
    )?;

    let claim_tokens_total = counter(
        "sitebind_json_claim_tokens_total",
        "Claim tokens issued or rejected.",
        &["result"],
    )?;

    let registrations_total = counter(
        "sitebind_json_registrations_total",
        "Finished site registrations partitioned by outcome and final stage.",
        &["outcome", "stage"],
    )?;

    register(&registry, &requests_total)?;
    register(&registry, &request_duration_seconds)?;
    register(&registry, &requests_in_flight)?;
    register(&registry, &handshake_attempts_total)?;
    register(&registry, &claim_tokens_total)?;
    register(&registry, &registrations_total)?;

    Some(Metrics {
        registry,
        requests_total,
        request_duration_seconds,
        requests_in_flight,
        handshake_attempts_total,
        claim_tokens_total,
        registrations_total,
    })
}

fn status_class(status_code: u16) -> &'static str {
    match status_code {
        100..=199 => "1xx",
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}
