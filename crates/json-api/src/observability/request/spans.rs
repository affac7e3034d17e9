//! HTTP span naming and route labels.

/// Routes served by this API. Any other path is labelled as unmatched so
/// probes and scanners cannot grow metric cardinality.
const KNOWN_ROUTES: &[&str] = &[
    "/site/register/verify-domain",
    "/site/register",
    "/site/verification",
    "/api-doc/openapi.json",
];

const UNMATCHED_ROUTE: &str = "{unmatched}";

/// Paths that bypass request logging entirely.
const UNLOGGED_PATHS: &[&str] = &["/metrics", "/healthcheck"];

#[derive(Debug, Clone)]
pub(super) struct RequestSpanName {
    pub(super) route: &'static str,
    pub(super) otel_span_name: String,
}

pub(super) fn request_span_name(method: &str, path: &str) -> RequestSpanName {
    let route = route_label(path);

    RequestSpanName {
        route,
        otel_span_name: format!("{method} {route}"),
    }
}

pub(super) fn is_unlogged_path(path: &str) -> bool {
    UNLOGGED_PATHS.contains(&path)
}

fn route_label(path: &str) -> &'static str {
    let trimmed = path.trim_end_matches('/');

    if path.starts_with("/docs") {
        return "/docs";
    }

    KNOWN_ROUTES
        .iter()
        .find(|route| **route == trimmed)
        .copied()
        .unwrap_or(UNMATCHED_ROUTE)
}
