use axum::http::HeaderMap;

use crate::github::models::DELIVERY_HEADER;

/// Picks the id that ties together every log line of one delivery
pub struct TraceContext;

impl TraceContext {
    /// New trace id (UUID v4)
    pub fn new_trace_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Delivery GUID if the sender supplied one, then `x-trace-id`, then a
    /// fresh id.
    pub fn extract_or_generate(headers: &HeaderMap) -> String {
        [DELIVERY_HEADER, "x-trace-id"]
            .iter()
            .find_map(|name| {
                headers
                    .get(*name)
                    .and_then(|h| h.to_str().ok())
                    .filter(|s| !s.is_empty())
            })
            .map(|s| s.to_string())
            .unwrap_or_else(Self::new_trace_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trace_id() {
        let id1 = TraceContext::new_trace_id();
        let id2 = TraceContext::new_trace_id();

        assert_ne!(id1, id2);
        assert!(!id1.is_empty());
    }

    #[test]
    fn test_prefers_delivery_id() {
        let mut headers = HeaderMap::new();
        headers.insert("x-trace-id", "test-trace-id".parse().unwrap());
        headers.insert("x-github-delivery", "72d3162e-cc78-11e3-81ab-4c9367dc0958".parse().unwrap());

        let trace_id = TraceContext::extract_or_generate(&headers);
        assert_eq!(trace_id, "72d3162e-cc78-11e3-81ab-4c9367dc0958");
    }

    #[test]
    fn test_falls_back_to_trace_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-trace-id", "test-trace-id".parse().unwrap());

        let trace_id = TraceContext::extract_or_generate(&headers);
        assert_eq!(trace_id, "test-trace-id");
    }

    #[test]
    fn test_generates_when_absent() {
        let headers = HeaderMap::new();
        let trace_id = TraceContext::extract_or_generate(&headers);

        // UUID v4 text form
        assert_eq!(trace_id.len(), 36);
        assert!(trace_id.contains('-'));
    }
}
