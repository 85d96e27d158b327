//! Structured audit records for gate decisions.
//!
//! Every auth / rate-limit / concurrency decision is emitted as one JSON line
//! under the `gate_audit` tracing target so operators can grep blocked
//! traffic without touching request logs.

use chrono::Utc;
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Serialize)]
pub struct GateEvent<'a> {
    pub component: &'a str,
    pub path: &'a str,
    pub method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_class: Option<&'a str>,
    pub ip_hash: &'a str,
    pub status: u16,
    pub blocked: bool,
    pub reason: &'a str,
    pub latency_ms: f64,
    pub ts: String,
}

impl<'a> GateEvent<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        component: &'a str,
        path: &'a str,
        method: &'a str,
        endpoint_class: Option<&'a str>,
        ip_hash: &'a str,
        status: u16,
        blocked: bool,
        reason: &'a str,
        started: Instant,
    ) -> Self {
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        GateEvent {
            component,
            path,
            method,
            endpoint_class,
            ip_hash,
            status,
            blocked,
            reason,
            latency_ms: (latency_ms * 100.0).round() / 100.0,
            ts: Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        }
    }

    pub fn emit(&self) {
        match serde_json::to_string(self) {
            Ok(line) => tracing::info!(target: "gate_audit", "{line}"),
            Err(e) => tracing::warn!("failed to serialize gate event: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_to_single_line() {
        let event = GateEvent::new(
            "ml_service_auth",
            "/api/v1/salary/predict",
            "POST",
            None,
            "ab12cd34ef56",
            401,
            true,
            "invalid_ml_service_key",
            Instant::now(),
        );
        let line = serde_json::to_string(&event).unwrap();
        assert!(!line.contains('\n'));
        assert!(line.contains("\"component\":\"ml_service_auth\""));
        assert!(line.contains("\"blocked\":true"));
        // endpoint_class is omitted entirely when absent
        assert!(!line.contains("endpoint_class"));
    }

    #[test]
    fn test_endpoint_class_serialized_when_present() {
        let event = GateEvent::new(
            "ml_service_rate_limit",
            "/api/v1/salary/predict",
            "POST",
            Some("predict"),
            "ab12cd34ef56",
            429,
            true,
            "rate_limited_route",
            Instant::now(),
        );
        let line = serde_json::to_string(&event).unwrap();
        assert!(line.contains("\"endpoint_class\":\"predict\""));
    }

    #[test]
    fn test_latency_rounded_to_two_decimals() {
        let event = GateEvent::new(
            "ml_service_auth",
            "/api/v1/health",
            "GET",
            None,
            "ab12cd34ef56",
            200,
            false,
            "ok",
            Instant::now(),
        );
        let scaled = event.latency_ms * 100.0;
        assert!((scaled - scaled.round()).abs() < 1e-9);
    }
}
