use std::time::Instant;
use tracing::{error, info, warn};

/// BoundaryLogger - logs every crossing between the HTTP layer, the
/// dispatcher and external processes.
///
/// Format: [trace_id] [caller→callee] [operation] [stage] [duration]
#[derive(Debug, Clone, Default)]
pub struct BoundaryLogger;

impl BoundaryLogger {
    pub fn new() -> Self {
        Self
    }

    /// Delivery reached the dispatcher
    /// e.g. [API→Dispatcher] POST /deploy [ENTRY] event=push
    pub fn api_entry(&self, trace_id: &str, method: &str, path: &str, event: &str) {
        info!(
            trace_id = %trace_id,
            method = %method,
            path = %path,
            flow = "API→Dispatcher",
            stage = "ENTRY",
            event = %event,
            "[{}] [API→Dispatcher] {} {} [ENTRY] event={}",
            trace_id, method, path, event
        );
    }

    /// Delivery handled
    /// e.g. [API→Dispatcher] POST /deploy [←DONE] 3.20ms status=200
    pub fn api_exit(&self, trace_id: &str, method: &str, path: &str, duration_ms: f64, status: u16) {
        info!(
            trace_id = %trace_id,
            method = %method,
            path = %path,
            flow = "API→Dispatcher",
            stage = "←DONE",
            duration_ms = %duration_ms,
            status = %status,
            "[{}] [API→Dispatcher] {} {} [←DONE] {:.2}ms status={}",
            trace_id, method, path, duration_ms, status
        );
    }

    /// Delivery dropped without a visible error (bad signature and the like)
    pub fn api_drop(&self, trace_id: &str, method: &str, path: &str, reason: &str) {
        warn!(
            trace_id = %trace_id,
            method = %method,
            path = %path,
            flow = "API→Dispatcher",
            stage = "←DROP",
            reason = %reason,
            "[{}] [API→Dispatcher] {} {} [←DROP] {}",
            trace_id, method, path, reason
        );
    }

    /// External process started
    /// e.g. [Dispatcher→Script] ./deploy.sh [EXT→]
    pub fn external_call(&self, trace_id: &str, from: &str, system: &str, operation: &str) {
        info!(
            trace_id = %trace_id,
            from = %from,
            system = %system,
            operation = %operation,
            flow = format!("{}→{}", from, system),
            stage = "EXT→",
            "[{}] [{}→{}] {} [EXT→]",
            trace_id, from, system, operation
        );
    }

    /// External process finished successfully
    pub fn external_done(&self, trace_id: &str, from: &str, system: &str, operation: &str, duration_ms: f64) {
        info!(
            trace_id = %trace_id,
            from = %from,
            system = %system,
            operation = %operation,
            flow = format!("{}→{}", from, system),
            stage = "←DONE",
            duration_ms = %duration_ms,
            "[{}] [{}→{}] {} [←DONE] {:.2}ms",
            trace_id, from, system, operation, duration_ms
        );
    }

    /// External process failed
    pub fn external_error<E: std::fmt::Display>(&self, trace_id: &str, from: &str, system: &str, operation: &str, error: &E) {
        error!(
            trace_id = %trace_id,
            from = %from,
            system = %system,
            operation = %operation,
            flow = format!("{}→{}", from, system),
            stage = "←FAIL",
            error = %error,
            "[{}] [{}→{}] {} [←FAIL] error={}",
            trace_id, from, system, operation, error
        );
    }
}

/// Elapsed-time helper
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Elapsed milliseconds
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}
