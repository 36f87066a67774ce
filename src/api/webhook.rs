use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, info, warn};

use crate::github::models::{EVENT_HEADER, PUSH_EVENT, SIGNATURE_HEADER};
use crate::github::{signature, PushEvent};
use crate::infrastructure::logging::{Timer, TraceContext};
use crate::state::AppState;

/// What a decoded push event led to. Never visible to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// No entry for the repository.
    Unmonitored,
    /// Repository known, branch not configured.
    NoScript,
    Deployed,
    Failed,
}

/// Webhook entry point.
///
/// Every gate that fails drops the delivery. Only an unreadable body (500)
/// and an undecodable payload (400) are visible to the sender; everything
/// else, including script failures, answers an empty 200.
pub async fn deploy_webhook(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let trace_id = TraceContext::extract_or_generate(&headers);
    let timer = Timer::start();
    let path = uri.path();

    let event = headers
        .get(EVENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if event != PUSH_EVENT {
        debug!("[{}] Ignoring '{}' event", trace_id, event);
        return StatusCode::OK.into_response();
    }

    state.logger.api_entry(&trace_id, method.as_str(), path, event);

    let body = match to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(e) => {
            error!("[{}] Failed to read request body: {}", trace_id, e);
            state.logger.api_exit(&trace_id, method.as_str(), path, timer.elapsed_ms(), 500);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
        }
    };

    let signature_header = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok());
    if !signature::verify(&state.secret, &body, signature_header) {
        state.logger.api_drop(
            &trace_id,
            method.as_str(),
            path,
            &format!("Ignoring '{}' event with incorrect signature", event),
        );
        return StatusCode::OK.into_response();
    }

    let push = match PushEvent::decode(&body) {
        Ok(p) => p,
        Err(e) => {
            warn!("[{}] Failed to parse push payload: {}", trace_id, e);
            state.logger.api_exit(&trace_id, method.as_str(), path, timer.elapsed_ms(), 400);
            return (StatusCode::BAD_REQUEST, "Bad Request").into_response();
        }
    };

    let outcome = dispatch(&state, &trace_id, &push).await;
    debug!("[{}] Dispatch outcome: {:?}", trace_id, outcome);

    state.logger.api_exit(&trace_id, method.as_str(), path, timer.elapsed_ms(), 200);
    StatusCode::OK.into_response()
}

/// Look up the (repository, branch) pair and run its script to completion.
pub async fn dispatch(state: &AppState, trace_id: &str, push: &PushEvent) -> DispatchOutcome {
    let repo = &push.repository;
    let branch = push.branch();

    let Some(branches) = state.config.repo(&repo.full_name) else {
        debug!("[{}] Repository {} is not monitored", trace_id, repo.full_name);
        return DispatchOutcome::Unmonitored;
    };

    info!(
        "[{}] Got a push event: {}, {}, {}",
        trace_id, repo.full_name, branch, push.after
    );

    let Some(script) = branches.get(branch) else {
        debug!("[{}] No script for {} branch {}", trace_id, repo.full_name, branch);
        return DispatchOutcome::NoScript;
    };

    let runner = state.runner.clone();
    let logger = state.logger.clone();
    let trace_id = trace_id.to_string();
    let script = script.clone();
    let args = [repo.ssh_url.clone(), branch.to_string(), push.after.clone()];

    // The run lives in its own task so a sender hanging up cannot cut it
    // short; the handler still waits for it.
    let task = tokio::spawn(async move {
        let timer = Timer::start();
        logger.external_call(&trace_id, "Dispatcher", "Script", &script);

        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        match runner.run(&script, &args).await {
            Ok(_) => {
                logger.external_done(&trace_id, "Dispatcher", "Script", &script, timer.elapsed_ms());
                DispatchOutcome::Deployed
            }
            Err(e) => {
                logger.external_error(&trace_id, "Dispatcher", "Script", &script, &e);
                if let Some(output) = e.output() {
                    warn!(
                        "[{}] `{}` output:\n```\n{}\n```",
                        trace_id,
                        script,
                        String::from_utf8_lossy(output)
                    );
                }
                DispatchOutcome::Failed
            }
        }
    });

    match task.await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Script task aborted: {}", e);
            DispatchOutcome::Failed
        }
    }
}
