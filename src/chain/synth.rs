//! Response Synthesizer: the single place where the final status is decided.

use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

use crate::chain::context::{ExecutionContext, LifecycleAction, RelayOutcome};

/// Everything the HTTP layer needs to answer.
#[derive(Debug, Clone)]
pub struct ChainResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
    pub action: Option<LifecycleAction>,
}

/// Explicit code, then relay status, then 200. A failed relay is a 500.
pub fn resolve_status(ctx: &ExecutionContext) -> StatusCode {
    if ctx.response_code != 0 {
        if let Ok(status) = StatusCode::from_u16(ctx.response_code) {
            return status;
        }
    }
    match ctx.relay {
        RelayOutcome::Succeeded(status) => status,
        RelayOutcome::Failed => StatusCode::INTERNAL_SERVER_ERROR,
        RelayOutcome::Skipped | RelayOutcome::NotAttempted => StatusCode::OK,
    }
}

/// Trace lines as the response body, one `| line` per entry.
pub fn render_trace(trace: &[String]) -> String {
    let mut body = String::with_capacity(trace.iter().map(|line| line.len() + 3).sum());
    for line in trace {
        body.push_str("| ");
        body.push_str(line);
        body.push('\n');
    }
    body
}

pub fn synthesize(ctx: ExecutionContext) -> ChainResponse {
    let status = resolve_status(&ctx);

    let mut headers = HeaderMap::with_capacity(ctx.response_headers.len());
    for (name, value) in ctx.response_headers.iter() {
        match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => tracing::warn!(header = name, "Dropping invalid response header"),
        }
    }

    ChainResponse {
        status,
        headers,
        body: render_trace(&ctx.trace),
        action: ctx.deferred_action,
    }
}
