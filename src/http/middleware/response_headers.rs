//! Response header middleware.
//! Applies the configured header list to every matching response.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    Router,
};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::task;

use crate::config::ReloadMode;
use crate::observability::metrics;
use crate::processing::{apply, RequestContext};
use crate::reload::ReloadSupervisor;
use crate::rules::{match_rule, resolve_headers, QueryParams, RuleRegistry};

/// Shared state of the middleware: the active rules and the reload path.
#[derive(Debug)]
pub struct HeaderManager {
    supervisor: Arc<ReloadSupervisor>,
    reload_mode: ReloadMode,
}

impl HeaderManager {
    pub fn new(supervisor: Arc<ReloadSupervisor>, reload_mode: ReloadMode) -> Self {
        Self {
            supervisor,
            reload_mode,
        }
    }

    pub fn registry(&self) -> &Arc<RuleRegistry> {
        self.supervisor.registry()
    }

    pub fn supervisor(&self) -> &Arc<ReloadSupervisor> {
        &self.supervisor
    }

    pub fn reload_mode(&self) -> ReloadMode {
        self.reload_mode
    }

    fn check_inline(&self) {
        if self.reload_mode != ReloadMode::Inline || !self.supervisor.is_due() {
            return;
        }
        // A due check reads and may parse the rules file, so this worker blocks.
        // `block_in_place` is unavailable on the current-thread runtime.
        match Handle::try_current().map(|handle| handle.runtime_flavor()) {
            Ok(RuntimeFlavor::MultiThread) => {
                task::block_in_place(|| self.supervisor.check());
            }
            _ => {
                self.supervisor.check();
            }
        }
    }
}

/// Wrap `router` so that every response passes through [`response_headers_middleware`].
pub fn with_response_headers(router: Router, manager: Arc<HeaderManager>) -> Router {
    router.layer(middleware::from_fn_with_state(
        manager,
        response_headers_middleware,
    ))
}

/// Middleware function resolving and applying response headers.
///
/// The request always continues downstream; processor failures are logged and the response
/// is returned as produced by the inner service.
pub async fn response_headers_middleware(
    State(manager): State<Arc<HeaderManager>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    manager.check_inline();

    let rule = {
        let rules = manager.registry().snapshot();
        match match_rule(&rules, request.uri().path()) {
            Some(rule) => rule.clone(),
            None => {
                tracing::trace!(path = %request.uri().path(), "No header rule matched");
                metrics::record_unmatched();
                return next.run(request).await;
            }
        }
    };

    let params = QueryParams::parse(request.uri().query());
    let Some(resolved) = resolve_headers(&rule, &params) else {
        tracing::trace!(
            uri = %request.uri(),
            pattern = rule.pattern(),
            "Rule matched but no header list applies"
        );
        metrics::record_unmatched();
        return next.run(request).await;
    };

    tracing::debug!(
        uri = %request.uri(),
        pattern = rule.pattern(),
        kind = resolved.selection.as_str(),
        "Applying response headers"
    );
    let context = RequestContext::from_request(&request, params);

    let mut response = next.run(request).await;

    match apply(&context, response.headers_mut(), resolved.headers, &rule) {
        Ok(()) => metrics::record_applied(resolved.selection.as_str()),
        Err(e) => {
            tracing::error!(
                uri = %context.uri,
                pattern = rule.pattern(),
                error = %e,
                "Failed to apply response headers"
            );
            metrics::record_processor_error(e.phase().to_string());
        }
    }

    response
}
