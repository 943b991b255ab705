//! Runs a rule's processor against a response.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

use axum::http::HeaderMap;
use thiserror::Error;

use crate::processing::{ProcessorError, RequestContext};
use crate::rules::{HeaderEntry, Rule};

/// Processor phase, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PreProcess,
    ApplyHeaders,
    PostProcess,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::PreProcess => "pre_process",
            Phase::ApplyHeaders => "apply_headers",
            Phase::PostProcess => "post_process",
        };
        f.write_str(name)
    }
}

/// A processor phase failed; later phases were skipped.
#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("processor `{processor}` failed in {phase}: {source}")]
    Failed {
        processor: String,
        phase: Phase,
        #[source]
        source: ProcessorError,
    },

    #[error("processor `{processor}` panicked in {phase}: {message}")]
    Panicked {
        processor: String,
        phase: Phase,
        message: String,
    },
}

impl ApplyError {
    pub fn phase(&self) -> Phase {
        match self {
            ApplyError::Failed { phase, .. } | ApplyError::Panicked { phase, .. } => *phase,
        }
    }
}

/// Runs `pre_process`, `apply_headers` and `post_process` of the rule's processor in order.
///
/// Errors and panics inside a phase stop the sequence and are returned to the caller, which
/// is expected to log them and let the request continue.
pub fn apply(
    request: &RequestContext,
    response: &mut HeaderMap,
    headers: &[HeaderEntry],
    rule: &Rule,
) -> Result<(), ApplyError> {
    let processor = rule.processor();

    run_phase(rule, Phase::PreProcess, || {
        processor.pre_process(request, response, rule)
    })?;
    run_phase(rule, Phase::ApplyHeaders, || {
        processor.apply_headers(request, response, headers, rule)
    })?;
    run_phase(rule, Phase::PostProcess, || {
        processor.post_process(request, response, rule)
    })
}

fn run_phase<F>(rule: &Rule, phase: Phase, f: F) -> Result<(), ApplyError>
where
    F: FnOnce() -> Result<(), ProcessorError>,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(ApplyError::Failed {
            processor: rule.processor_name().to_owned(),
            phase,
            source,
        }),
        Err(payload) => Err(ApplyError::Panicked {
            processor: rule.processor_name().to_owned(),
            phase,
            message: panic_message(payload.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
