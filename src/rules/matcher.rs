//! Rule and header-list resolution.
//!
//! # Responsibilities
//! - Resolve a request path to at most one rule
//! - Resolve a rule and the request's query parameters to at most one header list
//!
//! # Design Decisions
//! - Later declarations override earlier ones: both scans run in reverse declaration order
//!   and stop at the first hit
//! - Patterns are searched, not anchored, unless the pattern itself anchors
//! - Matching never cascades: exactly one header list or none per request

use std::sync::Arc;

use crate::rules::{HeaderEntry, QueryParams, Rule, RuleSet};

/// Which part of a rule produced the selected header list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    /// The conditional entry at this declaration index fired.
    Conditional(usize),
    /// No condition fired and the default list applies.
    Default,
}

impl Selection {
    pub fn is_conditional(&self) -> bool {
        matches!(self, Selection::Conditional(_))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Selection::Conditional(_) => "conditional",
            Selection::Default => "default",
        }
    }
}

/// The header list chosen for a request.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedHeaders<'a> {
    pub headers: &'a [HeaderEntry],
    pub selection: Selection,
}

/// Returns the last declared rule whose pattern matches anywhere in `uri`.
pub fn match_rule<'a>(rules: &'a RuleSet, uri: &str) -> Option<&'a Arc<Rule>> {
    rules
        .iter()
        .rev()
        .find(|rule| rule.url_pattern().is_match(uri))
}

/// Selects the header list of `rule` that applies to a request with `params`.
pub fn resolve_headers<'a>(rule: &'a Rule, params: &QueryParams) -> Option<ResolvedHeaders<'a>> {
    let fired = rule
        .conditional_headers()
        .iter()
        .enumerate()
        .rev()
        .find(|(_, entry)| {
            params
                .match_value(entry.condition.param())
                .is_some_and(|value| entry.condition.matches(value))
        });

    if let Some((index, entry)) = fired {
        return Some(ResolvedHeaders {
            headers: &entry.headers,
            selection: Selection::Conditional(index),
        });
    }

    rule.default_headers().map(|headers| ResolvedHeaders {
        headers,
        selection: Selection::Default,
    })
}
