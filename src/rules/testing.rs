//! Rule construction helpers for unit tests.

use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use regex::Regex;

use crate::processing::SetHeaders;
use crate::rules::{Condition, ConditionalHeaders, HeaderEntry, Rule};

pub(crate) fn headers(list: &[(&str, &str)]) -> Vec<HeaderEntry> {
    list.iter()
        .map(|(name, value)| {
            HeaderEntry::new(
                HeaderName::from_bytes(name.as_bytes()).unwrap(),
                HeaderValue::from_str(value).unwrap(),
            )
        })
        .collect()
}

/// Builds a rule using the default processor. An empty `default` list means no default headers.
pub(crate) fn rule(
    pattern: &str,
    default: &[(&str, &str)],
    conditional: Vec<(&str, &str, Vec<(&str, &str)>)>,
) -> Rule {
    let default = if default.is_empty() {
        None
    } else {
        Some(headers(default))
    };
    let conditional = conditional
        .into_iter()
        .map(|(param, pattern, list)| ConditionalHeaders {
            condition: Condition::new(param, Regex::new(pattern).unwrap()),
            headers: headers(&list),
        })
        .collect();

    Rule::new(
        Regex::new(pattern).unwrap(),
        default,
        conditional,
        "default",
        Arc::new(SetHeaders),
    )
}
