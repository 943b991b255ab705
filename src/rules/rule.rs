//! Compiled rule types.
//!
//! A [`Rule`] is produced once by the configuration loader and never mutated after it has been
//! published in a [`RuleSet`](crate::rules::RuleSet). Patterns are compiled and header names and
//! values are parsed up front so that the request path never has to deal with invalid input.

use std::fmt;
use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue};
use regex::Regex;

use crate::processing::MappingProcessor;

/// An immutable response header assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEntry {
    name: HeaderName,
    value: HeaderValue,
}

impl HeaderEntry {
    pub fn new(name: HeaderName, value: HeaderValue) -> Self {
        Self { name, value }
    }

    pub fn name(&self) -> &HeaderName {
        &self.name
    }

    pub fn value(&self) -> &HeaderValue {
        &self.value
    }
}

impl fmt::Display for HeaderEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}",
            self.name,
            String::from_utf8_lossy(self.value.as_bytes())
        )
    }
}

/// Query parameter based trigger selecting an alternate header list.
#[derive(Debug, Clone)]
pub struct Condition {
    param: String,
    value_pattern: Regex,
}

impl Condition {
    pub fn new(param: impl Into<String>, value_pattern: Regex) -> Self {
        Self {
            param: param.into(),
            value_pattern,
        }
    }

    /// Name of the query parameter this condition inspects.
    pub fn param(&self) -> &str {
        &self.param
    }

    pub fn value_pattern(&self) -> &Regex {
        &self.value_pattern
    }

    /// Searches the pattern anywhere within `value`.
    pub fn matches(&self, value: &str) -> bool {
        self.value_pattern.is_match(value)
    }
}

/// A conditional entry: the condition plus the headers it selects.
#[derive(Debug, Clone)]
pub struct ConditionalHeaders {
    pub condition: Condition,
    pub headers: Vec<HeaderEntry>,
}

/// One declared URL mapping.
#[derive(Clone)]
pub struct Rule {
    url_pattern: Regex,
    default_headers: Option<Vec<HeaderEntry>>,
    conditional_headers: Vec<ConditionalHeaders>,
    processor_name: String,
    processor: Arc<dyn MappingProcessor>,
}

impl Rule {
    pub fn new(
        url_pattern: Regex,
        default_headers: Option<Vec<HeaderEntry>>,
        conditional_headers: Vec<ConditionalHeaders>,
        processor_name: impl Into<String>,
        processor: Arc<dyn MappingProcessor>,
    ) -> Self {
        Self {
            url_pattern,
            default_headers,
            conditional_headers,
            processor_name: processor_name.into(),
            processor,
        }
    }

    pub fn url_pattern(&self) -> &Regex {
        &self.url_pattern
    }

    /// Source text of the URL pattern, the key of this rule in its rule set.
    pub fn pattern(&self) -> &str {
        self.url_pattern.as_str()
    }

    pub fn default_headers(&self) -> Option<&[HeaderEntry]> {
        self.default_headers.as_deref()
    }

    /// Conditional entries in declaration order.
    pub fn conditional_headers(&self) -> &[ConditionalHeaders] {
        &self.conditional_headers
    }

    pub fn processor_name(&self) -> &str {
        &self.processor_name
    }

    pub fn processor(&self) -> &dyn MappingProcessor {
        self.processor.as_ref()
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("url_pattern", &self.url_pattern.as_str())
            .field("default_headers", &self.default_headers)
            .field("conditional_headers", &self.conditional_headers)
            .field("processor", &self.processor_name)
            .finish()
    }
}
