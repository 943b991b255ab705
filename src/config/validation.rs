//! Configuration validation and compilation.
//!
//! # Responsibilities
//! - Compile URL and condition patterns
//! - Parse header names and values
//! - Resolve processor names
//! - Reject duplicate patterns and mappings without headers
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - A single bad entry rejects the whole file; no partially compiled rule set is produced

use std::collections::HashMap;

use axum::http::{HeaderName, HeaderValue};
use regex::Regex;
use thiserror::Error;

use crate::config::schema::{HeaderConfig, MappingConfig, RulesFile};
use crate::processing::{ProcessorRegistry, DEFAULT_PROCESSOR};
use crate::rules::{Condition, ConditionalHeaders, HeaderEntry, Rule, RuleSet};

/// A problem with one entry of a rules file. Mapping numbers start at 1.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("mapping #{mapping}: invalid url pattern `{pattern}`: {source}")]
    InvalidUrlPattern {
        mapping: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("mapping #{mapping}: url pattern `{pattern}` already declared by mapping #{first}")]
    DuplicatePattern {
        mapping: usize,
        first: usize,
        pattern: String,
    },

    #[error("mapping #{mapping}: conditional #{condition} has an empty param name")]
    EmptyParamName { mapping: usize, condition: usize },

    #[error("mapping #{mapping}: invalid pattern `{pattern}` for param `{param}`: {source}")]
    InvalidConditionPattern {
        mapping: usize,
        param: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("mapping #{mapping}: invalid header name `{name}`")]
    InvalidHeaderName { mapping: usize, name: String },

    #[error("mapping #{mapping}: invalid value for header `{name}`")]
    InvalidHeaderValue { mapping: usize, name: String },

    #[error("mapping #{mapping}: unknown processor `{name}`")]
    UnknownProcessor { mapping: usize, name: String },

    #[error("mapping #{mapping}: empty header list in {context}")]
    EmptyHeaderList { mapping: usize, context: String },

    #[error("mapping #{mapping}: neither default nor conditional headers declared")]
    NoHeaders { mapping: usize },
}

/// Compile a parsed rules file into a rule set.
pub fn compile_rules(
    file: &RulesFile,
    processors: &ProcessorRegistry,
) -> Result<RuleSet, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut rules = Vec::with_capacity(file.mappings.len());
    let mut seen: HashMap<&str, usize> = HashMap::new();

    for (i, mapping) in file.mappings.iter().enumerate() {
        let number = i + 1;
        if let Some(&first) = seen.get(mapping.url.as_str()) {
            errors.push(ValidationError::DuplicatePattern {
                mapping: number,
                first,
                pattern: mapping.url.clone(),
            });
            continue;
        }
        seen.insert(&mapping.url, number);

        if let Some(rule) = compile_mapping(number, mapping, processors, &mut errors) {
            rules.push(rule);
        }
    }

    if errors.is_empty() {
        Ok(RuleSet::new(rules))
    } else {
        Err(errors)
    }
}

fn compile_mapping(
    mapping_no: usize,
    mapping: &MappingConfig,
    processors: &ProcessorRegistry,
    errors: &mut Vec<ValidationError>,
) -> Option<Rule> {
    let before = errors.len();

    let url_pattern = Regex::new(&mapping.url)
        .map_err(|source| {
            errors.push(ValidationError::InvalidUrlPattern {
                mapping: mapping_no,
                pattern: mapping.url.clone(),
                source,
            })
        })
        .ok();

    let processor_name = mapping.processor.as_deref().unwrap_or(DEFAULT_PROCESSOR);
    let processor = processors.get(processor_name);
    if processor.is_none() {
        errors.push(ValidationError::UnknownProcessor {
            mapping: mapping_no,
            name: processor_name.to_owned(),
        });
    }

    if mapping.default.is_none() && mapping.conditional.is_empty() {
        errors.push(ValidationError::NoHeaders { mapping: mapping_no });
    }

    let default_headers = mapping
        .default
        .as_ref()
        .map(|list| compile_headers(mapping_no, list, "default headers", errors));

    let mut conditional_headers = Vec::with_capacity(mapping.conditional.len());
    for (i, conditional) in mapping.conditional.iter().enumerate() {
        let context = format!("conditional #{}", i + 1);
        if conditional.param.is_empty() {
            errors.push(ValidationError::EmptyParamName {
                mapping: mapping_no,
                condition: i + 1,
            });
        }
        let pattern = Regex::new(&conditional.value)
            .map_err(|source| {
                errors.push(ValidationError::InvalidConditionPattern {
                    mapping: mapping_no,
                    param: conditional.param.clone(),
                    pattern: conditional.value.clone(),
                    source,
                })
            })
            .ok();
        let headers = compile_headers(mapping_no, &conditional.headers, &context, errors);

        if let Some(pattern) = pattern {
            conditional_headers.push(ConditionalHeaders {
                condition: Condition::new(conditional.param.clone(), pattern),
                headers,
            });
        }
    }

    if errors.len() != before {
        return None;
    }

    Some(Rule::new(
        url_pattern?,
        default_headers,
        conditional_headers,
        processor_name,
        processor?,
    ))
}

fn compile_headers(
    mapping_no: usize,
    list: &[HeaderConfig],
    context: &str,
    errors: &mut Vec<ValidationError>,
) -> Vec<HeaderEntry> {
    if list.is_empty() {
        errors.push(ValidationError::EmptyHeaderList {
            mapping: mapping_no,
            context: context.to_owned(),
        });
    }

    let mut entries = Vec::with_capacity(list.len());
    for header in list {
        let name = HeaderName::from_bytes(header.name.as_bytes());
        let value = HeaderValue::from_str(&header.value);
        match (name, value) {
            (Ok(name), Ok(value)) => entries.push(HeaderEntry::new(name, value)),
            (Err(_), _) => errors.push(ValidationError::InvalidHeaderName {
                mapping: mapping_no,
                name: header.name.clone(),
            }),
            (Ok(_), Err(_)) => errors.push(ValidationError::InvalidHeaderValue {
                mapping: mapping_no,
                name: header.name.clone(),
            }),
        }
    }
    entries
}
