//! Header application strategies.
//!
//! Every rule carries a processor selected by name when the configuration is loaded. The
//! processor runs in three phases: `pre_process`, `apply_headers`, `post_process`. Only the
//! middle phase does anything in the built-in strategies.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, Uri};
use thiserror::Error;

use crate::rules::{HeaderEntry, QueryParams, Rule};

/// Name of the processor used when a mapping does not specify one.
pub const DEFAULT_PROCESSOR: &str = "default";

/// Name of the built-in appending processor.
pub const APPEND_PROCESSOR: &str = "append";

/// Failure reported by a processor phase.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ProcessorError(String);

impl ProcessorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Request facts available to processors.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub params: QueryParams,
}

impl RequestContext {
    pub fn from_request(request: &Request<Body>, params: QueryParams) -> Self {
        Self {
            method: request.method().clone(),
            uri: request.uri().clone(),
            headers: request.headers().clone(),
            params,
        }
    }
}

/// Strategy applying a header list to a response.
///
/// Processors only get access to the response headers; body and status are out of reach.
pub trait MappingProcessor: Send + Sync + fmt::Debug {
    fn pre_process(
        &self,
        _request: &RequestContext,
        _response: &mut HeaderMap,
        _rule: &Rule,
    ) -> Result<(), ProcessorError> {
        Ok(())
    }

    fn apply_headers(
        &self,
        request: &RequestContext,
        response: &mut HeaderMap,
        headers: &[HeaderEntry],
        rule: &Rule,
    ) -> Result<(), ProcessorError>;

    fn post_process(
        &self,
        _request: &RequestContext,
        _response: &mut HeaderMap,
        _rule: &Rule,
    ) -> Result<(), ProcessorError> {
        Ok(())
    }
}

/// Sets every header, replacing any existing values for that name.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetHeaders;

impl MappingProcessor for SetHeaders {
    fn apply_headers(
        &self,
        _request: &RequestContext,
        response: &mut HeaderMap,
        headers: &[HeaderEntry],
        _rule: &Rule,
    ) -> Result<(), ProcessorError> {
        for header in headers {
            response.insert(header.name().clone(), header.value().clone());
        }
        Ok(())
    }
}

/// Appends every header, keeping existing values. Useful for `Set-Cookie`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AppendHeaders;

impl MappingProcessor for AppendHeaders {
    fn apply_headers(
        &self,
        _request: &RequestContext,
        response: &mut HeaderMap,
        headers: &[HeaderEntry],
        _rule: &Rule,
    ) -> Result<(), ProcessorError> {
        for header in headers {
            response.append(header.name().clone(), header.value().clone());
        }
        Ok(())
    }
}

/// Named processors available to the configuration loader.
#[derive(Debug, Clone)]
pub struct ProcessorRegistry {
    processors: HashMap<String, Arc<dyn MappingProcessor>>,
}

impl ProcessorRegistry {
    /// Registry containing the built-in `default` and `append` processors.
    pub fn new() -> Self {
        let mut registry = Self {
            processors: HashMap::new(),
        };
        registry.register(DEFAULT_PROCESSOR, Arc::new(SetHeaders));
        registry.register(APPEND_PROCESSOR, Arc::new(AppendHeaders));
        registry
    }

    /// Adds or replaces a processor.
    pub fn register(&mut self, name: impl Into<String>, processor: Arc<dyn MappingProcessor>) {
        self.processors.insert(name.into(), processor);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn MappingProcessor>> {
        self.processors.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.processors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::testing::{headers, rule};
    use axum::http::header;

    fn context() -> RequestContext {
        let request = Request::builder()
            .uri("/anything")
            .body(Body::empty())
            .unwrap();
        RequestContext::from_request(&request, QueryParams::default())
    }

    #[test]
    fn test_set_headers_overwrites() {
        let rule = rule(".*", &[("X-A", "1")], vec![]);
        let mut response = HeaderMap::new();
        response.insert("x-a", "old".parse().unwrap());
        response.append("x-a", "older".parse().unwrap());

        let list = headers(&[("X-A", "1"), ("X-B", "2"), ("X-B", "3")]);
        SetHeaders
            .apply_headers(&context(), &mut response, &list, &rule)
            .unwrap();

        assert_eq!(response.get_all("x-a").iter().count(), 1);
        assert_eq!(response["x-a"], "1");
        assert_eq!(response["x-b"], "3");
    }

    #[test]
    fn test_set_headers_idempotent() {
        let rule = rule(".*", &[("X-A", "1")], vec![]);
        let list = headers(&[("X-A", "1"), (header::CACHE_CONTROL.as_str(), "no-cache")]);

        let mut once = HeaderMap::new();
        SetHeaders
            .apply_headers(&context(), &mut once, &list, &rule)
            .unwrap();

        let mut twice = HeaderMap::new();
        for _ in 0..2 {
            SetHeaders
                .apply_headers(&context(), &mut twice, &list, &rule)
                .unwrap();
        }

        assert_eq!(once, twice);
    }

    #[test]
    fn test_append_headers_keeps_existing() {
        let rule = rule(".*", &[("Set-Cookie", "a=1")], vec![]);
        let mut response = HeaderMap::new();
        response.insert(header::SET_COOKIE, "session=x".parse().unwrap());

        let list = headers(&[("Set-Cookie", "a=1")]);
        AppendHeaders
            .apply_headers(&context(), &mut response, &list, &rule)
            .unwrap();

        let cookies: Vec<_> = response.get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(cookies, vec!["session=x", "a=1"]);
    }

    #[test]
    fn test_registry_builtins() {
        let mut registry = ProcessorRegistry::new();
        assert_eq!(registry.names(), vec!["append", "default"]);
        assert!(registry.get("missing").is_none());

        registry.register("custom", Arc::new(SetHeaders));
        assert!(registry.get("custom").is_some());
    }
}
