//! HTTP middleware.

pub mod response_headers;

pub use response_headers::{response_headers_middleware, with_response_headers, HeaderManager};
