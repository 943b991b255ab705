//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, trace and timeout layers)
//!     → middleware/response_headers.rs (resolve header list, run inner service)
//!     → static files or default responder
//!     → middleware/response_headers.rs (apply headers to the response)
//!     → Send to client
//! ```

pub mod middleware;
pub mod server;

pub use middleware::{with_response_headers, HeaderManager};
pub use server::HttpServer;
