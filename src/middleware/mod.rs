//! Custom middleware implementations for the API.
//!
//! This module contains middleware for security headers, request IDs,
//! metrics collection, and other cross-cutting concerns.

pub mod metrics;
pub mod request_id;
pub mod security;

pub use metrics::*;
pub use request_id::*;
pub use security::*;
