//! Configuration structures and loading utilities.
//!
//! This module contains all configuration structures used by the application,
//! including environment variable loading and default values.

pub mod backend;
pub mod metrics;
pub mod rate_limit;
pub mod security;
pub mod server;

pub use metrics::*;
pub use rate_limit::*;
pub use security::*;
pub use server::*;
