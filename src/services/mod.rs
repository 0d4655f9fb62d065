//! Business logic and service layer modules.
//!
//! This module contains the core business logic of the application,
//! including the monitoring backend client, endpoint analytics, metrics
//! collection, and rate limiting.

pub mod backend;
pub mod endpoints;
pub mod metrics;
pub mod rate_limit;
pub mod sample;

pub use backend::*;
pub use endpoints::*;
pub use metrics::*;
pub use rate_limit::*;
pub use sample::*;
