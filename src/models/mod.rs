//! Data models and schemas for the dashboard API.
//!
//! This module contains all the data structures used throughout the
//! application: endpoint records and groups, projects, request logs,
//! analytics rows and the standard endpoint responses.

pub mod analytics;
pub mod api;
pub mod endpoint;
pub mod project;
pub mod requests;

pub use analytics::*;
pub use api::*;
pub use endpoint::*;
pub use project::*;
pub use requests::*;
