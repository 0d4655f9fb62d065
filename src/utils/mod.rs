//! Utility functions and helper modules.
//!
//! This module contains the path normalization and grouping core along
//! with request-info extraction and display formatting helpers.

pub mod format;
pub mod http;
pub mod route;

pub use format::*;
pub use http::*;
pub use route::*;
