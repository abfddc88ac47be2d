//! Middleware for the loanbook API
//!
//! This module provides middleware for request tracing, security headers,
//! and caller identity extraction.

pub mod identity;
mod security;
mod tracing;

pub use identity::CallerIdentity;
pub use security::security_headers;
pub use tracing::request_tracing;
