//! Marketplace Backend Library
//!
//! Exposes the authentication core and HTTP middleware for use by the
//! server binary and integration tests.

pub mod auth;
pub mod config;
pub mod middleware;
