//! REST API gateway for the portal backend.
//!
//! This module provides the `ApiClient` through which every backend call
//! is made. It attaches the stored bearer credential to outgoing requests
//! and ends the session when the backend rejects that credential.

pub mod client;
pub mod error;

pub use client::{ApiClient, LoginResponse, SessionHooks, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use error::ApiError;
