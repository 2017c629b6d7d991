//! Core library for the DG Space services portal client.
//!
//! The session subsystem lives here: the persisted session record, the
//! auth state controller, the HTTP gateway that keeps every backend call
//! authenticated, and the route guard built on top of them.
//!
//! Startup order matters: construct one `AuthController`, await
//! `initialize()`, and let a `RouteGuard` decide what each navigation
//! renders. The guard shows a waiting state until initialization resolves.

pub mod api;
pub mod auth;
pub mod config;
pub mod routing;
pub mod storage;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthController, AuthStatus, LoginError, Profile, Session};
pub use config::Config;
pub use routing::{GuardDecision, Navigator, Route, RouteGuard};
pub use storage::SessionStore;
