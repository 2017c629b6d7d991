//! Authentication module for managing the client session.
//!
//! This module provides:
//! - `Session`: the in-memory auth state (resolved flag + identity)
//! - `Profile`: the signed-in user's identity as returned by the backend
//! - `AuthController`: the single owner of the session, with `initialize`,
//!   `login` and `logout`
//!
//! The controller writes through to the persisted session record so a
//! restart rehydrates the same session.

pub mod controller;
pub mod session;

pub use controller::{AuthController, LoginError, LOGIN_FALLBACK_MESSAGE};
pub use session::{AuthStatus, Identity, Profile, Session};
