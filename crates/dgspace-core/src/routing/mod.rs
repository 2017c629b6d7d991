//! Navigation and route guarding.
//!
//! - `Route`: the views of the portal and their paths
//! - `Navigator`: shared history with push/replace/back and hard redirects
//! - `RouteGuard`: decides per navigation whether a protected view renders,
//!   waits for the session to resolve, or redirects to login

pub mod guard;
pub mod navigator;
pub mod route;

pub use guard::{GuardDecision, RouteGuard};
pub use navigator::Navigator;
pub use route::Route;
