//! # api-adapters
//!
//! The web routing and orchestration layer: every route is "resolve the
//! session, then authorize-and-act through a service". All HTTP surface
//! lives behind the `web-axum` feature.

#[cfg(feature = "web-axum")]
pub mod error;
#[cfg(feature = "web-axum")]
pub mod handlers;
#[cfg(feature = "web-axum")]
pub mod middleware;
#[cfg(feature = "web-axum")]
pub mod session;

#[cfg(feature = "web-axum")]
mod state;

#[cfg(feature = "web-axum")]
pub use session::CookiePolicy;
#[cfg(feature = "web-axum")]
pub use state::{AppState, Ports};

#[cfg(feature = "web-axum")]
pub use handlers::router;
