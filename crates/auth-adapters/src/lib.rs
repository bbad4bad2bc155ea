//! # auth-adapters
//!
//! Argon2-based implementation of `CredentialVerifier` and an in-memory
//! `SessionStore` keyed by opaque random tokens.

mod session;
mod verifier;

pub use session::MemorySessionStore;
pub use verifier::Argon2Verifier;
