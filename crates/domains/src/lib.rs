//! The central domain definitions for Clubhouse: entities, the port
//! traits adapters implement, and the shared error taxonomy.

pub mod error;
pub mod models;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
