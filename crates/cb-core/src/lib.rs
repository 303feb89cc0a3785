//! complaint-box/crates/cb-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Complaint Box:
//! models, ports, the priority scorer and the admin ranking pass.

pub mod error;
pub mod models;
pub mod priority;
pub mod ranking;
pub mod service;
pub mod traits;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
