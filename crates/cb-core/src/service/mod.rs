//! # Services
//!
//! Use-case orchestration on top of the port traits. Handlers in `cb-api`
//! call into these and never touch a repository directly.

mod auth;
mod complaint;

pub use auth::{AuthService, SignupInput};
pub use complaint::{ComplaintService, NewComplaint, RankedListing, StatusChange};
