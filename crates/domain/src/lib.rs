//! # Cloudgate Domain
//!
//! Business domain types and models for the Cloudflare gateway.
//!
//! This crate contains:
//! - Error taxonomy and `Result` definitions
//! - Wire-level domain types (rules, rulesets, pagination)
//! - Settings key constants
//!
//! ## Architecture
//! - No dependencies on other cloudgate crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod errors;
pub mod settings_keys;
pub mod types;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
