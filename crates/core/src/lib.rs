//! # Cloudgate Core
//!
//! Port/adapter interfaces for the Cloudflare gateway.
//!
//! This crate contains:
//! - Infrastructure ports (traits) for settings and cache backends
//!
//! ## Architecture Principles
//! - Only depends on `cloudgate-domain`
//! - No HTTP, cache-store, or platform code
//! - All external collaborators reach the gateway via these traits

pub mod cache_ports;
pub mod settings_ports;

pub use cache_ports::CacheStore;
pub use settings_ports::SettingsProvider;
