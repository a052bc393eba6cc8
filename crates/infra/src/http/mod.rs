//! HTTP transport for the Cloudflare v4 API
//!
//! Contains the retrying REST client and the response envelope parser.

pub mod client;
pub mod response;

// Re-export commonly used items
pub use client::{CloudflareClient, RequestOptions, DEFAULT_BASE_URL};
pub use response::ApiResponse;
