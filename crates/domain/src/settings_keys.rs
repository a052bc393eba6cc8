//! Settings key constants
//!
//! Centralized location for the string keys used to resolve credentials and
//! identifiers from a [`SettingsProvider`]-style source, and their
//! environment-variable counterparts.

pub const EMAIL: &str = "cloudflare_email";
pub const API_KEY: &str = "cloudflare_api_key";
pub const TOKEN: &str = "cloudflare_token";
pub const ZONE_ID: &str = "cloudflare_zone_id";
pub const ACCOUNT_ID: &str = "cloudflare_account_id";

// Environment variables (take priority over any backing store)
pub const ENV_EMAIL: &str = "CLOUDFLARE_EMAIL";
pub const ENV_API_KEY: &str = "CLOUDFLARE_API_KEY";
pub const ENV_TOKEN: &str = "CLOUDFLARE_TOKEN";
pub const ENV_ZONE_ID: &str = "CLOUDFLARE_ZONE_ID";
pub const ENV_ACCOUNT_ID: &str = "CLOUDFLARE_ACCOUNT_ID";
pub const ENV_CACHE_TTL: &str = "CLOUDFLARE_CACHE_TTL";
