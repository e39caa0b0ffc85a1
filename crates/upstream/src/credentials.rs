//! Account credential bundles
//!
//! One bundle per pooled account, loaded from the accounts list at startup
//! and immutable afterwards. Password and TOTP seed are wrapped in
//! `common::Secret` so Debug/log output never leaks them.

use common::Secret;
use serde::Deserialize;
use std::path::PathBuf;

/// Credentials for one upstream account.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountCredentials {
    /// Primary login identifier (username or email).
    pub auth_info_1: String,
    /// Secondary identifier, required by some login flows (e.g. phone).
    #[serde(default)]
    pub auth_info_2: Option<String>,
    pub password: Secret<String>,
    /// Persisted session cookies; login reuses these when present.
    #[serde(default)]
    pub cookies_file: Option<PathBuf>,
    /// Per-account egress proxy URL (http, https, or socks5).
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default)]
    pub totp_secret: Option<Secret<String>>,
}
