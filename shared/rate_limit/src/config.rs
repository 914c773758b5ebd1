//! Rate limiting configuration

use serde::{Deserialize, Serialize};

/// Rate limit configuration.
///
/// SafeGuard only needs two rate-limited surfaces: the global HTTP request
/// rate and the login lockout (handled by [`crate::lockout::AccountLockout`]
/// on top of the same limiter). Both are driven by this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Redis URL for distributed rate limiting (optional, falls back to in-memory)
    pub redis_url: Option<String>,

    /// Global API rate limit: max requests per window, per client IP
    #[serde(default = "default_global_max_requests")]
    pub global_max_requests: u32,
    #[serde(default = "default_global_window_seconds")]
    pub global_window_seconds: u64,

    /// Login lockout threshold (failed attempts before lockout)
    #[serde(default = "default_lockout_threshold")]
    pub lockout_threshold: u32,
    /// Window over which failed attempts are counted
    #[serde(default = "default_lockout_window_seconds")]
    pub lockout_window_seconds: u64,
    /// Duration an account stays locked once the threshold is hit
    #[serde(default = "default_lockout_duration_seconds")]
    pub lockout_duration_seconds: u64,

    /// Enable rate limiting (can be disabled for testing)
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Trusted IPs that bypass rate limiting (comma-separated)
    #[serde(default)]
    pub trusted_ips: Option<String>,
}

fn default_global_max_requests() -> u32 {
    100
}
fn default_global_window_seconds() -> u64 {
    60
}
fn default_lockout_threshold() -> u32 {
    5
}
fn default_lockout_window_seconds() -> u64 {
    900 // 15 minutes
}
fn default_lockout_duration_seconds() -> u64 {
    900 // 15 minutes
}
fn default_enabled() -> bool {
    true
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            global_max_requests: default_global_max_requests(),
            global_window_seconds: default_global_window_seconds(),
            lockout_threshold: default_lockout_threshold(),
            lockout_window_seconds: default_lockout_window_seconds(),
            lockout_duration_seconds: default_lockout_duration_seconds(),
            enabled: default_enabled(),
            trusted_ips: None,
        }
    }
}

impl RateLimitConfig {
    /// Get trusted IPs as a vector
    pub fn get_trusted_ips(&self) -> Vec<String> {
        self.trusted_ips
            .as_ref()
            .map(|s| {
                s.split(',')
                    .map(|ip| ip.trim().to_string())
                    .filter(|ip| !ip.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Check if an IP is trusted
    pub fn is_trusted_ip(&self, ip: &str) -> bool {
        self.get_trusted_ips().contains(&ip.to_string())
    }
}
