use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// JWT secret key for signing tokens
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    #[serde(default = "default_access_ttl_seconds")]
    pub access_ttl_seconds: i64,

    /// Refresh token lifetime in seconds
    #[serde(default = "default_refresh_ttl_seconds")]
    pub refresh_ttl_seconds: i64,

    /// bcrypt cost factor for password hashing
    #[serde(default = "default_password_hash_cost")]
    pub password_hash_cost: u32,

    /// Failed login attempts before an account is locked out
    #[serde(default = "default_login_lockout_threshold")]
    pub login_lockout_threshold: u32,

    /// Window over which failed login attempts are counted, in seconds
    #[serde(default = "default_login_lockout_window_seconds")]
    pub login_lockout_window_seconds: u64,

    /// How long an account stays locked once the threshold is hit, in seconds
    #[serde(default = "default_login_lockout_duration_seconds")]
    pub login_lockout_duration_seconds: u64,

    /// Grace period past a visit's scheduled end before the expiry sweeper
    /// transitions it to `expired`, in seconds
    #[serde(default = "default_visit_expiry_grace_seconds")]
    pub visit_expiry_grace_seconds: i64,

    /// How often the expiry sweeper runs, in seconds
    #[serde(default = "default_expiry_sweep_interval_seconds")]
    pub expiry_sweep_interval_seconds: u64,

    /// How long read notifications are retained before the retention
    /// sweeper deletes them, in days
    #[serde(default = "default_notification_retention_days")]
    pub notification_retention_days: i64,

    /// Global HTTP rate limit window, in seconds
    #[serde(default = "default_rate_limit_window_seconds")]
    pub rate_limit_window_seconds: u64,

    /// Global HTTP rate limit, max requests per window per IP
    #[serde(default = "default_rate_limit_max_requests")]
    pub rate_limit_max_requests: u32,

    /// Comma-separated list of allowed CORS origins
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,

    /// Optional Redis URL; enables the distributed rate-limit/lockout
    /// backend. Falls back to an in-memory backend when absent.
    pub redis_url: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_access_ttl_seconds() -> i64 {
    900 // 15 minutes
}
fn default_refresh_ttl_seconds() -> i64 {
    604_800 // 7 days
}
fn default_password_hash_cost() -> u32 {
    12
}
fn default_login_lockout_threshold() -> u32 {
    5
}
fn default_login_lockout_window_seconds() -> u64 {
    900
}
fn default_login_lockout_duration_seconds() -> u64 {
    900
}
fn default_visit_expiry_grace_seconds() -> i64 {
    7200 // 2 hours
}
fn default_expiry_sweep_interval_seconds() -> u64 {
    300 // 5 minutes
}
fn default_notification_retention_days() -> i64 {
    30
}
fn default_rate_limit_window_seconds() -> u64 {
    900
}
fn default_rate_limit_max_requests() -> u32 {
    100
}
fn default_cors_origins() -> String {
    "*".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    4500
}

impl Config {
    /// Load configuration from environment variables (and a `.env` file, if present)
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let dotenv_result = dotenvy::dotenv();
        tracing::debug!("dotenv load result: {:?}", dotenv_result);

        let builder = config::Config::builder()
            .set_default("database_url", "")?
            .set_default("jwt_secret", "")?
            .set_default("access_ttl_seconds", default_access_ttl_seconds())?
            .set_default("refresh_ttl_seconds", default_refresh_ttl_seconds())?
            .set_default("password_hash_cost", default_password_hash_cost())?
            .set_default("login_lockout_threshold", default_login_lockout_threshold())?
            .set_default("login_lockout_window_seconds", default_login_lockout_window_seconds())?
            .set_default(
                "login_lockout_duration_seconds",
                default_login_lockout_duration_seconds(),
            )?
            .set_default("visit_expiry_grace_seconds", default_visit_expiry_grace_seconds())?
            .set_default(
                "expiry_sweep_interval_seconds",
                default_expiry_sweep_interval_seconds(),
            )?
            .set_default("notification_retention_days", default_notification_retention_days())?
            .set_default("rate_limit_window_seconds", default_rate_limit_window_seconds())?
            .set_default("rate_limit_max_requests", default_rate_limit_max_requests())?
            .set_default("cors_origins", default_cors_origins())?
            .set_default("host", default_host())?
            .set_default("port", default_port())?
            .add_source(config::Environment::default());

        let built = builder.build()?;
        let deserialized = built.try_deserialize::<Config>()?;
        tracing::debug!(port = deserialized.port, "configuration loaded");

        Ok(deserialized)
    }

    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect()
    }
}
