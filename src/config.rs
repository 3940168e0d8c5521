use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";
const DEFAULT_API_TIMEOUT_SECS: u64 = 20;
const DEFAULT_MIRROR_BACKEND: &str = "file";
const DEFAULT_MIRROR_DIR: &str = ".watchstore";
const DEFAULT_TOUCHED_TTL_SECS: u64 = 30;
const DEFAULT_PAGE_SIZE: u64 = 10;
const DEFAULT_VNPAY_PAYMENT_URL: &str = "https://sandbox.vnpayment.vn/paymentv2/vpcpay.html";
const DEFAULT_VNPAY_RETURN_URL: &str = "http://localhost:3000/payment/vnpay-return";
const DEFAULT_VNPAY_EXPIRE_MINUTES: i64 = 15;
const SANDBOX_HASH_SECRET_HINT: &str = "sandbox";

/// Remote API client configuration
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the store backend, without a trailing slash
    #[validate(url)]
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[validate(range(min = 1, max = 120))]
    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_base_url(),
            timeout_secs: default_api_timeout_secs(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

/// Durable mirror configuration
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct MirrorConfig {
    /// Backend to use: "file" or "in-memory"
    #[serde(default = "default_mirror_backend")]
    #[validate(custom = "validate_mirror_backend")]
    pub backend: String,

    /// Directory for the file backend
    #[serde(default = "default_mirror_dir")]
    pub dir: String,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            backend: default_mirror_backend(),
            dir: default_mirror_dir(),
        }
    }
}

/// Entity store tuning
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct StoreTuning {
    /// How long a touched record stays pinned to the top of its list,
    /// in seconds. Expiry is coarse: a periodic sweep clears the whole
    /// touched set at this interval.
    #[validate(range(min = 1, max = 3600))]
    #[serde(default = "default_touched_ttl_secs")]
    pub touched_ttl_secs: u64,

    /// Default page size for list views
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

impl Default for StoreTuning {
    fn default() -> Self {
        Self {
            touched_ttl_secs: default_touched_ttl_secs(),
            page_size: default_page_size(),
        }
    }
}

/// VNPay gateway configuration
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct VnpayConfig {
    /// Merchant terminal code issued by VNPay
    #[serde(default)]
    pub tmn_code: String,

    /// HMAC-SHA512 secret shared with VNPay
    #[serde(default)]
    pub hash_secret: String,

    /// Hosted payment page URL
    #[validate(url)]
    #[serde(default = "default_vnpay_payment_url")]
    pub payment_url: String,

    /// URL the gateway redirects the shopper back to
    #[validate(url)]
    #[serde(default = "default_vnpay_return_url")]
    pub return_url: String,

    /// Minutes before an issued payment URL expires
    #[validate(range(min = 1, max = 60))]
    #[serde(default = "default_vnpay_expire_minutes")]
    pub expire_minutes: i64,
}

impl Default for VnpayConfig {
    fn default() -> Self {
        Self {
            tmn_code: String::new(),
            hash_secret: String::new(),
            payment_url: default_vnpay_payment_url(),
            return_url: default_vnpay_return_url(),
            expire_minutes: default_vnpay_expire_minutes(),
        }
    }
}

impl VnpayConfig {
    /// True when both merchant credentials are present.
    pub fn is_configured(&self) -> bool {
        !self.tmn_code.trim().is_empty() && !self.hash_secret.trim().is_empty()
    }
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Remote API client configuration
    #[serde(default)]
    #[validate]
    pub api: ApiConfig,

    /// Durable mirror configuration
    #[serde(default)]
    #[validate]
    pub mirror: MirrorConfig,

    /// Entity store tuning
    #[serde(default)]
    #[validate]
    pub store: StoreTuning,

    /// VNPay gateway configuration
    #[serde(default)]
    #[validate]
    pub vnpay: VnpayConfig,

    /// Display currency code
    #[serde(default = "default_currency")]
    pub default_currency: String,

    /// Notice channel capacity
    #[serde(default = "default_notice_channel_capacity")]
    #[validate(custom = "validate_notice_channel_capacity")]
    pub notice_channel_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            api: ApiConfig::default(),
            mirror: MirrorConfig::default(),
            store: StoreTuning::default(),
            vnpay: VnpayConfig::default(),
            default_currency: default_currency(),
            notice_channel_capacity: default_notice_channel_capacity(),
        }
    }
}

impl AppConfig {
    /// Checks if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Per-request timeout as a Duration
    pub fn api_timeout(&self) -> std::time::Duration {
        self.api.timeout()
    }

    /// Touched-record pin lifetime as a Duration
    pub fn touched_ttl(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.store.touched_ttl_secs)
    }

    fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.is_production() && !self.vnpay.is_configured() {
            let mut err = ValidationError::new("vnpay_credentials_required");
            err.message = Some(
                "Set APP__VNPAY__TMN_CODE and APP__VNPAY__HASH_SECRET for production environments"
                    .into(),
            );
            errors.add("vnpay", err);
        }

        if self.is_production()
            && self
                .vnpay
                .hash_secret
                .to_ascii_lowercase()
                .contains(SANDBOX_HASH_SECRET_HINT)
        {
            let mut err = ValidationError::new("vnpay_sandbox_secret");
            err.message =
                Some("The sandbox hash secret must not be used outside development".into());
            errors.add("vnpay", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_api_timeout_secs() -> u64 {
    DEFAULT_API_TIMEOUT_SECS
}

fn default_mirror_backend() -> String {
    DEFAULT_MIRROR_BACKEND.to_string()
}

fn default_mirror_dir() -> String {
    DEFAULT_MIRROR_DIR.to_string()
}

fn default_touched_ttl_secs() -> u64 {
    DEFAULT_TOUCHED_TTL_SECS
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

fn default_vnpay_payment_url() -> String {
    DEFAULT_VNPAY_PAYMENT_URL.to_string()
}

fn default_vnpay_return_url() -> String {
    DEFAULT_VNPAY_RETURN_URL.to_string()
}

fn default_vnpay_expire_minutes() -> i64 {
    DEFAULT_VNPAY_EXPIRE_MINUTES
}

fn default_currency() -> String {
    "VND".to_string()
}

fn default_notice_channel_capacity() -> usize {
    64
}

fn validate_mirror_backend(value: &str) -> Result<(), ValidationError> {
    match value.to_ascii_lowercase().as_str() {
        "file" | "in-memory" => Ok(()),
        _ => {
            let mut err = ValidationError::new("mirror_backend");
            err.message = Some("Must be one of: file, in-memory".into());
            Err(err)
        }
    }
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_notice_channel_capacity(capacity: usize) -> Result<(), ValidationError> {
    if capacity == 0 {
        let mut err = ValidationError::new("notice_channel_capacity");
        err.message = Some("notice_channel_capacity must be greater than 0".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::fmt;

    let default_directive = format!("watchstore_core={}", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt().with_env_filter(filter_directive).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter_directive).try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Default config (config/default.toml)
/// 2. Environment-specific config (config/{env}.toml)
/// 3. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration security validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}
