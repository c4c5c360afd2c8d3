use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let otp_ttl_minutes = env::var("APP_OTP_TTL_MINUTES")
            .unwrap_or_else(|_| DEFAULT_OTP_TTL_MINUTES.to_string())
            .parse::<u32>()
            .ok()
            .filter(|minutes| *minutes > 0)
            .ok_or(ConfigError::InvalidOtpTtl)?;

        let bcrypt_cost = env::var("APP_BCRYPT_COST")
            .unwrap_or_else(|_| DEFAULT_BCRYPT_COST.to_string())
            .parse::<u32>()
            .ok()
            .filter(|cost| (MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(cost))
            .ok_or(ConfigError::InvalidBcryptCost)?;

        let min_password_length = env::var("APP_MIN_PASSWORD_LENGTH")
            .unwrap_or_else(|_| DEFAULT_MIN_PASSWORD_LENGTH.to_string())
            .parse::<usize>()
            .ok()
            .filter(|length| *length > 0)
            .ok_or(ConfigError::InvalidPasswordLength)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            auth: AuthConfig {
                otp_ttl_minutes,
                bcrypt_cost,
                min_password_length,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

pub const DEFAULT_OTP_TTL_MINUTES: u32 = 10;
pub const DEFAULT_BCRYPT_COST: u32 = 10;
pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 6;
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

/// Account, password, and one-time-code policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub otp_ttl_minutes: u32,
    pub bcrypt_cost: u32,
    pub min_password_length: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            otp_ttl_minutes: DEFAULT_OTP_TTL_MINUTES,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidOtpTtl,
    InvalidBcryptCost,
    InvalidPasswordLength,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidOtpTtl => {
                write!(f, "APP_OTP_TTL_MINUTES must be a positive number of minutes")
            }
            ConfigError::InvalidBcryptCost => write!(
                f,
                "APP_BCRYPT_COST must be between {MIN_BCRYPT_COST} and {MAX_BCRYPT_COST}"
            ),
            ConfigError::InvalidPasswordLength => {
                write!(f, "APP_MIN_PASSWORD_LENGTH must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidOtpTtl
            | ConfigError::InvalidBcryptCost
            | ConfigError::InvalidPasswordLength => None,
        }
    }
}
