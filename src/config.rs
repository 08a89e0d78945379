/*
 * Responsibility
 * - 環境変数や設定の読み込み (DATABASE_URL, JWT_KEY, JWT_EXPIRATION など)
 * - 設定値のバリデーション (不足なら起動失敗)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        match std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub database_url: String,
    pub db_max_connections: u32,

    // HS256 signing secret; loaded once and handed to TokenCodec
    pub jwt_key: String,
    pub jwt_expiration: Duration,

    pub request_timeout: Duration,
    pub body_limit_bytes: usize,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print the signing secret or database credentials
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("app_env", &self.app_env)
            .field("db_max_connections", &self.db_max_connections)
            .field("jwt_expiration", &self.jwt_expiration)
            .field("request_timeout", &self.request_timeout)
            .field("body_limit_bytes", &self.body_limit_bytes)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let port: u16 = std::env::var("API_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8080);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("API_PORT"))?;

        let app_env = AppEnv::from_env();

        let database_url = database_url_from_env()?;

        let db_max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(100);

        let jwt_key = std::env::var("JWT_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::Missing("JWT_KEY"))?;

        let jwt_expiration = match std::env::var("JWT_EXPIRATION") {
            Ok(raw) if !raw.trim().is_empty() => {
                parse_duration(&raw).ok_or(ConfigError::Invalid("JWT_EXPIRATION"))?
            }
            _ => Duration::from_secs(24 * 60 * 60),
        };
        if jwt_expiration.as_secs() == 0 {
            return Err(ConfigError::Invalid("JWT_EXPIRATION"));
        }

        let request_timeout = std::env::var("REQUEST_TIMEOUT_SECONDS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        let body_limit_bytes = std::env::var("BODY_LIMIT_BYTES")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(1024 * 1024);

        Ok(Self {
            addr,
            app_env,
            database_url,
            db_max_connections,
            jwt_key,
            jwt_expiration,
            request_timeout,
            body_limit_bytes,
        })
    }
}

// DATABASE_URL wins; otherwise assemble one from the DB_* parts.
fn database_url_from_env() -> Result<String, ConfigError> {
    if let Ok(url) = std::env::var("DATABASE_URL")
        && !url.trim().is_empty()
    {
        return Ok(url);
    }

    let part = |key: &'static str| std::env::var(key).ok().filter(|v| !v.is_empty());

    match (
        part("DB_HOST"),
        part("DB_USER"),
        part("DB_PASSWORD"),
        part("DB_NAME"),
    ) {
        (Some(host), Some(user), Some(password), Some(name)) => {
            let port = part("DB_PORT").unwrap_or_else(|| "5432".to_string());
            Ok(format!(
                "postgres://{user}:{password}@{host}:{port}/{name}"
            ))
        }
        _ => Err(ConfigError::Missing("DATABASE_URL")),
    }
}

/// Parse a duration string such as `24h`, `90m`, `1h30m`, `3600s` or `500ms`.
///
/// Returns `None` for an empty string, a missing unit, or an unknown unit.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let mut total = Duration::ZERO;
    let mut rest = s;

    while !rest.is_empty() {
        let digits = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if digits == 0 {
            return None;
        }
        let value: u64 = rest[..digits].parse().ok()?;
        rest = &rest[digits..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];

        let part = match unit {
            "ms" => Duration::from_millis(value),
            "s" => Duration::from_secs(value),
            "m" => Duration::from_secs(value.checked_mul(60)?),
            "h" => Duration::from_secs(value.checked_mul(60 * 60)?),
            _ => return None,
        };
        total = total.checked_add(part)?;
    }

    Some(total)
}
