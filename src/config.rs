use jsonwebtoken::Algorithm;
use std::env;
use std::fmt;
use std::str::FromStr;

const DEFAULT_EXPIRY_DAYS: i64 = 7;
const DEFAULT_BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

/// Errors raised while reading configuration at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    Missing(&'static str),
    /// A variable is set but its value cannot be used.
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, value, reason } => {
                write!(f, "{} has invalid value '{}': {}", key, value, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Settings for password hashing and token signing.
///
/// Passed explicitly into `TokenService` and `AuthService` so neither reads
/// the process environment.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared HMAC secret used to sign and verify tokens.
    pub jwt_secret: String,
    /// Signing algorithm. Restricted to the HMAC family.
    pub jwt_algorithm: Algorithm,
    /// Lifetime of an issued token, in days.
    pub jwt_expiry_days: i64,
    /// bcrypt cost factor (log2 of the round count).
    pub bcrypt_cost: u32,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            jwt_algorithm: Algorithm::HS256,
            jwt_expiry_days: DEFAULT_EXPIRY_DAYS,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }
}

pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub cors_origins: Vec<String>,
    pub auth: AuthConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let server_port = parse_or("SERVER_PORT", get("SERVER_PORT"), 8080u16)?;
        let server_host = get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let cors_origins = get("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().trim_end_matches('/').to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let jwt_secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let jwt_algorithm = match get("JWT_ALGORITHM") {
            Some(value) => parse_algorithm(&value)?,
            None => Algorithm::HS256,
        };
        let jwt_expiry_days = parse_or("JWT_EXPIRY_DAYS", get("JWT_EXPIRY_DAYS"), DEFAULT_EXPIRY_DAYS)?;
        if !(1..=3650).contains(&jwt_expiry_days) {
            return Err(ConfigError::Invalid {
                key: "JWT_EXPIRY_DAYS",
                value: jwt_expiry_days.to_string(),
                reason: "must be between 1 and 3650".into(),
            });
        }
        let bcrypt_cost = parse_or("BCRYPT_COST", get("BCRYPT_COST"), DEFAULT_BCRYPT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
                reason: "must be between 4 and 31".into(),
            });
        }

        Ok(Self {
            database_url,
            server_port,
            server_host,
            cors_origins,
            auth: AuthConfig {
                jwt_secret,
                jwt_algorithm,
                jwt_expiry_days,
                bcrypt_cost,
            },
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => {
            let parsed = value.trim().parse::<T>();
            parsed.map_err(|e| ConfigError::Invalid {
                key,
                reason: e.to_string(),
                value,
            })
        }
    }
}

fn parse_algorithm(value: &str) -> Result<Algorithm, ConfigError> {
    let invalid = |reason: &str| ConfigError::Invalid {
        key: "JWT_ALGORITHM",
        value: value.to_string(),
        reason: reason.to_string(),
    };
    match Algorithm::from_str(value.trim()) {
        Ok(alg @ (Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)) => Ok(alg),
        Ok(_) => Err(invalid("only HS256, HS384 and HS512 work with a shared secret")),
        Err(_) => Err(invalid("unknown algorithm")),
    }
}
