use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    pub tls: Option<TlsConfig>,
    pub log: LogConfig,
    pub tap_bank: TapBankConfig,
    pub cors_origins: Vec<String>,
    pub bootstrap_superuser: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    pub algorithm: String,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub private_key_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
    pub path: Option<PathBuf>,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct TapBankConfig {
    pub base_url: String,
    pub api_token: String,
    pub timeout: Duration,
    pub callback_url: String,
    pub return_url: String,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = get_env("API_HOST")?;
        let port: u16 = get_env_parse("API_PORT")?;

        let tls = match (get_env_opt("SSL_CERT_PATH"), get_env_opt("SSL_PRIVATE_KEY_PATH")) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: cert.into(),
                private_key_path: key.into(),
            }),
            (None, None) => None,
            _ => {
                return Err(Error::Config(
                    "SSL_CERT_PATH and SSL_PRIVATE_KEY_PATH must be set together".to_string(),
                ))
            }
        };

        let base_url = get_env("TAP_BANK_BASE_URL")?;
        url::Url::parse(&base_url)
            .map_err(|e| Error::Config(format!("Invalid value for TAP_BANK_BASE_URL: {}", e)))?;

        Ok(Self {
            server_address: format!("{}:{}", host, port),
            database_url: database_url_from_env()?,
            db_max_connections: get_env_parse_or("DB_MAX_CONNECTIONS", 20)?,
            jwt: JwtConfig {
                private_key_path: get_env("JWT_PRIVATE_KEY_PATH")?.into(),
                public_key_path: get_env("JWT_PUBLIC_KEY_PATH")?.into(),
                algorithm: get_env("JWT_ALGORITHM")?,
                access_token_expire_minutes: get_env_parse("ACCESS_TOKEN_EXPIRE_MINUTES")?,
                refresh_token_expire_minutes: get_env_parse("REFRESH_TOKEN_EXPIRE_MINUTES")?,
            },
            tls,
            log: LogConfig {
                level: get_env_opt("LOG_LVL").unwrap_or_else(|| "info".to_string()),
                json: get_env_opt("LOG_FORMAT").is_some_and(|f| f.eq_ignore_ascii_case("json")),
                path: get_env_opt("LOGS_PATH").map(PathBuf::from),
                name: get_env_opt("LOG_NAME").unwrap_or_else(|| "salt-backend.log".to_string()),
            },
            tap_bank: TapBankConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                api_token: get_env("TAP_BANK_API_TOKEN")?,
                timeout: Duration::from_secs(get_env_parse_or("TAP_BANK_TIMEOUT_SECS", 30)?),
                callback_url: get_env_opt("TAP_BANK_CALLBACK_URL").unwrap_or_default(),
                return_url: get_env_opt("TAP_BANK_RETURN_URL")
                    .unwrap_or_else(|| "https://your-shop.com".to_string()),
            },
            cors_origins: parse_list(
                &get_env_opt("CORS_ORIGINS").unwrap_or_else(|| "http://localhost:8000".to_string()),
            ),
            bootstrap_superuser: get_env_opt("BOOTSTRAP_SUPERUSER"),
        })
    }
}

/// `DATABASE_URL` wins; otherwise the URL is assembled from the `DB_*` parts.
fn database_url_from_env() -> Result<String> {
    if let Some(url) = get_env_opt("DATABASE_URL") {
        return Ok(url);
    }
    Ok(format!(
        "postgres://{}:{}@{}:{}/{}",
        get_env("DB_USER")?,
        get_env("DB_PASS")?,
        get_env("DB_HOST")?,
        get_env("DB_PORT")?,
        get_env("DB_NAME")?,
    ))
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_parse<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name)?;
    parse_value(name, &raw)
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_opt(name) {
        Some(raw) => parse_value(name, &raw),
        None => Ok(default),
    }
}

fn parse_value<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e)))
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_list_skips_blanks() {
        assert_eq!(
            parse_list(" http://a.test, ,http://b.test,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn parse_value_reports_variable_name() {
        let err = parse_value::<u16>("API_PORT", "eighty").unwrap_err();
        assert!(err.to_string().contains("API_PORT"));

        let port: u16 = parse_value("API_PORT", " 8080 ").unwrap();
        assert_eq!(port, 8080);
    }
}
