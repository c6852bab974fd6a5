// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read once at startup into a [`Config`] value and handed to
//! the components that need it. A `.env` file in the working directory is
//! loaded first when present.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `DATA_DIR` | Directory holding the database file | `./data` |
//! | `MODE` | `debug` or `production` (no Swagger UI in production) | `debug` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `TLS_CERT_PATH` | PEM certificate chain; enables HTTPS with `TLS_KEY_PATH` | unset |
//! | `TLS_KEY_PATH` | PEM private key | unset |
//! | `AUTH_SECRET` | Access-token signing secret | Required |
//! | `AUTH_SALT` | Server-wide password hashing salt | Required |
//! | `AUTH_ACCESS_TOKEN_TTL` | Access-token lifetime in seconds | `900` |
//! | `AUTH_REFRESH_TOKEN_TTL` | Refresh-token lifetime in seconds | `2592000` |

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const DATA_DIR_ENV: &str = "DATA_DIR";
pub const MODE_ENV: &str = "MODE";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const AUTH_SECRET_ENV: &str = "AUTH_SECRET";
pub const AUTH_SALT_ENV: &str = "AUTH_SALT";
pub const AUTH_ACCESS_TOKEN_TTL_ENV: &str = "AUTH_ACCESS_TOKEN_TTL";
pub const AUTH_REFRESH_TOKEN_TTL_ENV: &str = "AUTH_REFRESH_TOKEN_TTL";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;
const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    PartialTls,
}

/// Deployment mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Debug,
    Production,
}

impl Mode {
    pub fn is_production(self) -> bool {
        self == Mode::Production
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Mode::Debug),
            "production" => Ok(Mode::Production),
            other => Err(format!("unknown mode {other:?} (expected debug or production)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsPaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub host: IpAddr,
    pub port: u16,
    pub tls: Option<TlsPaths>,
}

impl HttpSettings {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Secrets and lifetimes used by the auth service.
#[derive(Clone)]
pub struct AuthSettings {
    pub secret: String,
    pub salt: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http: HttpSettings,
    pub data_dir: PathBuf,
    pub mode: Mode,
    pub log_format: LogFormat,
    pub auth: AuthSettings,
}

impl Config {
    /// Load configuration from the process environment (after `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = match var(HOST_ENV) {
            Some(raw) => parse(HOST_ENV, &raw)?,
            None => parse(HOST_ENV, DEFAULT_HOST)?,
        };
        let port = match var(PORT_ENV) {
            Some(raw) => parse(PORT_ENV, &raw)?,
            None => DEFAULT_PORT,
        };
        let tls = match (var(TLS_CERT_PATH_ENV), var(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some(TlsPaths {
                cert: cert.into(),
                key: key.into(),
            }),
            (None, None) => None,
            _ => return Err(ConfigError::PartialTls),
        };

        let mode = match var(MODE_ENV) {
            Some(raw) => raw.parse().map_err(|reason| ConfigError::Invalid {
                name: MODE_ENV,
                value: raw.clone(),
                reason,
            })?,
            None => Mode::default(),
        };
        let log_format = match var(LOG_FORMAT_ENV).as_deref() {
            Some("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let auth = AuthSettings {
            secret: var(AUTH_SECRET_ENV).ok_or(ConfigError::Missing(AUTH_SECRET_ENV))?,
            salt: var(AUTH_SALT_ENV).ok_or(ConfigError::Missing(AUTH_SALT_ENV))?,
            access_token_ttl: ttl(
                AUTH_ACCESS_TOKEN_TTL_ENV,
                var(AUTH_ACCESS_TOKEN_TTL_ENV),
                DEFAULT_ACCESS_TOKEN_TTL_SECS,
            )?,
            refresh_token_ttl: ttl(
                AUTH_REFRESH_TOKEN_TTL_ENV,
                var(AUTH_REFRESH_TOKEN_TTL_ENV),
                DEFAULT_REFRESH_TOKEN_TTL_SECS,
            )?,
        };

        Ok(Self {
            http: HttpSettings { host, port, tls },
            data_dir: var(DATA_DIR_ENV)
                .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())
                .into(),
            mode,
            log_format,
            auth,
        })
    }
}

fn parse<T>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

fn ttl(name: &'static str, raw: Option<String>, default_secs: i64) -> Result<Duration, ConfigError> {
    let secs = match raw {
        Some(raw) => parse::<i64>(name, &raw)?,
        None => default_secs,
    };
    if secs <= 0 {
        return Err(ConfigError::Invalid {
            name,
            value: secs.to_string(),
            reason: "must be a positive number of seconds".to_string(),
        });
    }
    Ok(Duration::seconds(secs))
}
