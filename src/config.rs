use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{LottoError, Result};

pub const DEFAULT_DB_PATH: &str = "data/db/lotto.db";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: PathBuf,
    pub http_timeout: Duration,
    pub email_address: Option<String>,
    pub email_password: Option<String>,
}

pub fn load() -> Result<Config> {
    let database_path = env::var("LOTTO_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_PATH));

    let http_timeout = match env::var("LOTTO_HTTP_TIMEOUT_SECS") {
        Ok(raw) => Duration::from_secs(raw.trim().parse().map_err(|_| {
            LottoError::config(format!(
                "LOTTO_HTTP_TIMEOUT_SECS must be a number of seconds, got {:?}",
                raw
            ))
        })?),
        Err(_) => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
    };

    Ok(Config {
        database_path,
        http_timeout,
        email_address: env::var("EMAIL_SEND_ADDRESS").ok(),
        email_password: env::var("EMAIL_SEND_PASSWORD").ok(),
    })
}
