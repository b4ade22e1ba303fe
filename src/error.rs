use thiserror::Error;

pub type Result<T> = std::result::Result<T, LottoError>;

#[derive(Error, Debug)]
pub enum LottoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database schema not found in {0}; run `lotto setup` first")]
    SetupRequired(String),

    #[error("Invalid {field}: {input:?} ({reason})")]
    Validation {
        field: &'static str,
        input: String,
        reason: String,
    },

    #[error("Drawing fetch failed: {0}")]
    Fetch(String),

    #[error("No prize entry for {matches} matches (bonus: {bonus})")]
    PrizeTable { matches: usize, bonus: bool },

    #[error("Notification error: {0}")]
    Notify(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LottoError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn validation(
        field: &'static str,
        input: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Validation {
            field,
            input: input.into(),
            reason: reason.into(),
        }
    }

    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    pub fn notify(msg: impl Into<String>) -> Self {
        Self::Notify(msg.into())
    }
}

impl From<reqwest::Error> for LottoError {
    fn from(err: reqwest::Error) -> Self {
        LottoError::Fetch(err.to_string())
    }
}
