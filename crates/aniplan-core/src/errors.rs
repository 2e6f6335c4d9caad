use std::path::PathBuf;

/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the dispatcher
/// can turn every failure into a user-facing message.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid registry file: {path}: {reason}")]
    InvalidRegistry { path: PathBuf, reason: String },

    #[error("need at least 2 users, got {found}")]
    InsufficientIdentities { found: usize },

    #[error("at most {max} users can be compared, got {found}")]
    TooManyIdentities { max: usize, found: usize },

    #[error("error fetching data for user {username}: {detail}")]
    Remote { username: String, detail: String },

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
