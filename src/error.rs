use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Network error. Please try again later. ({0})")]
    Network(String),

    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    #[error("{0}")]
    Validation(String),

    #[error("Not logged in. Run `ledgerdesk login` first.")]
    NotLoggedIn,

    #[error("Access denied, redirected to {0}")]
    Redirect(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("updating {0} records is not supported by the server")]
    Unsupported(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Settings error: {0}")]
    Settings(String),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<reqwest::Error> for LedgerError {
    fn from(e: reqwest::Error) -> Self {
        Self::Network(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
