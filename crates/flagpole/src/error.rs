use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlagpoleError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("flag not found: {0}")]
    FlagNotFound(String),
    #[error("failed to fetch rules: {message}")]
    FetchRules {
        message: String,
        status: Option<u16>,
    },
    #[error("invalid rules document: {0}")]
    InvalidRules(String),
}

impl FlagpoleError {
    pub fn fetch(message: impl Into<String>, status: Option<u16>) -> Self {
        FlagpoleError::FetchRules {
            message: message.into(),
            status,
        }
    }
}

impl From<reqwest::Error> for FlagpoleError {
    fn from(error: reqwest::Error) -> Self {
        FlagpoleError::FetchRules {
            status: error.status().map(|s| s.as_u16()),
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for FlagpoleError {
    fn from(error: serde_json::Error) -> Self {
        FlagpoleError::InvalidRules(error.to_string())
    }
}
