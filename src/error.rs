use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The service answered with an error envelope.
    #[error("{code}: {message}")]
    Remote { code: String, message: String },
    #[error("{endpoint} returned HTTP status {status}")]
    Http {
        endpoint: String,
        status: reqwest::StatusCode,
    },
    #[error("Invalid endpoint url")]
    Url(#[from] url::ParseError),
    #[error("{endpoint} request timed out")]
    Timeout { endpoint: String },
    #[error("{endpoint} request failed")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Unable to decode {endpoint} response")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid acquisition date spec '{0}', expected YYYY-MM-DD or YYYY-MM-DD,YYYY-MM-DD")]
    InvalidDateSpec(String),
    #[error("Login response did not carry an API key")]
    MissingApiKey,
    #[error("A username is required. Use --username or set EE_USERNAME")]
    MissingUsername,
    #[error("Unable to read password")]
    Prompt(#[source] std::io::Error),
}

impl ApiError {
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}
