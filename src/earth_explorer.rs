//! EarthExplorer JSON inventory service: login, search and download calls
mod client;
pub mod criteria;
mod dataset;

pub use client::EarthExplorer;
pub use criteria::{additional_criteria, temporal_criteria, RequestParams};
pub use dataset::Dataset;

use crate::error::ApiError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;

/// Opaque session key handed out by `login`.
pub type ApiKey = String;

pub trait InventoryApi {
    async fn login(self: &Self, credentials: &Credentials) -> Result<ApiKey, ApiError>;

    async fn search(self: &Self, params: &RequestParams) -> Result<SearchResults, ApiError>;

    async fn download(self: &Self, params: &RequestParams) -> Result<Value, ApiError>;
}

pub struct Credentials {
    pub username: String,
    password: Option<String>,
}

impl Credentials {
    pub fn new(username: &str, password: Option<String>) -> Self {
        Self {
            username: username.to_string(),
            password,
        }
    }

    /// Either flag or env var may supply the username; neither is an error.
    pub fn from_options(
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self, ApiError> {
        let username = username
            .filter(|u| !u.is_empty())
            .ok_or(ApiError::MissingUsername)?;
        Ok(Self { username, password })
    }

    /// Returns the stored password or prompts for it without echoing.
    pub fn password(self: &Self) -> Result<String, ApiError> {
        match &self.password {
            Some(password) => Ok(password.clone()),
            None => rpassword::prompt_password(format!("Password ({}): ", self.username))
                .map_err(ApiError::Prompt),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Every response is wrapped like this, `data` only meaningful when neither
/// error field is set.
#[derive(Deserialize, Debug, Default)]
pub struct Envelope {
    #[serde(rename = "errorCode", default)]
    error_code: Value,
    #[serde(default)]
    error: Value,
    #[serde(default)]
    data: Value,
}

impl Envelope {
    pub fn into_data(self) -> Result<Value, ApiError> {
        if is_truthy(&self.error_code) || is_truthy(&self.error) {
            return Err(ApiError::Remote {
                code: display_value(&self.error_code),
                message: display_value(&self.error),
            });
        }
        Ok(self.data)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SearchResults {
    #[serde(rename = "totalHits", default)]
    pub total_hits: u64,
    #[serde(default)]
    pub results: Vec<Scene>,
    /// Paging fields such as `nextRecord`, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Scene {
    #[serde(rename = "displayId")]
    pub display_id: String,
    /// Remote defined fields, passed through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
