use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const UNKNOWN_MESSAGE_TYPE: &str = "Unknown message type";

/// JSON object answered to a message: `{success: true, ...}` or `{error: "..."}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Response(Map<String, Value>);

impl Response {
    pub fn success() -> Self {
        Self::default().with("success", true)
    }

    /// Bare error object, as used for unroutable messages.
    pub fn error(message: impl Into<String>) -> Self {
        Self::default().with("error", message.into())
    }

    /// Handler-level failure: `{success: false, error}`.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::default()
            .with("success", false)
            .with("error", message.into())
    }

    pub fn unknown_type() -> Self {
        Self::error(UNKNOWN_MESSAGE_TYPE)
    }

    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.0.insert(key.to_string(), value);
        self
    }

    pub fn is_success(&self) -> bool {
        self.0.get("success").and_then(Value::as_bool) == Some(true)
    }

    pub fn error_message(&self) -> Option<&str> {
        self.0.get("error").and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Typed view of one field; `None` when absent or of another shape.
    pub fn field<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.0.get(key).and_then(|value| T::deserialize(value).ok())
    }

    pub fn into_json(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Response {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
