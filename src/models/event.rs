use std::fmt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Invocation event as delivered by the platform
///
/// Only the body is used, every other field is kept so the event can be logged as received.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Event {
    pub body: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Event {
    pub fn new(body: String) -> Self {
        Self { body, extra: Map::new() }
    }
}

/// Implementation of the Display Trait for logging the event as JSON
impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => write!(f, "{:?}", self),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Response {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}
