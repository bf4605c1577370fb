use serde::{Deserialize, Serialize};

/// Error body the backend sends alongside non-2xx statuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    /// Best-effort extraction of the server's message from a raw body.
    pub fn message_from_body(body: &str) -> Option<String> {
        serde_json::from_str::<ApiError>(body)
            .ok()
            .map(|parsed| parsed.error)
            .filter(|message| !message.trim().is_empty())
    }
}
