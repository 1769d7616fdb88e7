//! Shared response envelope for API handlers.
//!
//! Successful responses are a flat JSON object carrying `"success": true`
//! next to the payload fields. Use [`Success`] instead of ad-hoc
//! `serde_json::json!` bodies.

use serde::Serialize;

/// `{ "success": true, ...T }` response envelope.
///
/// `T` must serialize as a JSON object; its fields are flattened in.
///
/// # Example
///
/// ```ignore
/// Ok(Json(Success::new(UserPayload { user })))
/// ```
#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
    success: bool,
    #[serde(flatten)]
    pub body: T,
}

impl<T: Serialize> Success<T> {
    pub fn new(body: T) -> Self {
        Self {
            success: true,
            body,
        }
    }
}

/// Payload with only a message.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Success<Self> {
        Success::new(Self {
            message: message.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Payload {
        count: usize,
    }

    #[test]
    fn success_flattens_payload() {
        let value = serde_json::to_value(Success::new(Payload { count: 3 })).unwrap();
        assert_eq!(value, serde_json::json!({"success": true, "count": 3}));
    }

    #[test]
    fn message_envelope() {
        let value = serde_json::to_value(Message::new("done")).unwrap();
        assert_eq!(value, serde_json::json!({"success": true, "message": "done"}));
    }
}
