//! Shared response envelope for API handlers.
//!
//! Every successful operation renders as
//! `{ "status": ..., "code": "MSG-....", "message": "...", ... }` with the
//! operation-specific payload fields flattened into the top level. Use
//! [`MessageResponse`] instead of ad-hoc `serde_json::json!` envelopes so the
//! status, code and message always come from the shared registry.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::{Map, Value};
use studygate_core::codes::MessageCode;

/// Builder for the standard success envelope.
///
/// # Example
///
/// ```ignore
/// Ok(MessageResponse::of(MessageCode::AddSiteSuccess).with("siteId", site.id))
/// ```
#[derive(Debug)]
pub struct MessageResponse {
    code: MessageCode,
    extras: Map<String, Value>,
}

impl MessageResponse {
    /// Start an envelope for the given message code.
    pub fn of(code: MessageCode) -> Self {
        Self {
            code,
            extras: Map::new(),
        }
    }

    /// Attach a payload field at the top level of the envelope.
    ///
    /// A field that fails to serialize is logged and dropped rather than
    /// failing the whole response.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => {
                self.extras.insert(key.to_string(), value);
            }
            Err(err) => {
                tracing::error!(key, error = %err, "Failed to serialize response field");
            }
        }
        self
    }
}

impl IntoResponse for MessageResponse {
    fn into_response(self) -> Response {
        let info = self.code.info();
        let status = StatusCode::from_u16(info.status).unwrap_or(StatusCode::OK);

        let mut body = Map::new();
        body.insert("status".into(), Value::from(info.status));
        body.insert("code".into(), Value::from(info.code));
        body.insert("message".into(), Value::from(info.message));
        body.extend(self.extras);

        (status, axum::Json(Value::Object(body))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_flattens_payload_fields() {
        let response = MessageResponse::of(MessageCode::AddSiteSuccess).with("siteId", 7);

        let info = MessageCode::AddSiteSuccess.info();
        assert_eq!(response.extras["siteId"], Value::from(7));
        assert_eq!(info.status, 201);
    }
}
