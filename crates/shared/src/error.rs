use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    RateLimited,
    Internal,
}

impl ErrorCode {
    /// Classifies an HTTP status returned by the banking backend.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            400 | 409 | 422 => Self::Validation,
            429 => Self::RateLimited,
            _ => Self::Internal,
        }
    }
}

/// Error body produced by the backend: `{"detail": "..."}` or, for request
/// validation failures, `{"detail": [{"loc": [...], "msg": "..."}]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(text) => text.clone(),
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect::<Vec<_>>()
                .join("; "),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_statuses_to_codes() {
        assert_eq!(ErrorCode::from_status(401), ErrorCode::Unauthorized);
        assert_eq!(ErrorCode::from_status(422), ErrorCode::Validation);
        assert_eq!(ErrorCode::from_status(503), ErrorCode::Internal);
    }

    #[test]
    fn joins_validation_messages() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"detail":[{"loc":["body","email"],"msg":"value is not a valid email"},{"loc":["body","phone"],"msg":"field required"}]}"#,
        )
        .expect("parse");
        assert_eq!(body.message(), "value is not a valid email; field required");
    }

    #[test]
    fn plain_detail_is_passed_through() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"detail":"Not enough reward points"}"#).expect("parse");
        assert_eq!(body.message(), "Not enough reward points");
    }
}
