use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::error::{ErrorBody, ErrorCode};
use tracing::debug;

use crate::error::{ClientError, Result};

/// Joins a normalized base url (no trailing slash) and an absolute path.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{base_url}{path}")
}

/// Turns a non-2xx backend reply into `ClientError::Api`. FastAPI wraps its
/// messages in `{"detail": ...}`; anything else is passed through verbatim.
pub fn api_error(status: u16, body: &str) -> ClientError {
    let body = body.trim();
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| parsed.message())
        .ok()
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| {
            if body.is_empty() {
                reqwest::StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body.to_string()
            }
        });

    ClientError::Api {
        status,
        code: ErrorCode::from_status(status),
        message,
    }
}

pub(crate) async fn send(request: RequestBuilder) -> Result<Response> {
    let response = request.send().await?;
    let status = response.status();
    debug!(url = %response.url(), status = status.as_u16(), "backend replied");
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(api_error(status.as_u16(), &body))
}

pub(crate) async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    Ok(send(request).await?.json().await?)
}

pub(crate) async fn send_bytes(request: RequestBuilder) -> Result<Vec<u8>> {
    Ok(send(request).await?.bytes().await?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_string_becomes_message() {
        let err = api_error(400, r#"{"detail":"Not enough reward points"}"#);
        match err {
            ClientError::Api {
                status,
                code,
                message,
            } => {
                assert_eq!(status, 400);
                assert_eq!(code, ErrorCode::Validation);
                assert_eq!(message, "Not enough reward points");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn non_json_body_is_kept_verbatim() {
        let err = api_error(502, "upstream down\n");
        assert_eq!(err.to_string(), "server rejected request (502): upstream down");
        assert_eq!(err.code(), Some(ErrorCode::Internal));
    }

    #[test]
    fn empty_body_uses_reason_phrase() {
        let err = api_error(404, "");
        assert_eq!(err.to_string(), "server rejected request (404): Not Found");
    }

    #[test]
    fn endpoint_joins_base_and_path() {
        assert_eq!(
            endpoint("http://localhost:8000", "/accounts/"),
            "http://localhost:8000/accounts/"
        );
    }
}
