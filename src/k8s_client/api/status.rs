use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

pub const REASON_NOT_FOUND: &str = "NotFound";
pub const REASON_FORBIDDEN: &str = "Forbidden";

/// Failure body the apiserver sends along with a non-2xx response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub code: u16,
}

impl Status {
    /// Decodes a `Status` body, or reconstructs one from the HTTP code when the
    /// body is something else (proxies, very old servers).
    pub fn from_response(code: StatusCode, body: &[u8]) -> Self {
        match serde_json::from_slice::<Status>(body) {
            Ok(mut status) if !status.reason.is_empty() || status.code != 0 => {
                if status.code == 0 {
                    status.code = code.as_u16();
                }
                if status.reason.is_empty() {
                    status.reason = reason_for_code(code).to_string();
                }
                status
            }
            _ => Status {
                status: "Failure".into(),
                message: String::from_utf8_lossy(body).trim().to_string(),
                reason: reason_for_code(code).to_string(),
                code: code.as_u16(),
            },
        }
    }
}

fn reason_for_code(code: StatusCode) -> &'static str {
    match code {
        StatusCode::BAD_REQUEST => "BadRequest",
        StatusCode::UNAUTHORIZED => "Unauthorized",
        StatusCode::FORBIDDEN => REASON_FORBIDDEN,
        StatusCode::NOT_FOUND => REASON_NOT_FOUND,
        StatusCode::METHOD_NOT_ALLOWED => "MethodNotAllowed",
        StatusCode::NOT_ACCEPTABLE => "NotAcceptable",
        StatusCode::CONFLICT => "Conflict",
        StatusCode::UNSUPPORTED_MEDIA_TYPE => "UnsupportedMediaType",
        StatusCode::UNPROCESSABLE_ENTITY => "Invalid",
        StatusCode::TOO_MANY_REQUESTS => "TooManyRequests",
        StatusCode::INTERNAL_SERVER_ERROR => "InternalError",
        StatusCode::SERVICE_UNAVAILABLE => "ServiceUnavailable",
        StatusCode::GATEWAY_TIMEOUT => "Timeout",
        _ => "Unknown",
    }
}
