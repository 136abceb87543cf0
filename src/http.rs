//! Shared HTTP helpers for the remote service clients.

use std::time::Duration;

/// Default timeout for HTTP requests. Generation calls can be slow.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Default connection timeout (10 seconds).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP status code for rate limiting.
pub const HTTP_STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// HTTP status code for bad request (often a safety block).
pub const HTTP_STATUS_BAD_REQUEST: u16 = 400;

/// HTTP status code for forbidden.
pub const HTTP_STATUS_FORBIDDEN: u16 = 403;

/// Keywords that indicate a content policy or safety rejection.
const CONTENT_POLICY_KEYWORDS: &[&str] = &[
    "content policy",
    "policy violation",
    "safety",
    "blocked",
    "prohibited",
    "responsible ai",
    "violates",
];

/// Check if an error body indicates a content policy rejection.
pub fn is_content_policy_error(error_text: &str) -> bool {
    let lower = error_text.to_lowercase();
    CONTENT_POLICY_KEYWORDS
        .iter()
        .any(|keyword| lower.contains(keyword))
}

/// Parse the Retry-After header value in seconds.
pub fn parse_retry_after(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
}

/// Build the shared reqwest client.
pub fn build_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
        .build()
}

/// Read the body of a failed response, never failing itself.
pub async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string())
}
