use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid source URL: {0}")]
    InvalidSourceUrl(String),

    #[error("invalid target URL: {0}")]
    InvalidTargetUrl(String),

    #[error("failed to parse event payload: {0}")]
    DecodeFailed(#[from] serde_json::Error),

    #[error("failed to decode base64 body: {0}")]
    InvalidBase64Body(#[from] base64::DecodeError),

    #[error("header name error: {0}")]
    InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),

    #[error("header value error: {0}")]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),

    #[error("http client error: {0}")]
    HttpClientFailed(#[from] reqwest::Error),

    #[error("sse transport error: {0}")]
    TransportFailed(#[from] eventsource_client::Error),
}
