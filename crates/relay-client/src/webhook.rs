use std::collections::HashMap;

use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, HOST},
    Client, Method, Request, StatusCode,
};
use url::Url;

use crate::{error::Error, event::WebhookPayload};

/// Result of one dispatched webhook, reported back through the logger.
#[derive(Debug, Clone)]
pub struct ForwardOutcome {
    pub method: Method,
    pub url: Url,
    pub status: StatusCode,
}

/// Replays decoded webhook payloads against the configured target URL.
#[derive(Debug, Clone)]
pub struct WebhookForwarder {
    target: Url,
    http_client: Client,
}

impl WebhookForwarder {
    pub fn new(target: Url, http_client: Client) -> Self {
        Self {
            target,
            http_client,
        }
    }

    /// Dispatches one payload. Any HTTP response counts as a success outcome;
    /// only a failed dispatch (network, DNS, refused connection) or an
    /// unrepresentable header is an error.
    pub async fn forward(&self, payload: WebhookPayload) -> Result<ForwardOutcome, Error> {
        let request = self.build_request(&payload)?;
        let method = request.method().clone();
        let url = request.url().clone();

        let response = self.http_client.execute(request).await?;

        Ok(ForwardOutcome {
            method,
            url,
            status: response.status(),
        })
    }

    fn build_request(&self, payload: &WebhookPayload) -> Result<Request, Error> {
        let url = merge_query(&self.target, &payload.query);

        let mut request_headers = HeaderMap::with_capacity(payload.headers.len() + 1);
        for (k, v) in &payload.headers {
            // Forwarding the relay's Host header breaks origin servers that
            // key routing on it.
            if k.eq_ignore_ascii_case(HOST.as_str()) {
                continue;
            }
            request_headers.insert(k.parse::<HeaderName>()?, v.parse::<HeaderValue>()?);
        }
        request_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let request = self
            .http_client
            .post(url)
            .headers(request_headers)
            .body(payload.body.clone())
            .build()?;

        Ok(request)
    }
}

/// Merges payload query parameters into the target's own query string.
/// Payload keys overwrite same-named target keys; target-only keys survive.
fn merge_query(target: &Url, query: &HashMap<String, String>) -> Url {
    let mut merged: Vec<(String, String)> = target
        .query_pairs()
        .filter(|(k, _)| !query.contains_key(k.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    merged.extend(query.iter().map(|(k, v)| (k.clone(), v.clone())));

    let mut url = target.clone();
    url.set_query(None);
    if !merged.is_empty() {
        url.query_pairs_mut().extend_pairs(merged);
    }
    url
}
