use reqwest::{header::LOCATION, redirect};

use crate::error::Error;

/// Fixed relay-server endpoint that provisions a fresh channel.
pub const NEW_CHANNEL_URL: &str = "https://hook.pipelinesascode.com/new";

/// Provisions a new channel on the public relay server and returns its URL,
/// usable as the client's source.
pub async fn create_channel() -> Result<String, Error> {
    new_channel(NEW_CHANNEL_URL).await
}

/// The relay server answers the HEAD with a redirect whose Location is the
/// freshly provisioned channel URL. A non-redirect response means the
/// requested URL itself is the channel.
async fn new_channel(url: &str) -> Result<String, Error> {
    let http_client = reqwest::Client::builder()
        .use_rustls_tls()
        .redirect(redirect::Policy::none())
        .build()?;

    let response = http_client.head(url).send().await?;

    if response.status().is_redirection() {
        if let Some(location) = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
        {
            return Ok(location.to_string());
        }
    }

    Ok(response.url().to_string())
}
