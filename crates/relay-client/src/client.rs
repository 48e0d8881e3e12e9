use std::sync::Arc;
use std::time::Duration;

use eventsource_client::{self as es, Client as _};
use futures_util::StreamExt;
use url::Url;

use crate::{
    error::Error,
    event::{decode, DecodedEvent, Lifecycle, SseMessage},
    logger::{ConsoleLogger, Logger},
    webhook::WebhookForwarder,
};

/// Channels on the public relay host expose their SSE stream under this
/// suffix; it is appended once at construction when missing.
const RELAY_HOST: &str = "hook.pipelinesascode.com";
const EVENTS_PATH_SUFFIX: &str = "/events";

const USER_AGENT: &str = concat!("sse-relay-client/", env!("CARGO_PKG_VERSION"));

pub struct Options {
    pub source: String,
    pub target: String,
    pub logger: Option<Arc<dyn Logger>>,
}

/// Subscribes to an SSE channel and replays every delivered webhook against
/// the local target.
pub struct Client {
    source: Url,
    target: Url,
    forwarder: Arc<WebhookForwarder>,
    logger: Arc<dyn Logger>,
}

impl Client {
    pub fn new(options: Options) -> Result<Self, Error> {
        let source = parse_source(&options.source)?;
        let target = Url::parse(&options.target)
            .map_err(|_| Error::InvalidTargetUrl(options.target.clone()))?;
        let logger = options
            .logger
            .unwrap_or_else(|| Arc::new(ConsoleLogger));

        let http_client = reqwest::Client::builder().use_rustls_tls().build()?;
        let forwarder = Arc::new(WebhookForwarder::new(target.clone(), http_client));

        Ok(Self {
            source,
            target,
            forwarder,
            logger,
        })
    }

    pub fn source(&self) -> &Url {
        &self.source
    }

    pub fn target(&self) -> &Url {
        &self.target
    }

    /// Connects to the channel and processes messages until the stream ends.
    /// Reconnection is the transport's job, configured here for immediate
    /// retries with no backoff.
    pub async fn start(&self) -> Result<(), Error> {
        let sse_client = es::ClientBuilder::for_url(self.source.as_str())?
            .header("User-Agent", USER_AGENT)?
            .reconnect(
                es::ReconnectOptions::reconnect(true)
                    .retry_initial(true)
                    .delay(Duration::from_secs(0))
                    .delay_max(Duration::from_secs(0))
                    .build(),
            )
            .build();

        self.logger
            .info(&format!("Forwarding {} to {}", self.source, self.target));

        let mut stream = sse_client.stream();
        while let Some(next) = stream.next().await {
            match next {
                Ok(es::SSE::Event(event)) => {
                    let message = SseMessage {
                        event: Some(event.event_type),
                        data: Some(event.data),
                    };
                    self.handle_message(message);
                }
                // Comments are keep-alives, nothing to do.
                Ok(es::SSE::Comment(_)) => {}
                Err(err) => {
                    self.logger
                        .error(&format!("❌ transport error: {}", Error::from(err)));
                }
            }
        }

        Ok(())
    }

    /// Classifies one message and, for payloads, dispatches the forward on
    /// its own task. The returned handle tracks the in-flight forward; the
    /// stream loop never awaits it, so forwards may overlap.
    pub fn handle_message(&self, message: SseMessage) -> Option<tokio::task::JoinHandle<()>> {
        match decode(&message) {
            Ok(DecodedEvent::Lifecycle(Lifecycle::Ready)) => {
                self.logger.info("✅ relay channel ready");
            }
            Ok(DecodedEvent::Lifecycle(Lifecycle::Connected)) => {
                self.logger.info(&format!("🔌 connected to {}", self.source));
            }
            Ok(DecodedEvent::Lifecycle(Lifecycle::Ping | Lifecycle::Empty)) => {}
            Ok(DecodedEvent::Payload(payload)) => {
                let forwarder = Arc::clone(&self.forwarder);
                let logger = Arc::clone(&self.logger);
                return Some(tokio::spawn(async move {
                    match forwarder.forward(payload).await {
                        Ok(outcome) => logger.info(&format!(
                            "➡️ {} {} - {}",
                            outcome.method,
                            outcome.url,
                            outcome.status.as_u16()
                        )),
                        Err(err) => {
                            logger.error(&format!("⚠️ failed to forward webhook: {err}"));
                        }
                    }
                }));
            }
            Err(err) => {
                self.logger
                    .error(&format!("❌ dropped malformed event: {err}"));
            }
        }

        None
    }
}

fn parse_source(source: &str) -> Result<Url, Error> {
    let mut url = Url::parse(source).map_err(|_| Error::InvalidSourceUrl(source.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(Error::InvalidSourceUrl(source.to_string()));
    }

    if url.host_str() == Some(RELAY_HOST) && !url.path().ends_with(EVENTS_PATH_SUFFIX) {
        let path = format!("{}{}", url.path().trim_end_matches('/'), EVENTS_PATH_SUFFIX);
        url.set_path(&path);
    }

    Ok(url)
}
