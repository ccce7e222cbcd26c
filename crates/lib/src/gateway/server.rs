//! Gateway HTTP server (single port): Twilio and Infobip webhook routes plus health.

use crate::channels::{InfobipAdapter, ParseError, TwilioAdapter, WebhookAdapter};
use crate::config::{self, Config};
use crate::gateway::protocol::{twiml_message, WebhookStatus};
use crate::init;
use crate::media::{Credentials, LocalStore, MediaAuth, MediaFetcher, RelayUploader};
use crate::pipeline::{Reply, WebhookHandler};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A provider's adapter and pipeline.
pub struct ProviderPipeline {
    adapter: Box<dyn WebhookAdapter>,
    handler: WebhookHandler,
}

impl ProviderPipeline {
    pub fn new(adapter: Box<dyn WebhookAdapter>, handler: WebhookHandler) -> Self {
        Self { adapter, handler }
    }

    pub fn id(&self) -> &str {
        self.adapter.id()
    }

    /// Parse the raw body and handle every event in order. Only parsing can fail.
    pub async fn process(&self, body: &[u8]) -> Result<Vec<Reply>, ParseError> {
        let events = self.adapter.parse(body)?;
        let mut replies = Vec::with_capacity(events.len());
        for event in &events {
            replies.push(self.handler.handle(event).await);
        }
        Ok(replies)
    }
}

/// Shared state for the gateway (config and one pipeline per provider). Immutable after startup.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub twilio: Arc<ProviderPipeline>,
    pub infobip: Arc<ProviderPipeline>,
}

fn twilio_auth(config: &Config) -> MediaAuth {
    let credentials = match config::resolve_twilio_credentials(config) {
        Some((username, password)) => Credentials::Basic { username, password },
        None => {
            log::warn!("twilio credentials not configured; media downloads will be unauthenticated");
            Credentials::None
        }
    };
    // Twilio media always needs Basic auth; an anonymous retry cannot succeed.
    MediaAuth::new(credentials, false)
}

fn infobip_auth(config: &Config) -> MediaAuth {
    let credentials = match config::resolve_infobip_api_key(config) {
        Some(key) => Credentials::ApiKey(key),
        None => {
            log::warn!("infobip api key not configured; media downloads will be unauthenticated");
            Credentials::None
        }
    };
    MediaAuth::new(credentials, true)
}

fn provider_pipeline(
    adapter: Box<dyn WebhookAdapter>,
    auth: MediaAuth,
    download_root: &Path,
    client: &reqwest::Client,
    relay: &RelayUploader,
) -> ProviderPipeline {
    let store = LocalStore::new(download_root.join(adapter.id()));
    let handler = WebhookHandler::new(
        MediaFetcher::new(client.clone()),
        auth,
        store,
        relay.clone(),
    );
    ProviderPipeline::new(adapter, handler)
}

/// Build gateway state from config: relay endpoint (required), download directories, provider credentials.
pub fn build_state(config: &Config, config_path: &Path) -> Result<GatewayState> {
    let upload_url = config::resolve_relay_upload_url(config).ok_or_else(|| {
        anyhow::anyhow!(
            "relay endpoint not configured (set relay.baseUrl in {} or MEDIARELAY_RELAY_URL)",
            config_path.display()
        )
    })?;
    let download_root: PathBuf = config::resolve_download_dir(config, config_path);
    let client = reqwest::Client::new();
    let relay = RelayUploader::new(upload_url, client.clone());

    let twilio = provider_pipeline(
        Box::new(TwilioAdapter::new()),
        twilio_auth(config),
        &download_root,
        &client,
        &relay,
    );
    let infobip = provider_pipeline(
        Box::new(InfobipAdapter::new()),
        infobip_auth(config),
        &download_root,
        &client,
        &relay,
    );
    log::info!(
        "relay endpoint {}, downloads under {}",
        relay.endpoint(),
        download_root.display()
    );

    Ok(GatewayState {
        config: Arc::new(config.clone()),
        twilio: Arc::new(twilio),
        infobip: Arc::new(infobip),
    })
}

/// Routes: `GET /` health, `POST /twilio_webhook`, `GET|POST /webhook` (Infobip).
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/twilio_webhook", post(twilio_webhook))
        .route("/webhook", get(infobip_probe).post(infobip_webhook))
        .with_state(state)
}

pub async fn run_gateway(config: Config, config_path: PathBuf) -> Result<()> {
    init::require_initialized(&config_path)?;
    let state = build_state(&config, &config_path)?;
    for pipeline in [&state.twilio, &state.infobip] {
        let store = pipeline.handler.store();
        store
            .ensure_dir()
            .await
            .with_context(|| format!("preparing {} download directory", pipeline.id()))?;
        log::debug!("{} downloads go to {}", pipeline.id(), store.dir().display());
    }

    let app = router(state);
    let bind = config.gateway.bind.trim();
    let bind_addr = format!("{}:{}", bind, config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
/// In-flight webhook requests are allowed to finish.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::warn!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                log::warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

fn joined_text(replies: &[Reply]) -> Option<String> {
    if replies.is_empty() {
        return None;
    }
    Some(
        replies
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join("\n"),
    )
}

fn twiml_response(status: StatusCode, text: &str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/xml")],
        twiml_message(text),
    )
        .into_response()
}

/// POST /twilio_webhook: form-encoded Twilio message; replies with TwiML.
async fn twilio_webhook(State(state): State<GatewayState>, body: Bytes) -> Response {
    match state.twilio.process(&body).await {
        Ok(replies) => {
            let text = joined_text(&replies).unwrap_or_default();
            twiml_response(StatusCode::OK, &text)
        }
        Err(e) => {
            log::warn!("twilio webhook rejected: {}", e);
            twiml_response(
                StatusCode::BAD_REQUEST,
                "Sorry, I couldn't read that message. Please try again.",
            )
        }
    }
}

/// POST /webhook: Infobip JSON batch; replies with a JSON status object.
async fn infobip_webhook(State(state): State<GatewayState>, body: Bytes) -> Response {
    match state.infobip.process(&body).await {
        Ok(replies) => (
            StatusCode::OK,
            Json(WebhookStatus::success(joined_text(&replies))),
        )
            .into_response(),
        Err(e) => {
            log::warn!("infobip webhook rejected: {}", e);
            (
                StatusCode::BAD_REQUEST,
                Json(WebhookStatus::error(e.to_string())),
            )
                .into_response()
        }
    }
}

/// GET /webhook: provider validation probe.
async fn infobip_probe() -> &'static str {
    log::debug!("infobip webhook validation probe");
    "Webhook is active"
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_relay() -> Config {
        let mut config = Config::default();
        config.relay.base_url = Some("https://relay.test".to_string());
        config.storage.download_dir = Some(PathBuf::from("/srv/media"));
        config
    }

    #[test]
    fn build_state_requires_relay_endpoint() {
        if std::env::var("MEDIARELAY_RELAY_URL").is_ok() {
            return;
        }
        let err = build_state(&Config::default(), Path::new("/etc/mediarelay/config.json"))
            .err()
            .expect("missing relay must fail");
        assert!(err.to_string().contains("relay endpoint not configured"));
    }

    #[test]
    fn providers_write_to_their_own_subdirectory() {
        if std::env::var("MEDIARELAY_DOWNLOAD_DIR").is_ok() {
            return;
        }
        let state = build_state(&config_with_relay(), Path::new("/etc/mediarelay/config.json"))
            .unwrap();
        assert_eq!(state.twilio.id(), "twilio");
        assert_eq!(
            state.twilio.handler.store().dir(),
            Path::new("/srv/media/twilio")
        );
        assert_eq!(
            state.infobip.handler.store().dir(),
            Path::new("/srv/media/infobip")
        );
    }

    #[test]
    fn joined_text_of_batch() {
        assert_eq!(joined_text(&[]), None);
        let replies = vec![Reply::upload_prompt(), Reply::no_attachment()];
        let text = joined_text(&replies).unwrap();
        assert_eq!(text.lines().count(), 2);
    }
}
