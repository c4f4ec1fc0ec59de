//! Gateway HTTP server (single port): health probe and Telegram webhook.

use crate::config::{self, Config};
use crate::routing::InboundRouter;
use crate::store::{PgStore, Stores};
use crate::gate::MembershipQuery;
use crate::transport::{InboundEvent, TelegramChannel, TelegramUpdate, Transport};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

const WEBHOOK_SECRET_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";

/// Which store backs the entity tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

impl StoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Postgres => "postgres",
            StoreKind::Memory => "memory",
        }
    }
}

/// Shared state for the HTTP handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    pub store_kind: StoreKind,
    /// Sender for inbound events (webhook POSTs). None when Telegram is not configured.
    pub inbound_tx: Option<mpsc::Sender<InboundEvent>>,
    /// Connector tasks (the getUpdates loop); aborted during graceful shutdown.
    pub channel_tasks: Arc<RwLock<Vec<JoinHandle<()>>>>,
}

/// Postgres when a database URL is configured (migrations applied), else in-memory.
pub async fn open_stores(config: &Config) -> Result<(Stores, StoreKind)> {
    match config::resolve_database_url(config) {
        Some(url) => {
            let store = PgStore::connect_and_migrate(&url, config.database.max_connections)
                .await
                .context("opening postgres store")?;
            log::info!("store: postgres (migrations applied)");
            Ok((Stores::from_backend(Arc::new(store)), StoreKind::Postgres))
        }
        None => {
            log::warn!("store: no database url configured, using in-memory store (entries are lost on restart)");
            Ok((Stores::in_memory(), StoreKind::Memory))
        }
    }
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config) -> Result<()> {
    if config.admins.user_ids.is_empty() {
        log::warn!("no admins configured (admins.userIds); the admin menu is unreachable");
    }
    let (stores, store_kind) = open_stores(&config).await?;
    let router = Arc::new(InboundRouter::from_config(&config, stores));
    let channel_tasks: Arc<RwLock<Vec<JoinHandle<()>>>> = Arc::new(RwLock::new(Vec::new()));

    let telegram = config::resolve_telegram_token(&config).map(|t| Arc::new(TelegramChannel::new(Some(t))));
    let webhook_url = config.channels.telegram.webhook_url.clone();

    let mut processor: Option<JoinHandle<()>> = None;
    let inbound_tx = match telegram.clone() {
        Some(telegram) => {
            let (inbound_tx, inbound_rx) = mpsc::channel::<InboundEvent>(64);
            processor = Some(spawn_processor(
                router.clone(),
                telegram.clone(),
                telegram.clone(),
                inbound_rx,
            ));

            if let Some(ref url) = webhook_url {
                let secret = config.channels.telegram.webhook_secret.as_deref();
                match telegram.set_webhook(url, secret).await {
                    Ok(()) => log::info!("telegram channel registered (webhook mode): {}", url),
                    Err(e) => log::warn!("telegram set_webhook failed: {}", e),
                }
            } else {
                let handle = telegram.clone().start_inbound(inbound_tx.clone());
                channel_tasks.write().await.push(handle);
                log::info!("telegram channel registered and getUpdates loop started");
            }
            Some(inbound_tx)
        }
        None => {
            log::warn!("telegram bot token not configured; serving health only");
            None
        }
    };

    let state = GatewayState {
        config: Arc::new(config.clone()),
        store_kind,
        inbound_tx,
        channel_tasks: channel_tasks.clone(),
    };
    let app = build_router(state);

    let bind_addr = format!("{}:{}", config.gateway.bind.trim(), config.gateway.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(channel_tasks, telegram, webhook_url.is_some()))
        .await
        .context("gateway server exited")?;

    // Every sender is gone once the server and the poll loop have stopped.
    if let Some(processor) = processor {
        if let Err(e) = processor.await {
            log::error!("inbound processor failed: {}", e);
        }
        log::info!("inbound queue drained");
    }
    log::info!("gateway stopped");
    Ok(())
}

/// Handles queued events one at a time until every sender is dropped.
pub fn spawn_processor(
    router: Arc<InboundRouter>,
    transport: Arc<dyn Transport>,
    membership: Arc<dyn MembershipQuery>,
    mut inbound_rx: mpsc::Receiver<InboundEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = inbound_rx.recv().await {
            router
                .handle(event, transport.as_ref(), membership.as_ref())
                .await;
        }
        log::debug!("inbound processor finished");
    })
}

/// Routes: `GET /` health probe, `POST /telegram/webhook`.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/telegram/webhook", post(telegram_webhook))
        .with_state(state)
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                log::error!("failed to install SIGTERM handler: {}", e);
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
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
/// Stops the Telegram connector, removes its webhook if used, then ends the poll loop.
/// The processor is not touched here; it drains once the senders are dropped.
async fn shutdown_signal(
    channel_tasks: Arc<RwLock<Vec<JoinHandle<()>>>>,
    telegram: Option<Arc<TelegramChannel>>,
    webhook_mode: bool,
) {
    wait_for_signal().await;
    log::info!("shutdown signal received, draining connections");

    if let Some(t) = telegram {
        t.stop();
        if webhook_mode {
            if let Err(e) = t.delete_webhook().await {
                log::debug!("telegram delete_webhook on shutdown: {}", e);
            }
        }
    }

    let handles = {
        let mut g = channel_tasks.write().await;
        std::mem::take(&mut *g)
    };
    // A pending long poll would hold shutdown for up to its timeout.
    for h in handles {
        h.abort();
        let _ = h.await;
    }
    log::info!("connector tasks finished");
}

/// POST /telegram/webhook: verifies the optional secret, queues the update.
async fn telegram_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(ref expected) = state.config.channels.telegram.webhook_secret {
        let provided = headers
            .get(WEBHOOK_SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if provided != expected.as_str() {
            return StatusCode::FORBIDDEN;
        }
    }
    let Some(ref inbound_tx) = state.inbound_tx else {
        return StatusCode::SERVICE_UNAVAILABLE;
    };
    let update: TelegramUpdate = match serde_json::from_slice(&body) {
        Ok(u) => u,
        Err(e) => {
            // Telegram retries non-2xx replies, so a bad body is dropped rather than rejected.
            log::debug!("telegram webhook: dropping unparsable update: {}", e);
            return StatusCode::OK;
        }
    };
    let Some(event) = update.into_inbound() else {
        return StatusCode::OK;
    };
    if inbound_tx.send(event).await.is_err() {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    StatusCode::OK
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "store": state.store_kind.as_str(),
        "telegram": state.inbound_tx.is_some(),
        "port": state.config.gateway.port,
    }))
}
