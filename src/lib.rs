pub mod auth;
pub mod config;
pub mod error;
pub mod relay;

use std::path::Path;
use std::sync::Arc;
use actix_web::{web, HttpResponse};

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use crate::config::Settings;

pub use auth::AccessGate;
pub use relay::{Dispatcher, PeerHandle, RoomRegistry};

/// Placeholder in `index.html` replaced with the access token as a quoted
/// JavaScript string.
pub const TOKEN_PLACEHOLDER: &str = "%%LITESHARE_TOKEN%%";

/// Health check endpoint handler
/// Returns a JSON response with server status, timestamp and live room count
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "rooms": state.registry.room_count(),
    }))
}

/// Serves the client page with the access token filled in.
pub async fn index(state: web::Data<AppState>) -> Result<HttpResponse> {
    let path = Path::new(&state.config.relay.public_dir).join("index.html");
    let page = tokio::fs::read_to_string(&path).await?;
    let token = script_string(state.gate.client_token())?;

    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(page.replace(TOKEN_PLACEHOLDER, &token)))
}

/// Quotes `value` as a JSON string that is also safe inside an inline
/// `<script>` element.
fn script_string(value: &str) -> Result<String> {
    let quoted = serde_json::to_string(value)
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    Ok(quoted
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}

/// Registers every route the relay serves.
pub fn configure_routes(cfg: &mut web::ServiceConfig, public_dir: &str) {
    cfg.route("/", web::get().to(index))
        .route("/health", web::get().to(health_check))
        .route("/ws", web::get().to(relay::websocket_route))
        .service(actix_files::Files::new("/static", public_dir));
}

/// Application state shared across all components
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub registry: Arc<RoomRegistry>,
    pub dispatcher: Dispatcher,
    pub gate: AccessGate,
}

impl AppState {
    pub fn new(config: Settings) -> Self {
        let registry = Arc::new(RoomRegistry::new());
        let gate = AccessGate::new(config.access_token().map(str::to_string));

        Self {
            config: Arc::new(config),
            dispatcher: Dispatcher::new(registry.clone()),
            registry,
            gate,
        }
    }
}
