use actix_web::{web, App, HttpServer};
use actix_cors::Cors;
use dotenv::dotenv;
use liteshare_relay::{configure_routes, AppError, AppState, Settings};
use std::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn build_cors(config: &Settings) -> Cors {
    if !config.cors.enabled {
        // CORS disabled - use most restrictive settings
        return Cors::default();
    }

    let cors = if config.cors.allow_any_origin {
        Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .expose_any_header()
            .supports_credentials()
    } else {
        let local = format!("http://{}:{}", config.server.host, config.server.port);
        Cors::default()
            .allowed_origin(&local)
            .allowed_methods(vec!["GET"])
            .supports_credentials()
    };

    cors.max_age(config.cors.max_age as usize)
}

#[actix_web::main]
async fn main() -> liteshare_relay::Result<()> {
    // Load environment variables
    dotenv().ok();

    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let config = Settings::new()?;
    info!("Configuration loaded successfully ({})", config.environment);

    let state = web::Data::new(AppState::new(config.clone()));
    if state.gate.is_enabled() {
        info!("Access gate enabled, /ws requires ?token=");
    } else {
        warn!("Access gate disabled, /ws accepts any client");
    }

    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;
    info!(
        "Signalling relay ready at ws://{}:{}/ws",
        config.server.host, config.server.port
    );

    let workers = config.server.workers.max(1) as usize;
    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&config))
            .app_data(state.clone())
            .configure(|cfg| configure_routes(cfg, &config.relay.public_dir))
    })
    .listen(listener)?
    .workers(workers)
    .run()
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?;

    Ok(())
}
