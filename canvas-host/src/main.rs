// canvas-host/src/main.rs
use actix_web::{web, App, HttpServer};
use canvas_core::{setup_tracing, Config};
use canvas_host::{api, AppState};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Setup tracing
    setup_tracing();

    // Load and validate configuration; missing key material is fatal.
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let server_addr = config.host_addr.clone();

    let state = match AppState::from_config(config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("failed to initialize key store: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting Canvas Host on {}", server_addr);

    let state_data = web::Data::new(state);

    HttpServer::new(move || {
        App::new()
            .app_data(state_data.clone())
            .configure(api::configure)
    })
    .bind(&server_addr)?
    .run()
    .await
}
