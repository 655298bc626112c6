use std::net::SocketAddr;

use plantarum_backend::config::AppConfig;
use plantarum_backend::handlers;
use plantarum_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = AppConfig::load()?;
    log::info!("Loaded config: {:?}", config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState::connect(config).await?;
    let app = handlers::router(state);

    log::info!("Starting server on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app.into_make_service()).await?;

    Ok(())
}
