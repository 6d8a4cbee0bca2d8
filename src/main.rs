use log::info;

use schedule_optimizer::config::ServerConfig;
use schedule_optimizer::handlers::{router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env()?;
    let state = AppState::new(config.progress_capacity);
    let app = router(state, &config)?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Server running on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
