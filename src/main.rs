use std::net::SocketAddr;

use account_policy::{config::AppConfig, routes::create_router, security};
use axum::{Router, extract::DefaultBodyLimit, middleware, serve};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env()?;

    let router: Router = create_router(&config)
        .layer(middleware::from_fn(security::headers::set_security_headers))
        .layer(DefaultBodyLimit::max(security::json::MAX_BODY_SIZE_BYTES));

    let app = router.into_make_service_with_connect_info::<SocketAddr>();

    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "Listening");

    serve(listener, app).await?;

    Ok(())
}
