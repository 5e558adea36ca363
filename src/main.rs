use std::{net::SocketAddr, sync::Arc};

use axum::{Router, middleware};
use tower_http::trace::TraceLayer;

use backoffice::{
    auth::bootstrap::seed_admin,
    config::AppConfig,
    db::{connection, dao::DaoContext},
    logging::init_tracing,
    middleware::{catch_panic_layer, cors_layer, json_error_middleware},
    routes::router,
    state::AppState,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!("server failed: {err:?}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env().expect("failed to load config");
    init_tracing(&cfg.logging.rust_log);

    let db = connection::connect(&cfg.database).await?;
    seed_admin(&cfg.auth, &DaoContext::new(&db)).await?;

    let state = AppState::new(cfg, db);

    let app = Router::new()
        .merge(router(Arc::clone(&state)))
        .layer(middleware::from_fn(json_error_middleware))
        .layer(catch_panic_layer())
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!(
        "{}:{}",
        state.config.general.host.as_str(),
        state.config.general.port
    )
    .parse()
    .expect("invalid host/port");
    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
