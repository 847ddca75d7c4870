use payments_gateway::config::AppConfig;
use payments_gateway::gateways::http_bank::HttpBankClient;
use payments_gateway::http::router::serve;
use payments_gateway::repo::payments_repo::PaymentsRepo;
use payments_gateway::service::payment_service::PaymentService;
use payments_gateway::AppState;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env();
    cfg.init_tracing();

    tracing::debug!(
        max_connections = cfg.db_max_connections,
        min_connections = cfg.db_min_connections,
        "connecting to postgres"
    );
    let pool = PgPoolOptions::new()
        .max_connections(cfg.db_max_connections)
        .min_connections(cfg.db_min_connections)
        .connect(&cfg.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let bank = Arc::new(HttpBankClient::new(cfg.bank_base_url.clone(), cfg.bank_retry()));
    let store = Arc::new(PaymentsRepo { pool: pool.clone() });
    let state = AppState {
        payment_service: PaymentService::new(bank, store),
    };

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    serve(listener, state, shutdown_signal()).await?;

    pool.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
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
                tracing::error!("failed to listen for SIGTERM: {}", e);
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

    tracing::info!("shutting down, draining in-flight requests");
}
