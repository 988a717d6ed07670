//! Factory Order Management Platform - Backend Server

use std::{net::SocketAddr, sync::Arc, time::Duration};

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use factory_order_backend::config::Config;
use factory_order_backend::external::{
    DownstreamOrderClient, HttpDownstreamClient, NoopDownstreamClient,
};
use factory_order_backend::repository::{
    MemoryOrderRepository, MemoryStockRepository, OrderRepository, PostgresOrderRepository,
    PostgresStockRepository, StockRepository,
};
use factory_order_backend::services::{FulfillmentService, OrderService, StockService};
use factory_order_backend::{create_app, AppState};
use shared::UuidTokenSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "factory_order_backend=debug,tower_http=debug,sqlx=warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Factory Order Management Server");
    tracing::info!("Environment: {}", config.environment);

    // Choose the persistence backend
    let (stock_repo, order_repo): (Arc<dyn StockRepository>, Arc<dyn OrderRepository>) =
        match &config.database.url {
            Some(url) => {
                tracing::info!("Connecting to database...");
                let db_pool = PgPoolOptions::new()
                    .max_connections(config.database.max_connections)
                    .min_connections(config.database.min_connections)
                    .acquire_timeout(Duration::from_secs(30))
                    .connect(url)
                    .await?;

                tracing::info!("Database connection established");

                if config.environment == "development" {
                    tracing::info!("Running database migrations...");
                    sqlx::migrate!("./migrations").run(&db_pool).await?;
                    tracing::info!("Migrations completed");
                }

                (
                    Arc::new(PostgresStockRepository::new(db_pool.clone())),
                    Arc::new(PostgresOrderRepository::new(db_pool)),
                )
            }
            None => {
                tracing::info!("No database URL configured, using the in-memory store");
                (
                    Arc::new(MemoryStockRepository::new()),
                    Arc::new(MemoryOrderRepository::new()),
                )
            }
        };

    // Downstream order-creation collaborator
    let downstream: Arc<dyn DownstreamOrderClient> = if config.downstream.enabled {
        Arc::new(HttpDownstreamClient::new(&config.downstream).map_err(|e| anyhow::anyhow!(e))?)
    } else {
        Arc::new(NoopDownstreamClient)
    };

    // Build services and application state
    let state = AppState {
        orders: OrderService::new(
            order_repo.clone(),
            stock_repo.clone(),
            Arc::new(UuidTokenSource),
            downstream,
        ),
        stock: StockService::new(stock_repo.clone()),
        fulfillment: FulfillmentService::new(order_repo, stock_repo),
        config: Arc::new(config.clone()),
    };

    let app = create_app(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
