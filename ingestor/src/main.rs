mod clock;
mod config;
mod dashboard;
mod db;
mod decode;
mod dispatch;
mod errors;
mod metrics;
mod model;
mod mqtt;

use axum::{routing::get, Router};
use clock::TimestampAssigner;
use config::Config;
use db::{Store, StoreOptions};
use dispatch::Dispatcher;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    // A missing .env is fine; the environment may be set externally.
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    info!("Starting brokerding");
    info!("Database: {}", config.database_path.display());
    info!("HTTP server: {}", config.http_addr);

    metrics::init_metrics();

    // Setup failures are fatal; steady-state storage errors are not.
    let store_options = StoreOptions {
        max_connections: config.db_max_connections,
        busy_timeout: config.db_busy_timeout,
    };
    let store = match Store::open(&config.database_path, &store_options).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };

    let mqtt_handle = match config.mqtt.clone() {
        Some(mqtt_config) => {
            let dispatcher = Dispatcher::new(store.clone(), TimestampAssigner::system());
            Some(tokio::spawn(mqtt::run_mqtt(mqtt_config, dispatcher)))
        }
        None => {
            info!("MQTT disabled, serving dashboard only");
            None
        }
    };

    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .merge(dashboard::create_router(
            store,
            config.template_path.clone(),
            config.dashboard_limit,
        ));

    let listener = tokio::net::TcpListener::bind(&config.http_addr)
        .await
        .unwrap_or_else(|e| {
            error!("Failed to bind to {}: {}", config.http_addr, e);
            std::process::exit(1);
        });

    info!("HTTP server listening on {}", config.http_addr);

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap_or_else(|e| {
            error!("HTTP server error: {}", e);
        });
    });

    let mqtt_task = async {
        match mqtt_handle {
            Some(handle) => {
                let _ = handle.await;
            }
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = mqtt_task => {
            error!("MQTT task terminated");
        }
        _ = server_handle => {
            error!("HTTP server terminated");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Shutting down");
}

async fn metrics_handler() -> String {
    metrics::gather_metrics()
}
