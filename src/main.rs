// src/main.rs
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use onecall_call_engine::api;
use onecall_call_engine::ari::{AriClient, AriListener};
use onecall_call_engine::cache::memory::SWEEP_INTERVAL_SECS;
use onecall_call_engine::cache::{CorrelationStore, MemoryStore, RedisClient};
use onecall_call_engine::config::Config;
use onecall_call_engine::database::{create_pool, PgHistorySink, PgRoutingSource};
use onecall_call_engine::services::{CallOrchestrator, CallRouter, OrchestratorSettings};
use onecall_call_engine::traits::KeyValueStore;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
        )
        .json()
        .init();

    info!("🚀 Starting OneCall call engine");

    // Load configuration
    let config = Config::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    info!("Environment: {}", config.environment);

    // Create database pool
    let db_pool = create_pool(&config.database_url)
        .await
        .context("Failed to create database pool")?;

    info!("✅ Database pool created");

    // Correlation store backend
    let backend: Arc<dyn KeyValueStore> = match &config.redis_url {
        Some(url) => {
            let redis_client = RedisClient::new(url)
                .await
                .context("Failed to create Redis client")?;
            info!("✅ Redis client connected");
            Arc::new(redis_client)
        }
        None => {
            let memory = MemoryStore::new();
            memory.spawn_sweeper(Duration::from_secs(SWEEP_INTERVAL_SECS));
            warn!("⚠️  No REDIS_URL configured, keeping call state in memory");
            Arc::new(memory)
        }
    };

    let ari_client = AriClient::new(&config.ari, &config.recording.format)
        .context("Failed to create ARI client")?;
    info!("✅ ARI client ready: {}", ari_client.base_url());

    let router = CallRouter::new(
        Arc::new(PgRoutingSource::new(db_pool.clone())),
        &config.ari.endpoint_tech,
    );

    let orchestrator = Arc::new(CallOrchestrator::new(
        Arc::new(ari_client),
        CorrelationStore::new(backend),
        router,
        Arc::new(PgHistorySink::new(db_pool.clone())),
        OrchestratorSettings {
            app: config.ari.app.clone(),
            dial_timeout_secs: config.ari.dial_timeout_secs,
            recording_dir: config.recording.directory.clone(),
            recording_format: config.recording.format.clone(),
        },
    ));

    // The first connection must succeed; losing it later is handled by run()
    let listener = AriListener::new(config.ari.clone(), orchestrator.clone());
    let stream = listener
        .connect()
        .await
        .context("Failed to connect to the ARI event stream")?;

    info!("✅ Connected to ARI as app '{}'", config.ari.app);

    // HTTP Server
    let bind_address = format!("{}:{}", config.host, config.port);
    info!("🌐 Starting HTTP server on {}", bind_address);

    let api_orchestrator = orchestrator.clone();
    let server = HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .app_data(web::Data::new(api_orchestrator.clone()))
            .configure(api::routes::configure)
    })
    .workers(2)
    .bind(&bind_address)?
    .run();

    tokio::select! {
        result = server => {
            result.context("HTTP server failed")?;
            info!("HTTP server stopped");
        }
        result = listener.run(stream) => {
            if let Err(e) = &result {
                error!("❌ ARI listener stopped: {}", e);
            }
            result.context("ARI event stream lost")?;
        }
    }

    Ok(())
}
