//! Kestrel - real-time transaction evaluation engine

use anyhow::{Context, Result};
use kestrel_core::domain::EvaluationMode;
use kestrel_engine::bus::{ChannelBus, EventBus, NatsBus};
use kestrel_engine::cache::{Cache, LruCache, RedisCache, TwoPhaseCache};
use kestrel_engine::{Processor, RuleEngine, TypologyEngine};
use kestrel_server::api::create_router;
use kestrel_server::config::{BusConfig, CacheConfig, Config, Tier};
use kestrel_server::service::EvaluationService;
use kestrel_server::state::AppState;
use kestrel_server::velocity::RepositoryVelocity;
use kestrel_server::worker::Worker;
use kestrel_server::VERSION;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let debug = std::env::var("DEBUG").ok().as_deref() == Some("true");
    init_tracing(debug)?;

    let config = Config::from_env();

    info!(
        version = VERSION,
        tier = %config.tier,
        mode = %config.mode,
        repository = config.repository.driver,
        cache = config.cache.cache_type,
        bus = config.bus.bus_type,
        "starting kestrel"
    );

    // Startup-time dependency failures are fatal
    let repo = kestrel_repository::connect(&config.repository)
        .await
        .context("failed to initialize repository")?;
    info!(driver = config.repository.driver, "repository initialized");

    let cache = build_cache(&config.cache)
        .await
        .context("failed to initialize cache")?;
    info!(cache_type = config.cache.cache_type, "cache initialized");

    let bus = build_bus(&config.bus)
        .await
        .context("failed to initialize event bus")?;
    info!(bus_type = config.bus.bus_type, "event bus initialized");

    let velocity: Arc<dyn kestrel_engine::VelocityProvider> =
        Arc::new(RepositoryVelocity::new(Arc::clone(&repo)));
    let rule_engine = Arc::new(RuleEngine::new(Some(velocity), config.max_rule_workers));
    let typology_engine = Arc::new(TypologyEngine::new());
    let processor = Processor::new().with_mode(config.mode);

    let service = Arc::new(EvaluationService::new(
        Arc::clone(&repo),
        Arc::clone(&cache),
        Arc::clone(&bus),
        Arc::clone(&rule_engine),
        Arc::clone(&typology_engine),
        processor,
        config.mode,
    ));

    service.load_at_startup().await;
    info!(
        rules = rule_engine.rules_count().await,
        typologies = typology_engine.count().await,
        "engines initialized"
    );

    if config.mode == EvaluationMode::Compliance && typology_engine.count().await == 0 {
        warn!("compliance mode enabled but no typologies configured; evaluations will be refused until one is created via POST /typologies");
    }

    let mut worker = None;
    if config.tier == Tier::Pro || config.async_worker {
        let mut w = Worker::new(Arc::clone(&service));
        match w.start(&config.tenants).await {
            Ok(()) => worker = Some(w),
            Err(error) => error!(%error, "failed to start async worker"),
        }
    }

    let app = create_router(AppState::new(Arc::clone(&service)));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(addr, "kestrel is ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server failed")?;

    info!("shutting down");

    if let Some(mut worker) = worker {
        worker.stop().await;
    }
    if let Err(error) = bus.close().await {
        error!(%error, "failed to close event bus");
    }
    if let Err(error) = cache.close().await {
        error!(%error, "failed to close cache");
    }
    if let Err(error) = repo.close().await {
        error!(%error, "failed to close repository");
    }

    info!("kestrel shutdown complete");
    Ok(())
}

fn init_tracing(debug: bool) -> Result<()> {
    let default_filter = if debug {
        "kestrel_server=debug,kestrel_engine=debug,tower_http=debug"
    } else {
        "kestrel_server=info,kestrel_engine=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    Ok(())
}

async fn build_cache(config: &CacheConfig) -> Result<Arc<dyn Cache>> {
    match config.cache_type.as_str() {
        "memory" => Ok(Arc::new(LruCache::new(config.local_max_size))),
        "redis" => {
            let remote = RedisCache::new(
                &config.redis_addr,
                &config.redis_password,
                config.redis_db,
            )
            .await?;

            if config.enable_two_phase {
                let local = LruCache::new(config.local_max_size);
                Ok(Arc::new(TwoPhaseCache::new(
                    local,
                    remote,
                    Duration::from_secs(config.local_ttl_secs),
                )))
            } else {
                Ok(Arc::new(remote))
            }
        }
        other => anyhow::bail!("unsupported cache type: {other}"),
    }
}

async fn build_bus(config: &BusConfig) -> Result<Arc<dyn EventBus>> {
    match config.bus_type.as_str() {
        "channel" => Ok(Arc::new(ChannelBus::new(config.channel_buffer_size))),
        "nats" => Ok(Arc::new(NatsBus::new(&config.nats_url).await?)),
        other => anyhow::bail!("unsupported bus type: {other}"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("received shutdown signal");
}
