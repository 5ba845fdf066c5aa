use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use anyhow::{Context, Result};
use chrono::Utc;
use db_pool::DbConfig;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thread_service::cache::{NoopRevalidator, Revalidator};
use thread_service::db::{ContentStore, PgContentStore};
use thread_service::handlers::{self, AppState};
use thread_service::jobs::link_repair::start_link_repair;
use thread_service::{middleware, Config, MIGRATOR, SERVICE_NAME};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct HealthState {
    store: Arc<dyn ContentStore>,
    revalidation_enabled: bool,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Disabled,
    Unhealthy,
}

#[derive(Serialize)]
struct ComponentCheck {
    status: ComponentStatus,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    postgresql: ComponentCheck,
    revalidation: ComponentCheck,
    timestamp: String,
}

async fn health_summary(state: web::Data<HealthState>) -> HttpResponse {
    match state.store.ping().await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": SERVICE_NAME,
            "version": env!("CARGO_PKG_VERSION")
        })),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": SERVICE_NAME
        })),
    }
}

async fn readiness_summary(state: web::Data<HealthState>) -> HttpResponse {
    let start = Instant::now();
    let pg_result = state.store.ping().await;
    let pg_latency = Some(start.elapsed().as_millis() as u64);
    let ready = pg_result.is_ok();

    let postgresql = match pg_result {
        Ok(_) => ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "PostgreSQL connection successful".to_string(),
            latency_ms: pg_latency,
        },
        Err(e) => ComponentCheck {
            status: ComponentStatus::Unhealthy,
            message: format!("PostgreSQL connection failed: {}", e),
            latency_ms: pg_latency,
        },
    };

    // Revalidation is best effort and never gates readiness.
    let revalidation = if state.revalidation_enabled {
        ComponentCheck {
            status: ComponentStatus::Healthy,
            message: "Publishing revalidation over Redis".to_string(),
            latency_ms: None,
        }
    } else {
        ComponentCheck {
            status: ComponentStatus::Disabled,
            message: "REDIS_URL not set".to_string(),
            latency_ms: None,
        }
    };

    let response = ReadinessResponse {
        ready,
        postgresql,
        revalidation,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"alive": true}))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

async fn build_revalidator(config: &Config) -> Arc<dyn Revalidator> {
    let Some(redis_url) = config.revalidation.redis_url.as_deref() else {
        tracing::warn!("REDIS_URL not set; revalidation signals are disabled");
        return Arc::new(NoopRevalidator);
    };

    match cache_invalidation::InvalidationPublisher::with_channel(
        redis_url,
        SERVICE_NAME.to_string(),
        config.revalidation.channel.clone(),
    )
    .await
    {
        Ok(publisher) => {
            tracing::info!(channel = %publisher.channel(), "Revalidation publisher connected");
            Arc::new(publisher)
        }
        Err(e) => {
            // Writes must not depend on the cache layer being up.
            tracing::error!("Failed to connect revalidation publisher: {}", e);
            Arc::new(NoopRevalidator)
        }
    }
}

/// Thread Service
///
/// Serves the thread and post feeds, detail views with nested replies,
/// content creation and user onboarding.
///
/// # Routes
///
/// - `/api/v1/{threads|posts}` - feed and create
/// - `/api/v1/{threads|posts}/{id}` - detail
/// - `/api/v1/{threads|posts}/{id}/replies` - reply
/// - `/api/v1/users/me` - current user and onboarding
/// - `/api/v1/health*`, `/metrics`
#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()
        .map_err(anyhow::Error::msg)
        .context("Failed to load configuration")?;

    tracing::info!(
        "Starting thread-service v{} (env={})",
        env!("CARGO_PKG_VERSION"),
        config.app.env
    );

    let mut db_cfg = DbConfig::from_env(SERVICE_NAME).unwrap_or_default();
    db_cfg.service_name = SERVICE_NAME.to_string();
    db_cfg.database_url = config.database.url.clone();
    db_cfg.max_connections = config.database.max_connections;
    db_cfg.min_connections = db_cfg.min_connections.min(db_cfg.max_connections);

    let pool = db_pool::connect_shared(db_cfg)
        .await
        .context("Failed to create database pool")?;
    db_pool::migrate(&pool, &MIGRATOR)
        .await
        .context("Failed to run database migrations")?;

    let store: Arc<dyn ContentStore> = Arc::new(PgContentStore::new(pool));
    let revalidator = build_revalidator(&config).await;

    let app_state = web::Data::new(AppState::new(
        store.clone(),
        revalidator,
        &config.feed,
    ));
    let health_state = web::Data::new(HealthState {
        store: store.clone(),
        revalidation_enabled: config.revalidation.redis_url.is_some(),
    });

    let repair_task = tokio::spawn(start_link_repair(store, config.link_repair.clone()));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else if !origin.is_empty() {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(app_state.clone())
            .app_data(health_state.clone())
            .wrap(middleware::MetricsMiddleware)
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route(
                "/metrics",
                web::get().to(thread_service::metrics::serve_metrics),
            )
            .route("/api/v1/health", web::get().to(health_summary))
            .route("/api/v1/health/ready", web::get().to(readiness_summary))
            .route("/api/v1/health/live", web::get().to(liveness_check))
            .configure(handlers::configure_routes)
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .run();

    let server_handle = server.handle();
    let server_task = tokio::spawn(server);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let result = tokio::select! {
        res = server_task => match res {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(anyhow::Error::new(e).context("HTTP server failed")),
            Err(e) => Err(anyhow::Error::new(e).context("HTTP server task panicked")),
        },
        _ = &mut shutdown => {
            tracing::info!("Shutdown signal received");
            server_handle.stop(true).await;
            Ok(())
        }
    };

    repair_task.abort();
    tracing::info!("thread-service shutting down");
    result
}
