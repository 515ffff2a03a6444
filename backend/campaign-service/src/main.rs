use actix_cors::Cors;
use actix_web::{App, HttpServer};
use anyhow::{Context, Result};
use campaign_service::{db, AppState, Config};
use db_pool::{create_pool, DbConfig};
use llm_client::{LlmProvider, OpenAiProvider};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "campaign_service=debug,llm_client=info,actix_web=info,sqlx=warn,info";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn build_cors(origins: &[String]) -> Cors {
    let mut cors = Cors::default();
    for origin in origins {
        if origin == "*" {
            cors = cors.allow_any_origin();
        } else {
            cors = cors.allowed_origin(origin);
        }
    }
    cors.allow_any_method().allow_any_header().max_age(3600)
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
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    info!(
        env = %config.app_env,
        chat_model = %config.chat_model,
        vision_model = %config.vision_model,
        embedding_model = %config.embedding_model,
        match_threshold = config.match_threshold,
        match_count = config.match_count,
        "Starting campaign-service"
    );

    let db_config = DbConfig::new(
        "campaign-service",
        &config.database_url,
        config.db_max_connections,
        config.db_min_connections,
    );
    db_config.log_config();

    let pool = create_pool(db_config)
        .await
        .context("Failed to create database pool")?;

    if config.run_migrations {
        db::run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;
        info!("Database migrations applied");
    }

    let provider = OpenAiProvider::new(config.llm_config()).context("Failed to build LLM client")?;
    if !provider.config().is_configured() {
        warn!("LLM_API_KEY is not set; chat, map analysis and embeddings will fail with 502");
    }
    let llm: Arc<dyn LlmProvider> = Arc::new(provider);

    let state = AppState::new(pool, llm, &config);

    let origins: Vec<String> = config.cors_origins().into_iter().map(str::to_string).collect();
    let bind_address = format!("{}:{}", config.host, config.port);
    info!("Starting HTTP server at {}", bind_address);

    let server = HttpServer::new(move || {
        let state = state.clone();
        App::new()
            .wrap(build_cors(&origins))
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(move |cfg| state.configure(cfg))
    })
    .bind(&bind_address)
    .with_context(|| format!("Failed to bind {}", bind_address))?
    .workers(config.http_workers.max(1))
    .shutdown_timeout(30)
    .run();

    let handle = server.handle();

    tokio::select! {
        result = server => {
            result.context("HTTP server error")?;
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, stopping HTTP server");
            handle.stop(true).await;
        }
    }

    info!("campaign-service stopped");
    Ok(())
}
