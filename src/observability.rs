//! Observability module for centralized metrics, tracing, and logging setup.
//!
//! This module provides:
//! - Structured logging with configurable levels and formats
//! - Metrics collection and Prometheus export
//! - Health check endpoints for monitoring
//! - Span and metric helpers used by the bot handlers and the order poller

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing_subscriber::prelude::*;

use crate::observability_config::ObservabilityConfig;

/// Initialize the complete observability stack with health check dependencies
pub async fn init_observability(
    config: &ObservabilityConfig,
    db_pool: Option<PgPool>,
    bot_token: Option<String>,
) -> Result<()> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid observability configuration: {}", e))?;

    // Initialize tracing first
    init_tracing_with_config(config)?;

    if config.enable_metrics_export {
        let metrics_handle = init_metrics_with_config(config)?;
        start_metrics_server_with_health_checks(
            metrics_handle,
            config.metrics_port,
            db_pool.clone(),
            bot_token.clone(),
        )
        .await?;
    }

    tracing::info!(
        environment = %config.environment,
        metrics_enabled = %config.enable_metrics_export,
        metrics_port = %config.metrics_port,
        has_db_pool = %db_pool.is_some(),
        has_bot_token = %bot_token.is_some(),
        "Observability stack initialized successfully"
    );
    Ok(())
}

/// Initialize structured logging with tracing and configuration
pub fn init_tracing_with_config(config: &ObservabilityConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("support_relay_bot={}", config.log_level).parse()?)
        .add_directive("sqlx=warn".parse()?)
        .add_directive("teloxide=warn".parse()?);

    if config.use_pretty_logs() {
        // Pretty formatting for development
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .try_init()?;
    } else {
        // JSON formatting for production (default)
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()?;
    }

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        "Tracing initialized with structured logging"
    );
    Ok(())
}

/// Initialize metrics collection with Prometheus exporter and configuration
fn init_metrics_with_config(config: &ObservabilityConfig) -> Result<PrometheusHandle> {
    let mut builder = PrometheusBuilder::new();
    for (key, value) in &config.tags {
        builder = builder.add_global_label(key.clone(), value.clone());
    }
    let handle = builder.install_recorder()?;

    tracing::info!(tags = ?config.tags, "Metrics collection initialized");
    Ok(handle)
}

async fn start_metrics_server_with_health_checks(
    metrics_handle: PrometheusHandle,
    port: u16,
    db_pool: Option<PgPool>,
    bot_token: Option<String>,
) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting metrics server with health checks on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Metrics server listening on {}", addr);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let metrics_handle = metrics_handle.clone();
                    let db_pool = db_pool.clone();
                    let bot_token = bot_token.clone();

                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = hyper::service::service_fn(
                            move |req: hyper::Request<hyper::body::Incoming>| {
                                let metrics_handle = metrics_handle.clone();
                                let db_pool = db_pool.clone();
                                let bot_token = bot_token.clone();
                                async move {
                                    match (req.method(), req.uri().path()) {
                                        (&hyper::Method::GET, "/metrics") => {
                                            let metrics = metrics_handle.render();
                                            let mut response = hyper::Response::new(metrics);
                                            response.headers_mut().insert(
                                                "content-type",
                                                hyper::header::HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
                                            );
                                            Ok::<_, std::convert::Infallible>(response)
                                        }
                                        (&hyper::Method::GET, "/health/live") => {
                                            // Liveness probe - just check if the service is running
                                            Ok(hyper::Response::new("OK".to_string()))
                                        }
                                        (&hyper::Method::GET, "/health/ready") => {
                                            // Readiness probe - check dependencies
                                            match perform_readiness_checks(
                                                db_pool.as_ref(),
                                                bot_token.as_deref(),
                                            )
                                            .await
                                            {
                                                Ok(_) => Ok(hyper::Response::new("OK".to_string())),
                                                Err(e) => {
                                                    let mut response = hyper::Response::new(
                                                        format!("NOT READY: {}", e),
                                                    );
                                                    *response.status_mut() =
                                                        hyper::StatusCode::SERVICE_UNAVAILABLE;
                                                    Ok(response)
                                                }
                                            }
                                        }
                                        _ => {
                                            let mut response =
                                                hyper::Response::new("Not Found".to_string());
                                            *response.status_mut() = hyper::StatusCode::NOT_FOUND;
                                            Ok(response)
                                        }
                                    }
                                }
                            },
                        );

                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await
                        {
                            tracing::error!("Error serving connection: {:?}", err);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Error accepting connection: {}", e);
                }
            }
        }
    });

    Ok(())
}

/// Create a span for Telegram bot operations
pub fn telegram_span(operation: &str, user_id: Option<u64>) -> tracing::Span {
    tracing::info_span!(
        "telegram_operation",
        operation = operation,
        user_id = user_id,
        component = "telegram"
    )
}

/// Create a span for one order poll cycle
pub fn poller_span(cycle: u64) -> tracing::Span {
    tracing::info_span!("order_poll_cycle", cycle = cycle, component = "poller")
}

/// Create a span for database operations
pub fn db_span(operation: &str, table: &str) -> tracing::Span {
    tracing::info_span!(
        "db_operation",
        operation = operation,
        table = table,
        component = "database"
    )
}

/// Record database operation metrics
pub fn record_db_metrics(operation: &str, duration: Duration) {
    let operation = operation.to_string();
    metrics::counter!("db_operations_total", "operation" => operation).increment(1);
    metrics::histogram!("db_operation_duration_seconds").record(duration.as_secs_f64());
}

/// Record request metrics
pub fn record_request_metrics(method: &str, duration: Duration) {
    let method = method.to_string();
    metrics::counter!("requests_total", "method" => method).increment(1);
    metrics::histogram!("request_duration_seconds").record(duration.as_secs_f64());
}

/// Record Telegram message processing metrics
pub fn record_telegram_message(message_type: &str) {
    let message_type = message_type.to_string();
    metrics::counter!("telegram_messages_total", "type" => message_type).increment(1);
}

/// Record the outcome of a user-to-support forward
pub fn record_support_request(result: &str) {
    let result = result.to_string();
    metrics::counter!("support_requests_total", "result" => result).increment(1);
}

/// Record the outcome of a support-to-user reply
pub fn record_support_reply(result: &str) {
    let result = result.to_string();
    metrics::counter!("support_replies_total", "result" => result).increment(1);
}

/// Update registry size gauges
pub fn update_registry_size(entries: usize, evicted: u64) {
    metrics::gauge!("support_sessions").set(entries as f64);
    metrics::gauge!("support_sessions_evicted").set(evicted as f64);
}

/// Record an emitted order notification
pub fn record_order_notification(status: &str) {
    let status = status.to_string();
    metrics::counter!("order_notifications_total", "status" => status).increment(1);
}

/// Record a finished poll cycle
pub fn record_poll_cycle(success: bool, duration: Duration) {
    let result = if success { "success" } else { "failure" };
    metrics::counter!("order_poll_cycles_total", "result" => result).increment(1);
    metrics::histogram!("order_poll_cycle_duration_seconds").record(duration.as_secs_f64());
}

/// Update the watermark gauge
pub fn update_watermark(watermark: DateTime<Utc>) {
    metrics::gauge!("order_watermark_timestamp_seconds").set(watermark.timestamp() as f64);
}

/// Perform readiness checks against the bot's dependencies
pub async fn perform_readiness_checks(
    db_pool: Option<&PgPool>,
    bot_token: Option<&str>,
) -> Result<()> {
    if let Some(pool) = db_pool {
        crate::db::check_database_health(pool).await?;
    }

    if let Some(token) = bot_token {
        check_bot_token_health(token)?;
    }

    Ok(())
}

/// Check Telegram bot token format
pub fn check_bot_token_health(token: &str) -> Result<()> {
    if token.is_empty() {
        return Err(anyhow::anyhow!("Bot token is empty"));
    }

    // Telegram bot tokens have the form "<bot id>:<secret>"
    if !token.contains(':') {
        return Err(anyhow::anyhow!("Bot token format is invalid"));
    }

    tracing::debug!("Bot token health check passed");
    Ok(())
}
