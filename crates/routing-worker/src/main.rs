//! Routing worker - consumes routing requests from Kafka, plans routes with
//! `routing-core`, and publishes responses.

mod backoff;
mod config;
mod error;
mod geojson_debug;
mod kafka;
mod wire;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::sync::broadcast;

use crate::backoff::Backoff;
use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "routing-worker", about = "Kafka-backed 3D path planning worker")]
struct Cli {
    /// Exit after validating configuration instead of starting the consume loop.
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("routing_worker=debug".parse()?);
    let log_format = std::env::var("ROUTING_LOG_FORMAT").unwrap_or_default();
    if log_format.trim().eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    tracing::info!("Starting routing worker...");

    let config = Arc::new(Config::from_env()?);
    tracing::info!(
        input_topic = %config.kafka_input_topic,
        output_topic = %config.kafka_output_topic,
        group = %config.kafka_consumer_group,
        "configuration loaded"
    );

    if cli.check_config {
        tracing::info!("configuration OK, exiting (--check-config)");
        return Ok(());
    }

    let (shutdown_tx, _) = broadcast::channel(1);

    spawn_supervised_loop("kafka-consume", shutdown_tx.clone(), {
        let config = config.clone();
        move |shutdown| crate::kafka::run(config.clone(), shutdown)
    });

    shutdown_signal(shutdown_tx).await;
    // Give the in-flight consume loop a moment to observe the shutdown
    // signal and return before the process exits.
    tokio::time::sleep(Duration::from_millis(200)).await;
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {},
                _ = sigterm.recv() => {},
            }
        }
        Err(err) => {
            tracing::warn!("Failed to install SIGTERM handler (CTRL-C only): {}", err);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}

#[cfg(not(unix))]
async fn shutdown_signal(shutdown_tx: broadcast::Sender<()>) {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received");
    let _ = shutdown_tx.send(());
}

/// Runs `make_future` under supervision: if it returns or errors before
/// shutdown is signaled, it is restarted with a backoff delay instead of
/// silently leaving the worker without a consumer.
fn spawn_supervised_loop<F, Fut>(name: &'static str, shutdown_tx: broadcast::Sender<()>, make_future: F)
where
    F: Fn(broadcast::Receiver<()>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut shutdown_rx = shutdown_tx.subscribe();
        let mut backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(30));
        loop {
            let task_shutdown = shutdown_tx.subscribe();
            let handle = tokio::spawn(make_future(task_shutdown));
            tokio::pin!(handle);
            let wait = tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    handle.as_mut().abort();
                    break;
                }
                result = &mut handle => {
                    match result {
                        Ok(Ok(())) => {
                            tracing::warn!("{} loop exited unexpectedly", name);
                            backoff.fail()
                        }
                        Ok(Err(err)) => {
                            tracing::error!("{} loop failed: {}", name, err);
                            backoff.fail()
                        }
                        Err(err) => {
                            tracing::error!("{} loop crashed: {}", name, err);
                            backoff.fail()
                        }
                    }
                }
            };

            if shutdown_rx.try_recv().is_ok() {
                break;
            }

            tracing::warn!("Restarting {} loop in {:?}", name, wait);
            tokio::time::sleep(wait).await;
        }
    });
}
