//! Kafka consume/produce loop: the only place this crate talks to the
//! network (spec §4.7). Decoding, planning, and encoding all happen per
//! message; planning itself runs on a blocking thread since it is CPU-bound
//! and never suspends (spec §5).

use std::sync::Arc;
use std::time::Duration;

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use tokio::sync::{broadcast, Semaphore};

use crate::config::Config;
use crate::{geojson_debug, wire};

/// Runs until `shutdown` fires or the consumer/producer can't be built at
/// all (a configuration problem, not a transient network blip).
pub async fn run(config: Arc<Config>, mut shutdown: broadcast::Receiver<()>) -> anyhow::Result<()> {
    let consumer: StreamConsumer = ClientConfig::new()
        .set("bootstrap.servers", &config.kafka_bootstrap_servers)
        .set("group.id", &config.kafka_consumer_group)
        .set("enable.auto.commit", "false")
        .set("auto.offset.reset", "earliest")
        .create()?;
    consumer.subscribe(&[config.kafka_input_topic.as_str()])?;

    let producer: FutureProducer = ClientConfig::new()
        .set("bootstrap.servers", &config.kafka_bootstrap_servers)
        .set("message.timeout.ms", "10000")
        .create()?;

    let in_flight = Arc::new(Semaphore::new(config.max_in_flight_requests.max(1)));

    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => {
                tracing::info!("kafka loop shutting down");
                return Ok(());
            }
            msg = consumer.recv() => {
                let msg = match msg {
                    Ok(msg) => msg,
                    Err(err) => {
                        tracing::error!(error = %err, "kafka recv error");
                        continue;
                    }
                };

                let payload = msg.payload().map(|p| p.to_vec());
                let producer = producer.clone();
                let config = config.clone();
                let permit = in_flight.clone().acquire_owned().await.expect("semaphore is never closed");

                tokio::spawn(async move {
                    let _permit = permit;
                    handle_message(&producer, &config, payload).await;
                });

                if let Err(err) = consumer.store_offset_from_message(&msg) {
                    tracing::warn!(error = %err, "failed to store kafka offset");
                }
            }
        }
    }
}

async fn handle_message(producer: &FutureProducer, config: &Config, payload: Option<Vec<u8>>) {
    let Some(payload) = payload else {
        tracing::warn!("received kafka message with empty payload");
        return;
    };

    let response = match wire::decode_request(&payload) {
        Ok(request) => {
            tokio::task::spawn_blocking(move || routing_core::handle_routing_request(&request))
                .await
                .unwrap_or_else(|join_err| {
                    tracing::error!(error = %join_err, "planning task panicked");
                    routing_core::RoutingResponse::decode_failure(
                        "unknown".to_string(),
                        "planning task panicked".to_string(),
                    )
                })
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to decode routing request");
            wire::decode_failure_response(&payload, &err)
        }
    };

    geojson_debug::maybe_write(config.geojson_debug_dir.as_deref(), &response);

    let body = wire::encode_response(&response);
    let record: FutureRecord<(), Vec<u8>> = FutureRecord::to(&config.kafka_output_topic).payload(&body);
    if let Err((err, _)) = producer.send(record, Duration::from_secs(5)).await {
        tracing::error!(error = %err, request_id = %response.request_id, "failed to publish routing response");
    }
}
