use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::ConfigService;
use crate::dependency::{DependencyKind, DependencyOption};
use crate::error::BootstrapError;
use crate::lifecycle::{BootContext, InitStep, StepOutput};

use super::{Closer, Endpoint};

pub const KAFKA_BROKER_HOSTS: &str = "KAFKA_BROKER_HOSTS";
pub const KAFKA_CLIENT_ID: &str = "KAFKA_CLIENT_ID";

const METADATA_TIMEOUT: Duration = Duration::from_secs(15);
const FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to publish to topic `{topic}`: {source}")]
    Publish {
        topic: String,
        #[source]
        source: KafkaError,
    },

    #[error("publish to topic `{topic}` was canceled before acknowledgment")]
    Canceled { topic: String },
}

/// Publish capability modules get over the broker client.
#[async_trait]
pub trait Broker: Closer {
    async fn publish(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
    ) -> Result<(), BrokerError>;
}

/// Serialize `value` as JSON and publish it.
pub async fn publish_json<T: Serialize>(
    broker: &dyn Broker,
    topic: &str,
    key: Option<&str>,
    value: &T,
) -> Result<(), BrokerError> {
    let payload = serde_json::to_vec(value)?;
    broker.publish(topic, key, &payload).await
}

#[derive(Debug, Clone)]
pub struct BrokerSettings {
    pub hosts: String,
    pub client_id: String,
}

impl BrokerSettings {
    pub fn from_config(config: &ConfigService) -> Result<Self, BootstrapError> {
        Ok(Self {
            hosts: config.require(KAFKA_BROKER_HOSTS)?,
            client_id: config.require(KAFKA_CLIENT_ID)?,
        })
    }
}

/// Kafka broker client wrapping an async producer.
pub struct KafkaBroker {
    producer: FutureProducer,
}

impl KafkaBroker {
    pub async fn open(ctx: &BootContext) -> Result<Self, BootstrapError> {
        let settings = BrokerSettings::from_config(ctx.config())?;
        Self::connect(&settings).await
    }

    /// Creating the producer never touches the network; the metadata fetch is
    /// what makes an unreachable cluster fail startup.
    pub async fn connect(settings: &BrokerSettings) -> Result<Self, BootstrapError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &settings.hosts)
            .set("client.id", &settings.client_id)
            .create()
            .map_err(|err| {
                BootstrapError::connection(DependencyKind::Broker, Endpoint::Primary, err)
            })?;

        let metadata = producer
            .client()
            .fetch_metadata(None, METADATA_TIMEOUT)
            .map_err(|err| {
                BootstrapError::connection(DependencyKind::Broker, Endpoint::Primary, err)
            })?;
        info!(
            client_id = %settings.client_id,
            topics = metadata.topics().len(),
            "kafka: broker connected"
        );
        Ok(Self { producer })
    }

    pub fn init_step() -> InitStep {
        InitStep::new(DependencyKind::Broker, |ctx| async move {
            let broker = Arc::new(Self::open(&ctx).await?);
            Ok(StepOutput {
                handle: broker.clone(),
                option: DependencyOption::Broker(broker),
            })
        })
    }
}

#[async_trait]
impl Closer for KafkaBroker {
    fn kind(&self) -> DependencyKind {
        DependencyKind::Broker
    }

    async fn close(&self) -> anyhow::Result<()> {
        self.producer.flush(FLUSH_TIMEOUT)?;
        info!("kafka: producer flushed and released");
        Ok(())
    }
}

#[async_trait]
impl Broker for KafkaBroker {
    async fn publish(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: &[u8],
    ) -> Result<(), BrokerError> {
        let mut record: FutureRecord<'_, str, [u8]> = FutureRecord::to(topic).payload(payload);
        if let Some(key) = key {
            record = record.key(key);
        }

        let delivery = self.producer.send_result(record).map_err(|(err, _)| {
            BrokerError::Publish {
                topic: topic.to_string(),
                source: err,
            }
        })?;

        match delivery.await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err((err, _))) => Err(BrokerError::Publish {
                topic: topic.to_string(),
                source: err,
            }),
            Err(_) => Err(BrokerError::Canceled {
                topic: topic.to_string(),
            }),
        }
    }
}
