/// 이벤트 발행/구독 (Kafka)
/// 같은 집계의 이벤트는 같은 키로 보내 파티션 안에서 순서가 유지된다
// region:    --- Imports
use crate::config::Config;
use crate::error::{Result, SettlementError};
use crate::event_store::Event;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::ClientConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{debug, error, info, warn};

// endregion: --- Imports

/// 로트/인보이스 이벤트가 발행되는 토픽
pub const EVENTS_TOPIC: &str = "events";

/// 일시적인 오류로 실패한 이벤트 반영 재시도 횟수
const PROJECTION_ATTEMPTS: u32 = 3;
const READY_ATTEMPTS: u32 = 10;

/// 파티션 키: 같은 집계는 같은 파티션
pub fn partition_key(event: &Event) -> String {
    format!("{}-{}", event.aggregate_type, event.aggregate_id)
}

fn broker_error(context: &str, e: impl std::fmt::Debug) -> SettlementError {
    SettlementError::Broker(format!("{}: {:?}", context, e))
}

// region:    --- Kafka Producer
#[derive(Clone)]
pub struct KafkaProducer {
    producer: Arc<FutureProducer>,
}

impl KafkaProducer {
    pub fn new(brokers: &str) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("message.timeout.ms", "5000")
            .set("acks", "all")
            .set("enable.idempotence", "true")
            .create()
            .map_err(|e| broker_error("Producer 생성 실패", e))?;

        Ok(KafkaProducer {
            producer: Arc::new(producer),
        })
    }

    /// 저장된 이벤트 발행
    pub async fn publish_event(&self, event: &Event) -> Result<()> {
        let key = partition_key(event);
        let payload = serde_json::to_string(event)?;
        let record = FutureRecord::to(EVENTS_TOPIC).key(&key).payload(&payload);

        let (partition, offset) = self
            .producer
            .send(record, Duration::from_secs(0))
            .await
            .map_err(|(e, _)| broker_error("이벤트 발행 실패", e))?;

        debug!(
            "{:<12} --> {} 발행: key={}, partition={}, offset={}",
            "Producer", event.event_type, key, partition, offset
        );
        Ok(())
    }

    /// 브로커 메타데이터 조회 (연결 확인용, 블로킹 호출)
    async fn broker_count(&self, timeout: Duration) -> Result<usize> {
        let producer = Arc::clone(&self.producer);
        tokio::task::spawn_blocking(move || {
            producer
                .client()
                .fetch_metadata(None, timeout)
                .map(|metadata| metadata.brokers().len())
        })
        .await
        .map_err(|e| broker_error("메타데이터 조회 태스크 실패", e))?
        .map_err(|e| broker_error("메타데이터 조회 실패", e))
    }
}

// endregion: --- Kafka Producer

// region:    --- Kafka Consumer
pub struct KafkaConsumer {
    consumer: Arc<StreamConsumer>,
}

impl KafkaConsumer {
    pub fn new(brokers: &str, group_id: &str) -> Result<Self> {
        // 오프셋은 반영이 끝난 뒤에 커밋
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .set("fetch.max.bytes", "5242880")
            .set("allow.auto.create.topics", "true")
            .create()
            .map_err(|e| broker_error("Consumer 생성 실패", e))?;

        Ok(KafkaConsumer {
            consumer: Arc::new(consumer),
        })
    }

    /// 이벤트 소싱
    /// 일시적인 오류는 재시도하고, 그 외 실패한 이벤트는 기록 후 건너뛴다
    pub async fn consume_events<F, Fut>(&self, topic: &str, handler: F) -> Result<()>
    where
        F: Fn(Event) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        info!(
            "{:<12} --> Kafka 이벤트 소싱 시작: topic={}",
            "Consumer", topic
        );
        self.consumer
            .subscribe(&[topic])
            .map_err(|e| broker_error("구독 실패", e))?;

        loop {
            let message = match self.consumer.recv().await {
                Ok(message) => message,
                Err(e) => {
                    error!("{:<12} --> 메시지 수신 오류: {:?}", "Consumer", e);
                    continue;
                }
            };
            debug!(
                "{:<12} --> 메시지 수신: partition={}, offset={}",
                "Consumer",
                message.partition(),
                message.offset()
            );

            match message.payload().map(|payload| serde_json::from_slice::<Event>(payload)) {
                Some(Ok(event)) => handle_with_retry(&handler, event).await,
                Some(Err(e)) => error!("{:<12} --> deserialize 오류: {:?}", "Consumer", e),
                None => warn!("{:<12} --> 빈 페이로드 수신", "Consumer"),
            }

            if let Err(e) = self.consumer.commit_message(&message, CommitMode::Async) {
                error!("{:<12} --> 오프셋 커밋 실패: {:?}", "Consumer", e);
            }
        }
    }
}

async fn handle_with_retry<F, Fut>(handler: &F, event: Event)
where
    F: Fn(Event) -> Fut,
    Fut: std::future::Future<Output = Result<()>>,
{
    for attempt in 1..=PROJECTION_ATTEMPTS {
        match handler(event.clone()).await {
            Ok(()) => return,
            Err(e) if e.is_transient() && attempt < PROJECTION_ATTEMPTS => {
                warn!(
                    "{:<12} --> 이벤트 {} 반영 재시도 ({}/{}): {:?}",
                    "Consumer", event.id, attempt, PROJECTION_ATTEMPTS, e
                );
                time::sleep(Duration::from_millis(200 * u64::from(attempt))).await;
            }
            Err(e) => {
                error!(
                    "{:<12} --> 이벤트 {} 반영 실패 ({} v{}): {:?}",
                    "Consumer", event.id, event.event_type, event.version, e
                );
                return;
            }
        }
    }
}

// endregion: --- Kafka Consumer

// region:    --- Kafka Manager
pub struct KafkaManager {
    producer: Arc<KafkaProducer>,
    consumer: Arc<KafkaConsumer>,
    brokers: String,
}

impl KafkaManager {
    pub fn new(config: &Config) -> Result<Self> {
        let producer = Arc::new(KafkaProducer::new(&config.kafka_brokers)?);
        let consumer = Arc::new(KafkaConsumer::new(
            &config.kafka_brokers,
            &config.kafka_group_id,
        )?);

        Ok(KafkaManager {
            producer,
            consumer,
            brokers: config.kafka_brokers.clone(),
        })
    }

    /// 프로듀서 반환
    pub fn get_producer(&self) -> Arc<KafkaProducer> {
        Arc::clone(&self.producer)
    }

    /// 컨슈머 반환
    pub fn get_consumer(&self) -> Arc<KafkaConsumer> {
        Arc::clone(&self.consumer)
    }

    /// 브로커가 응답할 때까지 대기
    pub async fn initialize(&self) -> Result<()> {
        info!("{:<12} --> Kafka 연결 확인: {}", "Manager", self.brokers);

        for attempt in 1..=READY_ATTEMPTS {
            match self.producer.broker_count(Duration::from_secs(1)).await {
                Ok(count) if count > 0 => {
                    info!("{:<12} --> Kafka 브로커 {}개 응답", "Manager", count);
                    return Ok(());
                }
                Ok(_) => warn!("{:<12} --> 응답한 브로커 없음", "Manager"),
                Err(e) => warn!(
                    "{:<12} --> Kafka 연결 대기 중... (시도: {}/{}) {:?}",
                    "Manager", attempt, READY_ATTEMPTS, e
                ),
            }
            time::sleep(Duration::from_secs(1)).await;
        }

        Err(SettlementError::Broker(format!(
            "Kafka 브로커 응답 없음: {}",
            self.brokers
        )))
    }

    /// 토픽 생성 (이미 있으면 그대로 사용)
    pub async fn create_topic(
        &self,
        topic_name: &str,
        num_partitions: i32,
        replication_factor: i32,
    ) -> Result<()> {
        let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .create()
            .map_err(|e| broker_error("AdminClient 생성 실패", e))?;

        let new_topic = NewTopic::new(
            topic_name,
            num_partitions,
            TopicReplication::Fixed(replication_factor),
        );

        let results = admin_client
            .create_topics(&[new_topic], &AdminOptions::new())
            .await
            .map_err(|e| broker_error("토픽 생성 실패", e))?;

        for result in results {
            match result {
                Ok(name) => info!("{:<12} --> Kafka 토픽 생성: {}", "Manager", name),
                Err((name, RDKafkaErrorCode::TopicAlreadyExists)) => {
                    debug!("{:<12} --> Kafka 토픽 존재: {}", "Manager", name)
                }
                Err((name, code)) => {
                    return Err(broker_error(&format!("토픽 {} 생성 실패", name), code));
                }
            }
        }
        Ok(())
    }
}

// endregion: --- Kafka Manager
