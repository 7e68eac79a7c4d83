// region:    --- Imports
use fish_auction_settlement::config::Config;
use fish_auction_settlement::database::DatabaseManager;
use fish_auction_settlement::event_store::{EventConsumer, PostgresEventStore};
use fish_auction_settlement::message_broker::{KafkaManager, EVENTS_TOPIC};
use fish_auction_settlement::scheduler::SettlementScheduler;
use std::sync::Arc;
use tracing::{error, info};
// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    let config = Config::from_env()?;

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::new(&config).await?);

    // 데이터베이스 초기화
    let initialized = if config.database_reset {
        db_manager.reset_database().await
    } else {
        db_manager.initialize_database().await
    };
    if let Err(e) = initialized {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // Kafka 매니저 생성 및 초기화
    let kafka_manager = Arc::new(KafkaManager::new(&config)?);
    if let Err(e) = kafka_manager.initialize().await {
        error!("{:<12} --> Kafka 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> Kafka 초기화 성공", "Main");

    // 토픽 생성
    kafka_manager.create_topic(EVENTS_TOPIC, 5, 1).await?;

    // 이벤트 소싱 시작
    let event_consumer = EventConsumer::new(Arc::clone(&db_manager), kafka_manager.get_consumer());
    tokio::spawn(async move {
        event_consumer.start().await;
    });

    // 정산 스케줄러 시작
    let event_store = Arc::new(PostgresEventStore::new(
        db_manager.get_pool(),
        kafka_manager.get_producer(),
    ));
    let scheduler = SettlementScheduler::new(
        Arc::clone(&db_manager),
        event_store,
        config.scheduler_interval,
    )
    .start();
    info!(
        "{:<12} --> 정산 워커 시작 (주기 {:?})",
        "Main", config.scheduler_interval
    );

    tokio::signal::ctrl_c().await?;
    info!("{:<12} --> 종료 신호 수신", "Main");
    scheduler.abort();
    Ok(())
}
// endregion: --- Main
