// region:    --- Imports
use crate::auction::events::LotEvent;
use crate::auction::lifecycle::{extended_end, is_sealed_bid};
use crate::bidding::model::LotHistory;
use crate::bidding::resolver::resolve;
use crate::database::DatabaseManager;
use crate::error::{Result, SettlementError};
use crate::invoice::ledger::{recalculate_for_participants, recalculate_invoice};
use crate::invoice::model::AdjustmentDirection;
use crate::message_broker::{KafkaConsumer, KafkaProducer, EVENTS_TOPIC};
use crate::query::handlers::{
    fetch_lot_auction, fetch_lot_bids, fetch_lot_for_update, fetch_tos, fetch_tos_for_user,
};
use crate::query::queries;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool, Row};
use std::sync::Arc;
use tracing::{error, info, warn};

// endregion: --- Imports

// region:    --- Event Model
/// 이벤트 저장소에 저장되는 이벤트 모델
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Event {
    pub id: i64,
    pub aggregate_type: String,
    pub aggregate_id: i64,
    pub event_type: String,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub version: i64,
}

impl Event {
    /// 로트 이벤트를 저장용 이벤트로 변환
    pub fn from_lot_event(lot_event: &LotEvent, version: i64) -> Result<Self> {
        Ok(Self {
            id: 0,
            aggregate_type: lot_event.aggregate_type().to_string(),
            aggregate_id: lot_event.aggregate_id(),
            event_type: lot_event.event_type().to_string(),
            data: serde_json::to_value(lot_event)?,
            timestamp: lot_event.timestamp(),
            version,
        })
    }

    /// 저장된 데이터를 로트 이벤트로 복원
    pub fn lot_event(&self) -> Result<LotEvent> {
        let lot_event: LotEvent = serde_json::from_value(self.data.clone())?;
        if lot_event.event_type() != self.event_type {
            return Err(SettlementError::UnknownEvent(self.event_type.clone()));
        }
        Ok(lot_event)
    }
}
// endregion: --- Event Model

// region:    --- Event Store Trait
/// 이벤트 저장소 트레이트
#[async_trait]
pub trait EventStore {
    /// 같은 버전이 이미 있으면 `SettlementError::VersionConflict`
    async fn append_and_publish_event(&self, event: Event) -> Result<()>;
}

/// 이벤트 저장소 구현체
pub struct PostgresEventStore {
    pool: Arc<PgPool>,
    kafka_producer: Arc<KafkaProducer>,
}

/// 이벤트 저장소 구현체 메서드 구현
#[async_trait]
impl EventStore for PostgresEventStore {
    async fn append_and_publish_event(&self, event: Event) -> Result<()> {
        let event_id = sqlx::query_scalar::<_, i64>(queries::INSERT_EVENT)
            .bind(&event.aggregate_type)
            .bind(event.aggregate_id)
            .bind(&event.event_type)
            .bind(&event.data)
            .bind(event.timestamp)
            .bind(event.version)
            .fetch_optional(&*self.pool)
            .await?
            .ok_or(SettlementError::VersionConflict)?;

        let stored = Event {
            id: event_id,
            ..event
        };

        // 이벤트를 카프카에 발행
        self.kafka_producer.publish_event(&stored).await?;

        Ok(())
    }
}

/// 이벤트 저장소 생성
impl PostgresEventStore {
    pub fn new(pool: Arc<PgPool>, kafka_producer: Arc<KafkaProducer>) -> Self {
        Self {
            pool,
            kafka_producer,
        }
    }
}

// endregion: --- Event Store

// region:    --- Event Consumer
/// 이벤트 소싱 구현체
pub struct EventConsumer {
    db_manager: Arc<DatabaseManager>,
    kafka_consumer: Arc<KafkaConsumer>,
}

/// 이벤트 소싱 구현체 메서드 구현
impl EventConsumer {
    /// 이벤트 소싱 생성
    pub fn new(db_manager: Arc<DatabaseManager>, kafka_consumer: Arc<KafkaConsumer>) -> Self {
        EventConsumer {
            db_manager,
            kafka_consumer,
        }
    }

    /// 이벤트 소싱 시작
    pub async fn start(&self) {
        let db_manager = Arc::clone(&self.db_manager);
        if let Err(e) = self
            .kafka_consumer
            .consume_events(EVENTS_TOPIC, move |event| {
                let db_manager = Arc::clone(&db_manager);
                Box::pin(async move { Self::process_event(&db_manager, event).await })
            })
            .await
        {
            error!("{:<12} --> 이벤트 소비 오류: {:?}", "EventConsume", e);
        }
    }

    /// 이벤트 처리 (하나의 트랜잭션)
    pub async fn process_event(db_manager: &DatabaseManager, event: Event) -> Result<()> {
        let lot_event = match event.lot_event() {
            Ok(lot_event) => lot_event,
            Err(e) => {
                warn!(
                    "{:<12} --> 알 수 없는 이벤트 타입: {} ({})",
                    "EventConsume", event.event_type, e
                );
                return Ok(());
            }
        };
        info!(
            "{:<12} --> {} (aggregate: {}, version: {})",
            "EventConsume", event.event_type, event.aggregate_id, event.version
        );
        db_manager
            .transaction(|tx| Box::pin(apply_event(&mut **tx, lot_event)))
            .await
    }
}
// endregion: --- Event Consumer

// region:    --- Projection
/// 이벤트를 관계형 테이블에 반영
pub async fn apply_event(conn: &mut PgConnection, lot_event: LotEvent) -> Result<()> {
    match lot_event {
        LotEvent::BidPlaced {
            lot_id,
            user_id,
            amount,
            timestamp,
        } => apply_bid_placed(conn, lot_id, user_id, amount, timestamp).await,
        LotEvent::BuyNowExecuted {
            lot_id,
            buyer_id,
            price,
            timestamp,
        } => apply_buy_now(conn, lot_id, buyer_id, price, timestamp).await,
        LotEvent::WinnerDeclared {
            lot_id,
            auctiontos_winner,
            winning_price,
            declared_by,
            override_existing,
            timestamp,
        } => {
            let declaration = WinnerDeclaration {
                auctiontos_winner,
                winning_price,
                declared_by,
                override_existing,
            };
            apply_winner_declared(conn, lot_id, declaration, timestamp).await
        }
        LotEvent::LotEnded {
            lot_id,
            winner_user_id,
            winning_price,
            timestamp,
        } => apply_lot_ended(conn, lot_id, winner_user_id, winning_price, timestamp).await,
        LotEvent::InvoiceAdjusted {
            invoice_id,
            direction,
            amount,
            notes,
            ..
        } => apply_invoice_adjusted(conn, invoice_id, direction, amount, &notes).await,
    }
}

struct WinnerDeclaration {
    auctiontos_winner: i64,
    winning_price: i64,
    declared_by: Option<i64>,
    override_existing: bool,
}

/// 입찰 반영: 금액 인상, 최고 입찰자 표시, 종료 시각 연장, 이력
async fn apply_bid_placed(
    conn: &mut PgConnection,
    lot_id: i64,
    user_id: i64,
    amount: i64,
    timestamp: DateTime<Utc>,
) -> Result<()> {
    let lot = fetch_lot_for_update(conn, lot_id).await?;
    let auction = fetch_lot_auction(conn, &lot).await?;
    let before = resolve(&lot, auction.as_ref(), &fetch_lot_bids(conn, lot_id).await?, timestamp);

    let raised = sqlx::query(queries::UPSERT_BID)
        .bind(lot_id)
        .bind(user_id)
        .bind(amount)
        .bind(timestamp)
        .fetch_optional(&mut *conn)
        .await?;
    if raised.is_none() {
        info!(
            "{:<12} --> 입찰 무시: 기존 입찰 금액 이상 (lot: {}, user: {})",
            "EventConsume", lot_id, user_id
        );
        return Ok(());
    }

    let bids = fetch_lot_bids(conn, lot_id).await?;
    let after = resolve(&lot, auction.as_ref(), &bids, timestamp);

    sqlx::query(queries::UPDATE_HIGH_BID_FLAGS)
        .bind(lot_id)
        .bind(after.high_bidder)
        .execute(&mut *conn)
        .await?;

    let extension = if after.changed_from(&before) {
        extended_end(&lot, auction.as_ref(), timestamp)
    } else {
        None
    };
    if let Some(new_end) = extension {
        sqlx::query(queries::EXTEND_LOT_END)
            .bind(new_end)
            .bind(lot_id)
            .execute(&mut *conn)
            .await?;
        info!(
            "{:<12} --> 로트 {} 종료 시각 연장: {}",
            "EventConsume", lot_id, new_end
        );
    }

    let sealed = is_sealed_bid(auction.as_ref());
    let changed_price = after.high_bid != before.high_bid;
    let message = if sealed {
        "Sealed bid placed".to_string()
    } else if after.high_bidder != before.high_bidder && after.high_bidder == Some(user_id) {
        format!("New high bidder! Current bid is ${}", after.high_bid)
    } else if changed_price {
        format!("Bid placed, current bid is now ${}", after.high_bid)
    } else {
        "Bid placed".to_string()
    };
    insert_history(
        conn,
        &LotHistory {
            id: 0,
            lot_id,
            user_id: Some(user_id),
            message,
            timestamp,
            current_price: if sealed { None } else { Some(after.high_bid) },
            changed_price: changed_price && !sealed,
            bid_amount: Some(amount),
        },
    )
    .await?;

    info!(
        "{:<12} --> 입찰 성공: lot {}, 현재 가격 {}",
        "EventConsume", lot_id, after.high_bid
    );
    Ok(())
}

/// 즉시 구매 반영 (낙찰가가 없을 때만)
async fn apply_buy_now(
    conn: &mut PgConnection,
    lot_id: i64,
    buyer_id: i64,
    price: i64,
    timestamp: DateTime<Utc>,
) -> Result<()> {
    let lot = fetch_lot_for_update(conn, lot_id).await?;
    if let Some(existing) = lot.winning_price {
        info!(
            "{:<12} --> 즉시 구매 실패: 이미 낙찰된 로트 (lot: {}, price: {})",
            "EventConsume", lot_id, existing
        );
        return Ok(());
    }
    let auction = fetch_lot_auction(conn, &lot).await?;
    let winner_tos = match &auction {
        Some(auction) => fetch_tos_for_user(conn, auction.id, buyer_id)
            .await?
            .map(|tos| tos.id),
        None => None,
    };

    sqlx::query(queries::SET_BUY_NOW_WINNER)
        .bind(buyer_id)
        .bind(winner_tos)
        .bind(price)
        .bind(timestamp)
        .bind(lot_id)
        .execute(&mut *conn)
        .await?;

    insert_history(
        conn,
        &LotHistory {
            id: 0,
            lot_id,
            user_id: Some(buyer_id),
            message: format!("Bought now for ${}", price),
            timestamp,
            current_price: Some(price),
            changed_price: true,
            bid_amount: None,
        },
    )
    .await?;

    if let Some(auction) = &auction {
        recalculate_for_participants(conn, auction.id, &[lot.auctiontos_seller, winner_tos]).await?;
    }
    info!(
        "{:<12} --> 즉시 구매 성공: lot {}, 최종 가격 {}",
        "EventConsume", lot_id, price
    );
    Ok(())
}

/// 관리자 낙찰자 지정 반영
async fn apply_winner_declared(
    conn: &mut PgConnection,
    lot_id: i64,
    declaration: WinnerDeclaration,
    timestamp: DateTime<Utc>,
) -> Result<()> {
    let lot = fetch_lot_for_update(conn, lot_id).await?;
    if let Some(existing) = lot.winning_price {
        if !declaration.override_existing {
            warn!(
                "{:<12} --> 낙찰자 지정 무시: 이미 낙찰가 {} (lot: {})",
                "EventConsume", existing, lot_id
            );
            return Ok(());
        }
    }

    let winner = fetch_tos(conn, declaration.auctiontos_winner).await?;
    if lot.auction_id != Some(winner.auction_id) {
        return Err(SettlementError::InvalidData(format!(
            "참가자 {}는 로트 {}의 경매에 속하지 않습니다",
            winner.id, lot_id
        )));
    }

    sqlx::query(queries::SET_LOT_WINNER)
        .bind(winner.user_id)
        .bind(winner.id)
        .bind(declaration.winning_price)
        .bind(lot_id)
        .execute(&mut *conn)
        .await?;

    let message = match lot.auctiontos_winner {
        Some(previous) if previous != winner.id => format!(
            "Winner changed to {} for ${}",
            winner.display_name(),
            declaration.winning_price
        ),
        _ => format!(
            "{} won this lot for ${}",
            winner.display_name(),
            declaration.winning_price
        ),
    };
    insert_history(
        conn,
        &LotHistory {
            id: 0,
            lot_id,
            user_id: declaration.declared_by,
            message,
            timestamp,
            current_price: Some(declaration.winning_price),
            changed_price: true,
            bid_amount: None,
        },
    )
    .await?;

    recalculate_for_participants(
        conn,
        winner.auction_id,
        &[lot.auctiontos_seller, Some(winner.id), lot.auctiontos_winner],
    )
    .await?;
    info!(
        "{:<12} --> 낙찰자 지정: lot {}, 참가자 {}, 가격 {}",
        "EventConsume", lot_id, winner.id, declaration.winning_price
    );
    Ok(())
}

/// 로트 종료 반영, 이미 낙찰가가 있으면 유지
async fn apply_lot_ended(
    conn: &mut PgConnection,
    lot_id: i64,
    winner_user_id: Option<i64>,
    winning_price: Option<i64>,
    timestamp: DateTime<Utc>,
) -> Result<()> {
    let lot = fetch_lot_for_update(conn, lot_id).await?;
    if !lot.active {
        info!("{:<12} --> 이미 종료된 로트: {}", "EventConsume", lot_id);
        return Ok(());
    }
    let auction = fetch_lot_auction(conn, &lot).await?;

    let (winner_user_id, auctiontos_winner, winning_price) = if lot.winning_price.is_some() {
        (lot.winner_user_id, lot.auctiontos_winner, lot.winning_price)
    } else {
        // 앞선 BidPlaced는 이미 반영되어 있으므로 현재 입찰로 다시 계산
        let resolution = resolve(&lot, auction.as_ref(), &fetch_lot_bids(conn, lot_id).await?, timestamp);
        let resolved = (resolution.high_bidder, resolution.winning_price());
        if resolved != (winner_user_id, winning_price) {
            warn!(
                "{:<12} --> 로트 {} 낙찰 재계산: 이벤트 {:?}/{:?} -> {:?}/{:?}",
                "EventConsume", lot_id, winner_user_id, winning_price, resolved.0, resolved.1
            );
        }
        match (resolved, &auction) {
            ((Some(user_id), Some(price)), Some(auction)) => {
                let tos = fetch_tos_for_user(conn, auction.id, user_id).await?;
                (Some(user_id), tos.map(|tos| tos.id), Some(price))
            }
            ((Some(user_id), Some(price)), None) => (Some(user_id), None, Some(price)),
            _ => (None, None, None),
        }
    };

    sqlx::query(queries::SET_LOT_WINNER)
        .bind(winner_user_id)
        .bind(auctiontos_winner)
        .bind(winning_price)
        .bind(lot_id)
        .execute(&mut *conn)
        .await?;

    let message = match winning_price {
        Some(price) => format!("Lot ended, sold for ${}", price),
        None => "Lot ended without a winner".to_string(),
    };
    insert_history(
        conn,
        &LotHistory {
            id: 0,
            lot_id,
            user_id: None,
            message,
            timestamp,
            current_price: winning_price,
            changed_price: false,
            bid_amount: None,
        },
    )
    .await?;

    if let Some(auction) = &auction {
        recalculate_for_participants(conn, auction.id, &[lot.auctiontos_seller, auctiontos_winner])
            .await?;
    }
    info!(
        "{:<12} --> 로트 종료: {} (낙찰가 {:?})",
        "EventConsume", lot_id, winning_price
    );
    Ok(())
}

/// 인보이스 조정 반영 후 재계산
async fn apply_invoice_adjusted(
    conn: &mut PgConnection,
    invoice_id: i64,
    direction: AdjustmentDirection,
    amount: i64,
    notes: &str,
) -> Result<()> {
    let row = sqlx::query(queries::UPDATE_INVOICE_ADJUSTMENT)
        .bind(direction.as_str())
        .bind(amount)
        .bind(notes)
        .bind(invoice_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(SettlementError::InvoiceNotFound(invoice_id))?;
    let auction_id: i64 = row.try_get("auction_id")?;
    let tos_id: i64 = row.try_get("auctiontos_user")?;

    recalculate_invoice(conn, auction_id, tos_id).await?;
    info!(
        "{:<12} --> 인보이스 {} 조정: {} {}",
        "EventConsume",
        invoice_id,
        direction.as_str(),
        amount
    );
    Ok(())
}

async fn insert_history(conn: &mut PgConnection, history: &LotHistory) -> Result<()> {
    sqlx::query(queries::INSERT_LOT_HISTORY)
        .bind(history.lot_id)
        .bind(history.user_id)
        .bind(&history.message)
        .bind(history.timestamp)
        .bind(history.current_price)
        .bind(history.changed_price)
        .bind(history.bid_amount)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
// endregion: --- Projection
