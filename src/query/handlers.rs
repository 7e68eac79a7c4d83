// region:    --- Imports
use super::queries;
use crate::auction::model::{Auction, AuctionTos};
use crate::auction::stats::AuctionStats;
use crate::bidding::model::{Bid, Lot, LotHistory};
use crate::database::DatabaseManager;
use crate::error::{Result, SettlementError};
use crate::invoice::model::Invoice;
use crate::settlement::payout::{compute_payout, Payout};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, Row};
use std::collections::HashMap;
use tracing::info;

// endregion: --- Imports

// region:    --- Connection Queries
// 트랜잭션 안에서 재사용되는 조회 함수

pub async fn fetch_auction(conn: &mut PgConnection, auction_id: i64) -> Result<Auction> {
    sqlx::query_as::<_, Auction>(queries::GET_AUCTION)
        .bind(auction_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(SettlementError::AuctionNotFound(auction_id))
}

pub async fn fetch_lot(conn: &mut PgConnection, lot_id: i64) -> Result<Lot> {
    sqlx::query_as::<_, Lot>(queries::GET_LOT)
        .bind(lot_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(SettlementError::LotNotFound(lot_id))
}

/// 이벤트 반영 중 동시 수정을 막기 위해 행을 잠근다
pub async fn fetch_lot_for_update(conn: &mut PgConnection, lot_id: i64) -> Result<Lot> {
    sqlx::query_as::<_, Lot>(queries::GET_LOT_FOR_UPDATE)
        .bind(lot_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(SettlementError::LotNotFound(lot_id))
}

/// 로트가 속한 경매 (없으면 None)
pub async fn fetch_lot_auction(conn: &mut PgConnection, lot: &Lot) -> Result<Option<Auction>> {
    match lot.auction_id {
        Some(auction_id) => Ok(Some(fetch_auction(conn, auction_id).await?)),
        None => Ok(None),
    }
}

pub async fn fetch_lot_bids(conn: &mut PgConnection, lot_id: i64) -> Result<Vec<Bid>> {
    Ok(sqlx::query_as::<_, Bid>(queries::GET_LOT_BIDS)
        .bind(lot_id)
        .fetch_all(&mut *conn)
        .await?)
}

pub async fn fetch_auction_lots(conn: &mut PgConnection, auction_id: i64) -> Result<Vec<Lot>> {
    Ok(sqlx::query_as::<_, Lot>(queries::GET_AUCTION_LOTS)
        .bind(auction_id)
        .fetch_all(&mut *conn)
        .await?)
}

pub async fn fetch_participant_lots(
    conn: &mut PgConnection,
    auction_id: i64,
    tos_id: i64,
) -> Result<Vec<Lot>> {
    Ok(sqlx::query_as::<_, Lot>(queries::GET_PARTICIPANT_LOTS)
        .bind(auction_id)
        .bind(tos_id)
        .fetch_all(&mut *conn)
        .await?)
}

pub async fn fetch_tos(conn: &mut PgConnection, tos_id: i64) -> Result<AuctionTos> {
    sqlx::query_as::<_, AuctionTos>(queries::GET_TOS)
        .bind(tos_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(SettlementError::ParticipantNotFound(tos_id))
}

pub async fn fetch_tos_for_user(
    conn: &mut PgConnection,
    auction_id: i64,
    user_id: i64,
) -> Result<Option<AuctionTos>> {
    Ok(sqlx::query_as::<_, AuctionTos>(queries::GET_TOS_FOR_USER)
        .bind(auction_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn fetch_auction_participants(
    conn: &mut PgConnection,
    auction_id: i64,
) -> Result<Vec<AuctionTos>> {
    Ok(sqlx::query_as::<_, AuctionTos>(queries::GET_AUCTION_PARTICIPANTS)
        .bind(auction_id)
        .fetch_all(&mut *conn)
        .await?)
}

pub async fn fetch_invoice(conn: &mut PgConnection, invoice_id: i64) -> Result<Invoice> {
    sqlx::query_as::<_, Invoice>(queries::GET_INVOICE)
        .bind(invoice_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(SettlementError::InvoiceNotFound(invoice_id))
}

pub async fn fetch_participant_invoice(
    conn: &mut PgConnection,
    auction_id: i64,
    tos_id: i64,
) -> Result<Option<Invoice>> {
    Ok(sqlx::query_as::<_, Invoice>(queries::GET_PARTICIPANT_INVOICE)
        .bind(auction_id)
        .bind(tos_id)
        .fetch_optional(&mut *conn)
        .await?)
}

pub async fn fetch_auction_invoices(conn: &mut PgConnection, auction_id: i64) -> Result<Vec<Invoice>> {
    Ok(sqlx::query_as::<_, Invoice>(queries::GET_AUCTION_INVOICES)
        .bind(auction_id)
        .fetch_all(&mut *conn)
        .await?)
}

async fn fetch_aggregate_version(
    conn: &mut PgConnection,
    aggregate_type: &str,
    aggregate_id: i64,
) -> Result<i64> {
    let row = sqlx::query(queries::GET_AGGREGATE_VERSION)
        .bind(aggregate_type)
        .bind(aggregate_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(row.try_get("version")?)
}

// endregion: --- Connection Queries

// region:    --- Query Handlers

/// 경매 조회
pub async fn get_auction(db_manager: &DatabaseManager, auction_id: i64) -> Result<Auction> {
    info!("{:<12} --> 경매 조회 id: {}", "Query", auction_id);
    db_manager
        .transaction(|tx| Box::pin(fetch_auction(&mut **tx, auction_id)))
        .await
}

/// 로트 조회
pub async fn get_lot(db_manager: &DatabaseManager, lot_id: i64) -> Result<Lot> {
    info!("{:<12} --> 로트 조회 id: {}", "Query", lot_id);
    db_manager
        .transaction(|tx| Box::pin(fetch_lot(&mut **tx, lot_id)))
        .await
}

/// 로트와 소속 경매 조회
pub async fn get_lot_with_auction(
    db_manager: &DatabaseManager,
    lot_id: i64,
) -> Result<(Lot, Option<Auction>)> {
    info!("{:<12} --> 로트/경매 조회 id: {}", "Query", lot_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let lot = fetch_lot(&mut **tx, lot_id).await?;
                let auction = fetch_lot_auction(&mut **tx, &lot).await?;
                Ok::<_, SettlementError>((lot, auction))
            })
        })
        .await
}

/// 로트 입찰 조회 (금액 내림차순)
pub async fn get_lot_bids(db_manager: &DatabaseManager, lot_id: i64) -> Result<Vec<Bid>> {
    info!("{:<12} --> 로트 입찰 조회 id: {}", "Query", lot_id);
    db_manager
        .transaction(|tx| Box::pin(fetch_lot_bids(&mut **tx, lot_id)))
        .await
}

/// 로트 이력 조회
pub async fn get_lot_history(db_manager: &DatabaseManager, lot_id: i64) -> Result<Vec<LotHistory>> {
    info!("{:<12} --> 로트 이력 조회 id: {}", "Query", lot_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                Ok::<_, SettlementError>(sqlx::query_as::<_, LotHistory>(queries::GET_LOT_HISTORY)
                    .bind(lot_id)
                    .fetch_all(&mut **tx)
                    .await?)
            })
        })
        .await
}

/// 참가자 조회
pub async fn get_tos(db_manager: &DatabaseManager, tos_id: i64) -> Result<AuctionTos> {
    info!("{:<12} --> 참가자 조회 id: {}", "Query", tos_id);
    db_manager
        .transaction(|tx| Box::pin(fetch_tos(&mut **tx, tos_id)))
        .await
}

/// 사용자의 경매 참가 정보 조회
pub async fn get_tos_for_user(
    db_manager: &DatabaseManager,
    auction_id: i64,
    user_id: i64,
) -> Result<Option<AuctionTos>> {
    info!(
        "{:<12} --> 참가 정보 조회 auction: {}, user: {}",
        "Query", auction_id, user_id
    );
    db_manager
        .transaction(|tx| Box::pin(fetch_tos_for_user(&mut **tx, auction_id, user_id)))
        .await
}

/// 인보이스 조회
pub async fn get_invoice(db_manager: &DatabaseManager, invoice_id: i64) -> Result<Invoice> {
    info!("{:<12} --> 인보이스 조회 id: {}", "Query", invoice_id);
    db_manager
        .transaction(|tx| Box::pin(fetch_invoice(&mut **tx, invoice_id)))
        .await
}

/// 경매 인보이스 전체 조회
pub async fn get_auction_invoices(
    db_manager: &DatabaseManager,
    auction_id: i64,
) -> Result<Vec<Invoice>> {
    info!("{:<12} --> 경매 인보이스 조회 id: {}", "Query", auction_id);
    db_manager
        .transaction(|tx| Box::pin(fetch_auction_invoices(&mut **tx, auction_id)))
        .await
}

/// 집계 이벤트 버전 조회
pub async fn get_aggregate_version(
    db_manager: &DatabaseManager,
    aggregate_type: &'static str,
    aggregate_id: i64,
) -> Result<i64> {
    info!(
        "{:<12} --> 이벤트 버전 조회 {}: {}",
        "Query", aggregate_type, aggregate_id
    );
    db_manager
        .transaction(|tx| Box::pin(fetch_aggregate_version(&mut **tx, aggregate_type, aggregate_id)))
        .await
}

/// 종료 시각이 지난 활성 로트 조회
pub async fn get_lots_due_to_end(db_manager: &DatabaseManager, now: DateTime<Utc>) -> Result<Vec<Lot>> {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                Ok::<_, SettlementError>(sqlx::query_as::<_, Lot>(queries::GET_LOTS_DUE_TO_END)
                    .bind(now)
                    .fetch_all(&mut **tx)
                    .await?)
            })
        })
        .await
}

/// 활성 로트가 남지 않은 미발행 온라인 경매 조회
pub async fn get_auctions_without_active_lots(db_manager: &DatabaseManager) -> Result<Vec<Auction>> {
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                Ok::<_, SettlementError>(sqlx::query_as::<_, Auction>(queries::GET_AUCTIONS_WITHOUT_ACTIVE_LOTS)
                    .fetch_all(&mut **tx)
                    .await?)
            })
        })
        .await
}

/// 경매 통계 조회
pub async fn get_auction_stats(db_manager: &DatabaseManager, auction_id: i64) -> Result<AuctionStats> {
    info!("{:<12} --> 경매 통계 조회 id: {}", "Query", auction_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                let auction = fetch_auction(&mut **tx, auction_id).await?;
                let lots = fetch_auction_lots(&mut **tx, auction_id).await?;
                let participants: HashMap<i64, AuctionTos> =
                    fetch_auction_participants(&mut **tx, auction_id)
                        .await?
                        .into_iter()
                        .map(|tos| (tos.id, tos))
                        .collect();
                let invoices = fetch_auction_invoices(&mut **tx, auction_id).await?;

                let payouts: Vec<Payout> = lots
                    .iter()
                    .map(|lot| {
                        let seller = lot.auctiontos_seller.and_then(|id| participants.get(&id));
                        compute_payout(lot, Some(&auction), seller)
                    })
                    .collect();
                Ok::<_, SettlementError>(AuctionStats::compute(&lots, &payouts, &invoices))
            })
        })
        .await
}

// endregion: --- Query Handlers
