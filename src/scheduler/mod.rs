/// 정산 스케줄러
/// 1. 종료 시각이 지난 온라인 로트를 낙찰 처리 (LotEnded 이벤트 발행)
/// 2. 모든 로트가 끝난 경매의 인보이스를 재계산하고 발행 완료로 표시
// region:    --- Imports
use crate::auction::events::{LotEvent, LOT_AGGREGATE};
use crate::auction::lifecycle::{auction_dynamic_end, lot_ended};
use crate::auction::model::Auction;
use crate::bidding::commands::append;
use crate::bidding::model::{Bid, Lot};
use crate::bidding::resolver::resolve;
use crate::database::DatabaseManager;
use crate::error::{Result, SettlementError};
use crate::event_store::EventStore;
use crate::invoice::ledger::{issue_draft_invoices, recalculate_auction_invoices};
use crate::query::{handlers, queries};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Settlement Scheduler
pub struct SettlementScheduler<S> {
    db_manager: Arc<DatabaseManager>,
    event_store: Arc<S>,
    period: Duration,
}

impl<S> SettlementScheduler<S>
where
    S: EventStore + Send + Sync + 'static,
{
    pub fn new(db_manager: Arc<DatabaseManager>, event_store: Arc<S>, period: Duration) -> Self {
        Self {
            db_manager,
            event_store,
            period,
        }
    }

    /// 스케줄러 시작 (백그라운드 태스크)
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = interval(self.period);
            loop {
                interval.tick().await;
                if let Err(e) = self.tick(Utc::now()).await {
                    error!("{:<12} --> 정산 작업 중 오류 발생: {:?}", "Scheduler", e);
                }
            }
        })
    }

    /// 한 번의 정산 주기
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<()> {
        let ended = self.end_due_lots(now).await?;
        let invoiced = self.invoice_finished_auctions(now).await?;
        debug!(
            "{:<12} --> 종료 로트 {}건, 인보이스 발행 경매 {}건",
            "Scheduler", ended, invoiced
        );
        Ok(())
    }

    /// 종료 시각이 지난 로트마다 LotEnded 이벤트 발행
    async fn end_due_lots(&self, now: DateTime<Utc>) -> Result<usize> {
        let lots = handlers::get_lots_due_to_end(&self.db_manager, now).await?;
        let mut ended = 0;
        for lot in lots {
            let auction = match lot.auction_id {
                Some(auction_id) => Some(handlers::get_auction(&self.db_manager, auction_id).await?),
                None => None,
            };
            if !lot_ended(&lot, auction.as_ref(), now) {
                continue;
            }
            // 버전은 입찰보다 먼저 조회
            let version =
                handlers::get_aggregate_version(&self.db_manager, LOT_AGGREGATE, lot.lot_number)
                    .await?;
            let bids = handlers::get_lot_bids(&self.db_manager, lot.lot_number).await?;
            let lot_event = lot_ended_event(&lot, auction.as_ref(), &bids, now);
            // 충돌한 로트는 다음 주기에 다시 시도
            if append(self.event_store.as_ref(), &lot_event, version + 1).await? {
                ended += 1;
            }
        }
        Ok(ended)
    }

    /// 동적 종료 시각이 지나고 활성 로트가 없는 경매를 발행 완료로 표시
    async fn invoice_finished_auctions(&self, now: DateTime<Utc>) -> Result<usize> {
        let auctions = handlers::get_auctions_without_active_lots(&self.db_manager).await?;
        let mut invoiced = 0;
        for auction in auctions.into_iter().filter(|a| ready_to_invoice(a, now)) {
            let auction_id = auction.id;
            let issued = self
                .db_manager
                .transaction(|tx| {
                    Box::pin(async move {
                        recalculate_auction_invoices(&mut **tx, auction_id).await?;
                        let issued = issue_draft_invoices(&mut **tx, auction_id).await?;
                        sqlx::query(queries::MARK_AUCTION_INVOICED)
                            .bind(auction_id)
                            .execute(&mut **tx)
                            .await?;
                        Ok::<_, SettlementError>(issued)
                    })
                })
                .await?;
            info!(
                "{:<12} --> 경매 {} 인보이스 발행 ({}건)",
                "Scheduler", auction.title, issued
            );
            invoiced += 1;
        }
        Ok(invoiced)
    }
}

/// 입찰 결과로 로트 종료 이벤트 생성
pub fn lot_ended_event(
    lot: &Lot,
    auction: Option<&Auction>,
    bids: &[Bid],
    now: DateTime<Utc>,
) -> LotEvent {
    let resolution = resolve(lot, auction, bids, now);
    LotEvent::LotEnded {
        lot_id: lot.lot_number,
        winner_user_id: resolution.high_bidder,
        winning_price: resolution.winning_price(),
        timestamp: now,
    }
}

/// 인보이스 발행 시점: 경매의 동적 종료 시각 이후
pub fn ready_to_invoice(auction: &Auction, now: DateTime<Utc>) -> bool {
    matches!(auction_dynamic_end(auction), Some(end) if end <= now)
}
// endregion: --- Settlement Scheduler
