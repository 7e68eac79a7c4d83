/// 입찰 관련 커맨드 처리
/// 1. 입찰
/// 2. 즉시 구매
/// 3. 낙찰자 지정 (관리자)
/// 4. 인보이스 조정
// region:    --- Imports
use crate::auction::events::{LotEvent, INVOICE_AGGREGATE, LOT_AGGREGATE};
use crate::auction::lifecycle::{bidding_error, is_sealed_bid, lot_ended};
use crate::auction::model::{Auction, AuctionTos};
use crate::bidding::model::{Bid, Lot};
use crate::bidding::resolver::resolve;
use crate::database::DatabaseManager;
use crate::error::{Result, SettlementError};
use crate::event_store::{Event, EventStore};
use crate::invoice::model::{AdjustmentDirection, Invoice};
use crate::query::handlers;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
// endregion: --- Imports

// region:    --- Commands
/// 입찰 명령 (대리 입찰 최고액)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlaceBidCommand {
    pub lot_id: i64,
    pub user_id: i64,
    pub amount: i64,
}

/// 즉시 구매 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BuyNowCommand {
    pub lot_id: i64,
    pub buyer_id: i64,
}

/// 관리자 낙찰자 지정 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeclareWinnerCommand {
    pub lot_id: i64,
    pub auctiontos_winner: i64,
    pub winning_price: i64,
    pub declared_by: Option<i64>,
    /// 이미 설정된 낙찰가를 덮어쓸지 여부
    pub override_existing: bool,
}

/// 인보이스 수동 조정 명령
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AdjustInvoiceCommand {
    pub invoice_id: i64,
    pub direction: AdjustmentDirection,
    pub amount: i64,
    pub notes: String,
}

// 최대 재시도 횟수
const MAX_RETRIES: i32 = 100;
// endregion: --- Commands

// region:    --- Validation
/// 입찰 검증 후 발행할 이벤트 결정
/// 즉시 구매 가격 이상이면 즉시 구매로 처리
pub fn validate_bid(
    cmd: &PlaceBidCommand,
    lot: &Lot,
    auction: Option<&Auction>,
    bids: &[Bid],
    tos: Option<&AuctionTos>,
    now: DateTime<Utc>,
) -> Result<LotEvent> {
    check_open_for(lot, auction, cmd.user_id, tos, now)?;

    if cmd.amount < lot.reserve_price {
        return Err(SettlementError::BelowReserve {
            minimum: lot.reserve_price,
        });
    }

    if let Some(existing) = bids.iter().find(|bid| bid.user_id == cmd.user_id) {
        if cmd.amount <= existing.amount {
            return Err(SettlementError::BidNotRaised {
                existing: existing.amount,
            });
        }
    }

    let sealed = is_sealed_bid(auction);
    if !sealed {
        let resolution = resolve(lot, auction, bids, now);
        if let Some(high_bidder) = resolution.high_bidder {
            if high_bidder != cmd.user_id && cmd.amount <= resolution.high_bid {
                return Err(SettlementError::LowBid {
                    current_price: resolution.high_bid,
                });
            }
        }
    }

    match lot.buy_now_price {
        Some(price) if !sealed && buy_now_open(lot) && cmd.amount >= price => {
            Ok(LotEvent::BuyNowExecuted {
                lot_id: lot.lot_number,
                buyer_id: cmd.user_id,
                price,
                timestamp: now,
            })
        }
        _ => Ok(LotEvent::BidPlaced {
            lot_id: lot.lot_number,
            user_id: cmd.user_id,
            amount: cmd.amount,
            timestamp: now,
        }),
    }
}

/// 즉시 구매 검증
pub fn validate_buy_now(
    cmd: &BuyNowCommand,
    lot: &Lot,
    auction: Option<&Auction>,
    tos: Option<&AuctionTos>,
    now: DateTime<Utc>,
) -> Result<LotEvent> {
    check_open_for(lot, auction, cmd.buyer_id, tos, now)?;
    match lot.buy_now_price {
        Some(price) if !is_sealed_bid(auction) && buy_now_open(lot) => Ok(LotEvent::BuyNowExecuted {
            lot_id: lot.lot_number,
            buyer_id: cmd.buyer_id,
            price,
            timestamp: now,
        }),
        _ => Err(SettlementError::BuyNowUnavailable),
    }
}

/// 낙찰자 지정 검증
pub fn validate_winner_declaration(
    cmd: &DeclareWinnerCommand,
    lot: &Lot,
    winner: &AuctionTos,
    now: DateTime<Utc>,
) -> Result<LotEvent> {
    if let Some(existing) = lot.winning_price {
        if !cmd.override_existing {
            return Err(SettlementError::WinningPriceLocked(existing));
        }
    }
    if lot.auction_id != Some(winner.auction_id) {
        return Err(SettlementError::InvalidData(format!(
            "참가자 {}는 로트 {}의 경매에 속하지 않습니다",
            winner.id, lot.lot_number
        )));
    }
    if cmd.winning_price < 0 {
        return Err(SettlementError::InvalidData(
            "낙찰가는 0 이상이어야 합니다".to_string(),
        ));
    }
    Ok(LotEvent::WinnerDeclared {
        lot_id: lot.lot_number,
        auctiontos_winner: winner.id,
        winning_price: cmd.winning_price,
        declared_by: cmd.declared_by,
        override_existing: cmd.override_existing,
        timestamp: now,
    })
}

/// 인보이스 조정 검증
pub fn validate_adjustment(
    cmd: &AdjustInvoiceCommand,
    invoice: &Invoice,
    now: DateTime<Utc>,
) -> Result<LotEvent> {
    if cmd.amount < 0 {
        return Err(SettlementError::InvalidData(
            "조정 금액은 0 이상이어야 합니다".to_string(),
        ));
    }
    Ok(LotEvent::InvoiceAdjusted {
        invoice_id: invoice.id,
        direction: cmd.direction,
        amount: cmd.amount,
        notes: cmd.notes.clone(),
        timestamp: now,
    })
}

/// 입찰과 즉시 구매에 공통인 검증
fn check_open_for(
    lot: &Lot,
    auction: Option<&Auction>,
    user_id: i64,
    tos: Option<&AuctionTos>,
    now: DateTime<Utc>,
) -> Result<()> {
    if let Some(reason) = bidding_error(lot, auction, now) {
        return Err(reason.into());
    }
    if !lot.active || lot_ended(lot, auction, now) {
        return Err(SettlementError::AlreadyEnded);
    }
    if lot.user_id == Some(user_id) {
        return Err(SettlementError::OwnLot);
    }
    if auction.is_some() {
        match tos {
            None => return Err(SettlementError::NotRegistered),
            Some(tos) if !tos.bidding_allowed => return Err(SettlementError::BiddingForbidden),
            Some(_) => {}
        }
    }
    Ok(())
}

fn buy_now_open(lot: &Lot) -> bool {
    !lot.buy_now_used && lot.winning_price.is_none()
}
// endregion: --- Validation

// region:    --- Handlers
/// 1. 입찰
pub async fn handle_place_bid(
    cmd: PlaceBidCommand,
    event_store: &impl EventStore,
    db_manager: &DatabaseManager,
) -> Result<LotEvent> {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);
    let mut retries = 0;

    while retries < MAX_RETRIES {
        // 현재 버전 조회
        let current_version =
            handlers::get_aggregate_version(db_manager, LOT_AGGREGATE, cmd.lot_id).await?;

        let (lot, auction) = handlers::get_lot_with_auction(db_manager, cmd.lot_id).await?;
        let bids = handlers::get_lot_bids(db_manager, cmd.lot_id).await?;
        let tos = match &auction {
            Some(auction) => handlers::get_tos_for_user(db_manager, auction.id, cmd.user_id).await?,
            None => None,
        };

        let lot_event = validate_bid(&cmd, &lot, auction.as_ref(), &bids, tos.as_ref(), Utc::now())?;
        if append(event_store, &lot_event, current_version + 1).await? {
            return Ok(lot_event);
        }
        retries += 1;
    }

    Err(SettlementError::MaxRetriesExceeded)
}

/// 2. 즉시 구매(낙찰)
pub async fn handle_buy_now(
    cmd: BuyNowCommand,
    event_store: &impl EventStore,
    db_manager: &DatabaseManager,
) -> Result<LotEvent> {
    info!("{:<12} --> 즉시 구매 요청 처리 시작: {:?}", "Command", cmd);
    let mut retries = 0;

    while retries < MAX_RETRIES {
        let current_version =
            handlers::get_aggregate_version(db_manager, LOT_AGGREGATE, cmd.lot_id).await?;

        let (lot, auction) = handlers::get_lot_with_auction(db_manager, cmd.lot_id).await?;
        let tos = match &auction {
            Some(auction) => handlers::get_tos_for_user(db_manager, auction.id, cmd.buyer_id).await?,
            None => None,
        };

        let lot_event = validate_buy_now(&cmd, &lot, auction.as_ref(), tos.as_ref(), Utc::now())?;
        if append(event_store, &lot_event, current_version + 1).await? {
            return Ok(lot_event);
        }
        retries += 1;
    }

    Err(SettlementError::MaxRetriesExceeded)
}

/// 3. 낙찰자 지정
pub async fn handle_declare_winner(
    cmd: DeclareWinnerCommand,
    event_store: &impl EventStore,
    db_manager: &DatabaseManager,
) -> Result<LotEvent> {
    info!("{:<12} --> 낙찰자 지정 요청 처리 시작: {:?}", "Command", cmd);
    let mut retries = 0;

    while retries < MAX_RETRIES {
        let current_version =
            handlers::get_aggregate_version(db_manager, LOT_AGGREGATE, cmd.lot_id).await?;

        let lot = handlers::get_lot(db_manager, cmd.lot_id).await?;
        let winner = handlers::get_tos(db_manager, cmd.auctiontos_winner).await?;

        let lot_event = validate_winner_declaration(&cmd, &lot, &winner, Utc::now())?;
        if append(event_store, &lot_event, current_version + 1).await? {
            return Ok(lot_event);
        }
        retries += 1;
    }

    Err(SettlementError::MaxRetriesExceeded)
}

/// 4. 인보이스 조정
pub async fn handle_adjust_invoice(
    cmd: AdjustInvoiceCommand,
    event_store: &impl EventStore,
    db_manager: &DatabaseManager,
) -> Result<LotEvent> {
    info!("{:<12} --> 인보이스 조정 요청 처리 시작: {:?}", "Command", cmd);
    let mut retries = 0;

    while retries < MAX_RETRIES {
        let current_version =
            handlers::get_aggregate_version(db_manager, INVOICE_AGGREGATE, cmd.invoice_id).await?;

        let invoice = handlers::get_invoice(db_manager, cmd.invoice_id).await?;

        let lot_event = validate_adjustment(&cmd, &invoice, Utc::now())?;
        if append(event_store, &lot_event, current_version + 1).await? {
            return Ok(lot_event);
        }
        retries += 1;
    }

    Err(SettlementError::MaxRetriesExceeded)
}

/// 이벤트 저장 및 발행, 버전 충돌이면 false
pub(crate) async fn append(
    event_store: &impl EventStore,
    lot_event: &LotEvent,
    version: i64,
) -> Result<bool> {
    let event = Event::from_lot_event(lot_event, version)?;
    match event_store.append_and_publish_event(event).await {
        Ok(()) => {
            info!(
                "{:<12} --> {} 이벤트가 성공적으로 저장되었습니다.",
                "Command",
                lot_event.event_type()
            );
            Ok(true)
        }
        Err(SettlementError::VersionConflict) => {
            warn!(
                "{:<12} --> 낙관적 업데이트로 인한 버전 충돌: 재시도",
                "Command"
            );
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
// endregion: --- Handlers
