use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use fish_auction_settlement::auction::events::LotEvent;
use fish_auction_settlement::auction::model::{Auction, AuctionTos};
use fish_auction_settlement::auction::stats::AuctionStats;
use fish_auction_settlement::bidding::commands::{self, PlaceBidCommand};
use fish_auction_settlement::bidding::model::{Bid, Lot};
use fish_auction_settlement::config::Config;
use fish_auction_settlement::database::DatabaseManager;
use fish_auction_settlement::error::{Result, SettlementError};
use fish_auction_settlement::event_store::{apply_event, Event, EventStore};
use fish_auction_settlement::invoice::calculator::InvoiceTotals;
use fish_auction_settlement::invoice::ledger;
use fish_auction_settlement::invoice::model::{Adjustment, AdjustmentDirection, Invoice, InvoiceStatus};
use fish_auction_settlement::query::handlers;
use fish_auction_settlement::scheduler::{lot_ended_event, SettlementScheduler};
use fish_auction_settlement::settlement::payout::{compute_payout, Payout};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::info;

// region:    --- Builders
fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 14, hour, minute, 0).unwrap()
}

fn club_auction() -> Auction {
    Auction {
        id: 1,
        title: "Fall Auction".to_string(),
        is_online: true,
        sealed_bid: false,
        date_start: at(9, 0),
        date_end: Some(at(19, 0)),
        lot_submission_start_date: at(0, 0),
        lot_submission_end_date: None,
        lot_entry_fee: 1,
        unsold_lot_fee: 1,
        winning_bid_percent_to_club: 25,
        lot_entry_fee_for_club_members: 0,
        winning_bid_percent_to_club_for_club_members: 10,
        pre_register_lot_discount_percent: 0,
        pre_register_lot_entry_fee_discount: 0,
        lot_promotion_cost: 1,
        first_bid_payout: 0,
        minimum_bid: 2,
        allow_bidding_on_lots: true,
        invoice_rounding: true,
        invoiced: false,
        is_deleted: false,
    }
}

fn member(id: i64, is_club_member: bool) -> AuctionTos {
    AuctionTos {
        id,
        auction_id: 1,
        user_id: Some(id * 10),
        bidder_number: id.to_string(),
        name: Some(format!("Bidder {}", id)),
        email: None,
        is_club_member,
        is_admin: false,
        bidding_allowed: true,
        selling_allowed: true,
        manually_added: false,
        created_at: at(0, 0),
    }
}

fn sold_lot(lot_number: i64, seller: i64, winner: i64, price: i64) -> Lot {
    let mut lot = unsold_lot(lot_number, seller);
    lot.auctiontos_winner = Some(winner);
    lot.winner_user_id = Some(winner * 10);
    lot.winning_price = Some(price);
    lot
}

fn unsold_lot(lot_number: i64, seller: i64) -> Lot {
    Lot {
        lot_number,
        custom_lot_number: None,
        lot_name: "Guppies".to_string(),
        auction_id: Some(1),
        user_id: Some(seller * 10),
        added_by: Some(seller * 10),
        auctiontos_seller: Some(seller),
        auctiontos_winner: None,
        winner_user_id: None,
        reserve_price: 2,
        buy_now_price: None,
        buy_now_used: false,
        date_posted: at(1, 0),
        date_end: Some(at(19, 0)),
        active: false,
        winning_price: None,
        banned: false,
        ban_reason: None,
        deactivated: false,
        donation: false,
        promoted: false,
        is_deleted: false,
    }
}

fn invoice_for(tos: &AuctionTos, total: Decimal) -> Invoice {
    Invoice {
        id: tos.id,
        auction_id: 1,
        auctiontos_user: tos.id,
        status: InvoiceStatus::Draft.to_string(),
        adjustment_direction: AdjustmentDirection::PayClub.as_str().to_string(),
        adjustment: 0,
        adjustment_notes: String::new(),
        memo: None,
        calculated_total: Some(total),
        date: at(20, 0),
    }
}
// endregion: --- Builders

/// 경매 전체 정산: 참가자 인보이스 합계와 경매 통계가 맞물린다
#[test]
fn test_whole_auction_settles() {
    let auction = club_auction();
    let participants = vec![member(1, false), member(2, true), member(3, false)];
    let mut donated = sold_lot(4, 2, 3, 6);
    donated.donation = true;
    let lots = vec![
        sold_lot(1, 1, 2, 20),
        sold_lot(2, 2, 3, 11),
        unsold_lot(3, 1),
        donated,
    ];

    let payouts: Vec<Payout> = lots
        .iter()
        .map(|lot| {
            let seller = participants
                .iter()
                .find(|tos| Some(tos.id) == lot.auctiontos_seller);
            compute_payout(lot, Some(&auction), seller)
        })
        .collect();

    // 비회원 25% + 1, 회원 10% + 0
    assert_eq!(payouts[0].to_club, Decimal::from(6));
    assert_eq!(payouts[1].to_club, Decimal::new(11, 1));
    assert_eq!(payouts[2].to_seller, Decimal::from(-1));
    assert_eq!(payouts[3].to_club, Decimal::from(6));

    let invoices: Vec<Invoice> = participants
        .iter()
        .map(|tos| {
            let totals = InvoiceTotals::for_participant(&auction, tos, &lots, Adjustment::none());
            invoice_for(tos, totals.rounded_net())
        })
        .collect();

    // 1: 14 - 1 = 13, 2: 9.9 - 20 = -10.1 -> -10, 3: -(11 + 6) = -17
    let totals: Vec<Decimal> = invoices
        .iter()
        .filter_map(|invoice| invoice.calculated_total)
        .collect();
    assert_eq!(
        totals,
        vec![Decimal::from(13), Decimal::from(-10), Decimal::from(-17)]
    );

    let stats = AuctionStats::compute(&lots, &payouts, &invoices);
    assert_eq!(stats.gross, 37);
    assert_eq!(stats.club_profit, Decimal::from(14));
    assert_eq!(stats.club_profit_raw, Decimal::new(141, 1));
    assert_eq!(stats.total_lots, 4);
    assert_eq!(stats.total_unsold_lots, 1);
    // 반올림은 클럽 수익을 늘리지 않는다
    assert!(stats.club_profit <= stats.club_profit_raw);
}

#[test]
fn test_config_requires_database_url() {
    let err = Config::from_lookup(|_| None).unwrap_err();
    assert_eq!(err.code(), "CONFIG");

    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://localhost/fish".to_string()),
        "SCHEDULER_INTERVAL_SECS" => Some("5".to_string()),
        _ => None,
    })
    .unwrap();
    assert_eq!(config.kafka_brokers, "localhost:9092");
    assert_eq!(config.scheduler_interval.as_secs(), 5);
}

// region:    --- Database Tests
// DATABASE_URL이 가리키는 Postgres가 필요하다: cargo test -- --ignored

/// 이벤트를 저장하지 않고 기록만 하는 저장소, 처음 몇 번은 버전 충돌을 낸다
#[derive(Default)]
struct RecordingEventStore {
    conflicts_left: AtomicUsize,
    events: Mutex<Vec<Event>>,
    attempts: AtomicUsize,
}

impl RecordingEventStore {
    fn with_conflicts(conflicts: usize) -> Self {
        Self {
            conflicts_left: AtomicUsize::new(conflicts),
            ..Default::default()
        }
    }

    fn lot_events(&self) -> Vec<LotEvent> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|event| event.lot_event().unwrap())
            .collect()
    }
}

#[async_trait]
impl EventStore for RecordingEventStore {
    async fn append_and_publish_event(&self, event: Event) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.conflicts_left.load(Ordering::SeqCst);
        if remaining > 0 {
            self.conflicts_left.store(remaining - 1, Ordering::SeqCst);
            return Err(SettlementError::VersionConflict);
        }
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// 트레이싱 초기화
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .without_time()
        .with_target(false)
        .with_test_writer()
        .try_init();
}

/// 데이터베이스 매니저 설정
async fn setup() -> Arc<DatabaseManager> {
    init_tracing();
    let config = Config::from_env().expect("DATABASE_URL must be set");
    let db_manager = DatabaseManager::new(&config)
        .await
        .expect("Failed to create pool");
    db_manager
        .initialize_database()
        .await
        .expect("Failed to create schema");
    Arc::new(db_manager)
}

/// 테스트용 경매 생성 (한 시간 전 시작)
async fn create_test_auction(
    db_manager: &DatabaseManager,
    date_end: DateTime<Utc>,
) -> Auction {
    let now = Utc::now();
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO auctions (title, date_start, date_end, lot_submission_start_date,
             lot_entry_fee, unsold_lot_fee, winning_bid_percent_to_club)
         VALUES ($1, $2, $3, $4, 1, 1, 25)
         RETURNING id",
    )
    .bind("테스트 경매")
    .bind(now - Duration::hours(1))
    .bind(date_end)
    .bind(now - Duration::hours(2))
    .fetch_one(db_manager.pool())
    .await
    .unwrap();
    handlers::get_auction(db_manager, id).await.unwrap()
}

/// 테스트용 참가자 생성
async fn create_test_tos(db_manager: &DatabaseManager, auction_id: i64, user_id: i64) -> AuctionTos {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO auction_tos (auction_id, user_id, bidder_number, name)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(auction_id)
    .bind(user_id)
    .bind(user_id.to_string())
    .bind(format!("User {}", user_id))
    .fetch_one(db_manager.pool())
    .await
    .unwrap();
    handlers::get_tos(db_manager, id).await.unwrap()
}

/// 테스트용 로트 생성 (두 시간 전 등록)
async fn create_test_lot(
    db_manager: &DatabaseManager,
    auction: &Auction,
    seller: &AuctionTos,
    date_end: DateTime<Utc>,
) -> Lot {
    let lot_number: i64 = sqlx::query_scalar(
        "INSERT INTO lots (lot_name, auction_id, user_id, added_by, auctiontos_seller,
             reserve_price, date_posted, date_end)
         VALUES ($1, $2, $3, $3, $4, 2, $5, $6)
         RETURNING lot_number",
    )
    .bind("테스트 로트")
    .bind(auction.id)
    .bind(seller.user_id)
    .bind(seller.id)
    .bind(Utc::now() - Duration::hours(2))
    .bind(date_end)
    .fetch_one(db_manager.pool())
    .await
    .unwrap();
    handlers::get_lot(db_manager, lot_number).await.unwrap()
}

/// 이벤트를 바로 테이블에 반영
async fn project(db_manager: &DatabaseManager, lot_event: LotEvent) {
    db_manager
        .transaction(|tx| Box::pin(apply_event(&mut **tx, lot_event)))
        .await
        .unwrap();
}

fn bid_event(lot: &Lot, tos: &AuctionTos, amount: i64, timestamp: DateTime<Utc>) -> LotEvent {
    LotEvent::BidPlaced {
        lot_id: lot.lot_number,
        user_id: tos.user_id.unwrap(),
        amount,
        timestamp,
    }
}

/// 막판 입찰: 가격이나 최고 입찰자가 바뀔 때만 종료 시각이 늘어난다
#[tokio::test]
#[ignore]
async fn test_dynamic_end_moves_only_when_price_or_bidder_changes() {
    let db_manager = setup().await;
    let auction = create_test_auction(&db_manager, Utc::now() + Duration::hours(2)).await;
    let seller = create_test_tos(&db_manager, auction.id, 6001).await;
    let bidder = create_test_tos(&db_manager, auction.id, 6002).await;
    let rival = create_test_tos(&db_manager, auction.id, 6003).await;
    let lot = create_test_lot(&db_manager, &auction, &seller, Utc::now() + Duration::minutes(10)).await;

    let t0 = Utc::now();
    project(&db_manager, bid_event(&lot, &bidder, 10, t0)).await;
    let after_first = handlers::get_lot(&db_manager, lot.lot_number).await.unwrap();
    assert!(after_first.date_end > lot.date_end);

    // 본인 대리 입찰 인상: 가격 2, 최고 입찰자 그대로
    project(&db_manager, bid_event(&lot, &bidder, 20, t0 + Duration::seconds(1))).await;
    let after_raise = handlers::get_lot(&db_manager, lot.lot_number).await.unwrap();
    assert_eq!(after_raise.date_end, after_first.date_end);

    project(&db_manager, bid_event(&lot, &rival, 15, t0 + Duration::seconds(2))).await;
    let after_challenge = handlers::get_lot(&db_manager, lot.lot_number).await.unwrap();
    assert!(after_challenge.date_end > after_raise.date_end);

    let history = handlers::get_lot_history(&db_manager, lot.lot_number).await.unwrap();
    assert_eq!(history[1].current_price, Some(2));
    assert_eq!(history[2].current_price, Some(16));
}

/// 종료 이벤트 이후에 반영된 이전 입찰도 낙찰 계산에 들어간다
#[tokio::test]
#[ignore]
async fn test_lot_end_counts_bids_projected_after_the_event_was_built() {
    let db_manager = setup().await;
    let auction = create_test_auction(&db_manager, Utc::now() + Duration::hours(2)).await;
    let seller = create_test_tos(&db_manager, auction.id, 7001).await;
    let early = create_test_tos(&db_manager, auction.id, 7002).await;
    let late = create_test_tos(&db_manager, auction.id, 7003).await;
    let lot = create_test_lot(&db_manager, &auction, &seller, Utc::now() + Duration::hours(1)).await;

    let now = Utc::now();
    project(&db_manager, bid_event(&lot, &early, 5, now)).await;
    let bids = handlers::get_lot_bids(&db_manager, lot.lot_number).await.unwrap();
    let stale = lot_ended_event(&lot, Some(&auction), &bids, now);
    assert!(matches!(
        stale,
        LotEvent::LotEnded { winning_price: Some(2), .. }
    ));

    // 종료 전에 들어왔지만 아직 반영되지 않았던 입찰
    project(&db_manager, bid_event(&lot, &late, 30, now + Duration::seconds(1))).await;
    project(&db_manager, stale).await;

    let ended = handlers::get_lot(&db_manager, lot.lot_number).await.unwrap();
    assert!(!ended.active);
    assert_eq!(ended.winner_user_id, late.user_id);
    assert_eq!(ended.auctiontos_winner, Some(late.id));
    assert_eq!(ended.winning_price, Some(6));
}

/// 입찰 반영 후 종료하면 차순위 + 1에 낙찰되고 인보이스가 생긴다
#[tokio::test]
#[ignore]
async fn test_bids_then_lot_end() {
    let db_manager = setup().await;
    let auction = create_test_auction(&db_manager, Utc::now() + Duration::hours(2)).await;
    let seller = create_test_tos(&db_manager, auction.id, 1001).await;
    let buyer = create_test_tos(&db_manager, auction.id, 1002).await;
    let rival = create_test_tos(&db_manager, auction.id, 1003).await;
    let lot = create_test_lot(&db_manager, &auction, &seller, Utc::now() + Duration::hours(1)).await;

    let now = Utc::now();
    for (tos, amount) in [(&buyer, 10), (&rival, 7)] {
        project(
            &db_manager,
            LotEvent::BidPlaced {
                lot_id: lot.lot_number,
                user_id: tos.user_id.unwrap(),
                amount,
                timestamp: now,
            },
        )
        .await;
    }

    let bids: Vec<Bid> = handlers::get_lot_bids(&db_manager, lot.lot_number).await.unwrap();
    assert_eq!(bids.len(), 2);
    assert!(bids[0].was_high_bid);
    let history = handlers::get_lot_history(&db_manager, lot.lot_number).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].current_price, Some(8));

    let ended = lot_ended_event(&lot, Some(&auction), &bids, now);
    project(&db_manager, ended).await;

    let lot = handlers::get_lot(&db_manager, lot.lot_number).await.unwrap();
    info!("종료된 로트: {:?}", lot);
    assert!(!lot.active);
    assert_eq!(lot.winning_price, Some(8));
    assert_eq!(lot.auctiontos_winner, Some(buyer.id));

    let invoices = handlers::get_auction_invoices(&db_manager, auction.id).await.unwrap();
    let total_of = |tos: &AuctionTos| {
        invoices
            .iter()
            .find(|invoice| invoice.auctiontos_user == tos.id)
            .and_then(|invoice| invoice.calculated_total)
    };
    // 판매자: 8 - (2 + 1) = 5, 구매자: -8
    assert_eq!(total_of(&seller), Some(Decimal::from(5)));
    assert_eq!(total_of(&buyer), Some(Decimal::from(-8)));
    assert_eq!(total_of(&rival), None);
}

/// 버전 충돌은 재시도되고 낮은 입찰은 거절된다
#[tokio::test]
#[ignore]
async fn test_place_bid_retries_on_version_conflict() {
    let db_manager = setup().await;
    let auction = create_test_auction(&db_manager, Utc::now() + Duration::hours(2)).await;
    let seller = create_test_tos(&db_manager, auction.id, 2001).await;
    let bidder = create_test_tos(&db_manager, auction.id, 2002).await;
    let lot = create_test_lot(&db_manager, &auction, &seller, Utc::now() + Duration::hours(1)).await;

    let store = RecordingEventStore::with_conflicts(3);
    let cmd = PlaceBidCommand {
        lot_id: lot.lot_number,
        user_id: bidder.user_id.unwrap(),
        amount: 15,
    };
    let event = commands::handle_place_bid(cmd, &store, &db_manager).await.unwrap();
    assert!(matches!(event, LotEvent::BidPlaced { amount: 15, .. }));
    assert_eq!(store.attempts.load(Ordering::SeqCst), 4);
    assert_eq!(store.lot_events(), vec![event]);

    let too_low = PlaceBidCommand {
        lot_id: lot.lot_number,
        user_id: bidder.user_id.unwrap(),
        amount: 1,
    };
    let err = commands::handle_place_bid(too_low, &store, &db_manager)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "BELOW_RESERVE");

    let own = PlaceBidCommand {
        lot_id: lot.lot_number,
        user_id: seller.user_id.unwrap(),
        amount: 20,
    };
    let err = commands::handle_place_bid(own, &store, &db_manager)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "OWN_LOT");
}

/// 기존 낙찰가는 명시적인 덮어쓰기로만 바뀐다
#[tokio::test]
#[ignore]
async fn test_declared_winner_override() {
    let db_manager = setup().await;
    let auction = create_test_auction(&db_manager, Utc::now() + Duration::hours(2)).await;
    let seller = create_test_tos(&db_manager, auction.id, 3001).await;
    let first = create_test_tos(&db_manager, auction.id, 3002).await;
    let second = create_test_tos(&db_manager, auction.id, 3003).await;
    let lot = create_test_lot(&db_manager, &auction, &seller, Utc::now() + Duration::hours(1)).await;

    let declare = |tos: &AuctionTos, price: i64, override_existing: bool| LotEvent::WinnerDeclared {
        lot_id: lot.lot_number,
        auctiontos_winner: tos.id,
        winning_price: price,
        declared_by: None,
        override_existing,
        timestamp: Utc::now(),
    };

    project(&db_manager, declare(&first, 12, false)).await;
    project(&db_manager, declare(&second, 30, false)).await;
    let current = handlers::get_lot(&db_manager, lot.lot_number).await.unwrap();
    assert_eq!(current.auctiontos_winner, Some(first.id));
    assert_eq!(current.winning_price, Some(12));

    project(&db_manager, declare(&second, 30, true)).await;
    let current = handlers::get_lot(&db_manager, lot.lot_number).await.unwrap();
    assert_eq!(current.auctiontos_winner, Some(second.id));
    assert_eq!(current.winning_price, Some(30));

    // 이전 낙찰자의 인보이스도 다시 계산된다
    let invoices = handlers::get_auction_invoices(&db_manager, auction.id).await.unwrap();
    let previous = invoices
        .iter()
        .find(|invoice| invoice.auctiontos_user == first.id)
        .unwrap();
    assert_eq!(previous.calculated_total, Some(Decimal::ZERO));
}

/// 조정은 인보이스 합계에 반영되고 상태는 앞으로만 진행된다
#[tokio::test]
#[ignore]
async fn test_invoice_adjustment_and_status() {
    let db_manager = setup().await;
    let auction = create_test_auction(&db_manager, Utc::now() + Duration::hours(2)).await;
    let seller = create_test_tos(&db_manager, auction.id, 4001).await;
    let buyer = create_test_tos(&db_manager, auction.id, 4002).await;
    let lot = create_test_lot(&db_manager, &auction, &seller, Utc::now() + Duration::hours(1)).await;

    project(
        &db_manager,
        LotEvent::WinnerDeclared {
            lot_id: lot.lot_number,
            auctiontos_winner: buyer.id,
            winning_price: 20,
            declared_by: None,
            override_existing: false,
            timestamp: Utc::now(),
        },
    )
    .await;

    let invoice = ledger::refresh_invoice(&db_manager, auction.id, buyer.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(invoice.calculated_total, Some(Decimal::from(-20)));

    project(
        &db_manager,
        LotEvent::InvoiceAdjusted {
            invoice_id: invoice.id,
            direction: AdjustmentDirection::PaySeller,
            amount: 5,
            notes: "Volunteer discount".to_string(),
            timestamp: Utc::now(),
        },
    )
    .await;
    let invoice = handlers::get_invoice(&db_manager, invoice.id).await.unwrap();
    assert_eq!(invoice.calculated_total, Some(Decimal::from(-15)));

    let unpaid = ledger::set_invoice_status(&db_manager, invoice.id, InvoiceStatus::Unpaid)
        .await
        .unwrap();
    assert_eq!(unpaid.status().unwrap(), InvoiceStatus::Unpaid);
    let err = ledger::set_invoice_status(&db_manager, invoice.id, InvoiceStatus::Draft)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_STATUS");
}

/// 스케줄러: 종료된 로트를 끝내고, 다음 주기에 경매 인보이스를 발행한다
#[tokio::test]
#[ignore]
async fn test_scheduler_ends_lots_and_invoices_auction() {
    let db_manager = setup().await;
    // 동적 종료(+60분)까지 지난 경매
    let auction = create_test_auction(&db_manager, Utc::now() - Duration::hours(2)).await;
    let seller = create_test_tos(&db_manager, auction.id, 5001).await;
    let buyer = create_test_tos(&db_manager, auction.id, 5002).await;
    let lot = create_test_lot(&db_manager, &auction, &seller, Utc::now() - Duration::minutes(90)).await;
    sqlx::query(
        "INSERT INTO bids (lot_id, user_id, amount, bid_time, last_bid_time)
         VALUES ($1, $2, 9, $3, $3)",
    )
    .bind(lot.lot_number)
    .bind(buyer.user_id)
    .bind(Utc::now() - Duration::minutes(100))
    .execute(db_manager.pool())
    .await
    .unwrap();

    let store = Arc::new(RecordingEventStore::default());
    let scheduler = SettlementScheduler::new(
        Arc::clone(&db_manager),
        Arc::clone(&store),
        std::time::Duration::from_secs(60),
    );

    scheduler.tick(Utc::now()).await.unwrap();
    let ended: Vec<LotEvent> = store
        .lot_events()
        .into_iter()
        .filter(|event| event.aggregate_id() == lot.lot_number)
        .collect();
    assert_eq!(ended.len(), 1);
    assert!(matches!(
        ended[0],
        LotEvent::LotEnded { winning_price: Some(2), .. }
    ));

    project(&db_manager, ended[0].clone()).await;
    scheduler.tick(Utc::now()).await.unwrap();

    let auction = handlers::get_auction(&db_manager, auction.id).await.unwrap();
    assert!(auction.invoiced);
    let invoices = handlers::get_auction_invoices(&db_manager, auction.id).await.unwrap();
    assert_eq!(invoices.len(), 2);
    assert!(invoices
        .iter()
        .all(|invoice| invoice.status().unwrap() == InvoiceStatus::Unpaid));

    let stats = handlers::get_auction_stats(&db_manager, auction.id).await.unwrap();
    assert_eq!(stats.gross, 2);
    assert_eq!(stats.total_sold_lots, 1);
}
// endregion: --- Database Tests
