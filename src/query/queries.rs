/// 경매 조회
pub const GET_AUCTION: &str = r#"
    SELECT id, title, is_online, sealed_bid, date_start, date_end,
           lot_submission_start_date, lot_submission_end_date,
           lot_entry_fee, unsold_lot_fee, winning_bid_percent_to_club,
           lot_entry_fee_for_club_members, winning_bid_percent_to_club_for_club_members,
           pre_register_lot_discount_percent, pre_register_lot_entry_fee_discount,
           lot_promotion_cost, first_bid_payout, minimum_bid, allow_bidding_on_lots,
           invoice_rounding, invoiced, is_deleted
    FROM auctions
    WHERE id = $1
"#;

/// 인보이스 발행 대기 경매 (활성 로트가 없는 경매)
pub const GET_AUCTIONS_WITHOUT_ACTIVE_LOTS: &str = r#"
    SELECT a.id, a.title, a.is_online, a.sealed_bid, a.date_start, a.date_end,
           a.lot_submission_start_date, a.lot_submission_end_date,
           a.lot_entry_fee, a.unsold_lot_fee, a.winning_bid_percent_to_club,
           a.lot_entry_fee_for_club_members, a.winning_bid_percent_to_club_for_club_members,
           a.pre_register_lot_discount_percent, a.pre_register_lot_entry_fee_discount,
           a.lot_promotion_cost, a.first_bid_payout, a.minimum_bid, a.allow_bidding_on_lots,
           a.invoice_rounding, a.invoiced, a.is_deleted
    FROM auctions a
    WHERE a.is_online AND NOT a.invoiced AND NOT a.is_deleted
      AND NOT EXISTS (
          SELECT 1 FROM lots l
          WHERE l.auction_id = a.id AND l.active AND NOT l.is_deleted
      )
"#;

/// 로트 조회
pub const GET_LOT: &str = r#"
    SELECT lot_number, custom_lot_number, lot_name, auction_id, user_id, added_by,
           auctiontos_seller, auctiontos_winner, winner_user_id, reserve_price,
           buy_now_price, buy_now_used, date_posted, date_end, active, winning_price,
           banned, ban_reason, deactivated, donation, promoted, is_deleted
    FROM lots
    WHERE lot_number = $1
"#;

/// 로트 조회 (행 잠금)
pub const GET_LOT_FOR_UPDATE: &str = r#"
    SELECT lot_number, custom_lot_number, lot_name, auction_id, user_id, added_by,
           auctiontos_seller, auctiontos_winner, winner_user_id, reserve_price,
           buy_now_price, buy_now_used, date_posted, date_end, active, winning_price,
           banned, ban_reason, deactivated, donation, promoted, is_deleted
    FROM lots
    WHERE lot_number = $1
    FOR UPDATE
"#;

/// 경매의 모든 로트 조회
pub const GET_AUCTION_LOTS: &str = r#"
    SELECT lot_number, custom_lot_number, lot_name, auction_id, user_id, added_by,
           auctiontos_seller, auctiontos_winner, winner_user_id, reserve_price,
           buy_now_price, buy_now_used, date_posted, date_end, active, winning_price,
           banned, ban_reason, deactivated, donation, promoted, is_deleted
    FROM lots
    WHERE auction_id = $1
    ORDER BY lot_number
"#;

/// 참가자가 판매했거나 낙찰받은 로트 조회
pub const GET_PARTICIPANT_LOTS: &str = r#"
    SELECT lot_number, custom_lot_number, lot_name, auction_id, user_id, added_by,
           auctiontos_seller, auctiontos_winner, winner_user_id, reserve_price,
           buy_now_price, buy_now_used, date_posted, date_end, active, winning_price,
           banned, ban_reason, deactivated, donation, promoted, is_deleted
    FROM lots
    WHERE auction_id = $1 AND (auctiontos_seller = $2 OR auctiontos_winner = $2)
    ORDER BY lot_number
"#;

/// 종료 시각이 지난 활성 로트 (온라인 경매 또는 경매에 속하지 않은 로트)
pub const GET_LOTS_DUE_TO_END: &str = r#"
    SELECT l.lot_number, l.custom_lot_number, l.lot_name, l.auction_id, l.user_id, l.added_by,
           l.auctiontos_seller, l.auctiontos_winner, l.winner_user_id, l.reserve_price,
           l.buy_now_price, l.buy_now_used, l.date_posted, l.date_end, l.active, l.winning_price,
           l.banned, l.ban_reason, l.deactivated, l.donation, l.promoted, l.is_deleted
    FROM lots l
    LEFT JOIN auctions a ON a.id = l.auction_id
    WHERE l.active AND NOT l.is_deleted
      AND l.date_end IS NOT NULL AND l.date_end <= $1
      AND (a.id IS NULL OR a.is_online)
    ORDER BY l.date_end
"#;

/// 로트 입찰 조회
pub const GET_LOT_BIDS: &str = r#"
    SELECT id, lot_id, user_id, amount, bid_time, last_bid_time, was_high_bid
    FROM bids
    WHERE lot_id = $1
    ORDER BY amount DESC, last_bid_time ASC
"#;

/// 로트 이력 조회
pub const GET_LOT_HISTORY: &str = r#"
    SELECT id, lot_id, user_id, message, timestamp, current_price, changed_price, bid_amount
    FROM lot_history
    WHERE lot_id = $1
    ORDER BY timestamp ASC, id ASC
"#;

/// 참가자 조회
pub const GET_TOS: &str = r#"
    SELECT id, auction_id, user_id, bidder_number, name, email, is_club_member, is_admin,
           bidding_allowed, selling_allowed, manually_added, created_at
    FROM auction_tos
    WHERE id = $1
"#;

/// 사용자 기준 참가자 조회
pub const GET_TOS_FOR_USER: &str = r#"
    SELECT id, auction_id, user_id, bidder_number, name, email, is_club_member, is_admin,
           bidding_allowed, selling_allowed, manually_added, created_at
    FROM auction_tos
    WHERE auction_id = $1 AND user_id = $2
    ORDER BY id
    LIMIT 1
"#;

/// 경매 참가자 전체 조회
pub const GET_AUCTION_PARTICIPANTS: &str = r#"
    SELECT id, auction_id, user_id, bidder_number, name, email, is_club_member, is_admin,
           bidding_allowed, selling_allowed, manually_added, created_at
    FROM auction_tos
    WHERE auction_id = $1
    ORDER BY id
"#;

/// 인보이스 조회
pub const GET_INVOICE: &str = r#"
    SELECT id, auction_id, auctiontos_user, status, adjustment_direction, adjustment,
           adjustment_notes, memo, calculated_total, date
    FROM invoices
    WHERE id = $1
"#;

/// 참가자 인보이스 조회
pub const GET_PARTICIPANT_INVOICE: &str = r#"
    SELECT id, auction_id, auctiontos_user, status, adjustment_direction, adjustment,
           adjustment_notes, memo, calculated_total, date
    FROM invoices
    WHERE auction_id = $1 AND auctiontos_user = $2
"#;

/// 경매 인보이스 전체 조회
pub const GET_AUCTION_INVOICES: &str = r#"
    SELECT id, auction_id, auctiontos_user, status, adjustment_direction, adjustment,
           adjustment_notes, memo, calculated_total, date
    FROM invoices
    WHERE auction_id = $1
    ORDER BY id
"#;

/// 인보이스 합계 저장 (없으면 DRAFT로 생성)
pub const UPSERT_INVOICE_TOTAL: &str = r#"
    INSERT INTO invoices (auction_id, auctiontos_user, calculated_total, date)
    VALUES ($1, $2, $3, $4)
    ON CONFLICT (auction_id, auctiontos_user)
    DO UPDATE SET calculated_total = EXCLUDED.calculated_total
    RETURNING id, auction_id, auctiontos_user, status, adjustment_direction, adjustment,
              adjustment_notes, memo, calculated_total, date
"#;

/// 인보이스 상태 변경
pub const UPDATE_INVOICE_STATUS: &str = "UPDATE invoices SET status = $1 WHERE id = $2";

/// 인보이스 조정 저장
pub const UPDATE_INVOICE_ADJUSTMENT: &str = r#"
    UPDATE invoices
    SET adjustment_direction = $1, adjustment = $2, adjustment_notes = $3
    WHERE id = $4
    RETURNING auction_id, auctiontos_user
"#;

/// 집계 이벤트 버전 조회
pub const GET_AGGREGATE_VERSION: &str = "SELECT COALESCE(MAX(version), 0) as version FROM events WHERE aggregate_type = $1 AND aggregate_id = $2";

/// 경매 인보이스 발행 완료 표시
pub const MARK_AUCTION_INVOICED: &str = "UPDATE auctions SET invoiced = TRUE WHERE id = $1";

/// 이벤트 추가 (같은 버전이 있으면 무시)
pub const INSERT_EVENT: &str = r#"
    INSERT INTO events (aggregate_type, aggregate_id, event_type, data, timestamp, version)
    VALUES ($1, $2, $3, $4, $5, $6)
    ON CONFLICT (aggregate_type, aggregate_id, version) DO NOTHING
    RETURNING id
"#;

/// 입찰 등록 또는 인상 (기존 금액보다 높을 때만)
pub const UPSERT_BID: &str = r#"
    INSERT INTO bids (lot_id, user_id, amount, bid_time, last_bid_time)
    VALUES ($1, $2, $3, $4, $4)
    ON CONFLICT (lot_id, user_id)
    DO UPDATE SET amount = EXCLUDED.amount, last_bid_time = EXCLUDED.last_bid_time
    WHERE bids.amount < EXCLUDED.amount
    RETURNING id
"#;

/// 현재 최고 입찰자 표시
pub const UPDATE_HIGH_BID_FLAGS: &str =
    "UPDATE bids SET was_high_bid = COALESCE(user_id = $2, FALSE) WHERE lot_id = $1";

/// 로트 종료 시각 연장
pub const EXTEND_LOT_END: &str = "UPDATE lots SET date_end = $1 WHERE lot_number = $2";

/// 즉시 구매 낙찰 (낙찰가가 없을 때만)
pub const SET_BUY_NOW_WINNER: &str = r#"
    UPDATE lots
    SET winner_user_id = $1, auctiontos_winner = $2, winning_price = $3,
        buy_now_used = TRUE, active = FALSE, date_end = $4
    WHERE lot_number = $5 AND winning_price IS NULL
"#;

/// 낙찰자 지정 및 로트 종료
pub const SET_LOT_WINNER: &str = r#"
    UPDATE lots
    SET winner_user_id = $1, auctiontos_winner = $2, winning_price = $3, active = FALSE
    WHERE lot_number = $4
"#;

/// 로트 이력 추가
pub const INSERT_LOT_HISTORY: &str = r#"
    INSERT INTO lot_history (lot_id, user_id, message, timestamp, current_price, changed_price, bid_amount)
    VALUES ($1, $2, $3, $4, $5, $6, $7)
"#;
