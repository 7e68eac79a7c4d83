use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 경매 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Auction {
    pub id: i64,
    pub title: String,
    pub is_online: bool,
    /// 입찰자는 현재 가격을 볼 수 없고 최고 입찰액 그대로 낙찰된다
    pub sealed_bid: bool,
    pub date_start: DateTime<Utc>,
    pub date_end: Option<DateTime<Utc>>,
    pub lot_submission_start_date: DateTime<Utc>,
    pub lot_submission_end_date: Option<DateTime<Utc>>,
    pub lot_entry_fee: i64,
    pub unsold_lot_fee: i64,
    pub winning_bid_percent_to_club: i64,
    pub lot_entry_fee_for_club_members: i64,
    pub winning_bid_percent_to_club_for_club_members: i64,
    pub pre_register_lot_discount_percent: i64,
    pub pre_register_lot_entry_fee_discount: i64,
    pub lot_promotion_cost: i64,
    pub first_bid_payout: i64,
    pub minimum_bid: i64,
    pub allow_bidding_on_lots: bool,
    pub invoice_rounding: bool,
    pub invoiced: bool,
    pub is_deleted: bool,
}

impl Auction {
    /// 사전 등록 할인이 설정되어 있는지
    pub fn has_pre_register_discount(&self) -> bool {
        self.pre_register_lot_discount_percent > 0 || self.pre_register_lot_entry_fee_discount > 0
    }

    /// 회원 여부에 따른 (수수료 비율, 출품료)
    pub fn fee_schedule(&self, is_club_member: bool) -> (i64, i64) {
        if is_club_member {
            (
                self.winning_bid_percent_to_club_for_club_members,
                self.lot_entry_fee_for_club_members,
            )
        } else {
            (self.winning_bid_percent_to_club, self.lot_entry_fee)
        }
    }
}

// 경매 참가자(약관 동의) 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuctionTos {
    pub id: i64,
    pub auction_id: i64,
    pub user_id: Option<i64>,
    pub bidder_number: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub is_club_member: bool,
    pub is_admin: bool,
    pub bidding_allowed: bool,
    pub selling_allowed: bool,
    pub manually_added: bool,
    pub created_at: DateTime<Utc>,
}

impl AuctionTos {
    /// 인보이스 등에 표시되는 이름
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.bidder_number,
        }
    }
}
