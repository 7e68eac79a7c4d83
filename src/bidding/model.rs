use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 로트 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lot {
    pub lot_number: i64,
    pub custom_lot_number: Option<String>,
    pub lot_name: String,
    pub auction_id: Option<i64>,
    /// 판매자 계정
    pub user_id: Option<i64>,
    /// 로트를 등록한 계정 (관리자가 대신 등록할 수 있음)
    pub added_by: Option<i64>,
    pub auctiontos_seller: Option<i64>,
    pub auctiontos_winner: Option<i64>,
    pub winner_user_id: Option<i64>,
    pub reserve_price: i64,
    pub buy_now_price: Option<i64>,
    pub buy_now_used: bool,
    pub date_posted: DateTime<Utc>,
    pub date_end: Option<DateTime<Utc>>,
    pub active: bool,
    pub winning_price: Option<i64>,
    pub banned: bool,
    pub ban_reason: Option<String>,
    pub deactivated: bool,
    pub donation: bool,
    pub promoted: bool,
    pub is_deleted: bool,
}

impl Lot {
    /// 낙찰자와 낙찰가가 모두 설정된 경우
    pub fn sold(&self) -> bool {
        (self.winner_user_id.is_some() || self.auctiontos_winner.is_some())
            && self.winning_price.unwrap_or(0) != 0
    }

    /// 판매자 본인이 직접 등록한 로트 (사전 등록 할인 대상)
    pub fn added_by_seller(&self) -> bool {
        matches!((self.added_by, self.user_id), (Some(added_by), Some(seller)) if added_by == seller)
    }
}

// 입찰 모델 (사용자당 로트 하나에 입찰 하나, 금액을 올리면 갱신)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bid {
    pub id: i64,
    pub lot_id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub bid_time: DateTime<Utc>,
    pub last_bid_time: DateTime<Utc>,
    pub was_high_bid: bool,
}

// 로트 이력 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LotHistory {
    pub id: i64,
    pub lot_id: i64,
    pub user_id: Option<i64>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub current_price: Option<i64>,
    pub changed_price: bool,
    pub bid_amount: Option<i64>,
}

/// 판매자의 다음 로트 번호 ("{입찰자 번호}-{순번}")
/// 기존 번호의 마지막 숫자 묶음 중 가장 큰 값 + 1
pub fn next_custom_lot_number<'a, I>(bidder_number: &str, existing: I) -> String
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let next = existing
        .into_iter()
        .flatten()
        .filter_map(trailing_number)
        .map(|n| n + 1)
        .fold(1, u64::max);
    format!("{}-{}", bidder_number, next)
}

fn trailing_number(value: &str) -> Option<u64> {
    let digits: Vec<char> = value
        .chars()
        .rev()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    digits.into_iter().rev().collect::<String>().parse().ok()
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn sold_requires_winner_and_nonzero_price() {
        let mut lot = open_lot(1);
        lot.winning_price = Some(10);
        assert!(!lot.sold());
        lot.auctiontos_winner = Some(9);
        assert!(lot.sold());
        lot.winning_price = Some(0);
        assert!(!lot.sold());
    }

    #[test]
    fn lot_numbers_continue_from_highest_existing() {
        let existing = vec![Some("101-3"), None, Some("101-12"), Some("abc")];
        assert_eq!(next_custom_lot_number("101", existing), "101-13");
        assert_eq!(next_custom_lot_number("7", Vec::<Option<&str>>::new()), "7-1");
    }

    #[test]
    fn trailing_number_uses_last_digit_run() {
        assert_eq!(trailing_number("12-4a"), Some(4));
        assert_eq!(trailing_number("none"), None);
    }
}
