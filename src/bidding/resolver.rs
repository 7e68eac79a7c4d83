/// 대리 입찰(proxy bidding) 결과 계산
/// 최고 입찰자가 낙찰되고, 가격은 두 번째 입찰액 + 1 (동액이면 그 금액)
// region:    --- Imports
use crate::auction::lifecycle::{is_sealed_bid, lot_calculated_end};
use crate::auction::model::Auction;
use crate::bidding::model::{Bid, Lot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
// endregion: --- Imports

/// 입찰 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidResolution {
    /// 최고 입찰자 (사용자 id)
    pub high_bidder: Option<i64>,
    /// 낙찰자가 지불하는 가격
    pub high_bid: i64,
    /// 최고 입찰액, 공개되지 않는 값
    pub max_bid: i64,
    pub bid_count: usize,
}

impl BidResolution {
    /// 최고 입찰자나 가격이 바뀌었는지 (종료 시각 연장 조건)
    pub fn changed_from(&self, before: &BidResolution) -> bool {
        self.high_bidder != before.high_bidder || self.high_bid != before.high_bid
    }

    /// 낙찰자가 있을 때만 낙찰가
    pub fn winning_price(&self) -> Option<i64> {
        self.high_bidder.map(|_| self.high_bid)
    }
}

/// 종료 전에 최저가 이상으로 들어온 입찰만, 금액 내림차순 / 시간 오름차순
pub fn qualifying_bids<'a>(
    lot: &Lot,
    auction: Option<&Auction>,
    bids: &'a [Bid],
    now: DateTime<Utc>,
) -> Vec<&'a Bid> {
    let end = lot_calculated_end(lot, auction, now);
    let mut qualifying: Vec<&Bid> = bids
        .iter()
        .filter(|bid| bid.lot_id == lot.lot_number)
        .filter(|bid| bid.last_bid_time <= end && bid.amount >= lot.reserve_price)
        .collect();
    qualifying.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.last_bid_time.cmp(&b.last_bid_time))
    });
    qualifying
}

/// 최고 입찰자와 낙찰가 계산
pub fn resolve(
    lot: &Lot,
    auction: Option<&Auction>,
    bids: &[Bid],
    now: DateTime<Utc>,
) -> BidResolution {
    let ranked = qualifying_bids(lot, auction, bids, now);

    let high_bidder = if lot.banned {
        None
    } else {
        ranked.first().map(|bid| bid.user_id)
    };

    let max_bid = ranked
        .first()
        .map(|bid| bid.amount)
        .unwrap_or(lot.reserve_price);

    BidResolution {
        high_bidder,
        high_bid: clearing_price(lot, is_sealed_bid(auction), &ranked),
        max_bid,
        bid_count: ranked.len(),
    }
}

fn clearing_price(lot: &Lot, sealed_bid: bool, ranked: &[&Bid]) -> i64 {
    if let Some(price) = lot.winning_price {
        return price;
    }
    if sealed_bid {
        // 봉인 입찰은 최고 입찰액 그대로
        return ranked.first().map(|bid| bid.amount).unwrap_or(0);
    }
    match ranked {
        [first, second, ..] => {
            let price = if first.amount == second.amount {
                first.amount
            } else {
                second.amount + 1
            };
            price.max(lot.reserve_price)
        }
        _ => lot.reserve_price,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::fixtures::{at, online_auction};
    use crate::bidding::model::fixtures::{bid, open_lot};

    #[test]
    fn no_qualifying_bids_means_no_winner_at_reserve() {
        let auction = online_auction();
        let mut lot = open_lot(1);
        lot.reserve_price = 5;
        // 최저가 미만 입찰은 무시
        let bids = vec![bid(1, 10, 4, at(9, 0))];
        let result = resolve(&lot, Some(&auction), &bids, at(10, 0));
        assert_eq!(result.high_bidder, None);
        assert_eq!(result.high_bid, 5);
        assert_eq!(result.max_bid, 5);
        assert_eq!(result.bid_count, 0);
    }

    #[test]
    fn single_bid_wins_at_reserve() {
        let auction = online_auction();
        let lot = open_lot(1);
        let bids = vec![bid(1, 10, 30, at(9, 0))];
        let result = resolve(&lot, Some(&auction), &bids, at(10, 0));
        assert_eq!(result.high_bidder, Some(10));
        assert_eq!(result.high_bid, 2);
        assert_eq!(result.max_bid, 30);
    }

    #[test]
    fn price_is_one_above_second_highest() {
        let auction = online_auction();
        let lot = open_lot(1);
        let bids = vec![
            bid(1, 10, 30, at(9, 0)),
            bid(2, 11, 12, at(9, 5)),
            bid(3, 12, 8, at(9, 10)),
        ];
        let result = resolve(&lot, Some(&auction), &bids, at(10, 0));
        assert_eq!(result.high_bidder, Some(10));
        assert_eq!(result.high_bid, 13);
        assert!(result.high_bid <= result.max_bid);
    }

    #[test]
    fn ties_go_to_earliest_bid_at_tied_amount() {
        let auction = online_auction();
        let lot = open_lot(1);
        let bids = vec![bid(1, 10, 20, at(9, 30)), bid(2, 11, 20, at(9, 0))];
        let result = resolve(&lot, Some(&auction), &bids, at(10, 0));
        assert_eq!(result.high_bidder, Some(11));
        assert_eq!(result.high_bid, 20);
    }

    #[test]
    fn bids_after_end_are_ignored() {
        let auction = online_auction();
        let lot = open_lot(1);
        let bids = vec![bid(1, 10, 20, at(9, 0)), bid(2, 11, 50, at(20, 30))];
        let result = resolve(&lot, Some(&auction), &bids, at(21, 0));
        assert_eq!(result.high_bidder, Some(10));
        assert_eq!(result.bid_count, 1);
    }

    #[test]
    fn sealed_bid_pays_own_amount() {
        let mut auction = online_auction();
        auction.sealed_bid = true;
        let lot = open_lot(1);
        let bids = vec![bid(1, 10, 30, at(9, 0)), bid(2, 11, 12, at(9, 5))];
        let result = resolve(&lot, Some(&auction), &bids, at(10, 0));
        assert_eq!(result.high_bid, 30);

        let empty = resolve(&lot, Some(&auction), &[], at(10, 0));
        assert_eq!(empty.high_bid, 0);
        assert_eq!(empty.high_bidder, None);
    }

    #[test]
    fn winning_price_overrides_and_banned_has_no_bidder() {
        let auction = online_auction();
        let mut lot = open_lot(1);
        lot.winning_price = Some(44);
        lot.banned = true;
        let bids = vec![bid(1, 10, 30, at(9, 0))];
        let result = resolve(&lot, Some(&auction), &bids, at(10, 0));
        assert_eq!(result.high_bid, 44);
        assert_eq!(result.high_bidder, None);
    }

    #[test]
    fn raising_own_proxy_changes_nothing_visible() {
        let auction = online_auction();
        let lot = open_lot(1);
        let first = resolve(&lot, Some(&auction), &[bid(1, 10, 10, at(9, 0))], at(10, 0));
        let raised = resolve(&lot, Some(&auction), &[bid(1, 10, 20, at(9, 30))], at(10, 0));
        assert!(!raised.changed_from(&first));
        assert_ne!(raised.max_bid, first.max_bid);

        let challenged = resolve(
            &lot,
            Some(&auction),
            &[bid(1, 10, 20, at(9, 30)), bid(2, 11, 15, at(9, 40))],
            at(10, 0),
        );
        assert!(challenged.changed_from(&raised));
        assert_eq!(challenged.winning_price(), Some(16));

        let empty = resolve(&lot, Some(&auction), &[], at(10, 0));
        assert!(first.changed_from(&empty));
        assert_eq!(empty.winning_price(), None);
    }

    #[test]
    fn clearing_price_stays_within_reserve_and_high_bid() {
        let auction = online_auction();
        for reserve in [1_i64, 5, 10] {
            for top in reserve..reserve + 6 {
                for second in reserve..=top {
                    let mut lot = open_lot(1);
                    lot.reserve_price = reserve;
                    let bids = vec![bid(1, 10, top, at(9, 0)), bid(2, 11, second, at(9, 1))];
                    let result = resolve(&lot, Some(&auction), &bids, at(10, 0));
                    assert!(result.high_bid <= top);
                    assert!(result.high_bid >= reserve);
                }
            }
        }
    }
}
