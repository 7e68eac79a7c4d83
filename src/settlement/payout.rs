/// 로트 판매 대금 분배 (판매자 / 클럽 / 사이트)
// region:    --- Imports
use crate::auction::model::{Auction, AuctionTos};
use crate::bidding::model::Lot;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
// endregion: --- Imports

/// 인보이스 계산용 로트 정산 결과
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub ended: bool,
    pub sold: bool,
    pub winning_price: i64,
    pub to_seller: Decimal,
    pub to_club: Decimal,
    pub to_site: Decimal,
}

/// 사전 등록 할인 대상 여부
pub fn pre_registered(lot: &Lot, auction: &Auction) -> bool {
    auction.has_pre_register_discount() && lot.added_by_seller()
}

/// 로트 정산 계산
/// 종료되지 않은 로트, 경매에 속하지 않은 로트는 0
pub fn compute_payout(lot: &Lot, auction: Option<&Auction>, seller: Option<&AuctionTos>) -> Payout {
    let mut payout = Payout::default();
    let Some(auction) = auction else {
        return payout;
    };
    if lot.winning_price.is_none() && lot.active {
        return payout;
    }

    payout.ended = true;
    if lot.banned {
        return payout;
    }

    if lot.sold() {
        let winning_price = lot.winning_price.unwrap_or(0);
        payout.sold = true;
        payout.winning_price = winning_price;

        let price = Decimal::from(winning_price);
        if lot.donation {
            payout.to_club = price;
            payout.to_seller = Decimal::ZERO;
        } else {
            let club_cut = club_cut(lot, auction, seller, price);
            payout.to_club = club_cut;
            payout.to_seller = price - club_cut;
        }
    } else if !lot.donation {
        // 팔리지 않아도 판매자에게 수수료 청구
        payout.to_club = Decimal::from(auction.unsold_lot_fee);
        payout.to_seller = -Decimal::from(auction.unsold_lot_fee);
    }

    if lot.promoted {
        payout.to_club += Decimal::from(auction.lot_promotion_cost);
    }
    payout
}

fn club_cut(lot: &Lot, auction: &Auction, seller: Option<&AuctionTos>, price: Decimal) -> Decimal {
    let is_club_member = seller.map(|tos| tos.is_club_member).unwrap_or(false);
    let (mut percent, mut entry_fee) = auction.fee_schedule(is_club_member);
    if pre_registered(lot, auction) {
        percent -= auction.pre_register_lot_discount_percent;
        entry_fee -= auction.pre_register_lot_entry_fee_discount;
    }
    price * Decimal::from(percent) / Decimal::ONE_HUNDRED + Decimal::from(entry_fee)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::fixtures::{online_auction, participant};
    use crate::bidding::model::fixtures::open_lot;

    fn sold_lot(price: i64) -> Lot {
        let mut lot = open_lot(1);
        lot.winning_price = Some(price);
        lot.auctiontos_winner = Some(9);
        lot.active = false;
        lot
    }

    #[test]
    fn open_lot_pays_nothing() {
        let auction = online_auction();
        let payout = compute_payout(&open_lot(1), Some(&auction), None);
        assert_eq!(payout, Payout::default());
    }

    #[test]
    fn lot_without_auction_pays_nothing() {
        let payout = compute_payout(&sold_lot(10), None, None);
        assert!(!payout.ended);
        assert_eq!(payout.to_club, Decimal::ZERO);
    }

    #[test]
    fn standard_split_sums_to_winning_price() {
        let auction = online_auction();
        let seller = participant(5, Some(50), false);
        let lot = sold_lot(10);
        let payout = compute_payout(&lot, Some(&auction), Some(&seller));
        // 10 * 25% + 1
        assert_eq!(payout.to_club, Decimal::new(35, 1));
        assert_eq!(payout.to_seller, Decimal::new(65, 1));
        assert_eq!(payout.to_club + payout.to_seller, Decimal::from(10));
        assert!(payout.sold && payout.ended);
    }

    #[test]
    fn club_members_use_member_rates() {
        let auction = online_auction();
        let seller = participant(5, Some(50), true);
        let payout = compute_payout(&sold_lot(20), Some(&auction), Some(&seller));
        assert_eq!(payout.to_club, Decimal::from(2));
        assert_eq!(payout.to_seller, Decimal::from(18));
    }

    #[test]
    fn pre_registered_lots_subtract_both_discounts() {
        let mut auction = online_auction();
        auction.pre_register_lot_discount_percent = 5;
        auction.pre_register_lot_entry_fee_discount = 3;
        let lot = sold_lot(20);
        let payout = compute_payout(&lot, Some(&auction), None);
        // 20 * 20% + (1 - 3)
        assert_eq!(payout.to_club, Decimal::from(2));
        assert_eq!(payout.to_seller, Decimal::from(18));

        let mut added_by_admin = sold_lot(20);
        added_by_admin.added_by = Some(1);
        let payout = compute_payout(&added_by_admin, Some(&auction), None);
        assert_eq!(payout.to_club, Decimal::from(6));
    }

    #[test]
    fn donations_go_entirely_to_the_club() {
        let auction = online_auction();
        let mut lot = sold_lot(15);
        lot.donation = true;
        let payout = compute_payout(&lot, Some(&auction), None);
        assert_eq!(payout.to_club, Decimal::from(15));
        assert_eq!(payout.to_seller, Decimal::ZERO);
    }

    #[test]
    fn unsold_lots_charge_the_seller_except_donations() {
        let auction = online_auction();
        let mut lot = open_lot(1);
        lot.active = false;
        let payout = compute_payout(&lot, Some(&auction), None);
        assert!(payout.ended && !payout.sold);
        assert_eq!(payout.to_seller, Decimal::from(-1));
        assert_eq!(payout.to_club, Decimal::from(1));

        lot.donation = true;
        let payout = compute_payout(&lot, Some(&auction), None);
        assert_eq!(payout.to_seller, Decimal::ZERO);
        assert_eq!(payout.to_club, Decimal::ZERO);
    }

    #[test]
    fn promotion_cost_goes_to_club_only() {
        let mut auction = online_auction();
        auction.lot_promotion_cost = 2;
        let mut lot = sold_lot(10);
        lot.promoted = true;
        let payout = compute_payout(&lot, Some(&auction), None);
        assert_eq!(payout.to_club, Decimal::new(55, 1));
        assert_eq!(payout.to_seller, Decimal::new(65, 1));
    }

    #[test]
    fn banned_lots_end_without_payout() {
        let auction = online_auction();
        let mut lot = sold_lot(10);
        lot.banned = true;
        let payout = compute_payout(&lot, Some(&auction), None);
        assert!(payout.ended);
        assert!(!payout.sold);
        assert_eq!(payout.to_club, Decimal::ZERO);
    }
}
