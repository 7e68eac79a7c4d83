/// 경매 전체 통계 (총 매출, 클럽 수익 등)
// region:    --- Imports
use crate::bidding::model::Lot;
use crate::invoice::model::Invoice;
use crate::settlement::payout::Payout;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
// endregion: --- Imports

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuctionStats {
    /// 판매된 로트 낙찰가 합계
    pub gross: i64,
    /// 로트별 클럽 몫 합계 (인보이스 반올림, 조정 제외)
    pub club_profit_raw: Decimal,
    /// 인보이스 기준 클럽 수익 (반올림 포함)
    pub club_profit: Decimal,
    pub total_to_sellers: Decimal,
    pub percent_to_club: Decimal,
    pub total_lots: usize,
    pub total_sold_lots: usize,
    pub total_unsold_lots: usize,
    pub percent_unsold_lots: Decimal,
    pub median_lot_price: i64,
}

impl AuctionStats {
    /// `lots`와 `payouts`는 같은 순서
    pub fn compute(lots: &[Lot], payouts: &[Payout], invoices: &[Invoice]) -> Self {
        let live: Vec<(&Lot, &Payout)> = lots
            .iter()
            .zip(payouts.iter())
            .filter(|(lot, _)| !lot.is_deleted)
            .collect();

        let gross: i64 = live.iter().filter_map(|(lot, _)| lot.winning_price).sum();
        let club_profit_raw: Decimal = live.iter().map(|(_, payout)| payout.to_club).sum();
        let club_profit: Decimal = -invoices
            .iter()
            .filter_map(|invoice| invoice.calculated_total)
            .sum::<Decimal>();
        let total_to_sellers = Decimal::from(gross) - club_profit;
        let percent_to_club = if gross > 0 {
            club_profit / Decimal::from(gross) * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        let unbanned: Vec<&Lot> = live
            .iter()
            .map(|(lot, _)| *lot)
            .filter(|lot| !lot.banned)
            .collect();
        let total_lots = unbanned.len();
        let total_sold_lots = unbanned.iter().filter(|lot| lot.winning_price.is_some()).count();
        let total_unsold_lots = total_lots - total_sold_lots;
        let percent_unsold_lots = if total_lots > 0 {
            Decimal::from(total_unsold_lots as u64) / Decimal::from(total_lots as u64)
                * Decimal::ONE_HUNDRED
        } else {
            Decimal::ONE_HUNDRED
        };

        let mut prices: Vec<i64> = live.iter().filter_map(|(lot, _)| lot.winning_price).collect();
        prices.sort_unstable();

        Self {
            gross,
            club_profit_raw,
            club_profit,
            total_to_sellers,
            percent_to_club,
            total_lots,
            total_sold_lots,
            total_unsold_lots,
            percent_unsold_lots,
            median_lot_price: median(&prices),
        }
    }
}

/// 정렬된 가격 목록에서 count/2 (반올림) 위치의 값
fn median(sorted: &[i64]) -> i64 {
    if sorted.is_empty() {
        return 0;
    }
    let count = sorted.len();
    // x.5는 짝수 쪽으로 반올림
    let half = count / 2;
    let index = if count % 2 == 1 && half % 2 == 1 { half + 1 } else { half };
    sorted[index.min(count - 1)]
}
