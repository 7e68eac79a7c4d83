/// 참가자별 인보이스 합산 및 반올림
/// 반올림은 항상 참가자에게 유리하게 (클럽은 반올림으로 이익을 보지 않는다)
// region:    --- Imports
use crate::auction::model::{Auction, AuctionTos};
use crate::bidding::model::Lot;
use crate::invoice::model::Adjustment;
use crate::settlement::payout::{compute_payout, Payout};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
// endregion: --- Imports

/// 인보이스 계산 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    /// 판매한 로트의 판매자 몫 합계 (미판매 수수료 포함)
    pub total_sold: Decimal,
    /// 구매한 로트의 낙찰가 합계
    pub total_bought: Decimal,
    pub lots_sold: usize,
    pub lots_sold_successfully: usize,
    pub lots_bought: usize,
    pub first_bid_payout: Decimal,
    pub adjustment: Adjustment,
    pub rounding: bool,
}

impl InvoiceTotals {
    /// 판매/구매 로트로부터 계산
    /// `sold`는 참가자가 판매자인 로트와 정산 결과, `bought`는 낙찰받은 로트
    pub fn compute(
        auction: &Auction,
        sold: &[(&Lot, Payout)],
        bought: &[&Lot],
        adjustment: Adjustment,
    ) -> Self {
        let sold: Vec<&(&Lot, Payout)> = sold.iter().filter(|(lot, _)| !lot.is_deleted).collect();
        let bought: Vec<&&Lot> = bought.iter().filter(|lot| !lot.is_deleted).collect();

        let total_sold = sold.iter().map(|(_, payout)| payout.to_seller).sum();
        let total_bought = bought
            .iter()
            .map(|lot| Decimal::from(lot.winning_price.unwrap_or(0)))
            .sum();

        let first_bid_payout = if auction.first_bid_payout > 0 && !bought.is_empty() {
            Decimal::from(auction.first_bid_payout)
        } else {
            Decimal::ZERO
        };

        Self {
            total_sold,
            total_bought,
            lots_sold: sold.len(),
            lots_sold_successfully: sold.iter().filter(|(lot, _)| lot.sold()).count(),
            lots_bought: bought.len(),
            first_bid_payout,
            adjustment,
            rounding: auction.invoice_rounding,
        }
    }

    /// 참가자와 관련된 로트 목록에서 정산까지 포함해 계산
    pub fn for_participant(
        auction: &Auction,
        tos: &AuctionTos,
        lots: &[Lot],
        adjustment: Adjustment,
    ) -> Self {
        let sold: Vec<(&Lot, Payout)> = lots
            .iter()
            .filter(|lot| lot.auctiontos_seller == Some(tos.id))
            .map(|lot| (lot, compute_payout(lot, Some(auction), Some(tos))))
            .collect();
        let bought: Vec<&Lot> = lots
            .iter()
            .filter(|lot| lot.auctiontos_winner == Some(tos.id))
            .collect();
        Self::compute(auction, &sold, &bought, adjustment)
    }

    pub fn subtotal(&self) -> Decimal {
        self.total_sold - self.total_bought
    }

    /// 반올림 전 순액: 판매 - 구매 + 첫 입찰 보너스 ± 조정
    pub fn net(&self) -> Decimal {
        self.subtotal() + self.first_bid_payout + self.adjustment.signed()
    }

    /// 참가자에게 유리하게 올림
    pub fn rounded_net(&self) -> Decimal {
        let net = self.net();
        if self.rounding {
            net.ceil()
        } else {
            net.round_dp_with_strategy(2, RoundingStrategy::ToPositiveInfinity)
        }
    }

    /// 클럽이 참가자에게 지급해야 하는 경우
    pub fn user_should_be_paid(&self) -> bool {
        self.net() > Decimal::ZERO
    }

    pub fn absolute_amount(&self) -> Decimal {
        self.rounded_net().abs()
    }

    /// 소계와 최종 금액의 차이 (반올림, 조정, 보너스)
    pub fn total_adjustment_amount(&self) -> Decimal {
        self.subtotal() - self.rounded_net()
    }

    pub fn summary(&self, name: &str) -> String {
        let amount = self.absolute_amount().round_dp(2);
        if self.user_should_be_paid() {
            format!("{} needs to be paid ${:.2}", name, amount)
        } else {
            format!("{} owes the club ${:.2}", name, amount)
        }
    }
}
