use crate::invoice::model::AdjustmentDirection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 로트 이벤트 집계 타입
pub const LOT_AGGREGATE: &str = "lot";
/// 인보이스 이벤트 집계 타입
pub const INVOICE_AGGREGATE: &str = "invoice";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum LotEvent {
    // 입찰 이벤트 (대리 입찰 최고액 등록 또는 인상)
    BidPlaced {
        lot_id: i64,
        user_id: i64,
        amount: i64,
        timestamp: DateTime<Utc>,
    },
    // 즉시 구매 이벤트
    BuyNowExecuted {
        lot_id: i64,
        buyer_id: i64,
        price: i64,
        timestamp: DateTime<Utc>,
    },
    // 관리자 낙찰자 지정 이벤트
    WinnerDeclared {
        lot_id: i64,
        auctiontos_winner: i64,
        winning_price: i64,
        declared_by: Option<i64>,
        override_existing: bool,
        timestamp: DateTime<Utc>,
    },
    // 로트 종료 이벤트 (스케줄러)
    LotEnded {
        lot_id: i64,
        winner_user_id: Option<i64>,
        winning_price: Option<i64>,
        timestamp: DateTime<Utc>,
    },
    // 인보이스 수동 조정 이벤트
    InvoiceAdjusted {
        invoice_id: i64,
        direction: AdjustmentDirection,
        amount: i64,
        notes: String,
        timestamp: DateTime<Utc>,
    },
}

impl LotEvent {
    /// 이벤트 저장소에 기록되는 타입 이름
    pub fn event_type(&self) -> &'static str {
        match self {
            LotEvent::BidPlaced { .. } => "BidPlaced",
            LotEvent::BuyNowExecuted { .. } => "BuyNowExecuted",
            LotEvent::WinnerDeclared { .. } => "WinnerDeclared",
            LotEvent::LotEnded { .. } => "LotEnded",
            LotEvent::InvoiceAdjusted { .. } => "InvoiceAdjusted",
        }
    }

    pub fn aggregate_type(&self) -> &'static str {
        match self {
            LotEvent::InvoiceAdjusted { .. } => INVOICE_AGGREGATE,
            _ => LOT_AGGREGATE,
        }
    }

    /// 이벤트 집계 id (로트 번호, 인보이스 조정은 인보이스 id)
    pub fn aggregate_id(&self) -> i64 {
        match self {
            LotEvent::BidPlaced { lot_id, .. }
            | LotEvent::BuyNowExecuted { lot_id, .. }
            | LotEvent::WinnerDeclared { lot_id, .. }
            | LotEvent::LotEnded { lot_id, .. } => *lot_id,
            LotEvent::InvoiceAdjusted { invoice_id, .. } => *invoice_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            LotEvent::BidPlaced { timestamp, .. }
            | LotEvent::BuyNowExecuted { timestamp, .. }
            | LotEvent::WinnerDeclared { timestamp, .. }
            | LotEvent::LotEnded { timestamp, .. }
            | LotEvent::InvoiceAdjusted { timestamp, .. } => *timestamp,
        }
    }
}
