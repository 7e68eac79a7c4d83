use crate::error::{Result, SettlementError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// 인보이스 모델
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invoice {
    pub id: i64,
    pub auction_id: i64,
    pub auctiontos_user: i64,
    pub status: String,
    pub adjustment_direction: String,
    pub adjustment: i64,
    pub adjustment_notes: String,
    pub memo: Option<String>,
    pub calculated_total: Option<Decimal>,
    pub date: DateTime<Utc>,
}

impl Invoice {
    pub fn status(&self) -> Result<InvoiceStatus> {
        self.status.parse()
    }

    pub fn adjustment_direction(&self) -> Result<AdjustmentDirection> {
        self.adjustment_direction.parse()
    }
}

/// 인보이스 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Draft,
    Unpaid,
    Paid,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "DRAFT",
            InvoiceStatus::Unpaid => "UNPAID",
            InvoiceStatus::Paid => "PAID",
        }
    }

    /// DRAFT -> UNPAID -> PAID 순서로만 변경 가능
    pub fn transition(self, to: InvoiceStatus) -> Result<InvoiceStatus> {
        match (self, to) {
            (InvoiceStatus::Draft, InvoiceStatus::Unpaid)
            | (InvoiceStatus::Unpaid, InvoiceStatus::Paid) => Ok(to),
            _ => Err(SettlementError::InvalidInvoiceTransition {
                from: self.to_string(),
                to: to.to_string(),
            }),
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = SettlementError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "DRAFT" => Ok(InvoiceStatus::Draft),
            "UNPAID" => Ok(InvoiceStatus::Unpaid),
            "PAID" => Ok(InvoiceStatus::Paid),
            other => Err(SettlementError::InvalidData(format!(
                "알 수 없는 인보이스 상태: {}",
                other
            ))),
        }
    }
}

/// 수동 조정 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdjustmentDirection {
    /// 할인 (참가자에게 지급)
    PaySeller,
    /// 추가 청구
    PayClub,
}

impl AdjustmentDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentDirection::PaySeller => "PAY_SELLER",
            AdjustmentDirection::PayClub => "PAY_CLUB",
        }
    }
}

impl std::str::FromStr for AdjustmentDirection {
    type Err = SettlementError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PAY_SELLER" => Ok(AdjustmentDirection::PaySeller),
            "PAY_CLUB" => Ok(AdjustmentDirection::PayClub),
            other => Err(SettlementError::InvalidData(format!(
                "알 수 없는 조정 방향: {}",
                other
            ))),
        }
    }
}

/// 인보이스에 적용되는 수동 조정
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    pub direction: AdjustmentDirection,
    pub amount: i64,
}

impl Adjustment {
    pub fn none() -> Self {
        Self {
            direction: AdjustmentDirection::PayClub,
            amount: 0,
        }
    }

    /// 참가자 기준 부호가 적용된 금액
    pub fn signed(&self) -> Decimal {
        let amount = Decimal::from(self.amount);
        match self.direction {
            AdjustmentDirection::PaySeller => amount,
            AdjustmentDirection::PayClub => -amount,
        }
    }
}
