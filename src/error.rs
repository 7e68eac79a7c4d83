//! 정산 서비스 에러 타입

use thiserror::Error;

/// 로트에 입찰할 수 없는 이유
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BiddingError {
    #[error("이 로트는 삭제되었습니다: {0}")]
    BannedWithReason(String),

    #[error("이 로트는 삭제되었습니다")]
    Banned,

    #[error("이 경매는 온라인 입찰을 허용하지 않습니다")]
    BiddingNotAllowed,

    #[error("이 경매는 아직 입찰이 시작되지 않았습니다")]
    AuctionNotStarted,

    #[error("판매자가 이 로트를 비활성화했습니다")]
    Deactivated,

    /// 등록 직후의 로트, 남은 시간은 "5 minutes" 형태
    #[error("등록된 지 얼마 안 된 로트입니다. {0} 후에 입찰할 수 있습니다")]
    TooNew(String),
}

/// 정산 서비스 에러
#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("설정 오류: {0}")]
    Config(String),

    #[error("로트를 찾을 수 없습니다: {0}")]
    LotNotFound(i64),

    #[error("경매를 찾을 수 없습니다: {0}")]
    AuctionNotFound(i64),

    #[error("인보이스를 찾을 수 없습니다: {0}")]
    InvoiceNotFound(i64),

    #[error("경매 참가자를 찾을 수 없습니다: {0}")]
    ParticipantNotFound(i64),

    #[error(transparent)]
    Bidding(#[from] BiddingError),

    #[error("경매가 이미 종료되었습니다.")]
    AlreadyEnded,

    #[error("자신의 로트에는 입찰할 수 없습니다.")]
    OwnLot,

    #[error("입찰 전에 이 경매에 참가해야 합니다.")]
    NotRegistered,

    #[error("이 경매에서 입찰 권한이 없습니다.")]
    BiddingForbidden,

    #[error("입찰 금액이 최소 금액({minimum})보다 낮습니다.")]
    BelowReserve { minimum: i64 },

    #[error("입찰 금액이 현재 가격({current_price})보다 낮습니다.")]
    LowBid { current_price: i64 },

    #[error("기존 입찰 금액({existing})보다 높게 입찰해야 합니다.")]
    BidNotRaised { existing: i64 },

    #[error("즉시 구매가 불가능한 로트입니다.")]
    BuyNowUnavailable,

    #[error("낙찰가가 이미 설정되어 있습니다: {0}")]
    WinningPriceLocked(i64),

    #[error("잘못된 인보이스 상태 변경입니다: {from} -> {to}")]
    InvalidInvoiceTransition { from: String, to: String },

    #[error("저장된 값이 올바르지 않습니다: {0}")]
    InvalidData(String),

    #[error("버전 충돌")]
    VersionConflict,

    #[error("최대 재시도 횟수 초과")]
    MaxRetriesExceeded,

    #[error("메시지 브로커 오류: {0}")]
    Broker(String),

    #[error("알 수 없는 이벤트 타입: {0}")]
    UnknownEvent(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl SettlementError {
    /// 호출자에게 전달되는 에러 코드
    pub fn code(&self) -> &'static str {
        match self {
            SettlementError::Config(_) => "CONFIG",
            SettlementError::LotNotFound(_) => "LOT_NOT_FOUND",
            SettlementError::AuctionNotFound(_) => "AUCTION_NOT_FOUND",
            SettlementError::InvoiceNotFound(_) => "INVOICE_NOT_FOUND",
            SettlementError::ParticipantNotFound(_) => "PARTICIPANT_NOT_FOUND",
            SettlementError::Bidding(_) => "BIDDING_CLOSED",
            SettlementError::AlreadyEnded => "ALREADY_ENDED",
            SettlementError::OwnLot => "OWN_LOT",
            SettlementError::NotRegistered => "NOT_REGISTERED",
            SettlementError::BiddingForbidden => "BIDDING_FORBIDDEN",
            SettlementError::BelowReserve { .. } => "BELOW_RESERVE",
            SettlementError::LowBid { .. } => "LOW_BID",
            SettlementError::BidNotRaised { .. } => "BID_NOT_RAISED",
            SettlementError::BuyNowUnavailable => "BUY_NOW_UNAVAILABLE",
            SettlementError::WinningPriceLocked(_) => "WINNING_PRICE_LOCKED",
            SettlementError::InvalidInvoiceTransition { .. } => "INVALID_STATUS",
            SettlementError::InvalidData(_) => "INVALID_DATA",
            SettlementError::VersionConflict => "VERSION_CONFLICT",
            SettlementError::MaxRetriesExceeded => "MAX_RETRIES_EXCEEDED",
            SettlementError::Broker(_) => "BROKER",
            SettlementError::UnknownEvent(_) => "UNKNOWN_EVENT",
            SettlementError::Database(_) => "DATABASE",
            SettlementError::Serialization(_) => "SERIALIZATION",
        }
    }

    /// 다시 시도하면 성공할 수 있는 오류 (DB, 브로커)
    pub fn is_transient(&self) -> bool {
        matches!(self, SettlementError::Database(_) | SettlementError::Broker(_))
    }

    /// 호출자에게 반환할 JSON 에러 본문
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
        })
    }
}

pub type Result<T> = std::result::Result<T, SettlementError>;
