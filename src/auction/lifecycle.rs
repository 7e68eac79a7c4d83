/// 경매 및 로트의 시간 기반 상태 계산
/// 모든 함수는 현재 시각을 인자로 받는다.
// region:    --- Imports
use crate::auction::model::Auction;
use crate::bidding::model::Lot;
use crate::error::BiddingError;
use chrono::{DateTime, Duration, Utc};
// endregion: --- Imports

// region:    --- Constants
/// 막판 입찰 시 연장 가능한 최대 시간(분)
pub const DYNAMIC_END_GRACE_MINUTES: i64 = 60;
/// 이 시간(분) 안에 입찰이 들어오면 종료 시각을 연장
pub const DYNAMIC_END_WINDOW_MINUTES: i64 = 15;
/// 등록 직후 입찰 금지 시간(분)
pub const NEW_LOT_BIDDING_DELAY_MINUTES: i64 = 20;
/// 오프라인 경매 로트는 수동으로 종료된다
pub const IN_PERSON_LOT_LIFETIME_DAYS: i64 = 364;

const NO_END_MINUTES: i64 = 9999;
const IN_PERSON_MINUTES: i64 = 999;
// endregion: --- Constants

// region:    --- Auction
/// 로트가 늦어도 종료되어야 하는 시각
pub fn auction_dynamic_end(auction: &Auction) -> Option<DateTime<Utc>> {
    let date_end = auction.date_end?;
    if auction.sealed_bid {
        Some(date_end)
    } else {
        Some(date_end + Duration::minutes(DYNAMIC_END_GRACE_MINUTES))
    }
}

/// 온라인 경매만 시간에 따라 종료된다
pub fn auction_closed(auction: &Auction, now: DateTime<Utc>) -> bool {
    if !auction.is_online {
        return false;
    }
    matches!(auction_dynamic_end(auction), Some(end) if now > end)
}

pub fn auction_started(auction: &Auction, now: DateTime<Utc>) -> bool {
    now > auction.date_start
}

pub fn auction_minutes_to_end(auction: &Auction, now: DateTime<Utc>) -> i64 {
    match auction.date_end {
        Some(end) => whole_minutes_until(end, now),
        None => NO_END_MINUTES,
    }
}

/// 알림 발송용
pub fn auction_ending_soon(auction: &Auction, now: DateTime<Utc>) -> bool {
    auction_minutes_to_end(auction, now) < 120
}

pub fn can_submit_lots(auction: &Auction, now: DateTime<Utc>) -> bool {
    if now < auction.lot_submission_start_date {
        return false;
    }
    if let Some(submission_end) = auction.lot_submission_end_date {
        return submission_end >= now;
    }
    if auction.is_online {
        if let Some(end) = auction.date_end {
            if end > now {
                return false;
            }
        }
    }
    true
}
// endregion: --- Auction

// region:    --- Lot
pub fn is_part_of_in_person_auction(auction: Option<&Auction>) -> bool {
    matches!(auction, Some(a) if !a.is_online)
}

/// 연장을 포함해 로트가 종료될 수 있는 가장 늦은 시각
pub fn lot_hard_end(lot: &Lot, auction: Option<&Auction>) -> Option<DateTime<Utc>> {
    match auction {
        Some(auction) => auction_dynamic_end(auction),
        None => lot.date_end.map(|end| end + Duration::minutes(DYNAMIC_END_GRACE_MINUTES)),
    }
}

/// 로트 종료 시각
/// 오프라인 경매 로트는 경매 시작 후 364일, 종료 시각이 비어 있으면 현재 시각
pub fn lot_calculated_end(lot: &Lot, auction: Option<&Auction>, now: DateTime<Utc>) -> DateTime<Utc> {
    if let Some(auction) = auction.filter(|a| !a.is_online) {
        return auction.date_start + Duration::days(IN_PERSON_LOT_LIFETIME_DAYS);
    }
    lot.date_end.unwrap_or(now)
}

pub fn lot_ended(lot: &Lot, auction: Option<&Auction>, now: DateTime<Utc>) -> bool {
    if lot.sold() || lot.banned || lot.is_deleted {
        return true;
    }
    if is_part_of_in_person_auction(auction) {
        return false;
    }
    now > lot_calculated_end(lot, auction, now)
}

pub fn lot_minutes_to_end(lot: &Lot, auction: Option<&Auction>, now: DateTime<Utc>) -> i64 {
    if is_part_of_in_person_auction(auction) {
        return IN_PERSON_MINUTES;
    }
    whole_minutes_until(lot_calculated_end(lot, auction, now), now)
}

/// 종료 2시간 전 (관심 로트 알림)
pub fn lot_ending_soon(lot: &Lot, auction: Option<&Auction>, now: DateTime<Utc>) -> bool {
    if is_part_of_in_person_auction(auction) {
        return false;
    }
    now > lot_calculated_end(lot, auction, now) - Duration::hours(2)
}

pub fn lot_ending_very_soon(lot: &Lot, auction: Option<&Auction>, now: DateTime<Utc>) -> bool {
    lot_minutes_to_end(lot, auction, now) < 1
}

/// 종료 15분 이내 (막판 입찰 시 종료 연장 대상)
pub fn within_dynamic_end_time(lot: &Lot, auction: Option<&Auction>, now: DateTime<Utc>) -> bool {
    if is_part_of_in_person_auction(auction) {
        return false;
    }
    lot_minutes_to_end(lot, auction, now) < DYNAMIC_END_WINDOW_MINUTES
}

pub fn is_sealed_bid(auction: Option<&Auction>) -> bool {
    matches!(auction, Some(a) if a.sealed_bid)
}

/// 입찰 가능 시각: 등록 20분 후, 경매 시작이 더 늦으면 경매 시작
pub fn bidding_allowed_on(lot: &Lot, auction: Option<&Auction>) -> DateTime<Utc> {
    let first_bid_date = lot.date_posted + Duration::minutes(NEW_LOT_BIDDING_DELAY_MINUTES);
    match auction {
        Some(auction) if auction.date_start > first_bid_date => auction.date_start,
        _ => first_bid_date,
    }
}

/// 입찰이 불가능하면 그 이유를 반환
pub fn bidding_error(
    lot: &Lot,
    auction: Option<&Auction>,
    now: DateTime<Utc>,
) -> Option<BiddingError> {
    if lot.banned {
        return Some(match lot.ban_reason.as_deref() {
            Some(reason) if !reason.is_empty() => BiddingError::BannedWithReason(reason.to_string()),
            _ => BiddingError::Banned,
        });
    }
    if let Some(auction) = auction {
        if !auction.allow_bidding_on_lots {
            return Some(BiddingError::BiddingNotAllowed);
        }
        if !auction_started(auction, now) {
            return Some(BiddingError::AuctionNotStarted);
        }
    }
    if lot.deactivated {
        return Some(BiddingError::Deactivated);
    }
    let allowed_on = bidding_allowed_on(lot, auction);
    if allowed_on > now {
        return Some(BiddingError::TooNew(humanize_wait(allowed_on - now)));
    }
    None
}

/// 막판 입찰로 연장된 새 종료 시각, 연장 대상이 아니면 None
pub fn extended_end(lot: &Lot, auction: Option<&Auction>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if is_sealed_bid(auction) || lot_ended(lot, auction, now) {
        return None;
    }
    if !within_dynamic_end_time(lot, auction, now) {
        return None;
    }
    let proposed = now + Duration::minutes(DYNAMIC_END_WINDOW_MINUTES);
    match lot_hard_end(lot, auction) {
        Some(hard_end) if proposed > hard_end => Some(hard_end),
        _ => Some(proposed),
    }
}
// endregion: --- Lot

fn whole_minutes_until(end: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (end - now).num_seconds();
    if seconds < 0 {
        0
    } else {
        seconds / 60
    }
}

/// "5 minutes", "1 hour" 형태
fn humanize_wait(wait: Duration) -> String {
    let mut delta = wait.num_seconds().max(0);
    let mut unit = "second";
    if delta > 60 {
        delta /= 60;
        unit = "minute";
    }
    if unit == "minute" && delta > 60 {
        delta /= 60;
        unit = "hour";
    }
    if unit == "hour" && delta > 24 {
        delta /= 24;
        unit = "day";
    }
    if delta == 1 {
        format!("{} {}", delta, unit)
    } else {
        format!("{} {}s", delta, unit)
    }
}
