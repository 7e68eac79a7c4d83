/// 인보이스 재계산 및 저장
/// 합계는 항상 현재 로트 상태에서 다시 계산한다
// region:    --- Imports
use crate::database::DatabaseManager;
use crate::error::Result;
use crate::invoice::calculator::InvoiceTotals;
use crate::invoice::model::{Adjustment, Invoice, InvoiceStatus};
use crate::query::handlers::{
    fetch_auction, fetch_auction_invoices, fetch_auction_participants, fetch_invoice,
    fetch_participant_invoice, fetch_participant_lots, fetch_tos,
};
use crate::query::queries;
use chrono::Utc;
use sqlx::PgConnection;
use tracing::{debug, info};
// endregion: --- Imports

/// 참가자 한 명의 인보이스 재계산
/// 관련 로트도 인보이스도 없으면 아무것도 만들지 않는다
pub async fn recalculate_invoice(
    conn: &mut PgConnection,
    auction_id: i64,
    tos_id: i64,
) -> Result<Option<Invoice>> {
    let auction = fetch_auction(conn, auction_id).await?;
    let tos = fetch_tos(conn, tos_id).await?;
    let lots = fetch_participant_lots(conn, auction_id, tos_id).await?;
    let existing = fetch_participant_invoice(conn, auction_id, tos_id).await?;

    if lots.is_empty() && existing.is_none() {
        return Ok(None);
    }

    let adjustment = match &existing {
        Some(invoice) => Adjustment {
            direction: invoice.adjustment_direction()?,
            amount: invoice.adjustment,
        },
        None => Adjustment::none(),
    };
    let totals = InvoiceTotals::for_participant(&auction, &tos, &lots, adjustment);

    let invoice = sqlx::query_as::<_, Invoice>(queries::UPSERT_INVOICE_TOTAL)
        .bind(auction_id)
        .bind(tos_id)
        .bind(totals.rounded_net())
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

    debug!(
        "{:<12} --> {}",
        "Invoice",
        totals.summary(tos.display_name())
    );
    Ok(Some(invoice))
}

/// 로트 정산에 관련된 참가자들의 인보이스 재계산 (판매자, 낙찰자 등)
pub async fn recalculate_for_participants(
    conn: &mut PgConnection,
    auction_id: i64,
    tos_ids: &[Option<i64>],
) -> Result<()> {
    let mut seen: Vec<i64> = Vec::new();
    for tos_id in tos_ids.iter().flatten() {
        if seen.contains(tos_id) {
            continue;
        }
        seen.push(*tos_id);
        recalculate_invoice(conn, auction_id, *tos_id).await?;
    }
    Ok(())
}

/// 경매 참가자 전체의 인보이스 재계산
pub async fn recalculate_auction_invoices(conn: &mut PgConnection, auction_id: i64) -> Result<usize> {
    let participants = fetch_auction_participants(conn, auction_id).await?;
    let mut count = 0;
    for tos in &participants {
        if recalculate_invoice(conn, auction_id, tos.id).await?.is_some() {
            count += 1;
        }
    }
    info!(
        "{:<12} --> 경매 {} 인보이스 {}건 재계산",
        "Invoice", auction_id, count
    );
    Ok(count)
}

/// 인보이스 상태 변경 (DRAFT -> UNPAID -> PAID)
pub async fn change_invoice_status(
    conn: &mut PgConnection,
    invoice_id: i64,
    to: InvoiceStatus,
) -> Result<Invoice> {
    let mut invoice = fetch_invoice(conn, invoice_id).await?;
    let next = invoice.status()?.transition(to)?;
    sqlx::query(queries::UPDATE_INVOICE_STATUS)
        .bind(next.as_str())
        .bind(invoice_id)
        .execute(&mut *conn)
        .await?;
    invoice.status = next.to_string();
    Ok(invoice)
}

/// 경매의 DRAFT 인보이스를 UNPAID로 발행
pub async fn issue_draft_invoices(conn: &mut PgConnection, auction_id: i64) -> Result<usize> {
    let invoices = fetch_auction_invoices(conn, auction_id).await?;
    let mut issued = 0;
    for invoice in invoices {
        if invoice.status()? == InvoiceStatus::Draft {
            change_invoice_status(conn, invoice.id, InvoiceStatus::Unpaid).await?;
            issued += 1;
        }
    }
    Ok(issued)
}

/// 인보이스 상태 변경 (트랜잭션 단위)
pub async fn set_invoice_status(
    db_manager: &DatabaseManager,
    invoice_id: i64,
    to: InvoiceStatus,
) -> Result<Invoice> {
    info!(
        "{:<12} --> 인보이스 {} 상태 변경: {}",
        "Invoice", invoice_id, to
    );
    db_manager
        .transaction(|tx| Box::pin(change_invoice_status(&mut **tx, invoice_id, to)))
        .await
}

/// 참가자 인보이스 재계산 (트랜잭션 단위)
pub async fn refresh_invoice(
    db_manager: &DatabaseManager,
    auction_id: i64,
    tos_id: i64,
) -> Result<Option<Invoice>> {
    db_manager
        .transaction(|tx| Box::pin(recalculate_invoice(&mut **tx, auction_id, tos_id)))
        .await
}
