use api_types::transaction::TransactionView;
use ratatui::{Frame, layout::Rect};

use crate::{
    app::AppState,
    ui::{components::page, theme::Theme},
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let (header, body) = page::split(area);
    page::render_header(frame, header, "Transactions", &state.transactions, theme);
    page::render_body(frame, body, &state.transactions, theme, row);
}

fn row(tx: &TransactionView) -> String {
    let date = tx
        .transaction_date
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    let id = tx
        .id
        .map(|id| format!("#{id}"))
        .unwrap_or_else(|| "-".to_string());
    let total = tx.total_value.unwrap_or(tx.quantity * tx.price);
    let platform = tx.platform.as_deref().unwrap_or("-");

    format!(
        "{date:<16}  {id:<8} user {:<6} pf {:<6} {platform:<10} {:<8} {:<4} {:>12.4} @ {:>10.2} = {:>12.2}  {}",
        tx.user_id,
        tx.portfolio_id,
        tx.symbol,
        tx.side.as_str(),
        tx.quantity,
        tx.price,
        total,
        tx.status.as_str(),
    )
}
