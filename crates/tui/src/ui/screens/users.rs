use api_types::user::UserView;
use ratatui::{Frame, layout::Rect};

use crate::{
    app::AppState,
    ui::{components::page, theme::Theme},
};

pub fn render(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let (header, body) = page::split(area);
    page::render_header(frame, header, "Users", &state.users, theme);
    page::render_body(frame, body, &state.users, theme, row);
}

fn row(user: &UserView) -> String {
    let registered = user
        .registration_date
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "#{:<7} {:<20} {:<32} {:<12} {registered}",
        user.user_id,
        user.user_name,
        user.email,
        user.account_status.as_str(),
    )
}
