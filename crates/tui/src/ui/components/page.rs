//! Pieces shared by the paginated list screens.

use admin_client::Resource;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::{app::SectionState, ui::theme::Theme};

const HEADER_HEIGHT: u16 = 4;

/// Splits `area` into the header and body of a list screen.
pub fn split(area: Rect) -> (Rect, Rect) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(HEADER_HEIGHT), Constraint::Min(0)])
        .split(area);
    (layout[0], layout[1])
}

/// Page position, size, auto-refresh and the active query.
pub fn render_header<R: Resource>(
    frame: &mut Frame<'_>,
    area: Rect,
    title: &str,
    section: &SectionState<R>,
    theme: &Theme,
) {
    let snapshot = &section.snapshot;
    let window = snapshot.window;
    let updated = snapshot
        .last_update
        .map(|dt| dt.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());

    let mut position = vec![
        Span::styled("Page", Style::default().fg(theme.text_muted)),
        Span::raw(format!(
            ": {}/{}   ",
            window.current_page + 1,
            window.total_pages
        )),
        Span::styled("Size", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {}   ", window.page_size)),
        Span::styled("Auto-refresh", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {}   ", snapshot.refresh_interval)),
        Span::styled("Updated", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {updated}")),
    ];
    if snapshot.is_loading {
        position.push(Span::raw("   "));
        position.push(Span::styled("loading…", Style::default().fg(theme.warning)));
    }

    let filters = section.filter_summary();
    let query = if filters.is_empty() {
        Line::from(vec![
            Span::styled("Query", Style::default().fg(theme.text_muted)),
            Span::raw(": all records"),
        ])
    } else {
        Line::from(vec![
            Span::styled("Query", Style::default().fg(theme.text_muted)),
            Span::raw(": "),
            Span::styled(filters, Style::default().fg(theme.accent)),
        ])
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title(title.to_string());
    frame.render_widget(
        Paragraph::new(vec![Line::from(position), query]).block(block),
        area,
    );
}

/// The current page as a selectable list, or the state that replaces it:
/// an expired session, an error, loading or no results.
pub fn render_body<R: Resource>(
    frame: &mut Frame<'_>,
    area: Rect,
    section: &SectionState<R>,
    theme: &Theme,
    row: impl Fn(&R::Record) -> String,
) {
    let snapshot = &section.snapshot;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));

    let notice = if snapshot.session_expired {
        Some((
            "Your session has expired. Sign in again, then press r to reload.".to_string(),
            theme.error,
        ))
    } else if let Some(err) = &snapshot.error {
        Some((format!("{err}  (r to retry)"), theme.error))
    } else if snapshot.records.is_empty() && snapshot.is_loading {
        Some(("Loading…".to_string(), theme.text_muted))
    } else if snapshot.records.is_empty() {
        Some((format!("No {} found.", R::LABEL), theme.text_muted))
    } else {
        None
    };

    if let Some((message, color)) = notice {
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(message, Style::default().fg(color))))
                .block(block)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            area,
        );
        return;
    }

    let items = snapshot
        .records
        .iter()
        .map(|record| ListItem::new(Line::from(row(record))))
        .collect::<Vec<_>>();

    let mut list_state = ListState::default();
    list_state.select(Some(section.selected));

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("» ");

    frame.render_stateful_widget(list, area, &mut list_state);
}
