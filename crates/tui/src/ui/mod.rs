pub mod components;
pub mod keymap;
pub mod screens;

mod terminal;
mod theme;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::{AppState, Prompt, PromptKind, Section};

pub use terminal::{AppTerminal as Terminal, restore_terminal, setup_terminal};
pub use theme::Theme;

pub fn render(frame: &mut Frame<'_>, state: &AppState) {
    let theme = Theme::default();
    let area = frame.area();

    // Main layout: info bar, tabs, content, bottom bar
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_info_bar(frame, layout[0], state, &theme);
    components::tabs::render_tabs(frame, layout[1], state.section, &theme);

    match state.section {
        Section::Transactions => screens::transactions::render(frame, layout[2], state, &theme),
        Section::Users => screens::users::render(frame, layout[2], state, &theme),
    }

    match &state.prompt {
        Some(prompt) => render_prompt(frame, layout[3], prompt, &theme),
        None => render_bottom_bar(frame, layout[3], state, &theme),
    }
    components::toast::render(frame, area, state.toast.as_ref(), &theme);
}

fn render_info_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let (status, status_style) = if state.session_expired() {
        (
            "SESSION EXPIRED",
            Style::default()
                .fg(theme.error)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        ("OK", Style::default().fg(theme.positive))
    };

    let line = Line::from(vec![
        Span::styled("Tradedesk admin", Style::default().fg(theme.accent)),
        Span::raw("  "),
        Span::styled("API", Style::default().fg(theme.text_muted)),
        Span::raw(format!(": {}  ", state.base_url)),
        Span::styled("Session", Style::default().fg(theme.text_muted)),
        Span::raw(": "),
        Span::styled(status, status_style),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

fn render_bottom_bar(frame: &mut Frame<'_>, area: Rect, state: &AppState, theme: &Theme) {
    let mut parts = components::tabs::tab_shortcuts(theme);

    parts.push(components::hints::hint_separator(theme));
    let hints = match state.section {
        Section::Transactions => components::hints::common::browse(),
        Section::Users => {
            let mut hints = components::hints::common::browse();
            hints.push(components::hints::KeyHint::new("e", "edit"));
            hints
        }
    };
    parts.extend(components::hints::hints_to_spans(&hints, theme));

    parts.push(components::hints::hint_separator(theme));
    parts.push(Span::styled("q", Style::default().fg(theme.accent)));
    parts.push(Span::raw(" quit"));

    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}

fn render_prompt(frame: &mut Frame<'_>, area: Rect, prompt: &Prompt, theme: &Theme) {
    let mut parts = vec![
        Span::styled(prompt.label(), Style::default().fg(theme.accent)),
        Span::raw(": "),
        Span::styled(prompt.input.clone(), Style::default().fg(theme.text)),
        Span::styled("_", Style::default().fg(theme.accent)),
        Span::raw("  "),
    ];

    match &prompt.error {
        Some(err) => parts.push(Span::styled(err.clone(), Style::default().fg(theme.error))),
        None => {
            let hint = match prompt.kind {
                PromptKind::Search => "field=value ... (_any_ = no constraint)",
                PromptKind::GoTo => "page number",
                PromptKind::EditUser(_) => "name= email= password= status=",
            };
            parts.push(Span::styled(hint, Style::default().fg(theme.text_muted)));
        }
    }
    parts.push(components::hints::hint_separator(theme));
    parts.extend(components::hints::hints_to_spans(
        &components::hints::common::prompt(),
        theme,
    ));

    frame.render_widget(Paragraph::new(Line::from(parts)), area);
}
