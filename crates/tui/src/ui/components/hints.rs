use ratatui::{style::Style, text::Span};

use crate::ui::theme::Theme;

/// A keyboard hint consisting of a key and its action.
#[derive(Debug, Clone)]
pub struct KeyHint {
    pub key: String,
    pub action: String,
}

impl KeyHint {
    pub fn new(key: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            action: action.into(),
        }
    }
}

pub fn hints_to_spans(hints: &[KeyHint], theme: &Theme) -> Vec<Span<'static>> {
    let mut spans = Vec::new();

    for (i, hint) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(
            hint.key.clone(),
            Style::default().fg(theme.accent),
        ));
        spans.push(Span::raw(format!(" {}", hint.action)));
    }

    spans
}

pub fn hint_separator(theme: &Theme) -> Span<'static> {
    Span::styled("  │  ", Style::default().fg(theme.border))
}

pub mod common {
    use super::KeyHint;

    /// Paging and query keys shared by both sections.
    pub fn browse() -> Vec<KeyHint> {
        vec![
            KeyHint::new("n/p", "page"),
            KeyHint::new("g", "go to"),
            KeyHint::new("+/-", "size"),
            KeyHint::new("/", "search"),
            KeyHint::new("c", "clear"),
            KeyHint::new("r", "refresh"),
            KeyHint::new("i", "auto"),
        ]
    }

    pub fn prompt() -> Vec<KeyHint> {
        vec![KeyHint::new("Enter", "apply"), KeyHint::new("Esc", "cancel")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_alternate_keys_and_actions() {
        let spans = hints_to_spans(&common::prompt(), &Theme::default());
        let text: String = spans.iter().map(|span| span.content.as_ref()).collect();
        assert_eq!(text, "Enter apply  Esc cancel");
    }
}
