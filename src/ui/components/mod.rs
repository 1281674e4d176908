use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Index after `current` in a list of `len` items, wrapping to the top
pub fn next_index(current: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match current {
        Some(i) if i + 1 < len => i + 1,
        _ => 0,
    })
}

/// Index before `current`, wrapping to the bottom
pub fn previous_index(current: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match current {
        Some(0) | None => len - 1,
        Some(i) => (i - 1).min(len - 1),
    })
}

/// One red line per validation message, indented under its input
pub fn error_spans(messages: &[String]) -> Vec<Spans<'static>> {
    messages
        .iter()
        .map(|message| {
            Spans::from(Span::styled(
                format!("    ! {}", message),
                Style::default().fg(Color::Red),
            ))
        })
        .collect()
}

/// `label: value`, with a cursor bar while the field is being edited
pub fn field_spans(label: &str, value: &str, focused: bool, editing: bool) -> Spans<'static> {
    let label_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let value = if focused && editing {
        format!("{}|", value)
    } else {
        value.to_string()
    };

    Spans::from(vec![
        Span::styled(format!("{}: ", label), label_style),
        Span::raw(value),
    ])
}

pub fn render_delete_confirmation<B: Backend>(frame: &mut Frame<B>, area: Rect, question: &str) {
    let popup_area = centered_rect(50, 20, area);

    let popup = Paragraph::new(vec![
        Spans::from(""),
        Spans::from(question.to_string()),
        Spans::from(""),
        Spans::from("<Y> Yes  <N> No"),
    ])
    .block(Block::default().title("Confirm Delete").borders(Borders::ALL))
    .style(Style::default().fg(Color::White).bg(Color::Black));

    frame.render_widget(Clear, popup_area);
    frame.render_widget(popup, popup_area);
}

// Helper function to create a centered rect
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_wraps_both_ways() {
        assert_eq!(next_index(None, 3), Some(0));
        assert_eq!(next_index(Some(1), 3), Some(2));
        assert_eq!(next_index(Some(2), 3), Some(0));
        assert_eq!(previous_index(Some(0), 3), Some(2));
        assert_eq!(previous_index(Some(2), 3), Some(1));
        assert_eq!(next_index(Some(0), 0), None);
        assert_eq!(previous_index(None, 0), None);
    }

    #[test]
    fn cursor_past_end_is_clamped() {
        assert_eq!(previous_index(Some(9), 3), Some(2));
        assert_eq!(next_index(Some(9), 3), Some(0));
    }
}
