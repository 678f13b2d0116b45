//! Overlay rendering (error notification, help popup)

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::model::UiState;

const KEYBINDINGS: &[(&str, &str)] = &[
    ("", "── Navigation ──"),
    ("↑ / ↓", "Move selection"),
    ("Enter", "Open artist / Play track"),
    ("Backspace / Esc", "Go back"),
    ("R", "Retry loading"),
    ("", ""),
    ("", "── Playback ──"),
    ("Space", "Play / Pause"),
    ("S", "Stop"),
    ("", ""),
    ("", "── General ──"),
    ("H", "Toggle this help"),
    ("Q", "Quit"),
];

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    }
}

fn popup_block(title: &'static str, color: Color) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(title)
        .title_style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .style(Style::default().bg(Color::Black))
}

/// Snackbar for the last failure; dismissed with Esc or after a timeout
pub fn render_error_notification(frame: &mut Frame, ui_state: &UiState) {
    let Some(message) = &ui_state.error_message else {
        return;
    };
    let area = frame.area();

    let popup_width = 52.min(area.width.saturating_sub(4));
    let inner_width = popup_width.saturating_sub(4).max(1) as usize;
    let line_count = message.chars().count().div_ceil(inner_width).max(1) as u16;

    // Bottom-anchored, just above the mini player
    let height = (line_count + 2).min(area.height.saturating_sub(4));
    let popup_area = Rect {
        x: area.x + area.width.saturating_sub(popup_width) / 2,
        y: area.y + area.height.saturating_sub(height + 3),
        width: popup_width,
        height,
    };

    frame.render_widget(Clear, popup_area);
    let notification = Paragraph::new(message.as_str())
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: false })
        .block(popup_block(" Error (Esc to dismiss) ", Color::Red));
    frame.render_widget(notification, popup_area);
}

pub fn render_help_popup(frame: &mut Frame) {
    let popup_area = centered(frame.area(), 62, KEYBINDINGS.len() as u16 + 2);

    let lines: Vec<Line> = KEYBINDINGS
        .iter()
        .map(|(key, desc)| {
            if key.is_empty() {
                Line::from(Span::styled(
                    format!("{:^38}", desc),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(vec![
                    Span::styled(
                        format!("{:>18}", key),
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled(desc.to_string(), Style::default().fg(Color::White)),
                ])
            }
        })
        .collect();

    frame.render_widget(Clear, popup_area);
    let help = Paragraph::new(lines)
        .block(popup_block(" Help (H or Esc to close) ", Color::Cyan))
        .style(Style::default().bg(Color::Black));
    frame.render_widget(help, popup_area);
}
