//! Layout rendering (top bar)

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Padding, Paragraph},
    Frame,
};

use crate::model::{ContentState, ContentView};

pub fn render_top_bar(frame: &mut Frame, area: Rect, content_state: &ContentState, device_name: &str) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // Screen title
            Constraint::Length(30), // Device name
        ])
        .split(area);

    let screen = match &content_state.view {
        ContentView::PopularArtists => "Popular artists".to_string(),
        ContentView::ArtistDetail { title, .. } => format!("Popular artists › {}", title),
    };

    let title = Paragraph::new(screen)
        .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Musify ")
                .padding(Padding::horizontal(1)),
        );
    frame.render_widget(title, chunks[0]);

    let device = Paragraph::new(format!("🎵 {}", device_name))
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL).title(" Device "));
    frame.render_widget(device, chunks[1]);
}
