//! Main content area rendering (popular artists, artist detail)

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, ListItem, Padding, Paragraph, Wrap},
    Frame,
};

use crate::model::{ContentState, ContentView, LoadState, PopularArtist, Streamable, UiState};
use super::utils::{calculate_num_width, render_scrollable_list, truncate_string};

pub fn render_main_content(
    frame: &mut Frame,
    area: Rect,
    ui_state: &UiState,
    content_state: &ContentState,
    current_playing_uri: Option<&str>,
) {
    match &content_state.view {
        ContentView::PopularArtists => {
            let block = content_block(" Popular Artists ");
            match &content_state.popular_artists {
                LoadState::Ready(artists) => {
                    render_artist_list(frame, area, artists, ui_state.artists_selected, block);
                }
                other => render_placeholder(frame, area, other, block),
            }
        }
        ContentView::ArtistDetail { title, .. } => {
            let block = content_block(&format!(" {} ", title));
            match &content_state.artist_tracks {
                LoadState::Ready(tracks) => {
                    render_track_list(
                        frame,
                        area,
                        tracks,
                        ui_state.tracks_selected,
                        current_playing_uri,
                        block,
                    );
                }
                other => render_placeholder(frame, area, other, block),
            }
        }
    }
}

fn content_block(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(title.to_string())
        .padding(Padding::horizontal(1))
        .border_style(Style::default().fg(Color::Green))
}

/// Loading or error body of a screen, or an empty-list hint
fn render_placeholder<T>(frame: &mut Frame, area: Rect, state: &LoadState<T>, block: Block) {
    let (text, style) = match state {
        LoadState::Loading => ("Loading...".to_string(), Style::default().fg(Color::Yellow)),
        LoadState::Error(message) => (
            format!(
                "Could not load content: {}\n\nPress R to retry",
                message.as_deref().unwrap_or("unknown error")
            ),
            Style::default().fg(Color::Red),
        ),
        LoadState::Ready(_) => ("Nothing here yet".to_string(), Style::default().fg(Color::DarkGray)),
    };

    let paragraph = Paragraph::new(text)
        .style(style)
        .wrap(Wrap { trim: false })
        .block(block);
    frame.render_widget(paragraph, area);
}

fn render_artist_list(
    frame: &mut Frame,
    area: Rect,
    artists: &[PopularArtist],
    selected_index: usize,
    block: Block,
) {
    if artists.is_empty() {
        render_placeholder(frame, area, &LoadState::Ready(()), block);
        return;
    }

    let content_width = area.width.saturating_sub(4) as usize;
    let items = artist_items(artists, selected_index, content_width);
    render_scrollable_list(frame, area, items, selected_index, block);
}

fn artist_items(artists: &[PopularArtist], selected_index: usize, content_width: usize) -> Vec<ListItem<'static>> {
    let count_width = 12;
    let title_width = content_width.saturating_sub(count_width + 3);

    artists
        .iter()
        .enumerate()
        .map(|(i, artist)| {
            let style = if i == selected_index {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let tracks = format!("{} tracks", artist.track_count);
            let mut text = format!("{}   {:>count_width$}", truncate_string(&artist.title, title_width), tracks);
            if let Some(content) = &artist.content {
                text.push('\n');
                text.push_str(&truncate_string(content, content_width));
            }
            ListItem::new(text).style(style)
        })
        .collect()
}

fn render_track_list(
    frame: &mut Frame,
    area: Rect,
    tracks: &[Streamable],
    selected_index: usize,
    current_playing_uri: Option<&str>,
    block: Block,
) {
    if tracks.is_empty() {
        render_placeholder(frame, area, &LoadState::Ready(()), block);
        return;
    }

    let content_width = area.width.saturating_sub(4) as usize;
    let items = track_items(tracks, selected_index, current_playing_uri, content_width);
    // +1 for header
    render_scrollable_list(frame, area, items, selected_index + 1, block);
}

fn track_items(
    tracks: &[Streamable],
    selected_index: usize,
    current_playing_uri: Option<&str>,
    content_width: usize,
) -> Vec<ListItem<'static>> {
    let num_width = calculate_num_width(tracks.len());
    let fixed_width = 1 + num_width + 3 + 3;
    let remaining_width = content_width.saturating_sub(fixed_width);
    let title_width = (remaining_width * 55) / 100;
    let detail_width = remaining_width.saturating_sub(title_width);

    let mut items: Vec<ListItem<'static>> = vec![
        ListItem::new(format!(
            " {:<num_width$}   {:<title_width$}   {:<detail_width$}",
            "#", "Title", "Description",
        ))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
    ];

    items.extend(tracks.iter().enumerate().map(|(i, track)| {
        let is_playing = current_playing_uri == Some(track.stream_uri.as_str());
        let style = if i == selected_index {
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
        } else if is_playing {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        let playing_indicator = if is_playing { "▶" } else { " " };
        let track_num = format!("{}{:<num_width$}", playing_indicator, i + 1);
        let detail = track.detail.lines().next().unwrap_or_default();

        ListItem::new(format!(
            "{}   {}   {}",
            track_num,
            truncate_string(&track.title, title_width),
            truncate_string(detail, detail_width)
        ))
        .style(style)
    }));

    items
}
