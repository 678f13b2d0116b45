//! Key event handling

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::model::ContentView;
use super::AppController;

impl AppController {
    pub async fn handle_key_event(&self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        let model = self.model.lock().await;

        // Error notification blocks all other interactions
        if model.has_error().await {
            return match key.code {
                KeyCode::Esc | KeyCode::Enter => {
                    model.clear_error().await;
                    Ok(())
                }
                _ => Ok(()),
            };
        }

        if model.is_help_popup_open().await {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H') => {
                    model.hide_help_popup().await;
                    Ok(())
                }
                _ => Ok(()),
            };
        }

        let view = model.current_view().await;

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                model.set_should_quit(true).await;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                model.set_should_quit(true).await;
            }
            KeyCode::Up => {
                model.move_selection_up().await;
            }
            KeyCode::Down => {
                model.move_selection_down().await;
            }
            KeyCode::Enter => {
                drop(model);
                // Network-bound, keep the UI loop responsive
                let controller = self.clone();
                match view {
                    ContentView::PopularArtists => {
                        tokio::spawn(async move { controller.open_selected_artist().await });
                    }
                    ContentView::ArtistDetail { .. } => {
                        tokio::spawn(async move { controller.play_selected_track().await });
                    }
                }
            }
            KeyCode::Backspace | KeyCode::Esc => {
                drop(model);
                self.go_back().await;
            }
            // Play/Pause toggle
            KeyCode::Char(' ') => {
                drop(model);
                let controller = self.clone();
                tokio::spawn(async move { controller.toggle_playback().await });
            }
            KeyCode::Char('s') | KeyCode::Char('S') => {
                drop(model);
                self.stop_playback();
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                drop(model);
                let controller = self.clone();
                tokio::spawn(async move { controller.retry_current_view().await });
            }
            KeyCode::Char('h') | KeyCode::Char('H') => {
                model.show_help_popup().await;
            }
            _ => {}
        }
        Ok(())
    }
}
