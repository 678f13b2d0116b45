mod audio;
mod config;
mod controller;
mod logging;
mod model;
mod player;
mod view;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::Mutex;

use audio::RodioEngine;
use config::AppConfig;
use controller::{AppController, PlaybackController};
use model::{AppModel, CatalogClient, HttpArtworkDownloader};
use player::MusicPlayer;
use view::AppView;

const USER_AGENT: &str = concat!("musify-rs/", env!("CARGO_PKG_VERSION"));

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::parse();

    if let Err(e) = logging::init_logging(&config.log_dir) {
        eprintln!("Warning: Failed to initialize logging: {:#}", e);
    }

    tracing::info!(api = %config.api_base_url, "=== Musify-RS Starting ===");

    let http = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to build HTTP client")?;

    let engine = Arc::new(RodioEngine::new(http.clone()).context("Failed to initialize audio output")?);
    let player = MusicPlayer::new(engine, config.player_config());
    let artwork = Arc::new(HttpArtworkDownloader::new(http.clone()));
    let playback = PlaybackController::new(player, artwork);

    let mut app_model = AppModel::new(config.error_timeout());
    app_model.set_catalog_client(CatalogClient::new(http, &config.api_base_url));
    app_model.update_device_name(audio::device_name()).await;

    let model = Arc::new(Mutex::new(app_model));
    let controller = AppController::new(model.clone(), playback);

    let controller_for_load = controller.clone();
    tokio::spawn(async move {
        controller_for_load.load_popular_artists().await;
    });

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, model, controller.clone()).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    controller.stop_playback();

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    tracing::info!("Musify-RS shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    model: Arc<Mutex<AppModel>>,
    controller: AppController,
) -> io::Result<()> {
    loop {
        controller.drain_playback_events().await;

        let (ui_state, content_state, device_name, should_quit) = {
            let model_guard = model.lock().await;

            model_guard.auto_clear_old_errors().await;

            (
                model_guard.get_ui_state().await,
                model_guard.get_content_state().await,
                model_guard.get_device_name().await,
                model_guard.should_quit().await,
            )
        };
        let playback = controller.playback_info(&device_name);

        terminal.draw(|f| {
            AppView::render(f, &playback, &ui_state, &content_state);
        })?;

        // Short poll keeps the elapsed time and progress gauge moving
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if let Err(e) = controller.handle_key_event(key).await {
                    tracing::warn!(error = %e, "Key handling failed");
                }
            }
        }

        if should_quit {
            break;
        }
    }

    Ok(())
}
