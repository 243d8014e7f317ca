pub mod agent;
pub mod app;
pub mod config;
pub mod event;
pub mod logging;
pub mod session;
pub mod tui;
pub mod ui;

use std::env;

use anyhow::{Context, Result};
use app::App;
use config::Settings;
use crossterm::event::{Event as CrosstermEvent, EventStream};
use event::Event;
use futures_util::StreamExt;
use tui::{Tui, init, restore};
use ui::render;

#[tokio::main]
async fn main() -> Result<()> {
    let workspace_root = env::current_dir().context("failed to resolve working directory")?;
    let config_path = Settings::config_path(&workspace_root);
    let bootstrap = Settings::bootstrap(&config_path, |name| env::var(name).ok())?;

    // Stdout belongs to the TUI, so a logger failure is reported before it starts.
    if let Err(err) = logging::init(&bootstrap.settings().logging, &workspace_root) {
        eprintln!("warning: logging disabled: {:#}", err);
    }

    let mut app = App::from_bootstrap(bootstrap, config_path);
    tui::install_panic_hook();
    let mut tui = init()?;
    let outcome = run(&mut tui, &mut app).await;
    restore()?;
    outcome
}

async fn run(tui: &mut Tui, app: &mut App) -> Result<()> {
    let mut stream = EventStream::new();
    let mut interval = tokio::time::interval(app.tick_rate());

    while !app.should_quit {
        tui.draw(|frame| render(frame, app))?;

        let event = tokio::select! {
            _ = interval.tick() => Event::Tick,
            maybe_event = stream.next() => {
                match maybe_event {
                    Some(Ok(CrosstermEvent::Key(key))) => Event::Key(key),
                    Some(Ok(CrosstermEvent::Resize(_, _))) => Event::Resize,
                    // Mouse, focus and paste events are not used.
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => {
                        log::error!("Terminal event stream failed: {}", err);
                        break;
                    }
                    None => break,
                }
            }
        };

        match event {
            Event::Tick => app.on_tick(),
            Event::Key(key) => app.handle_key(key),
            Event::Resize => {}
        }
    }

    log::info!("Shutting down");
    Ok(())
}
