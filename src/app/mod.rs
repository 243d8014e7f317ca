//! `app` is the core of the agent maker.
//!
//! It owns the application state, handles keyboard input and applies the results
//! of background agent runs.

/// `actions`: the three user operations (generate instructions, create agent, chat).
mod actions;
/// `init`: construction of `App` from settings.
mod init;
/// `keyboard`: routes key events to fields, buttons and overlays.
mod keyboard;
/// `overlays`: the API key prompt.
mod overlays;
/// `state`: the `App` struct and its component states.
mod state;
/// `tick`: periodic work, mostly draining finished runs.
mod tick;

pub use state::{App, Field, InputPromptState, OverlayState, StatusKind, StatusLine, TextInput};

/// Frames of the busy indicator, advanced once per tick.
pub const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

impl App {
    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn is_thinking(&self) -> bool {
        self.pending_chat.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.is_generating() || self.is_thinking()
    }

    pub fn spinner(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()]
    }

    /// Name of the connected model, if any.
    pub fn model_name(&self) -> Option<&str> {
        self.model.as_ref().map(|model| model.name())
    }

    pub(crate) fn set_status(&mut self, status: StatusLine) {
        self.status = status;
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Duration;

    use super::App;
    use crate::agent::ChatModel;
    use crate::config::Settings;

    pub(crate) fn app_with(model: Option<Arc<dyn ChatModel>>) -> App {
        let config_path = std::env::temp_dir().join("agent-maker-tests/never-written.toml");
        App::with_settings(Settings::default(), config_path, model)
    }

    /// Ticks until no run is in flight.
    pub(crate) async fn settle(app: &mut App) {
        for _ in 0..200 {
            app.on_tick();
            if !app.is_busy() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("runs did not finish");
    }

    /// Ticks for a fixed while, for runs whose results the app no longer waits on.
    pub(crate) async fn drain(app: &mut App) {
        for _ in 0..20 {
            app.on_tick();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}
