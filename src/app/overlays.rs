use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{info, warn};

use super::{App, InputPromptState, OverlayState, StatusLine};

impl App {
    /// Opens the API key prompt with `instructions` as its explanation.
    pub(crate) fn prompt_api_key(&mut self, instructions: impl Into<String>) {
        let instructions = instructions.into();
        info!("Prompting for API key: {}", instructions);
        let title = format!("Set {} API Key", self.settings.provider.kind.display_name());
        self.overlay = Some(OverlayState::ApiKeyPrompt(InputPromptState::new(
            title,
            instructions.clone(),
            true,
        )));
        self.set_status(StatusLine::info(instructions));
    }

    pub(crate) fn close_overlay(&mut self) {
        self.overlay = None;
    }

    /// Stores the key in the settings file and reconnects the model.
    ///
    /// A failed save is not fatal: the key still applies to this session.
    pub(crate) fn apply_api_key(&mut self, api_key: &str) -> Result<(), String> {
        let trimmed = api_key.trim();
        if trimmed.is_empty() {
            return Err(String::from("API key cannot be empty"));
        }
        self.settings.provider.api_key = Some(trimmed.to_string());
        let saved = match self.settings.save_to_file(&self.config_path) {
            Ok(()) => {
                info!("API key saved to {}", self.config_path.display());
                true
            }
            Err(err) => {
                warn!("Failed to save API key: {:#}", err);
                false
            }
        };
        self.close_overlay();
        self.connect_model();
        if self.model.is_none() {
            return Ok(());
        }
        if !saved {
            self.set_status(StatusLine::error(format!(
                "Connected, but could not write {}; the key lasts for this session only",
                self.config_path.display()
            )));
        }
        Ok(())
    }

    /// Handles key events when an overlay is active.
    pub(crate) fn handle_overlay_key(&mut self, key: KeyEvent) {
        let Some(OverlayState::ApiKeyPrompt(mut state)) = self.overlay.clone() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                self.close_overlay();
                self.set_status(StatusLine::info(
                    "No API key set. Press Ctrl+K to enter one later.",
                ));
                return;
            }
            KeyCode::Enter => {
                let value = state.value.clone();
                if let Err(message) = self.apply_api_key(&value) {
                    state.error = Some(message);
                    self.overlay = Some(OverlayState::ApiKeyPrompt(state));
                }
                return;
            }
            KeyCode::Backspace => {
                state.value.pop();
                state.error = None;
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                state.value.clear();
                state.error = None;
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                state.value.push(ch);
                state.error = None;
            }
            _ => return,
        }
        self.overlay = Some(OverlayState::ApiKeyPrompt(state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Bootstrap, Settings};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn prompting_app(config_path: std::path::PathBuf) -> App {
        App::from_bootstrap(
            Bootstrap::NeedsApiKey {
                settings: Settings::default(),
                instructions: String::from("enter a key"),
            },
            config_path,
        )
    }

    #[tokio::test]
    async fn entered_key_is_saved_and_connects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config/agent-maker.toml");
        let mut app = prompting_app(path.clone());
        assert!(matches!(app.overlay, Some(OverlayState::ApiKeyPrompt(_))));
        assert!(app.model_name().is_none());

        for ch in "key-123".chars() {
            app.handle_overlay_key(press(KeyCode::Char(ch)));
        }
        app.handle_overlay_key(press(KeyCode::Enter));

        assert!(app.overlay.is_none());
        assert_eq!(app.model_name(), Some("Gemini (gemini-2.0-flash)"));
        let saved = Settings::load(&path).unwrap();
        assert_eq!(saved.provider.api_key.as_deref(), Some("key-123"));
    }

    #[tokio::test]
    async fn empty_key_keeps_prompt_open() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = prompting_app(dir.path().join("agent-maker.toml"));
        app.handle_overlay_key(press(KeyCode::Enter));

        match app.overlay.as_ref() {
            Some(OverlayState::ApiKeyPrompt(state)) => {
                assert_eq!(state.error.as_deref(), Some("API key cannot be empty"));
            }
            None => panic!("prompt closed on empty key"),
        }
    }

    #[tokio::test]
    async fn escape_dismisses_without_model() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = prompting_app(dir.path().join("agent-maker.toml"));
        app.handle_overlay_key(press(KeyCode::Char('x')));
        app.handle_overlay_key(press(KeyCode::Esc));

        assert!(app.overlay.is_none());
        assert!(app.model_name().is_none());
    }
}
