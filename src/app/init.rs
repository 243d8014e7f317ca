use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use super::{App, Field, StatusLine, TextInput};
use crate::agent::providers::http::OpenAiCompatModel;
use crate::agent::{ChatModel, ModelError, Runner};
use crate::config::{Bootstrap, Settings};
use crate::session::Session;

impl App {
    /// Creates the app from the outcome of [`Settings::bootstrap`].
    ///
    /// A ready bootstrap connects the HTTP model straight away; a missing key opens
    /// the API key prompt instead.
    pub fn from_bootstrap(bootstrap: Bootstrap, config_path: PathBuf) -> Self {
        match bootstrap {
            Bootstrap::Ready { settings, message } => {
                let mut app = Self::with_settings(settings, config_path, None);
                if let Some(message) = message {
                    info!("{}", message);
                }
                app.connect_model();
                app
            }
            Bootstrap::NeedsApiKey {
                settings,
                instructions,
            } => {
                let mut app = Self::with_settings(settings, config_path, None);
                app.prompt_api_key(instructions);
                app
            }
        }
    }

    /// Creates the app around an explicit model (or none).
    pub fn with_settings(
        settings: Settings,
        config_path: PathBuf,
        model: Option<Arc<dyn ChatModel>>,
    ) -> Self {
        debug!("Initializing App, settings at {}", config_path.display());
        let status = match model.as_ref() {
            Some(model) => StatusLine::info(format!("Connected to {}", model.name())),
            None => StatusLine::info("Tab to move between fields, Ctrl+Q to quit"),
        };
        Self {
            should_quit: false,
            focus: Field::Description,
            session: Session::new(),
            description: TextInput::new(),
            agent_name: TextInput::with_text(settings.defaults.agent_name.clone()),
            agent_instructions: TextInput::with_text(settings.defaults.agent_instructions.clone()),
            chat_input: TextInput::new(),
            status,
            generator_error: None,
            form_error: None,
            chat_error: None,
            chat_scroll: 0,
            chat_scroll_limit: 0,
            overlay: None,
            settings,
            config_path,
            model,
            runner: Runner::new(),
            generating: false,
            pending_chat: None,
            spinner_frame: 0,
            tick_rate: Duration::from_millis(250),
        }
    }

    /// (Re)builds the HTTP model from the current provider settings.
    pub(crate) fn connect_model(&mut self) {
        match OpenAiCompatModel::new(&self.settings.provider) {
            Ok(model) => {
                info!("Model ready: {} at {}", model.name(), model.endpoint());
                self.set_status(StatusLine::info(format!("Connected to {}", model.name())));
                self.model = Some(Arc::new(model));
            }
            Err(ModelError::MissingApiKey { provider, env_var }) => {
                self.model = None;
                warn!("No API key for {}", provider);
                self.prompt_api_key(format!(
                    "{} needs an API key. Set {} or enter one now.",
                    provider, env_var
                ));
            }
            Err(err) => {
                self.model = None;
                warn!("Failed to set up model: {}", err);
                self.set_status(StatusLine::error(format!("Model setup failed: {}", err)));
            }
        }
    }
}
