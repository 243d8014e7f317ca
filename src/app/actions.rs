use log::{debug, info};

use super::{App, Field, StatusLine};
use crate::agent::{self, RunPurpose};

// The three things a user can do: draft instructions, create an agent, chat with it.
impl App {
    /// Asks the prompt engineer to draft instructions from the description field.
    pub(crate) fn generate_instructions(&mut self) {
        if self.generating {
            self.set_status(StatusLine::info("Already generating instructions..."));
            return;
        }
        let description = self.description.text().trim().to_string();
        if description.is_empty() {
            self.set_status(StatusLine::error("Describe your agent first"));
            self.focus = Field::Description;
            return;
        }
        let Some(model) = self.model.clone() else {
            self.report_missing_model();
            return;
        };

        let engineer = agent::prompt_engineer(&self.settings.generator);
        info!("Generating instructions via {}", model.name());
        self.runner.spawn(
            model,
            RunPurpose::Instructions,
            engineer,
            agent::instruction_request(&description),
        );
        self.generating = true;
        self.generator_error = None;
        self.set_status(StatusLine::info("Generating instructions..."));
    }

    /// Creates the agent from the form and starts a fresh chat.
    pub(crate) fn submit_agent_form(&mut self) {
        let name = self.agent_name.text().trim().to_string();
        let instructions = self.agent_instructions.text().trim().to_string();
        if name.is_empty() {
            self.reject_form("Agent name cannot be empty", Field::AgentName);
            return;
        }
        if instructions.is_empty() {
            self.reject_form("Agent instructions cannot be empty", Field::AgentInstructions);
            return;
        }

        self.session.create_agent(name.clone(), instructions);
        info!("Created agent '{}' (epoch {})", name, self.session.epoch());
        // A reply still in flight belongs to the previous agent and will be dropped.
        self.pending_chat = None;
        self.chat_input.clear();
        self.chat_error = None;
        self.chat_scroll = 0;
        self.form_error = None;
        self.focus = Field::ChatInput;
        self.set_status(StatusLine::success(format!(
            "{} is ready to answer your questions!",
            name
        )));
    }

    /// Sends the chat input to the current agent.
    pub(crate) fn submit_chat_prompt(&mut self) {
        let Some(agent) = self.session.agent().cloned() else {
            self.set_status(StatusLine::info(
                "Please create an agent using the form above to start chatting.",
            ));
            return;
        };
        if self.chat_input.text().trim().is_empty() {
            return;
        }
        if self.pending_chat.is_some() {
            self.set_status(StatusLine::info(format!("{} is still thinking...", agent.name)));
            return;
        }
        let Some(model) = self.model.clone() else {
            self.report_missing_model();
            return;
        };

        let prompt = self.chat_input.take();
        let epoch = self.session.epoch();
        debug!("Chat turn for '{}' (epoch {})", agent.name, epoch);
        self.session.push_user(prompt.clone());
        self.chat_error = None;
        self.chat_scroll = 0;
        self.runner
            .spawn(model, RunPurpose::Chat { epoch }, agent, prompt);
        self.pending_chat = Some(epoch);
        self.set_status(StatusLine::info("Thinking..."));
    }

    fn reject_form(&mut self, message: &str, field: Field) {
        self.form_error = Some(message.to_string());
        self.focus = field;
        self.set_status(StatusLine::error(message));
    }

    fn report_missing_model(&mut self) {
        self.set_status(StatusLine::error(
            "No model connected. Press Ctrl+K to enter an API key.",
        ));
    }
}
