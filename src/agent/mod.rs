//! Agents and the machinery that runs them.
//!
//! An [`Agent`] is a name plus a system prompt. Running it means one completion
//! against a [`ChatModel`]: the instructions as the system message, the user's
//! input as the only user message.

/// `providers`: model backends behind the [`ChatModel`] trait.
pub mod providers;

/// `runner`: executes agents inline or on background tasks.
pub mod runner;

pub use providers::{ChatModel, ModelError};
pub use runner::{RunEvent, RunPurpose, Runner};

use crate::config::GeneratorConfig;

/// Name of the built-in agent that drafts instructions for other agents.
pub const PROMPT_ENGINEER_NAME: &str = "Prompt Engineer";

/// A conversational agent bound to a system prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Agent {
    pub name: String,
    pub instructions: String,
}

impl Agent {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
        }
    }
}

/// What an agent produced for one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub final_output: String,
}

/// The agent used to turn a short description into full agent instructions.
pub fn prompt_engineer(config: &GeneratorConfig) -> Agent {
    Agent::new(PROMPT_ENGINEER_NAME, config.system_prompt.trim())
}

/// The user message sent to the prompt engineer.
pub fn instruction_request(description: &str) -> String {
    format!("The user wants this agent: {}", description.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_GENERATOR_PROMPT;

    #[test]
    fn prompt_engineer_uses_generator_prompt() {
        let agent = prompt_engineer(&GeneratorConfig::default());
        assert_eq!(agent.name, PROMPT_ENGINEER_NAME);
        assert_eq!(agent.instructions, DEFAULT_GENERATOR_PROMPT);
        assert!(agent.instructions.starts_with("You are a prompt engineer"));
    }

    #[test]
    fn instruction_request_wraps_description() {
        assert_eq!(
            instruction_request("  A friendly Python tutor for kids "),
            "The user wants this agent: A friendly Python tutor for kids"
        );
    }
}
