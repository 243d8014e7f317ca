use crate::agent::Agent;

/// Who said a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One entry of the chat transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// Everything the user built during this run of the program.
///
/// Nothing here is persisted. Each time an agent is created the transcript starts
/// over and the epoch moves forward, so replies meant for an older agent can be
/// recognised and dropped.
#[derive(Debug, Default)]
pub struct Session {
    generated_instructions: Option<String>,
    user_agent: Option<Agent>,
    chat_history: Vec<ChatMessage>,
    epoch: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generated_instructions(&self) -> Option<&str> {
        self.generated_instructions.as_deref()
    }

    /// Replaces the last generated instructions.
    pub fn store_generated(&mut self, instructions: impl Into<String>) {
        self.generated_instructions = Some(instructions.into());
    }

    /// Installs a new agent and clears the transcript.
    pub fn create_agent(&mut self, name: impl Into<String>, instructions: impl Into<String>) -> &Agent {
        self.chat_history.clear();
        self.epoch += 1;
        self.user_agent.insert(Agent::new(name, instructions))
    }

    pub fn agent(&self) -> Option<&Agent> {
        self.user_agent.as_ref()
    }

    pub fn has_agent(&self) -> bool {
        self.user_agent.is_some()
    }

    /// Identifies the current agent. Zero until the first agent is created.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.chat_history
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(ChatRole::User, content.into());
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(ChatRole::Assistant, content.into());
    }

    fn push(&mut self, role: ChatRole, content: String) {
        self.chat_history.push(ChatMessage { role, content });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creating_agent_resets_history_and_bumps_epoch() {
        let mut session = Session::new();
        assert!(!session.has_agent());
        assert_eq!(session.epoch(), 0);

        let agent = session.create_agent("Tutor", "Teach Python.");
        assert_eq!(agent.name, "Tutor");
        session.push_user("What is a list?");
        session.push_assistant("An ordered collection.");
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.epoch(), 1);

        session.create_agent("Chef", "Cook.");
        assert!(session.history().is_empty());
        assert_eq!(session.epoch(), 2);
        assert_eq!(session.agent().map(|a| a.instructions.as_str()), Some("Cook."));
    }

    #[test]
    fn history_keeps_roles_in_order() {
        let mut session = Session::new();
        session.create_agent("A", "B");
        session.push_user("hi");
        session.push_assistant("hello");
        let roles: Vec<_> = session.history().iter().map(|m| m.role.label()).collect();
        assert_eq!(roles, ["user", "assistant"]);
    }

    #[test]
    fn generated_instructions_are_replaced() {
        let mut session = Session::new();
        assert!(session.generated_instructions().is_none());
        session.store_generated("first");
        session.store_generated("second");
        assert_eq!(session.generated_instructions(), Some("second"));
        assert!(!session.has_agent());
    }
}
