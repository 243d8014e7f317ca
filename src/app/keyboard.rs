use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::{App, Field, StatusLine, TextInput};

impl App {
    /// The main entry point for handling keyboard events.
    ///
    /// Overlays capture all input, then global shortcuts, then the focused field.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.overlay.is_some() {
            self.handle_overlay_key(key);
            return;
        }

        if self.handle_global_shortcuts(key) {
            return;
        }

        match self.focus {
            Field::Description => {
                if key.code == KeyCode::Enter {
                    self.generate_instructions();
                } else {
                    edit_single_line(&mut self.description, key);
                }
            }
            Field::AgentName => {
                if key.code == KeyCode::Enter {
                    self.submit_agent_form();
                } else {
                    edit_single_line(&mut self.agent_name, key);
                }
            }
            Field::AgentInstructions => self.handle_instructions_key(key),
            Field::GenerateButton | Field::CreateButton => self.handle_button_key(key),
            Field::ChatInput => self.handle_chat_key(key),
        }
    }

    /// Handles global keyboard shortcuts.
    /// Returns `true` if a shortcut was handled, `false` otherwise.
    fn handle_global_shortcuts(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            // Ctrl+Q / Ctrl+C: Quit
            KeyCode::Char('q') | KeyCode::Char('c') if ctrl => self.should_quit = true,
            // Ctrl+G: Generate instructions
            KeyCode::Char('g') if ctrl => self.generate_instructions(),
            // Ctrl+S: Create agent
            KeyCode::Char('s') if ctrl => self.submit_agent_form(),
            // Ctrl+K: Enter API key
            KeyCode::Char('k') if ctrl => {
                let provider = self.settings.provider.kind.display_name();
                self.prompt_api_key(format!(
                    "Enter a {} API key. It is saved to {}.",
                    provider,
                    self.config_path.display()
                ));
            }
            KeyCode::Tab => self.cycle_focus(1),
            KeyCode::BackTab => self.cycle_focus(-1),
            _ => return false,
        }
        true
    }

    fn cycle_focus(&mut self, delta: isize) {
        self.focus = self.focus.cycle(delta, self.session.has_agent());
    }

    fn handle_button_key(&mut self, key: KeyEvent) {
        if !matches!(key.code, KeyCode::Enter | KeyCode::Char(' ')) {
            return;
        }
        match self.focus {
            Field::GenerateButton => self.generate_instructions(),
            Field::CreateButton => self.submit_agent_form(),
            _ => {}
        }
    }

    /// Multi-line editing: Enter inserts a newline, Up/Down move between lines.
    fn handle_instructions_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.agent_instructions.insert_newline(),
            KeyCode::Up => {
                self.agent_instructions.move_vertical(-1);
            }
            KeyCode::Down => {
                self.agent_instructions.move_vertical(1);
            }
            _ => {
                edit_single_line(&mut self.agent_instructions, key);
            }
        }
    }

    /// Handles key events when the chat input is focused.
    fn handle_chat_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.chat_input.insert_newline();
                } else {
                    self.submit_chat_prompt();
                }
            }
            // Up/Down move inside a multi-line draft; at the edges they walk history.
            KeyCode::Up => {
                if self.chat_input.is_empty() || !self.chat_input.move_vertical(-1) {
                    self.chat_input.history_previous();
                }
            }
            KeyCode::Down => {
                if !self.chat_input.move_vertical(1) {
                    self.chat_input.history_next();
                }
            }
            KeyCode::PageUp => {
                self.chat_scroll = self.chat_scroll.saturating_add(5).min(self.chat_scroll_limit);
            }
            KeyCode::PageDown => self.chat_scroll = self.chat_scroll.saturating_sub(5),
            KeyCode::Esc => {
                self.chat_input.clear();
                self.set_status(StatusLine::info("Chat input cleared"));
            }
            _ => {
                edit_single_line(&mut self.chat_input, key);
            }
        }
    }
}

/// Basic text editing shared by every input. Returns `true` if the key was used.
fn edit_single_line(input: &mut TextInput, key: KeyEvent) -> bool {
    let modifiers = key.modifiers;
    match key.code {
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.move_to_line_start(),
        KeyCode::End => input.move_to_line_end(),
        KeyCode::Esc => input.clear(),
        KeyCode::Char(ch)
            if !modifiers.contains(KeyModifiers::CONTROL)
                && !modifiers.contains(KeyModifiers::ALT) =>
        {
            input.insert_char(ch)
        }
        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::agent::runner::tests::FakeModel;
    use crate::app::test_support::{app_with, settle};
    use crate::session::ChatRole;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(press(KeyCode::Char(ch)));
        }
    }

    #[tokio::test]
    async fn full_flow_from_keyboard() {
        let mut app = app_with(Some(Arc::new(FakeModel::replying("Drafted prompt"))));

        type_text(&mut app, "A chef");
        app.handle_key(press(KeyCode::Enter));
        settle(&mut app).await;
        assert_eq!(app.agent_instructions.text(), "Drafted prompt");

        app.handle_key(ctrl('s'));
        assert_eq!(app.focus, Field::ChatInput);

        type_text(&mut app, "Hi");
        app.handle_key(press(KeyCode::Enter));
        settle(&mut app).await;
        let history = app.session.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, ChatRole::Assistant);
    }

    #[tokio::test]
    async fn tab_walks_fields_and_buttons_activate() {
        let mut app = app_with(None);
        app.handle_key(press(KeyCode::Tab));
        assert_eq!(app.focus, Field::GenerateButton);
        app.handle_key(press(KeyCode::Tab));
        assert_eq!(app.focus, Field::AgentName);
        app.handle_key(press(KeyCode::Tab));
        assert_eq!(app.focus, Field::AgentInstructions);
        app.handle_key(press(KeyCode::Tab));
        assert_eq!(app.focus, Field::CreateButton);
        app.handle_key(press(KeyCode::Char(' ')));
        assert!(app.session.has_agent());
        assert_eq!(app.focus, Field::ChatInput);
        app.handle_key(press(KeyCode::BackTab));
        assert_eq!(app.focus, Field::CreateButton);
    }

    #[tokio::test]
    async fn enter_in_instructions_inserts_newline() {
        let mut app = app_with(None);
        app.focus = Field::AgentInstructions;
        app.agent_instructions.set_text("line one");
        app.handle_key(press(KeyCode::Enter));
        type_text(&mut app, "line two");
        assert_eq!(app.agent_instructions.text(), "line one\nline two");
        assert!(!app.session.has_agent());
    }

    #[tokio::test]
    async fn ctrl_q_quits_and_ctrl_chars_are_not_typed() {
        let mut app = app_with(None);
        app.handle_key(KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT));
        assert!(app.description.is_empty());
        app.handle_key(ctrl('q'));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn ctrl_k_opens_key_prompt() {
        let mut app = app_with(None);
        app.handle_key(ctrl('k'));
        assert!(app.overlay.is_some());
        type_text(&mut app, "abc");
        assert!(app.description.is_empty());
    }

    #[tokio::test]
    async fn enter_in_agent_name_creates_agent() {
        let mut app = app_with(None);
        app.focus = Field::AgentName;
        app.agent_name.set_text("Chef");
        app.handle_key(press(KeyCode::Enter));

        assert_eq!(app.session.agent().map(|a| a.name.as_str()), Some("Chef"));
        assert_eq!(app.focus, Field::ChatInput);
    }

    #[tokio::test]
    async fn page_up_stops_at_rendered_limit() {
        let mut app = app_with(None);
        app.submit_agent_form();
        app.chat_scroll_limit = 7;
        for _ in 0..10 {
            app.handle_key(press(KeyCode::PageUp));
        }
        assert_eq!(app.chat_scroll, 7);
        app.handle_key(press(KeyCode::PageDown));
        assert_eq!(app.chat_scroll, 2);
    }
}
