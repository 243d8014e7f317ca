//! Defines the core state structures for the application.
//!
//! This module contains the central `App` struct, the focusable fields of the
//! three sections (instruction generator, agent form, chat), the text input used
//! by every field, and the API key overlay.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::agent::{ChatModel, Runner};
use crate::config::Settings;
use crate::session::Session;

/// The main application state.
///
/// Holds everything needed to render the UI and react to input. The `session`
/// is the only piece that models the user's work; the rest is UI bookkeeping.
pub struct App {
    // --- Core State ---
    /// Flag to indicate if the application should quit.
    pub should_quit: bool,
    /// The currently focused field.
    pub focus: Field,
    /// Generated instructions, the agent and the chat transcript.
    pub session: Session,

    // --- Form Inputs ---
    /// "Describe your agent" input of the instruction generator.
    pub description: TextInput,
    pub agent_name: TextInput,
    /// Multi-line system prompt of the agent form.
    pub agent_instructions: TextInput,
    pub chat_input: TextInput,

    // --- UI Feedback ---
    /// The message currently displayed in the status bar.
    pub status: StatusLine,
    /// Last instruction generation failure, shown in the generator section.
    pub generator_error: Option<String>,
    /// Last agent form validation failure, shown under the form.
    pub form_error: Option<String>,
    /// Last failed chat turn, shown below the transcript.
    pub chat_error: Option<String>,
    /// Lines scrolled up from the bottom of the transcript.
    pub chat_scroll: u16,
    /// Furthest `chat_scroll` can go, recorded by the last render.
    pub chat_scroll_limit: u16,
    /// The currently active overlay, if any.
    pub overlay: Option<OverlayState>,

    // --- Configuration ---
    pub settings: Settings,
    /// Where the API key prompt saves settings.
    pub config_path: PathBuf,

    // --- Runs ---
    /// The model agents run against. `None` until an API key is available.
    pub(crate) model: Option<Arc<dyn ChatModel>>,
    pub(crate) runner: Runner,
    pub(crate) generating: bool,
    /// Epoch of the in-flight chat turn.
    pub(crate) pending_chat: Option<u64>,
    pub(crate) spinner_frame: usize,
    /// How often the main loop should call `on_tick`.
    pub(crate) tick_rate: Duration,
}

/// Focusable fields, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Description,
    GenerateButton,
    AgentName,
    AgentInstructions,
    CreateButton,
    ChatInput,
}

impl Field {
    const ORDER: [Field; 6] = [
        Field::Description,
        Field::GenerateButton,
        Field::AgentName,
        Field::AgentInstructions,
        Field::CreateButton,
        Field::ChatInput,
    ];

    /// Next field in tab order (`delta` of +1 or -1), wrapping around.
    /// The chat input is skipped while there is no agent to chat with.
    pub fn cycle(self, delta: isize, chat_enabled: bool) -> Field {
        let order: &[Field] = if chat_enabled {
            &Self::ORDER
        } else {
            &Self::ORDER[..Self::ORDER.len() - 1]
        };
        let len = order.len() as isize;
        let current = order.iter().position(|field| *field == self).unwrap_or(0) as isize;
        let next = (current + delta).rem_euclid(len);
        order[next as usize]
    }

    pub fn is_button(self) -> bool {
        matches!(self, Field::GenerateButton | Field::CreateButton)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusLine {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }
}

/// Editable text buffer with a byte cursor and an optional submission history.
#[derive(Clone, Default)]
pub struct TextInput {
    buffer: String,
    cursor: usize,
    history: Vec<String>,
    history_index: Option<usize>,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an input pre-filled with `text`, cursor at the end.
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut input = Self::new();
        input.set_text(text);
        input
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Replaces the content and moves the cursor to the end.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
        self.cursor = self.buffer.len();
        self.reset_history_navigation();
    }

    /// Inserts a character at the current cursor position.
    pub fn insert_char(&mut self, ch: char) {
        self.buffer.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
        self.reset_history_navigation();
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    /// Deletes the character before the cursor (backspace).
    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        if let Some((idx, _)) = self.buffer[..self.cursor].char_indices().next_back() {
            self.buffer.drain(idx..self.cursor);
            self.cursor = idx;
            self.reset_history_navigation();
        }
    }

    /// Deletes the character at the cursor (delete).
    pub fn delete(&mut self) {
        if let Some(ch) = self.buffer[self.cursor..].chars().next() {
            let end = self.cursor + ch.len_utf8();
            self.buffer.drain(self.cursor..end);
            self.reset_history_navigation();
        }
    }

    pub fn move_left(&mut self) {
        if let Some((idx, _)) = self.buffer[..self.cursor].char_indices().next_back() {
            self.cursor = idx;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(ch) = self.buffer[self.cursor..].chars().next() {
            self.cursor += ch.len_utf8();
        }
    }

    pub fn move_to_line_start(&mut self) {
        self.cursor = self.line_start(self.cursor);
    }

    pub fn move_to_line_end(&mut self) {
        self.cursor = self.line_end(self.cursor);
    }

    /// Moves the cursor one line up or down, keeping the character column when the
    /// target line is long enough. Returns `false` when already on the edge line.
    pub fn move_vertical(&mut self, delta: isize) -> bool {
        let start = self.line_start(self.cursor);
        let column = self.buffer[start..self.cursor].chars().count();
        let target_start = if delta < 0 {
            if start == 0 {
                return false;
            }
            self.line_start(start - 1)
        } else {
            let end = self.line_end(self.cursor);
            if end >= self.buffer.len() {
                return false;
            }
            end + 1
        };
        let target_end = self.line_end(target_start);
        self.cursor = self.buffer[target_start..target_end]
            .char_indices()
            .nth(column)
            .map(|(offset, _)| target_start + offset)
            .unwrap_or(target_end);
        true
    }

    /// Clears the entire input buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.reset_history_navigation();
    }

    /// Takes the content of the buffer, adds it to history, and clears the buffer.
    pub fn take(&mut self) -> String {
        let content = std::mem::take(&mut self.buffer);
        if !content.trim().is_empty() {
            self.history.push(content.clone());
        }
        self.cursor = 0;
        self.reset_history_navigation();
        content
    }

    /// Navigates to the previous entry in the submission history.
    pub fn history_previous(&mut self) -> bool {
        if self.history.is_empty() {
            return false;
        }
        let target = match self.history_index {
            Some(idx) => idx.saturating_sub(1),
            None => self.history.len() - 1,
        };
        self.load_history(target)
    }

    /// Navigates to the next entry; past the newest entry the buffer is cleared.
    pub fn history_next(&mut self) -> bool {
        match self.history_index {
            Some(idx) if idx + 1 < self.history.len() => self.load_history(idx + 1),
            Some(_) => {
                self.history_index = None;
                self.buffer.clear();
                self.cursor = 0;
                true
            }
            None => false,
        }
    }

    fn load_history(&mut self, index: usize) -> bool {
        if let Some(entry) = self.history.get(index).cloned() {
            self.buffer = entry;
            self.cursor = self.buffer.len();
            self.history_index = Some(index);
            true
        } else {
            false
        }
    }

    fn reset_history_navigation(&mut self) {
        self.history_index = None;
    }

    fn line_start(&self, pos: usize) -> usize {
        self.buffer[..pos].rfind('\n').map(|idx| idx + 1).unwrap_or(0)
    }

    fn line_end(&self, pos: usize) -> usize {
        self.buffer[pos..]
            .find('\n')
            .map(|idx| pos + idx)
            .unwrap_or(self.buffer.len())
    }

    /// Calculates the (col, row) position of the cursor for rendering, wrapping at
    /// `width` display cells.
    pub fn cursor_display_position(&self, width: usize) -> (u16, u16) {
        if width == 0 {
            return (0, 0);
        }
        let mut col = 0usize;
        let mut row = 0usize;
        for ch in self.buffer[..self.cursor].chars() {
            if ch == '\n' {
                row += 1;
                col = 0;
                continue;
            }
            let char_width = unicode_width::UnicodeWidthChar::width(ch)
                .unwrap_or(1)
                .max(1);
            if col + char_width > width {
                row += 1;
                col = 0;
            }
            col += char_width;
            if col >= width {
                row += 1;
                col = 0;
            }
        }
        (col as u16, row as u16)
    }
}

/// Represents the state of any active overlay panel.
#[derive(Debug, Clone)]
pub enum OverlayState {
    ApiKeyPrompt(InputPromptState),
}

/// State for the input prompt overlay.
#[derive(Debug, Clone)]
pub struct InputPromptState {
    /// The title displayed at the top of the prompt.
    pub title: String,
    /// The current value entered by the user.
    pub value: String,
    /// Explanation shown above the input.
    pub placeholder: String,
    /// Render the value as asterisks.
    pub masked: bool,
    /// An optional error message to display.
    pub error: Option<String>,
}

impl InputPromptState {
    pub fn new(title: impl Into<String>, placeholder: impl Into<String>, masked: bool) -> Self {
        Self {
            title: title.into(),
            value: String::new(),
            placeholder: placeholder.into(),
            masked,
            error: None,
        }
    }

    pub fn display_value(&self) -> String {
        if self.masked {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_order_skips_chat_without_agent() {
        assert_eq!(Field::CreateButton.cycle(1, false), Field::Description);
        assert_eq!(Field::CreateButton.cycle(1, true), Field::ChatInput);
        assert_eq!(Field::Description.cycle(-1, false), Field::CreateButton);
        assert_eq!(Field::Description.cycle(-1, true), Field::ChatInput);
        assert_eq!(Field::ChatInput.cycle(1, true), Field::Description);
    }

    #[test]
    fn editing_handles_multibyte_chars() {
        let mut input = TextInput::with_text("héllo");
        input.move_left();
        input.move_left();
        input.move_left();
        input.backspace();
        assert_eq!(input.text(), "hllo");
        input.insert_char('é');
        input.move_to_line_end();
        input.insert_char('!');
        assert_eq!(input.text(), "héllo!");
        input.move_to_line_start();
        input.delete();
        assert_eq!(input.text(), "éllo!");
    }

    #[test]
    fn vertical_movement_keeps_column() {
        let mut input = TextInput::with_text("first line\nab\nthird line");
        assert!(input.move_vertical(-1));
        input.move_to_line_end();
        assert!(input.move_vertical(-1));
        input.insert_char('|');
        assert_eq!(input.text(), "fi|rst line\nab\nthird line");
        assert!(!input.move_vertical(-1));
        assert!(input.move_vertical(1));
        assert!(input.move_vertical(1));
        assert!(!input.move_vertical(1));
    }

    #[test]
    fn history_round_trip() {
        let mut input = TextInput::new();
        input.set_text("one");
        assert_eq!(input.take(), "one");
        input.set_text("  ");
        input.take();
        input.set_text("two");
        input.take();

        assert!(input.history_previous());
        assert_eq!(input.text(), "two");
        assert!(input.history_previous());
        assert_eq!(input.text(), "one");
        assert!(input.history_previous());
        assert_eq!(input.text(), "one");
        assert!(input.history_next());
        assert_eq!(input.text(), "two");
        assert!(input.history_next());
        assert!(input.is_empty());
        assert!(!input.history_next());
    }

    #[test]
    fn cursor_position_wraps_by_width() {
        let input = TextInput::with_text("abcdef");
        assert_eq!(input.cursor_display_position(4), (2, 1));
        let input = TextInput::with_text("ab\ncd");
        assert_eq!(input.cursor_display_position(10), (2, 1));
    }

    #[test]
    fn masked_prompt_hides_value() {
        let mut state = InputPromptState::new("Key", "enter", true);
        state.value = String::from("sk-123");
        assert_eq!(state.display_value(), "******");
    }
}
