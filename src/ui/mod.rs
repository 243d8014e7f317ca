use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use unicode_width::UnicodeWidthChar;

use crate::app::{App, Field, InputPromptState, OverlayState, StatusKind, TextInput};
use crate::session::ChatRole;

mod theme;
use theme::*;

const MIN_WIDTH: u16 = 80;
const MIN_HEIGHT: u16 = 24;

pub fn render(f: &mut Frame<'_>, app: &mut App) {
    let size = f.size();
    if size.width < MIN_WIDTH || size.height < MIN_HEIGHT {
        let block = Paragraph::new(format!(
            "Terminal too small. Resize to at least {}x{}.",
            MIN_WIDTH, MIN_HEIGHT
        ))
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .title("AI Agent Maker")
                .borders(Borders::ALL)
                .style(Style::default().fg(FG_PRIMARY).bg(MENU_BG)),
        )
        .style(Style::default().fg(FG_PRIMARY).bg(BG_PRIMARY));
        f.render_widget(block, size);
        return;
    }

    let base = Block::default().style(Style::default().bg(BG_PRIMARY));
    f.render_widget(base, size);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(10),
            Constraint::Length(1),
        ])
        .split(size);
    let title_area = vertical[0];
    let workspace = vertical[1];
    let status_area = vertical[2];

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(workspace);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(10)])
        .split(columns[0]);

    render_title_bar(f, app, title_area);
    render_generator(f, app, left[0]);
    render_agent_form(f, app, left[1]);
    render_chat(f, app, columns[1]);
    render_status_bar(f, app, status_area);

    if let Some(overlay) = app.overlay.as_ref() {
        render_overlay(f, overlay);
    }
}

fn render_title_bar(f: &mut Frame<'_>, app: &App, area: Rect) {
    let model = app.model_name().unwrap_or("no model connected");
    let line = Line::from(vec![
        Span::styled(
            " AI Agent Maker ",
            Style::default().fg(BAR_TEXT).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("· {}", model), Style::default().fg(BAR_TEXT)),
    ]);
    let bar = Paragraph::new(line).style(Style::default().bg(BAR_BG));
    f.render_widget(bar, area);
}

fn section_block(title: &str, focused: bool) -> Block<'_> {
    let border = if focused {
        Style::default()
            .fg(BORDER_FOCUS)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(BORDER_IDLE)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled(title, Style::default().fg(FG_PRIMARY)))
        .style(Style::default().bg(BG_PANEL))
}

fn render_generator(f: &mut Frame<'_>, app: &App, area: Rect) {
    let focused = matches!(app.focus, Field::Description | Field::GenerateButton);
    let block = section_block("1. Generate Agent Instructions", focused);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(inner);

    render_text_input(
        f,
        app,
        &app.description,
        Field::Description,
        "Describe your agent",
        "e.g. A friendly Python tutor for kids",
        rows[0],
    );
    render_button(f, app, Field::GenerateButton, "Generate Instructions", rows[1]);

    let width = rows[2].width.max(1) as usize;
    let mut lines = Vec::new();
    if app.is_generating() {
        lines.push(Line::from(Span::styled(
            format!("{} Generating instructions...", app.spinner()),
            Style::default().fg(FG_PRIMARY),
        )));
    } else if let Some(error) = app.generator_error.as_ref() {
        push_wrapped_line(
            &mut lines,
            &format!("Error: {}", error),
            Style::default().fg(ERROR),
            width,
        );
    } else if let Some(generated) = app.session.generated_instructions() {
        lines.push(Line::from(Span::styled(
            "Generated (copied into the form):",
            Style::default().fg(SUCCESS),
        )));
        for line in generated.lines() {
            push_wrapped_line(&mut lines, line, Style::default().fg(FG_DIM), width);
        }
    } else {
        lines.push(Line::from(Span::styled(
            "Enter or Ctrl+G drafts a system prompt from your description.",
            Style::default().fg(FG_DIM),
        )));
    }
    f.render_widget(
        Paragraph::new(lines).style(Style::default().bg(BG_PANEL)),
        rows[2],
    );
}

fn render_agent_form(f: &mut Frame<'_>, app: &App, area: Rect) {
    let focused = matches!(
        app.focus,
        Field::AgentName | Field::AgentInstructions | Field::CreateButton
    );
    let block = section_block("2. Create Your Agent", focused);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    render_text_input(
        f,
        app,
        &app.agent_name,
        Field::AgentName,
        "Agent Name",
        "Name your agent",
        rows[0],
    );
    render_text_input(
        f,
        app,
        &app.agent_instructions,
        Field::AgentInstructions,
        "Agent Instructions (Enter for newline)",
        "Paste or generate instructions",
        rows[1],
    );
    render_button(f, app, Field::CreateButton, "Create Agent", rows[2]);

    if let Some(error) = app.form_error.as_ref() {
        f.render_widget(
            Paragraph::new(error.as_str()).style(Style::default().fg(ERROR).bg(BG_PANEL)),
            rows[3],
        );
    }
}

fn render_chat(f: &mut Frame<'_>, app: &mut App, area: Rect) {
    let title = match app.session.agent() {
        Some(agent) => format!("3. Chat with {}", agent.name),
        None => String::from("3. Chat with Your Agent"),
    };
    let focused = app.focus == Field::ChatInput;
    let block = section_block(&title, focused);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(4)])
        .split(inner);

    render_chat_history(f, app, sections[0]);
    if app.session.has_agent() {
        render_text_input(
            f,
            app,
            &app.chat_input,
            Field::ChatInput,
            "Message (Enter send / Shift+Enter newline)",
            "Ask your agent something...",
            sections[1],
        );
    }
}

fn render_chat_history(f: &mut Frame<'_>, app: &mut App, area: Rect) {
    let width = area.width.max(1) as usize;
    let mut lines: Vec<Line> = Vec::new();

    let Some(agent_name) = app.session.agent().map(|agent| agent.name.clone()) else {
        app.chat_scroll = 0;
        app.chat_scroll_limit = 0;
        push_wrapped_line(
            &mut lines,
            "Please create an agent using the form above to start chatting.",
            Style::default().fg(FG_DIM),
            width,
        );
        f.render_widget(
            Paragraph::new(lines).style(Style::default().bg(BG_PANEL)),
            area,
        );
        return;
    };

    for message in app.session.history() {
        let (label, color) = match message.role {
            ChatRole::User => (message.role.label().to_string(), USER_LABEL),
            ChatRole::Assistant => (agent_name.clone(), ASSISTANT_LABEL),
        };
        lines.push(Line::from(Span::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        for line in message.content.lines() {
            push_wrapped_line(&mut lines, line, Style::default().fg(FG_PRIMARY), width);
        }
        lines.push(Line::default());
    }

    if app.is_thinking() {
        lines.push(Line::from(Span::styled(
            format!("{} Thinking...", app.spinner()),
            Style::default().fg(FG_DIM).add_modifier(Modifier::ITALIC),
        )));
    } else if let Some(error) = app.chat_error.as_ref() {
        push_wrapped_line(
            &mut lines,
            &format!("Error: {}", error),
            Style::default().fg(ERROR),
            width,
        );
    }

    // Pinned to the bottom; `chat_scroll` counts lines scrolled back up.
    let visible = area.height as usize;
    let max_offset = lines.len().saturating_sub(visible);
    app.chat_scroll_limit = u16::try_from(max_offset).unwrap_or(u16::MAX);
    app.chat_scroll = app.chat_scroll.min(app.chat_scroll_limit);
    let top = max_offset - app.chat_scroll as usize;
    lines.drain(..top);
    lines.truncate(visible);
    let paragraph = Paragraph::new(lines).style(Style::default().bg(BG_PANEL));
    f.render_widget(paragraph, area);
}

fn render_text_input(
    f: &mut Frame<'_>,
    app: &App,
    input: &TextInput,
    field: Field,
    title: &str,
    placeholder: &str,
    area: Rect,
) {
    let focused = app.focus == field;
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BORDER_IDLE))
        .title(Span::styled(title, Style::default().fg(FG_PRIMARY)))
        .style(Style::default().bg(BG_PANEL));
    if focused {
        block = block.border_style(
            Style::default()
                .fg(BORDER_FOCUS)
                .add_modifier(Modifier::BOLD),
        );
    }

    let inner = block.inner(area);
    let width = inner.width.max(1) as usize;
    let mut lines: Vec<Line> = Vec::new();
    if input.is_empty() {
        lines.push(Line::from(Span::styled(
            placeholder.to_string(),
            Style::default().fg(FG_DIM),
        )));
    } else {
        for line in input.text().split('\n') {
            push_wrapped_line(&mut lines, line, Style::default().fg(FG_PRIMARY), width);
        }
    }

    let (cursor_col, cursor_row) = input.cursor_display_position(width);
    let scroll = cursor_row.saturating_sub(inner.height.saturating_sub(1));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(Style::default().bg(BG_PANEL))
        .scroll((scroll, 0));

    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);

    if focused && app.overlay.is_none() && inner.width > 0 && inner.height > 0 {
        let cursor_x = inner
            .x
            .saturating_add(cursor_col.min(width.saturating_sub(1) as u16));
        let cursor_y = inner.y.saturating_add(cursor_row - scroll);
        f.set_cursor(cursor_x, cursor_y);
    }
}

fn render_button(f: &mut Frame<'_>, app: &App, field: Field, label: &str, area: Rect) {
    let focused = app.focus == field && field.is_button();
    let style = if focused {
        Style::default()
            .fg(BUTTON_TEXT)
            .bg(BUTTON_FOCUS_BG)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(BUTTON_TEXT).bg(BUTTON_BG)
    };
    let line = Line::from(Span::styled(format!("[ {} ]", label), style));
    f.render_widget(
        Paragraph::new(line).style(Style::default().bg(BG_PANEL)),
        area,
    );
}

fn render_status_bar(f: &mut Frame<'_>, app: &App, area: Rect) {
    f.render_widget(Clear, area);

    let color = match app.status.kind {
        StatusKind::Info => BAR_TEXT,
        StatusKind::Success => SUCCESS,
        StatusKind::Error => ERROR,
    };
    // The latest status always shows; a busy run only prefixes the spinner.
    let text = if app.is_busy() {
        format!("{} {}", app.spinner(), app.status.text)
    } else {
        app.status.text.clone()
    };
    let message = Span::styled(text, Style::default().fg(color));

    let hints = Span::styled(
        "  |  Tab focus · Ctrl+G generate · Ctrl+S create · Ctrl+K key · Ctrl+Q quit",
        Style::default().fg(FG_DIM),
    );
    let paragraph = Paragraph::new(Line::from(vec![message, hints]))
        .style(Style::default().bg(BAR_BG))
        .alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

fn render_overlay(f: &mut Frame<'_>, overlay: &OverlayState) {
    match overlay {
        OverlayState::ApiKeyPrompt(state) => render_input_prompt_overlay(f, state),
    }
}

fn render_input_prompt_overlay(f: &mut Frame<'_>, state: &InputPromptState) {
    let area = centered_rect(60, 30, f.size());
    f.render_widget(Clear, area);
    let block = Block::default()
        .title(Span::styled(
            state.title.as_str(),
            Style::default().fg(BAR_TEXT).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(MENU_BORDER))
        .style(Style::default().bg(MENU_BG));
    f.render_widget(block.clone(), area);
    let inner = block.inner(area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let placeholder = Paragraph::new(state.placeholder.as_str())
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(FG_DIM).bg(MENU_BG));
    f.render_widget(placeholder, chunks[0]);

    let mut input_spans = vec![Span::styled("> ", Style::default().fg(FG_PRIMARY))];
    if state.value.is_empty() {
        input_spans.push(Span::styled("(nothing entered)", Style::default().fg(FG_DIM)));
    } else {
        input_spans.push(Span::styled(
            state.display_value(),
            Style::default().fg(Color::White),
        ));
    }
    input_spans.push(Span::styled(" ▍", Style::default().fg(BORDER_FOCUS)));
    let input = Paragraph::new(Line::from(input_spans))
        .style(Style::default().bg(MENU_BG))
        .alignment(Alignment::Left);
    f.render_widget(input, chunks[1]);

    let message_area = chunks[2];
    if let Some(error) = state.error.as_ref() {
        let error_widget =
            Paragraph::new(error.as_str()).style(Style::default().fg(ERROR).bg(MENU_BG));
        f.render_widget(error_widget, message_area);
    } else {
        let hint = Paragraph::new("Enter confirm · Esc cancel · Ctrl+U clear")
            .style(Style::default().fg(FG_DIM).bg(MENU_BG));
        f.render_widget(hint, message_area);
    }
}

fn push_wrapped_line(lines: &mut Vec<Line>, text: &str, style: Style, width: usize) {
    for segment in wrap_to_width(text, width) {
        lines.push(Line::from(Span::styled(segment, style)));
    }
}

/// Splits `text` into rows of at most `width` display cells.
fn wrap_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }
    if text.is_empty() {
        return vec![String::new()];
    }
    let mut result = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(1).max(1);
        if current_width + ch_width > width && !current.is_empty() {
            result.push(current);
            current = String::new();
            current_width = 0;
        }
        current.push(ch);
        current_width += ch_width;
    }
    result.push(current);
    result
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1])[1]
}

#[cfg(test)]
pub(crate) mod test_support {
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use super::render;
    use crate::app::App;

    /// Draws one frame and returns the screen as text, one line per row.
    pub(crate) fn screen(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::screen;
    use super::*;

    use crate::app::test_support::app_with;

    #[test]
    fn wraps_by_display_width() {
        assert_eq!(wrap_to_width("abcdef", 4), vec!["abcd", "ef"]);
        assert_eq!(wrap_to_width("", 4), vec![""]);
        assert_eq!(wrap_to_width("日本語", 4), vec!["日本", "語"]);
    }

    #[tokio::test]
    async fn chat_prompts_for_agent_first() {
        let mut app = app_with(None);
        let text = screen(&mut app, 120, 40);
        assert!(text.contains("AI Agent Maker"));
        assert!(text.contains("Please create an agent"));
        assert!(text.contains("My Custom Agent"));
    }

    #[tokio::test]
    async fn transcript_shows_both_speakers() {
        let mut app = app_with(None);
        app.submit_agent_form();
        app.session.push_user("What is a closure?");
        app.session.push_assistant("A function that captures its environment.");
        let text = screen(&mut app, 120, 40);
        assert!(text.contains("3. Chat with My Custom Agent"));
        assert!(text.contains("What is a closure?"));
        assert!(text.contains("captures its environment."));
    }

    #[tokio::test]
    async fn small_terminal_shows_notice() {
        let mut app = app_with(None);
        let text = screen(&mut app, 60, 20);
        assert!(text.contains("Terminal too small"));
    }

    #[tokio::test]
    async fn api_key_is_masked() {
        let mut app = app_with(None);
        app.prompt_api_key("Enter a key");
        if let Some(OverlayState::ApiKeyPrompt(state)) = app.overlay.as_mut() {
            state.value = String::from("secret-key");
        }
        let text = screen(&mut app, 120, 40);
        assert!(text.contains("**********"));
        assert!(!text.contains("secret-key"));
    }

    #[tokio::test]
    async fn busy_status_bar_keeps_latest_message() {
        let mut app = app_with(None);
        app.generating = true;
        app.set_status(crate::app::StatusLine::error("Agent name cannot be empty"));
        let text = screen(&mut app, 120, 40);
        let status_row = text.lines().last().unwrap_or_default();
        assert!(status_row.contains(app.spinner()));
        assert!(status_row.contains("Agent name cannot be empty"));
    }

    #[tokio::test]
    async fn chat_scroll_stops_at_top_of_transcript() {
        let mut app = app_with(None);
        app.submit_agent_form();
        app.chat_scroll = 500;
        screen(&mut app, 120, 40);
        assert_eq!(app.chat_scroll, 0);
        assert_eq!(app.chat_scroll_limit, 0);

        for idx in 0..40 {
            app.session.push_user(format!("question {idx}"));
            app.session.push_assistant(format!("answer {idx}"));
        }
        app.chat_scroll = 500;
        let text = screen(&mut app, 120, 40);
        assert!(app.chat_scroll_limit > 0);
        assert_eq!(app.chat_scroll, app.chat_scroll_limit);
        assert!(text.contains("question 0"));
        assert!(!text.contains("answer 39"));
    }

    #[tokio::test]
    async fn huge_transcript_stays_pinned_to_bottom() {
        let mut app = app_with(None);
        app.submit_agent_form();
        // Each message is a label, one content line and a blank line: well past u16::MAX rows.
        for idx in 0..22_000 {
            app.session.push_assistant(format!("line {idx}"));
        }
        let text = screen(&mut app, 120, 40);
        assert_eq!(app.chat_scroll_limit, u16::MAX);
        assert!(text.contains("line 21999"));
        assert!(!text.contains("line 0 "));
    }
}
