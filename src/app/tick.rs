use log::{debug, info, warn};

use super::{App, StatusLine};
use crate::agent::{RunEvent, RunPurpose};

// Implementation block for tick-related logic in the App.
impl App {
    /// Called on every tick of the main loop: advances the spinner and applies
    /// every run that finished since the last tick.
    pub fn on_tick(&mut self) {
        if self.is_busy() {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
        }
        while let Some(event) = self.runner.poll_event() {
            self.apply_run_event(event);
        }
    }

    pub fn tick_rate(&self) -> std::time::Duration {
        self.tick_rate
    }

    fn apply_run_event(&mut self, event: RunEvent) {
        match event.purpose {
            RunPurpose::Instructions => {
                self.generating = false;
                match event.outcome {
                    Ok(result) => {
                        info!("Instructions generated ({} chars)", result.final_output.len());
                        self.agent_instructions.set_text(result.final_output.clone());
                        self.session.store_generated(result.final_output);
                        self.generator_error = None;
                        self.set_status(StatusLine::success("Instructions generated!"));
                    }
                    Err(message) => {
                        self.set_status(StatusLine::error(format!(
                            "Instruction generation failed: {}",
                            message
                        )));
                        self.generator_error = Some(message);
                    }
                }
            }
            RunPurpose::Chat { epoch } => {
                if self.pending_chat == Some(epoch) {
                    self.pending_chat = None;
                }
                if epoch != self.session.epoch() {
                    debug!(
                        "Dropping reply for epoch {} (current {})",
                        epoch,
                        self.session.epoch()
                    );
                    return;
                }
                match event.outcome {
                    Ok(result) => {
                        self.session.push_assistant(result.final_output);
                        self.chat_scroll = 0;
                        self.set_status(StatusLine::info("Reply received"));
                    }
                    Err(message) => {
                        warn!("Chat turn failed: {}", message);
                        self.set_status(StatusLine::error(format!("Agent error: {}", message)));
                        self.chat_error = Some(message);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::Notify;

    use crate::agent::runner::tests::FakeModel;
    use crate::app::test_support::{app_with, settle};

    #[tokio::test]
    async fn spinner_moves_only_while_busy() {
        let gate = Arc::new(Notify::new());
        let mut app = app_with(Some(Arc::new(FakeModel::gated("Drafted", gate.clone()))));
        app.on_tick();
        assert_eq!(app.spinner_frame, 0);

        app.description.set_text("A chef");
        app.generate_instructions();
        app.on_tick();
        app.on_tick();
        assert_eq!(app.spinner_frame, 2);

        gate.notify_one();
        settle(&mut app).await;
        let frame = app.spinner_frame;
        app.on_tick();
        app.on_tick();
        assert_eq!(app.spinner_frame, frame);
        assert!(!app.is_busy());
    }
}
