use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::{Agent, ChatModel, ModelError, RunResult};

/// Why a run was started; echoed back on the matching [`RunEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPurpose {
    /// Prompt-engineer run drafting agent instructions.
    Instructions,
    /// Chat turn addressed to the agent created in session `epoch`.
    Chat { epoch: u64 },
}

/// Completion notice for a spawned run.
#[derive(Debug)]
pub struct RunEvent {
    pub purpose: RunPurpose,
    pub outcome: Result<RunResult, String>,
}

/// Runs agents against a model.
///
/// [`Runner::run`] awaits a single run. [`Runner::spawn`] moves the run onto a tokio
/// task and reports back through a channel that the UI drains with
/// [`Runner::poll_event`] on every tick.
pub struct Runner {
    events_tx: UnboundedSender<RunEvent>,
    events_rx: UnboundedReceiver<RunEvent>,
}

impl Default for Runner {
    fn default() -> Self {
        Self::new()
    }
}

impl Runner {
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            events_tx,
            events_rx,
        }
    }

    /// Runs `agent` on `input` and waits for the result.
    pub async fn run(
        model: &dyn ChatModel,
        agent: &Agent,
        input: &str,
    ) -> Result<RunResult, ModelError> {
        debug!("Running agent '{}' on {}", agent.name, model.name());
        let output = model.complete(&agent.instructions, input).await?;
        Ok(RunResult {
            final_output: output.trim().to_string(),
        })
    }

    /// Starts a run in the background. The outcome arrives as a [`RunEvent`].
    pub fn spawn(&self, model: Arc<dyn ChatModel>, purpose: RunPurpose, agent: Agent, input: String) {
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = Self::run(model.as_ref(), &agent, &input)
                .await
                .map_err(|err| {
                    warn!("Run for '{}' failed: {}", agent.name, err);
                    err.to_string()
                });
            // The receiver lives as long as the app; a send error only means we are shutting down.
            let _ = tx.send(RunEvent { purpose, outcome });
        });
    }

    /// Returns the next finished run, if any. Never blocks.
    pub fn poll_event(&mut self) -> Option<RunEvent> {
        self.events_rx.try_recv().ok()
    }
}
