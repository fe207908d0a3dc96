use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use advisor_core::{ChatTurnController, Config, MessageLog, TurnOutcome, WorkerClient};
use anyhow::Result;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

pub const TRANSCRIPT_FILE: &str = "advisor-transcript.html";
pub const BUSY_STATUS: &str = "Still waiting for the previous reply";

pub struct App {
    // Core state
    pub should_quit: bool,
    pub endpoint: String,

    // Chat state, shared with the running turn
    pub log: Arc<Mutex<MessageLog>>,
    pub controller: ChatTurnController<WorkerClient>,
    pub turn_task: Option<JoinHandle<TurnOutcome>>,
    pub last_outcome: Option<TurnOutcome>,

    // Layout, updated during render
    pub chat_height: u16,
    pub chat_width: u16,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // One-line notice shown in the footer
    pub status: Option<String>,
}

impl App {
    pub fn new(config: &Config) -> Result<Self> {
        let client = WorkerClient::new(config.endpoint(), config.timeout())?;
        Ok(Self::with_controller(
            ChatTurnController::new(client),
            config.endpoint(),
        ))
    }

    pub fn with_controller(controller: ChatTurnController<WorkerClient>, endpoint: &str) -> Self {
        Self {
            should_quit: false,
            endpoint: endpoint.to_string(),
            log: Arc::new(Mutex::new(MessageLog::new())),
            controller,
            turn_task: None,
            last_outcome: None,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            status: None,
        }
    }

    pub fn log(&self) -> MutexGuard<'_, MessageLog> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_loading(&self) -> bool {
        self.controller.is_in_flight()
    }

    /// Run the current input as a chat turn in the background.
    pub fn submit(&mut self) {
        if self.turn_task.is_some() {
            debug!("Enter pressed while the previous turn is still running");
            self.status = Some(BUSY_STATUS.to_string());
            return;
        }
        let controller = self.controller.clone();
        let log = Arc::clone(&self.log);
        self.turn_task = Some(tokio::spawn(async move { controller.submit(&*log).await }));
    }

    /// Collect the result of a finished turn, if any.
    pub async fn poll_turn(&mut self) {
        if !self.turn_task.as_ref().is_some_and(|t| t.is_finished()) {
            return;
        }
        if let Some(task) = self.turn_task.take() {
            if self.status.as_deref() == Some(BUSY_STATUS) {
                self.status = None;
            }
            match task.await {
                Ok(outcome) if outcome.is_turn() => self.last_outcome = Some(outcome),
                Ok(_) => {}
                Err(e) => error!(error = %e, "Chat turn task failed"),
            }
        }
    }

    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.log().scroll_up(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.log().scroll_down(lines);
    }

    pub fn half_page(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }

    pub fn export_transcript(&mut self, path: &Path) {
        let html = self.log().to_html();
        match std::fs::write(path, html) {
            Ok(()) => {
                info!(path = %path.display(), "Transcript exported");
                self.status = Some(format!("Saved transcript to {}", path.display()));
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Transcript export failed");
                self.status = Some(format!("Could not save transcript: {}", e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_app() -> App {
        let client = WorkerClient::new("http://127.0.0.1:9/", Duration::from_millis(200)).unwrap();
        App::with_controller(ChatTurnController::new(client), "http://127.0.0.1:9/")
    }

    #[tokio::test]
    async fn test_empty_submit_is_ignored() {
        let mut app = test_app();
        app.submit();
        let outcome = app.turn_task.take().unwrap().await.unwrap();

        assert_eq!(outcome, TurnOutcome::Ignored);
        assert!(app.log().entries().is_empty());
    }

    #[tokio::test]
    async fn test_submit_while_turn_pending_reports_status() {
        let mut app = test_app();
        app.turn_task = Some(tokio::spawn(std::future::pending::<TurnOutcome>()));
        app.log().set_input("second question");

        app.submit();

        assert_eq!(app.status.as_deref(), Some(BUSY_STATUS));
        assert_eq!(app.log().input(), "second question");
        assert!(app.log().entries().is_empty());
        app.turn_task.take().unwrap().abort();
    }

    #[test]
    fn test_export_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.html");
        let mut app = test_app();
        advisor_core::add_message(&mut *app.log(), "User", Some("Hi"));

        app.export_transcript(&path);

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("<div class=\"message user\"><strong>User:</strong> Hi</div>"));
        assert!(app.status.unwrap().starts_with("Saved transcript"));
    }

    #[test]
    fn test_animation_only_runs_while_loading() {
        let mut app = test_app();
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);
    }
}
