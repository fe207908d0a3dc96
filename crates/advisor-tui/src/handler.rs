use std::path::Path;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use tracing::debug;

use crate::app::{App, TRANSCRIPT_FILE};
use crate::tui::AppEvent;

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    // Collect a finished turn first so Enter right after a reply is not dropped
    app.poll_turn().await;

    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(w, h) => debug!(w, h, "Terminal resized"),
        AppEvent::Tick => app.tick_animation(),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => app.should_quit = true,
            KeyCode::Char('s') => app.export_transcript(Path::new(TRANSCRIPT_FILE)),
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Enter => app.submit(),

        // Chat scrolling
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => {
            let lines = app.half_page();
            app.scroll_up(lines);
        }
        KeyCode::PageDown => {
            let lines = app.half_page();
            app.scroll_down(lines);
        }

        // Input editing; the log ignores these while a turn is running
        KeyCode::Backspace => app.log().backspace(),
        KeyCode::Delete => app.log().delete(),
        KeyCode::Left => app.log().cursor_left(),
        KeyCode::Right => app.log().cursor_right(),
        KeyCode::Home => app.log().cursor_home(),
        KeyCode::End => app.log().cursor_end(),
        KeyCode::Char(c) => {
            app.status = None;
            app.log().insert_char(c);
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll_up(3),
        MouseEventKind::ScrollDown => app.scroll_down(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use advisor_core::{ChatTurnController, WorkerClient};
    use crossterm::event::KeyEventKind;
    use std::time::Duration;

    fn test_app() -> App {
        let client = WorkerClient::new("http://127.0.0.1:9/", Duration::from_millis(200)).unwrap();
        App::with_controller(ChatTurnController::new(client), "http://127.0.0.1:9/")
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[tokio::test]
    async fn test_typing_edits_input() {
        let mut app = test_app();
        for c in "serum".chars() {
            handle_event(&mut app, key(KeyCode::Char(c))).await.unwrap();
        }
        handle_event(&mut app, key(KeyCode::Backspace)).await.unwrap();

        assert_eq!(app.log().input(), "seru");
    }

    #[tokio::test]
    async fn test_ctrl_c_quits() {
        let mut app = test_app();
        let mut event = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        event.kind = KeyEventKind::Press;
        handle_event(&mut app, AppEvent::Key(event)).await.unwrap();

        assert!(app.should_quit);
        assert_eq!(app.log().input(), "");
    }

    #[tokio::test]
    async fn test_scroll_keys() {
        let mut app = test_app();
        app.chat_height = 10;
        handle_event(&mut app, key(KeyCode::PageUp)).await.unwrap();
        handle_event(&mut app, key(KeyCode::Up)).await.unwrap();
        assert_eq!(app.log().scroll_back(), 6);

        handle_event(&mut app, key(KeyCode::PageDown)).await.unwrap();
        assert_eq!(app.log().scroll_back(), 1);
    }
}
