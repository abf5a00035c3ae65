//! Main chat event loop
//!
//! Runs the terminal session: draws the UI, routes key and mouse events,
//! and drains stream updates coming back from the request tasks. All
//! mutations of [`App`] happen here, on the event-loop side; stream tasks
//! only ever write to their channel.

use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{error::Error, io, time::Duration};
use tokio::sync::mpsc;

use crate::core::app::{App, Focus};
use crate::core::chat_stream::{ChatStreamService, StreamMessage};
use crate::core::config::{chat_log_path, Settings};
use crate::core::transcript::TranscriptLog;
use crate::ui::renderer::ui;

/// Rows consumed by fixed chrome: options bar (1), system prompt (3),
/// input box (3), scrollback title (1). Must match the renderer's layout.
const CHROME_HEIGHT: u16 = 8;

pub async fn run_chat(model: String, base_url: String) -> Result<(), Box<dyn Error>> {
    let settings = Settings::load();
    let transcript = TranscriptLog::new(chat_log_path());
    let mut app = App::new(&model, base_url, settings, transcript);

    // Setup terminal only after successful app creation
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Channel for streaming updates with stream ID
    let (stream_service, mut rx) = ChatStreamService::new();

    let result = run_event_loop(&mut terminal, &mut app, &stream_service, &mut rx).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    stream_service: &ChatStreamService,
    rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let (available_height, available_width) = scrollback_viewport(terminal)?;

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if handle_key_event(app, stream_service, key, available_height, available_width)
                    {
                        break Ok(());
                    }
                }
                Event::Mouse(mouse) => match mouse.kind {
                    MouseEventKind::ScrollUp => app.scroll_up(3),
                    MouseEventKind::ScrollDown => {
                        app.scroll_down(3, available_height, available_width)
                    }
                    _ => {}
                },
                _ => {}
            }
        }

        // Drain all pending stream updates before the next draw
        let mut received_any = false;
        while let Ok((message, stream_id)) = rx.try_recv() {
            if stream_id != app.current_stream_id {
                continue;
            }
            match message {
                StreamMessage::Chunk(content) => app.append_to_response(&content),
                StreamMessage::Error(err) => app.handle_stream_error(err),
                StreamMessage::End => app.finalize_response(),
            }
            received_any = true;
        }

        if app.update_typing_indicator() {
            received_any = true;
        }

        if received_any {
            app.update_scroll_position(available_height, available_width);
        }
    }
}

/// Route one key press. Returns true when the app should exit.
fn handle_key_event(
    app: &mut App,
    stream_service: &ChatStreamService,
    key: KeyEvent,
    available_height: u16,
    available_width: u16,
) -> bool {
    // The error dialog is modal: it swallows everything except dismissal
    // and quit.
    if app.error_dialog.is_some() {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => app.error_dialog = None,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            _ => {}
        }
        return false;
    }

    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
        KeyCode::Tab => {
            app.focus = match app.focus {
                Focus::Input => Focus::SystemPrompt,
                Focus::SystemPrompt => Focus::Input,
            };
        }
        KeyCode::Enter => match app.focus {
            Focus::SystemPrompt => app.focus = Focus::Input,
            Focus::Input => {
                let text = std::mem::take(&mut app.input);
                match app.submit_message(&text) {
                    Some(params) => {
                        stream_service.spawn_stream(params);
                        app.update_scroll_position(available_height, available_width);
                    }
                    None => app.input = text,
                }
            }
        },
        KeyCode::F(2) => {
            app.cycle_appearance();
            save_settings(app);
        }
        KeyCode::F(3) => {
            app.cycle_color_theme();
            save_settings(app);
        }
        KeyCode::F(4) => app.cycle_model(),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1, available_height, available_width),
        KeyCode::Backspace => {
            focused_field(app).pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            focused_field(app).push(c);
        }
        _ => {}
    }

    false
}

fn focused_field(app: &mut App) -> &mut String {
    match app.focus {
        Focus::Input => &mut app.input,
        Focus::SystemPrompt => &mut app.system_prompt,
    }
}

fn save_settings(app: &App) {
    // Settings persist on every change; a failed write only costs the
    // preference, never the session.
    if let Err(e) = app.settings.save() {
        tracing::warn!("could not save settings: {e}");
    }
}

fn scrollback_viewport(
    terminal: &Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<(u16, u16), Box<dyn Error>> {
    let size = terminal.size()?;
    Ok((size.height.saturating_sub(CHROME_HEIGHT), size.width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Role;
    use tempfile::TempDir;

    fn test_app(dir: &TempDir) -> App {
        let transcript = TranscriptLog::new(dir.path().join("chat_log.txt"));
        App::new(
            "mistral",
            "http://localhost:11434".to_string(),
            Settings::default(),
            transcript,
        )
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn apply_stream_messages(app: &mut App, messages: Vec<(StreamMessage, u64)>) {
        for (message, stream_id) in messages {
            if stream_id != app.current_stream_id {
                continue;
            }
            match message {
                StreamMessage::Chunk(content) => app.append_to_response(&content),
                StreamMessage::Error(err) => app.handle_stream_error(err),
                StreamMessage::End => app.finalize_response(),
            }
        }
    }

    #[tokio::test]
    async fn enter_submits_input_and_spawns_stream_state() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        let (service, _rx) = ChatStreamService::new();
        app.system_prompt = "Be concise".to_string();
        app.input = "Hi".to_string();

        assert!(!handle_key_event(&mut app, &service, press(KeyCode::Enter), 20, 80));

        assert!(app.input.is_empty());
        assert!(app.is_streaming);
        assert_eq!(app.messages[0].role, Role::System);
        assert_eq!(app.messages[1].role, Role::User);
    }

    #[test]
    fn blank_input_is_not_submitted() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        let (service, _rx) = ChatStreamService::new();
        app.input = "   ".to_string();

        handle_key_event(&mut app, &service, press(KeyCode::Enter), 20, 80);

        assert_eq!(app.input, "   ");
        assert!(!app.is_streaming);
        assert!(app.messages.is_empty());
    }

    #[test]
    fn tab_toggles_focus_and_typing_targets_focused_field() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        let (service, _rx) = ChatStreamService::new();
        app.system_prompt.clear();

        handle_key_event(&mut app, &service, press(KeyCode::Tab), 20, 80);
        assert_eq!(app.focus, Focus::SystemPrompt);
        handle_key_event(&mut app, &service, press(KeyCode::Char('B')), 20, 80);
        handle_key_event(&mut app, &service, press(KeyCode::Char('e')), 20, 80);
        assert_eq!(app.system_prompt, "Be");

        handle_key_event(&mut app, &service, press(KeyCode::Enter), 20, 80);
        assert_eq!(app.focus, Focus::Input);
        handle_key_event(&mut app, &service, press(KeyCode::Char('h')), 20, 80);
        assert_eq!(app.input, "h");
        assert!(app.messages.is_empty());
    }

    #[test]
    fn dialog_swallows_keys_until_dismissed() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        let (service, _rx) = ChatStreamService::new();
        app.error_dialog = Some("connection refused".to_string());

        handle_key_event(&mut app, &service, press(KeyCode::Char('x')), 20, 80);
        assert!(app.error_dialog.is_some());
        assert!(app.input.is_empty());

        handle_key_event(&mut app, &service, press(KeyCode::Enter), 20, 80);
        assert!(app.error_dialog.is_none());
    }

    #[test]
    fn ctrl_c_exits_even_with_dialog_open() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        let (service, _rx) = ChatStreamService::new();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);

        assert!(handle_key_event(&mut app, &service, ctrl_c, 20, 80));
        app.error_dialog = Some("boom".to_string());
        assert!(handle_key_event(&mut app, &service, ctrl_c, 20, 80));
    }

    #[test]
    fn stale_stream_updates_are_ignored() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.submit_message("Hi").unwrap();
        let current = app.current_stream_id;

        apply_stream_messages(
            &mut app,
            vec![
                (StreamMessage::Chunk("old".to_string()), current - 1),
                (StreamMessage::Chunk("Hel".to_string()), current),
                (StreamMessage::Chunk("lo".to_string()), current),
                (StreamMessage::End, current),
            ],
        );

        let last = app.messages.last().unwrap();
        assert_eq!(last.content, "Hello");
    }

    #[test]
    fn stream_error_is_surfaced_as_dialog() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.submit_message("Hi").unwrap();
        let current = app.current_stream_id;

        apply_stream_messages(
            &mut app,
            vec![
                (
                    StreamMessage::Error("Server error (500): boom".to_string()),
                    current,
                ),
                (StreamMessage::End, current),
            ],
        );

        assert_eq!(
            app.error_dialog.as_deref(),
            Some("Server error (500): boom")
        );
        assert_eq!(app.messages.last().unwrap().role, Role::User);
    }

    #[test]
    fn function_keys_cycle_selectors() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        let (service, _rx) = ChatStreamService::new();

        handle_key_event(&mut app, &service, press(KeyCode::F(4)), 20, 80);
        assert_eq!(app.model(), "phi");
    }
}
