use std::time::Instant;

use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use reqwest::Client;

use crate::api::ChatMessage;
use crate::core::chat_stream::StreamParams;
use crate::core::config::Settings;
use crate::core::constants::{
    APPEARANCE_MODES, COLOR_THEMES, DEFAULT_SYSTEM_PROMPT, SUPPORTED_MODELS,
    TYPING_INDICATOR_DELAY,
};
use crate::core::message::{Message, Role};
use crate::core::transcript::TranscriptLog;
use crate::ui::theme::Theme;

/// Which text field receives typed characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    SystemPrompt,
}

pub struct App {
    pub messages: Vec<Message>,
    pub settings: Settings,
    pub theme: Theme,
    pub model_index: usize,
    pub system_prompt: String,
    pub input: String,
    pub focus: Focus,
    pub scroll_offset: u16,
    pub auto_scroll: bool,
    pub is_streaming: bool,
    pub typing_indicator: bool,
    pub error_dialog: Option<String>,
    pub client: Client,
    pub base_url: String,
    pub current_response: String,
    pub current_stream_id: u64,
    stream_started: Option<Instant>,
    transcript: TranscriptLog,
}

impl App {
    pub fn new(model: &str, base_url: String, settings: Settings, transcript: TranscriptLog) -> Self {
        let theme = Theme::from_settings(&settings);
        let model_index = SUPPORTED_MODELS
            .iter()
            .position(|&m| m == model)
            .unwrap_or(0);

        App {
            messages: Vec::new(),
            settings,
            theme,
            model_index,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            input: String::new(),
            focus: Focus::Input,
            scroll_offset: 0,
            auto_scroll: true,
            is_streaming: false,
            typing_indicator: false,
            error_dialog: None,
            client: Client::new(),
            base_url,
            current_response: String::new(),
            current_stream_id: 0,
            stream_started: None,
            transcript,
        }
    }

    pub fn model(&self) -> &'static str {
        SUPPORTED_MODELS[self.model_index % SUPPORTED_MODELS.len()]
    }

    pub fn cycle_model(&mut self) {
        self.model_index = (self.model_index + 1) % SUPPORTED_MODELS.len();
    }

    pub fn cycle_appearance(&mut self) {
        self.settings.appearance = next_choice(APPEARANCE_MODES, &self.settings.appearance);
        self.theme = Theme::from_settings(&self.settings);
    }

    pub fn cycle_color_theme(&mut self) {
        self.settings.color_theme = next_choice(COLOR_THEMES, &self.settings.color_theme);
        self.theme = Theme::from_settings(&self.settings);
    }

    /// Append the user's message to history and prepare the outgoing request.
    ///
    /// On the first send of the session the system-prompt field is consulted
    /// exactly once: non-empty text becomes the history's leading system
    /// message; an empty field is refilled with the default prompt instead.
    /// A send issued while a stream is still open supersedes it.
    /// Returns `None` for blank input.
    pub fn submit_message(&mut self, text: &str) -> Option<StreamParams> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        // The superseded stream's updates are already filtered by id; close
        // out its placeholder before the new request reads history, so the
        // payload never carries an empty assistant message.
        if self.is_streaming {
            self.finalize_response();
        }

        if self.messages.is_empty() {
            let prompt = self.system_prompt.trim().to_string();
            if prompt.is_empty() {
                self.system_prompt = DEFAULT_SYSTEM_PROMPT.to_string();
            } else {
                self.messages.push(Message::system(prompt));
            }
        }

        self.messages.push(Message::user(trimmed));
        if let Err(e) = self.transcript.log_message("You", trimmed) {
            tracing::warn!("could not write chat log: {e}");
        }

        // Request payload is the full history; the streaming placeholder is
        // pushed afterwards so it is never part of the request.
        let api_messages: Vec<ChatMessage> =
            self.messages.iter().map(|m| m.to_api_message()).collect();

        self.messages.push(Message::assistant(String::new()));
        self.current_response.clear();
        self.is_streaming = true;
        self.typing_indicator = false;
        self.stream_started = Some(Instant::now());
        self.current_stream_id += 1;
        self.auto_scroll = true;

        Some(StreamParams {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            model: self.model().to_string(),
            api_messages,
            stream_id: self.current_stream_id,
        })
    }

    /// Fold one streamed fragment into the in-progress assistant message.
    /// The first fragment clears the typing indicator.
    pub fn append_to_response(&mut self, content: &str) {
        self.typing_indicator = false;
        self.stream_started = None;
        self.current_response.push_str(content);
        if let Some(last) = self.messages.last_mut() {
            if last.role.is_assistant() {
                last.content = self.current_response.clone();
            }
        }
    }

    /// Close out the current stream. An assistant message that never
    /// received a fragment is dropped from history; anything else is logged
    /// to the transcript.
    pub fn finalize_response(&mut self) {
        if !self.is_streaming {
            return;
        }
        self.is_streaming = false;
        self.typing_indicator = false;
        self.stream_started = None;

        let empty_placeholder =
            matches!(self.messages.last(), Some(m) if m.role.is_assistant() && m.content.is_empty());
        let finished = if empty_placeholder {
            self.messages.pop();
            None
        } else {
            match self.messages.last() {
                Some(last) if last.role.is_assistant() => Some(last.content.clone()),
                _ => None,
            }
        };

        if let Some(content) = finished {
            if let Err(e) = self.transcript.log_message("Bot", &content) {
                tracing::warn!("could not write chat log: {e}");
            }
        }
        self.current_response.clear();
    }

    /// A failed request aborts the stream: the in-flight assistant message
    /// (partial or empty) is removed and the error is raised as a modal
    /// dialog.
    pub fn handle_stream_error(&mut self, message: String) {
        if self.is_streaming && matches!(self.messages.last(), Some(m) if m.role.is_assistant()) {
            self.messages.pop();
        }
        self.is_streaming = false;
        self.typing_indicator = false;
        self.stream_started = None;
        self.current_response.clear();
        self.error_dialog = Some(message);
    }

    /// Show the typing indicator once the stream has been silent for the
    /// configured delay. Returns true when visibility changed.
    pub fn update_typing_indicator(&mut self) -> bool {
        if self.typing_indicator || !self.is_streaming || !self.current_response.is_empty() {
            return false;
        }
        match self.stream_started {
            Some(started) if started.elapsed() >= TYPING_INDICATOR_DELAY => {
                self.typing_indicator = true;
                true
            }
            _ => false,
        }
    }

    pub fn build_display_lines(&self) -> Vec<Line<'_>> {
        let mut lines = Vec::new();

        for msg in &self.messages {
            match msg.role {
                Role::System => {
                    lines.push(Line::from(Span::styled(
                        msg.content.as_str(),
                        self.theme.system_text_style,
                    )));
                    lines.push(Line::from(""));
                }
                Role::User => {
                    lines.push(Line::from(vec![
                        Span::styled("You: ", self.theme.user_prefix_style),
                        Span::styled(msg.content.as_str(), self.theme.user_text_style),
                    ]));
                    lines.push(Line::from(""));
                }
                Role::Assistant => {
                    if msg.content.is_empty() {
                        // In-flight placeholder: invisible until the first
                        // fragment, except for the delayed typing notice.
                        if self.typing_indicator {
                            lines.push(Line::from(Span::styled(
                                "Bot: Typing...",
                                self.theme.typing_indicator_style,
                            )));
                            lines.push(Line::from(""));
                        }
                        continue;
                    }
                    for (i, content_line) in msg.content.lines().enumerate() {
                        if i == 0 {
                            lines.push(Line::from(vec![
                                Span::styled("Bot: ", self.theme.assistant_prefix_style),
                                Span::styled(content_line, self.theme.assistant_text_style),
                            ]));
                        } else if content_line.trim().is_empty() {
                            lines.push(Line::from(""));
                        } else {
                            lines.push(Line::from(Span::styled(
                                content_line,
                                self.theme.assistant_text_style,
                            )));
                        }
                    }
                    lines.push(Line::from(""));
                }
            }
        }

        lines
    }

    /// Measured against the wrapped line count for the given width, the same
    /// wrapping the scrollback paragraph renders with.
    pub fn calculate_max_scroll_offset(&self, available_height: u16, available_width: u16) -> u16 {
        let paragraph = Paragraph::new(self.build_display_lines()).wrap(Wrap { trim: true });
        let total_lines = paragraph
            .line_count(available_width)
            .min(u16::MAX as usize) as u16;
        total_lines.saturating_sub(available_height)
    }

    pub fn scroll_up(&mut self, amount: u16) {
        self.auto_scroll = false;
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }

    pub fn scroll_down(&mut self, amount: u16, available_height: u16, available_width: u16) {
        let max_scroll = self.calculate_max_scroll_offset(available_height, available_width);
        self.scroll_offset = self.scroll_offset.saturating_add(amount).min(max_scroll);
        // Reaching the bottom re-engages follow mode.
        if self.scroll_offset >= max_scroll {
            self.auto_scroll = true;
        }
    }

    /// Pin the view to the bottom of the scrollback when follow mode is on.
    pub fn update_scroll_position(&mut self, available_height: u16, available_width: u16) {
        if self.auto_scroll {
            self.scroll_offset = self.calculate_max_scroll_offset(available_height, available_width);
        }
    }
}

fn next_choice(choices: &[&str], current: &str) -> String {
    let index = choices.iter().position(|&c| c == current).unwrap_or(0);
    choices[(index + 1) % choices.len()].to_string()
}
