use crate::core::app::{App, Focus};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub fn ui(f: &mut Frame, app: &App) {
    // Paint the full frame background before laying out widgets
    let background = Block::default().style(Style::default().bg(app.theme.background_color));
    f.render_widget(background, f.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // options bar
            Constraint::Length(3), // system prompt
            Constraint::Min(0),    // scrollback
            Constraint::Length(3), // input
        ])
        .split(f.area());

    render_options_bar(f, app, chunks[0]);
    render_system_prompt(f, app, chunks[1]);
    render_scrollback(f, app, chunks[2]);
    render_input(f, app, chunks[3]);

    if let Some(message) = &app.error_dialog {
        render_error_dialog(f, app, message);
    }
}

fn render_options_bar(f: &mut Frame, app: &App, area: Rect) {
    let bar = Line::from(vec![
        Span::styled(
            format!("Chatbox v{}", env!("CARGO_PKG_VERSION")),
            app.theme.title_style,
        ),
        Span::styled(
            format!(
                "  •  Appearance: {} (F2)  •  Color: {} (F3)  •  Model: {} (F4)",
                app.settings.appearance,
                app.settings.color_theme,
                app.model()
            ),
            app.theme.input_title_style,
        ),
    ]);
    f.render_widget(Paragraph::new(bar), area);
}

fn render_system_prompt(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::SystemPrompt && app.error_dialog.is_none();
    let border_style = if focused {
        app.theme.input_border_focused_style
    } else {
        app.theme.input_border_style
    };

    let prompt = Paragraph::new(app.system_prompt.as_str())
        .style(app.theme.input_text_style)
        .scroll((0, field_scroll(&app.system_prompt, area)))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled("System prompt", app.theme.input_title_style)),
        );
    f.render_widget(prompt, area);

    if focused {
        set_field_cursor(f, area, &app.system_prompt);
    }
}

fn render_scrollback(f: &mut Frame, app: &App, area: Rect) {
    let lines = app.build_display_lines();

    // Account for the title line; the scrollback block has no borders
    let available_height = area.height.saturating_sub(1);
    let max_offset = app.calculate_max_scroll_offset(available_height, area.width);
    let scroll_offset = app.scroll_offset.min(max_offset);

    let scrollback = Paragraph::new(lines)
        .block(Block::default().title(Span::styled("Chat", app.theme.title_style)))
        .wrap(Wrap { trim: true })
        .scroll((scroll_offset, 0));
    f.render_widget(scrollback, area);
}

fn render_input(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Input && app.error_dialog.is_none();
    let border_style = if focused {
        app.theme.input_border_focused_style
    } else {
        app.theme.input_border_style
    };

    let title = "Type your message (Enter to send, Tab to edit system prompt, Ctrl+C to quit)";
    let input = Paragraph::new(app.input.as_str())
        .style(app.theme.input_text_style)
        .scroll((0, field_scroll(&app.input, area)))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(title, app.theme.input_title_style)),
        );
    f.render_widget(input, area);

    if focused {
        set_field_cursor(f, area, &app.input);
    }
}

fn render_error_dialog(f: &mut Frame, app: &App, message: &str) {
    let area = centered_rect(60, 30, f.area());
    f.render_widget(Clear, area);

    let text = format!("{}\n\nPress Enter to dismiss", message);
    let dialog = Paragraph::new(text)
        .style(app.theme.error_text_style)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(app.theme.error_border_style)
                .title(Span::styled("Error", app.theme.error_border_style)),
        );
    f.render_widget(dialog, area);
}

/// Columns to scroll a single-line field so the cursor column stays inside
/// the bordered box. Zero until the text outgrows the inner width.
fn field_scroll(text: &str, area: Rect) -> u16 {
    let inner_width = area.width.saturating_sub(2);
    let len = text.chars().count().min(u16::MAX as usize) as u16;
    len.saturating_sub(inner_width.saturating_sub(1))
}

fn set_field_cursor(f: &mut Frame, area: Rect, text: &str) {
    // Cursor sits after the last visible character of the scrolled text.
    let len = text.chars().count().min(u16::MAX as usize) as u16;
    let cursor_x = len - field_scroll(text, area) + 1;
    f.set_cursor_position((area.x + cursor_x, area.y + 1));
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_field_text_does_not_scroll() {
        let area = Rect::new(0, 0, 10, 3);
        assert_eq!(field_scroll("", area), 0);
        assert_eq!(field_scroll("short", area), 0);
    }

    #[test]
    fn long_field_text_scrolls_to_keep_cursor_in_view() {
        // Inner width 8: the cursor column is len - scroll + 1, which must
        // stay within the box once the text outgrows it.
        let area = Rect::new(0, 0, 10, 3);
        assert_eq!(field_scroll("12345678", area), 1);
        assert_eq!(field_scroll("0123456789abcdef", area), 9);

        let len = 16u16;
        let cursor_col = len - field_scroll("0123456789abcdef", area) + 1;
        assert_eq!(cursor_col, 8);
    }
}
