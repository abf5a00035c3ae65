use ratatui::style::{Color, Modifier, Style};

use crate::core::config::Settings;
use crate::ui::appearance::Appearance;

#[derive(Debug, Clone)]
pub struct Theme {
    // Overall background color to paint the full frame
    pub background_color: Color,
    // Chat message styles
    pub user_prefix_style: Style,
    pub user_text_style: Style,
    pub assistant_prefix_style: Style,
    pub assistant_text_style: Style,
    pub system_text_style: Style,
    pub typing_indicator_style: Style,

    // Chrome
    pub title_style: Style,
    pub input_border_style: Style,
    pub input_border_focused_style: Style,
    pub input_title_style: Style,
    pub input_text_style: Style,

    // Error dialog
    pub error_border_style: Style,
    pub error_text_style: Style,
}

impl Theme {
    /// Resolve the palette from persisted settings: the color theme picks
    /// the accent colors, the appearance mode picks light or dark chrome.
    pub fn from_settings(settings: &Settings) -> Self {
        let appearance = Appearance::from_setting(&settings.appearance);
        match settings.color_theme.to_ascii_lowercase().as_str() {
            "green" => Self::green(appearance),
            "dark-blue" => Self::dark_blue(appearance),
            // "blue" and anything unrecognized
            _ => Self::blue(appearance),
        }
    }

    pub fn blue(appearance: Appearance) -> Self {
        Self::with_accents(appearance, Color::Cyan, Color::Blue)
    }

    pub fn green(appearance: Appearance) -> Self {
        Self::with_accents(appearance, Color::Green, Color::LightGreen)
    }

    pub fn dark_blue(appearance: Appearance) -> Self {
        Self::with_accents(appearance, Color::Blue, Color::LightBlue)
    }

    fn with_accents(appearance: Appearance, user_accent: Color, chrome_accent: Color) -> Self {
        let (background, body_text, dim_text, chrome_text) = match appearance {
            Appearance::Dark => (Color::Black, Color::White, Color::DarkGray, Color::Gray),
            Appearance::Light => (Color::White, Color::Black, Color::Gray, Color::DarkGray),
        };

        Theme {
            background_color: background,
            user_prefix_style: Style::default()
                .fg(user_accent)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(user_accent),
            assistant_prefix_style: Style::default()
                .fg(body_text)
                .add_modifier(Modifier::BOLD),
            assistant_text_style: Style::default().fg(body_text),
            system_text_style: Style::default().fg(dim_text),
            typing_indicator_style: Style::default()
                .fg(dim_text)
                .add_modifier(Modifier::ITALIC),

            title_style: Style::default().fg(chrome_accent),
            input_border_style: Style::default().fg(chrome_text),
            input_border_focused_style: Style::default().fg(chrome_accent),
            input_title_style: Style::default().fg(chrome_text),
            input_text_style: Style::default().fg(body_text),

            error_border_style: Style::default().fg(Color::Red),
            error_text_style: Style::default().fg(body_text),
        }
    }
}
