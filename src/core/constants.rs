//! Shared constants used across the application

use std::time::Duration;

/// Base URL of the local Ollama server; overridable via `--base-url`.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Models offered by the model selector, in cycle order.
pub const SUPPORTED_MODELS: &[&str] = &["mistral", "phi", "llama2", "gemma"];

/// Appearance modes offered by the appearance selector, in cycle order.
pub const APPEARANCE_MODES: &[&str] = &["System", "Light", "Dark"];

/// Color themes offered by the color-theme selector, in cycle order.
pub const COLOR_THEMES: &[&str] = &["blue", "green", "dark-blue"];

/// Text used to refill the system-prompt field when it is empty at first send.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// How long a stream may stay silent before the typing indicator appears.
pub const TYPING_INDICATOR_DELAY: Duration = Duration::from_millis(500);
