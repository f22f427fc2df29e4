//! Interactive input utilities for confirmations and progress spinners

use crate::error::{AcctctlError, Result};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Interactive prompt utilities
pub struct InteractivePrompt {
    theme: ColorfulTheme,
}

impl InteractivePrompt {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }

    /// Prompt for yes/no confirmation with a default value
    pub fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(message)
            .default(default)
            .interact()
            .map_err(|e| AcctctlError::config(format!("Failed to get user input: {e}")))
    }

    /// Prompt for free text, optionally pre-filled
    pub fn input_text(&self, message: &str, default: Option<&str>) -> Result<String> {
        self.input_text_validated(message, default, |_| Ok(()))
    }

    /// Prompt for text until `validator` accepts it
    pub fn input_text_validated<F>(
        &self,
        message: &str,
        default: Option<&str>,
        validator: F,
    ) -> Result<String>
    where
        F: Fn(&str) -> std::result::Result<(), String>,
    {
        let mut input = Input::<String>::with_theme(&self.theme).with_prompt(message);
        if let Some(default) = default {
            input = input.default(default.to_string());
        }
        input
            .validate_with(|value: &String| validator(value))
            .interact_text()
            .map_err(|e| AcctctlError::config(format!("Failed to get user input: {e}")))
    }

    /// Pick one entry from `items`
    pub fn select<T: ToString>(
        &self,
        message: &str,
        items: &[T],
        default: Option<usize>,
    ) -> Result<usize> {
        Select::with_theme(&self.theme)
            .with_prompt(message)
            .items(items)
            .default(default.unwrap_or(0))
            .interact()
            .map_err(|e| AcctctlError::config(format!("Failed to get user selection: {e}")))
    }

    /// Ask for confirmation unless `force` is set; a "no" becomes `Cancelled`
    pub fn require_confirmation(&self, message: &str, force: bool) -> Result<()> {
        if force || self.confirm(message, false)? {
            Ok(())
        } else {
            Err(AcctctlError::Cancelled)
        }
    }
}

impl Default for InteractivePrompt {
    fn default() -> Self {
        Self::new()
    }
}

/// Spinner for long-running operations
pub struct ProgressIndicator {
    bar: ProgressBar,
}

impl ProgressIndicator {
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.blue} {msg}")
        {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// A spinner that draws nothing, for non-interactive output
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    pub fn finish_success(&self, message: &str) {
        self.bar.finish_with_message(format!("✅ {message}"));
    }

    pub fn finish_error(&self, message: &str) {
        self.bar.finish_with_message(format!("❌ {message}"));
    }

    /// Hide the spinner while `f` writes to the terminal
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.bar.suspend(f)
    }
}
