pub mod config;
pub mod mirror;
pub mod peer;

use anyhow::Result;
use colored::Colorize;

#[derive(Debug, Clone)]
pub struct OutputContext {
    pub json: bool,
}

impl OutputContext {
    pub fn print_json<T: serde::Serialize>(&self, data: &T) {
        println!("{}", serde_json::to_string_pretty(data).unwrap());
    }

    pub fn print_success(&self, message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    pub fn print_error(&self, message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }
}

/// Yes/no confirmation for destructive operations, injectable so tests
/// can stub the terminal away.
pub trait Confirmer {
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Interactive confirmation on the controlling terminal.
pub struct TerminalConfirmer;

impl Confirmer for TerminalConfirmer {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        Ok(dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?)
    }
}
