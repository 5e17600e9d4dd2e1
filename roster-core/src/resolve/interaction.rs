//! User interaction capability
//!
//! Whether a human is present is decided once, when the session is
//! built, and every resolution path asks this trait instead of probing
//! the terminal itself.

use anyhow::{Context, Result};
use std::io::{BufRead, IsTerminal, Write};

/// Trait for talking to the user during resolution
pub trait Interaction: Send + Sync {
    /// Whether a human can answer prompts
    fn is_interactive(&self) -> bool;

    /// Show `lines`, ask `question` and return the trimmed answer
    fn prompt(&self, lines: &[String], question: &str) -> Result<String>;

    /// Informational message that does not expect an answer
    fn notice(&self, message: &str);
}

/// Terminal interaction on stdin/stderr
///
/// Prompts go to stderr so that stdout only ever carries results.
pub struct TerminalInteraction {
    interactive: bool,
}

impl TerminalInteraction {
    /// Interactive when both stdin and stderr are terminals and input is allowed
    pub fn detect(no_input: bool) -> Self {
        let interactive =
            !no_input && std::io::stdin().is_terminal() && std::io::stderr().is_terminal();
        tracing::debug!("Terminal interaction: interactive={}", interactive);
        Self { interactive }
    }

    /// Never prompts
    pub fn non_interactive() -> Self {
        Self { interactive: false }
    }
}

impl Interaction for TerminalInteraction {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn prompt(&self, lines: &[String], question: &str) -> Result<String> {
        if !self.interactive {
            anyhow::bail!("Cannot prompt: no interactive terminal");
        }

        let mut stderr = std::io::stderr().lock();
        for line in lines {
            writeln!(stderr, "{line}")?;
        }
        write!(stderr, "{question} ")?;
        stderr.flush()?;

        let mut input = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut input)
            .context("Failed to read from stdin")?;

        Ok(input.trim().to_string())
    }

    fn notice(&self, message: &str) {
        eprintln!("{message}");
    }
}
