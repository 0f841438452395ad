//! Blocking user prompts: confirmations and alerts.

use std::io::{self, BufRead, Write};

use parking_lot::Mutex;

/// The alert channel pages use for persistence errors and confirmations.
pub trait Dialogs {
    /// Asks a yes/no question.
    fn confirm(&self, message: &str) -> bool;

    /// Shows a message.
    fn alert(&self, message: &str);
}

impl<T: Dialogs + ?Sized> Dialogs for &T {
    fn confirm(&self, message: &str) -> bool {
        (**self).confirm(message)
    }

    fn alert(&self, message: &str) {
        (**self).alert(message);
    }
}

impl<T: Dialogs + ?Sized> Dialogs for std::rc::Rc<T> {
    fn confirm(&self, message: &str) -> bool {
        (**self).confirm(message)
    }

    fn alert(&self, message: &str) {
        (**self).alert(message);
    }
}

/// Prompts on stdin and prints to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalDialogs;

impl Dialogs for TerminalDialogs {
    fn confirm(&self, message: &str) -> bool {
        print!("{message} [s/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).is_err() {
            return false;
        }
        matches!(line.trim().to_lowercase().as_str(), "s" | "sim" | "y" | "yes")
    }

    fn alert(&self, message: &str) {
        println!("{message}");
    }
}

/// Answers every confirmation the same way and records what was shown.
#[derive(Debug, Default)]
pub struct Scripted {
    answer: bool,
    confirms: Mutex<Vec<String>>,
    alerts: Mutex<Vec<String>>,
    echo: bool,
}

impl Scripted {
    /// Creates dialogs that answer `answer`.
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            ..Self::default()
        }
    }

    /// Also prints alerts to stdout.
    pub fn echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Returns the confirmation questions asked.
    pub fn confirms(&self) -> Vec<String> {
        self.confirms.lock().clone()
    }

    /// Returns the alerts shown.
    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().clone()
    }
}

impl Dialogs for Scripted {
    fn confirm(&self, message: &str) -> bool {
        self.confirms.lock().push(message.to_string());
        self.answer
    }

    fn alert(&self, message: &str) {
        if self.echo {
            println!("{message}");
        }
        self.alerts.lock().push(message.to_string());
    }
}
