use spinoff::{Color, Spinner, spinners};
use std::io::IsTerminal;

pub struct SpinnerContainer {
    instance: Option<Spinner>,
}

impl SpinnerContainer {
    /// Attempts to create a spinner based on user preference and terminal
    /// capabilities.
    ///
    /// Auto-detecting the terminal keeps the spinner from flooding pipes
    /// when the output is redirected, without making `--no-animate`
    /// mandatory in scripts.
    pub fn create_unless_no_terminal_or(no_animate: bool) -> Self {
        if no_animate || !std::io::stdout().is_terminal() {
            return SpinnerContainer { instance: None };
        }

        SpinnerContainer {
            instance: Some(Spinner::new(spinners::Dots, "Fetching", Color::Blue)),
        }
    }

    pub fn stop_with_message(&mut self, message: &str) {
        // Note that it has to take ownership to prevent double stopping.
        match self.instance.take() {
            Some(mut s) => s.stop_with_message(message),
            None => println!("{}", message),
        }
    }

    pub fn update_text(&mut self, message: String) {
        if let Some(spinner) = self.instance.as_mut() {
            spinner.update_text(message)
        }
    }
}

impl Drop for SpinnerContainer {
    fn drop(&mut self) {
        if let Some(s) = self.instance.as_mut() {
            s.stop_with_message("");
        }
    }
}
