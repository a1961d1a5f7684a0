//! Output rendering for the chat application.
//!
//! The session only emits [`SessionUpdate`]s; a [`Renderer`] turns them into
//! terminal output.  The default implementation prints reveal partials as
//! deltas so the answer appears to stream in place.

use std::io::{self, Write};

use serde_json::Value;

use crate::chat::session::SessionUpdate;
use crate::types::Message;

/// ANSI escape code for dim text (used for status lines).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for the bot label).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for yellow text (used for debug payloads).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for red text (used for failures).
const ANSI_RED: &str = "\x1b[31m";

/// Trait for rendering chat output.
pub trait Renderer: Send {
    /// Show that a query is in flight.
    fn print_waiting(&mut self);

    /// Show the revealed prefix of the answer.
    ///
    /// Called with successively longer prefixes of the same answer.
    fn print_partial(&mut self, partial: &str);

    /// Called when the answer is committed to the log.
    fn finish_response(&mut self, message: &Message);

    /// Show the fixed reply for a failed query, with the underlying error.
    fn print_failure(&mut self, message: &Message, error: &str);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Print the debug payload, or a note that there is none yet.
    fn print_debug(&mut self, payload: Option<&Value>);

    /// Dispatch a session update to the methods above.
    fn render_update(&mut self, update: &SessionUpdate) {
        match update {
            SessionUpdate::Revealing => {}
            SessionUpdate::Partial(partial) => self.print_partial(partial),
            SessionUpdate::Committed(message) => self.finish_response(message),
            SessionUpdate::Failed { message, error } => self.print_failure(message, error),
        }
    }
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    out: Box<dyn Write + Send>,
    use_color: bool,
    shown: usize,
    waiting: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer on stdout with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer on stdout with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writer(Box::new(io::stdout()), use_color)
    }

    /// Creates a renderer writing somewhere other than stdout.
    pub fn with_writer(out: Box<dyn Write + Send>, use_color: bool) -> Self {
        Self {
            out,
            use_color,
            shown: 0,
            waiting: false,
        }
    }

    fn styled(&self, style: &str, text: &str) -> String {
        if self.use_color {
            format!("{style}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    fn write(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }

    fn start_reply(&mut self) {
        if self.waiting {
            self.write("\n");
            self.waiting = false;
        }
        if self.shown == 0 {
            let label = self.styled(ANSI_CYAN, "Bot: ");
            self.write(&label);
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_waiting(&mut self) {
        let line = self.styled(ANSI_DIM, "Answering...");
        self.write(&line);
        self.waiting = true;
        self.shown = 0;
    }

    fn print_partial(&mut self, partial: &str) {
        self.start_reply();
        match partial.get(self.shown..) {
            Some(delta) => {
                let delta = delta.to_string();
                self.write(&delta);
            }
            None => self.write(partial),
        }
        self.shown = partial.len();
    }

    fn finish_response(&mut self, message: &Message) {
        self.start_reply();
        if let Some(rest) = message.text.get(self.shown..) {
            let rest = rest.to_string();
            self.write(&rest);
        }
        if message.text.is_empty() {
            let note = self.styled(ANSI_DIM, "(empty answer)");
            self.write(&note);
        }
        self.write("\n");
        self.shown = 0;
    }

    fn print_failure(&mut self, message: &Message, error: &str) {
        self.start_reply();
        let reply = self.styled(ANSI_RED, &message.text);
        let detail = self.styled(ANSI_DIM, &format!("  ({error}; /debug for details)"));
        self.write(&format!("{reply}\n{detail}\n"));
        self.shown = 0;
    }

    fn print_error(&mut self, error: &str) {
        let _ = writeln!(io::stderr(), "Error: {error}");
    }

    fn print_info(&mut self, info: &str) {
        self.write(&format!("{info}\n"));
    }

    fn print_debug(&mut self, payload: Option<&Value>) {
        match payload {
            Some(payload) => {
                let pretty =
                    serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
                let block = self.styled(ANSI_YELLOW, &pretty);
                self.write(&format!("{block}\n"));
            }
            None => self.print_info("No response to inspect yet."),
        }
    }
}
