use std::io;
use std::io::BufRead;

use thiserror::Error;
use tracing::trace;

/// One message of the push stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// JSON board settings
    Settings(String),

    /// Base64 board snapshot
    Frame(String),
}

impl StreamEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            StreamEvent::Settings(_) => "settings",
            StreamEvent::Frame(_) => "message",
        }
    }

    pub fn payload(&self) -> &str {
        match self {
            StreamEvent::Settings(payload) | StreamEvent::Frame(payload) => payload,
        }
    }
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Event stream is not valid UTF-8")]
    InvalidUtf8,

    #[error("Failed to read event stream: {0}")]
    Io(io::Error),
}

impl From<io::Error> for StreamError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::InvalidData => StreamError::InvalidUtf8,
            _ => StreamError::Io(err),
        }
    }
}

/// Reads `text/event-stream` framing and yields the events the viewer understands.
///
/// `event:` names the kind of the next event, `data:` lines are joined with `\n`, and a blank line
/// dispatches. Events without a kind are `message`s, which carry frames. Kinds other than
/// `settings` and `message` are skipped. An unterminated event at the end of input is dropped.
pub struct EventStream<R> {
    reader: R,
    line: String,
    kind: Option<String>,
    data: Option<String>,
}

impl<R: BufRead> EventStream<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            kind: None,
            data: None,
        }
    }

    fn dispatch(&mut self) -> Option<StreamEvent> {
        let kind = self.kind.take();
        let data = self.data.take()?;

        match kind.as_deref() {
            None | Some("message") => Some(StreamEvent::Frame(data)),
            Some("settings") => Some(StreamEvent::Settings(data)),
            Some(kind) => {
                trace!(kind, "Skipping unknown event");
                None
            }
        }
    }

    fn field(&mut self, name: &str, value: &str) {
        match name {
            "event" => self.kind = Some(value.to_string()),
            "data" => match &mut self.data {
                Some(data) => {
                    data.push('\n');
                    data.push_str(value);
                }
                None => self.data = Some(value.to_string()),
            },
            "id" | "retry" => {}
            name => trace!(name, "Ignoring unknown field"),
        }
    }
}

impl<R: BufRead> Iterator for EventStream<R> {
    type Item = Result<StreamEvent, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();

            match self.reader.read_line(&mut self.line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(err) => return Some(Err(err.into())),
            }

            let line = std::mem::take(&mut self.line);
            let trimmed = line.trim_end_matches(['\n', '\r']);

            if trimmed.is_empty() {
                self.line = line;

                if let Some(event) = self.dispatch() {
                    return Some(Ok(event));
                }

                continue;
            }

            if let Some((name, value)) = split_field(trimmed) {
                self.field(name, value);
            }

            self.line = line;
        }
    }
}

/// Split a line into its field name and value. Comment lines yield `None`.
fn split_field(line: &str) -> Option<(&str, &str)> {
    if line.starts_with(':') {
        return None;
    }

    let Some((name, value)) = line.split_once(':') else {
        return Some((line, ""));
    };

    Some((name, value.strip_prefix(' ').unwrap_or(value)))
}
