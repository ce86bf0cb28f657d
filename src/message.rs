//! Error, warning and status reporting.
//!
//! Every message goes to `tracing` first. A registry may additionally hold
//! one [`MessageSink`] that receives the same text, e.g. to show it in a
//! host application's log window.

use std::cell::RefCell;
use std::fmt;

use crate::error::{ReturnCode, TixiError};

/// Severity of a library message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Error,
    Warning,
    Status,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error => f.write_str("error"),
            Self::Warning => f.write_str("warning"),
            Self::Status => f.write_str("status"),
        }
    }
}

/// Receives the messages a [`crate::Tixi`] registry emits.
///
/// Closures of the form `FnMut(MessageType, &str)` implement this trait.
///
/// ```
/// use std::sync::{Arc, Mutex};
/// use tixi::{MessageType, Tixi};
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// let mut tixi = Tixi::new();
/// tixi.set_message_sink(move |kind: MessageType, text: &str| {
///     sink.lock().unwrap().push((kind, text.to_string()));
/// });
/// assert!(tixi.open_document("does-not-exist.xml").is_err());
/// assert_eq!(seen.lock().unwrap()[0].0, MessageType::Error);
/// ```
pub trait MessageSink: Send {
    fn message(&mut self, kind: MessageType, text: &str);
}

impl<F> MessageSink for F
where
    F: FnMut(MessageType, &str) + Send,
{
    fn message(&mut self, kind: MessageType, text: &str) {
        self(kind, text);
    }
}

/// The registry's message channel.
#[derive(Default)]
pub(crate) struct Messenger {
    sink: RefCell<Option<Box<dyn MessageSink>>>,
    silenced: bool,
}

impl fmt::Debug for Messenger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Messenger")
            .field("has_sink", &self.sink.borrow().is_some())
            .field("silenced", &self.silenced)
            .finish()
    }
}

impl Messenger {
    pub(crate) fn set_sink(&mut self, sink: Box<dyn MessageSink>) {
        *self.sink.get_mut() = Some(sink);
    }

    pub(crate) fn clear_sink(&mut self) {
        *self.sink.get_mut() = None;
    }

    pub(crate) fn silence(&mut self, silenced: bool) {
        self.silenced = silenced;
    }

    pub(crate) fn emit(&self, kind: MessageType, text: &str) {
        match kind {
            MessageType::Error => tracing::error!("{text}"),
            MessageType::Warning => tracing::warn!("{text}"),
            MessageType::Status => tracing::debug!("{text}"),
        }
        if self.silenced {
            return;
        }
        // A sink that re-enters the registry would already be borrowed.
        if let Ok(mut sink) = self.sink.try_borrow_mut() {
            if let Some(sink) = sink.as_mut() {
                sink.message(kind, text);
            }
        }
    }

    pub(crate) fn warn(&self, text: &str) {
        self.emit(MessageType::Warning, text);
    }

    pub(crate) fn status(&self, text: &str) {
        self.emit(MessageType::Status, text);
    }

    /// Emits `err` and hands it back. A missing element is routine for
    /// existence probes and is reported as status only.
    pub(crate) fn report(&self, err: TixiError) -> TixiError {
        let kind = match err.code() {
            ReturnCode::ElementNotFound => MessageType::Status,
            _ => MessageType::Error,
        };
        self.emit(kind, &err.to_string());
        err
    }
}
