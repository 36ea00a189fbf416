//! Extension hooks for messages the built-in dispatcher does not handle.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::warn;

use crate::message::Message;
use crate::session::SessionState;

/// A hook invoked on messages no built-in transition matched.
///
/// Runs synchronously inside the client's single dispatch step; hooks are
/// for bookkeeping and must not block. Returning `Some(state)` replaces the
/// session state and marks the message handled; `None` passes it to the
/// next hook.
pub trait Extension: Send {
    /// Inspect an unmatched message.
    fn handle(&mut self, msg: &Message, state: &SessionState) -> Option<SessionState>;
}

/// Extensions in registration order. The first hook to return an updated
/// state claims the message.
#[derive(Default)]
pub struct ExtensionRegistry {
    extensions: Vec<Box<dyn Extension>>,
}

impl ExtensionRegistry {
    pub fn new(extensions: Vec<Box<dyn Extension>>) -> ExtensionRegistry {
        ExtensionRegistry { extensions }
    }

    /// Offer `msg` to each hook in turn. Returns the updated state from the
    /// first hook that claims it. A panicking hook is contained and treated
    /// as not claiming the message.
    pub fn dispatch(&mut self, msg: &Message, state: &SessionState) -> Option<SessionState> {
        for ext in &mut self.extensions {
            let outcome = catch_unwind(AssertUnwindSafe(|| ext.handle(msg, state)));
            match outcome {
                Ok(Some(updated)) => return Some(updated),
                Ok(None) => {}
                Err(_) => warn!(cmd = %msg.cmd, "extension panicked; message unclaimed"),
            }
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("len", &self.extensions.len())
            .finish()
    }
}
