//! Command registry, undo/redo history engine, keyboard dispatch and
//! gesture-bound commands.
//!
//! The embedding view owns the document and hands the core a read/write pair
//! ([`DocumentAccess`]). Commands are registered on a [`Commander`]; running
//! one by name executes it, applies its forward effect and (for tracked
//! commands) records the reversal pair in the linear history.
//!
//! * `command`   - descriptors and the `Execution` pair a command returns
//! * `commander` - registry, dispatch, history cursor, lifecycle, built-ins
//! * `keyboard`  - key-down routing with focus gating
//! * `gesture`   - commands whose before/after spans a drag gesture
//! * `document`  - snapshot accessor pair and a shared cell implementation

mod command;
mod commander;
mod document;
mod gesture;
mod keyboard;

pub use command::{Action, CommandDescriptor, Detach, Execution};
pub use commander::{Commander, Lifecycle, REDO, UNDO, WeakCommander};
pub use document::{DocumentAccess, SharedDocument};
pub use gesture::{GestureAdapter, GestureCapture, gesture_command};
pub use keyboard::{IgnoreReason, KeyOutcome};

pub use core_history::HistoryConfig;

/// Failures surfaced by the command engine.
///
/// Everything except `UnknownCommand` wraps an error raised inside a
/// command body, which indicates a defect in that command; the engine does
/// not attempt recovery and records nothing for the failed call.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("no command registered under `{0}`")]
    UnknownCommand(String),
    #[error("command `{name}` failed to execute")]
    Execute {
        name: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("command `{name}` failed to apply its forward effect")]
    Apply {
        name: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("commander is already initialized")]
    AlreadyInitialized,
}

impl CommandError {
    /// Name of the command involved, when the error concerns one.
    pub fn command(&self) -> Option<&str> {
        match self {
            CommandError::UnknownCommand(name)
            | CommandError::Execute { name, .. }
            | CommandError::Apply { name, .. } => Some(name),
            CommandError::AlreadyInitialized => None,
        }
    }
}
