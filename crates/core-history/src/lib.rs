//! Linear undo/redo history with a movable cursor.
//!
//! State is fully described by `(len, cursor)` where `cursor` is the index of
//! the last applied entry and `-1` means nothing is applied. Entries past the
//! cursor are the redoable tail left behind by undo; recording a new entry
//! drops that tail (no branching timeline).
//!
//! ```text
//! record(e1..e4)        [e1 e2 e3 e4]   cursor = 3
//! undo x2               [e1 e2 e3 e4]   cursor = 1   (e3 e4 redoable)
//! record(e5)            [e1 e2 e5]      cursor = 2   (tail dropped)
//! ```
//!
//! The cursor is stored as a count of applied entries, so the
//! `-1 <= cursor < len` invariant holds by construction.

use std::fmt;
use std::rc::Rc;
use tracing::trace;

/// One side (forward or backward) of a recorded change.
pub type Action = Box<dyn Fn() -> anyhow::Result<()>>;

/// The reversal pair recorded for one applied command.
///
/// `undo` is optional: an entry without one is irreversible and undoing it
/// only moves the cursor.
pub struct HistoryEntry {
    label: String,
    undo: Option<Action>,
    redo: Option<Action>,
}

impl fmt::Debug for HistoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryEntry")
            .field("label", &self.label)
            .field("undo", &self.undo.is_some())
            .field("redo", &self.redo.is_some())
            .finish()
    }
}

impl HistoryEntry {
    pub fn new(label: impl Into<String>, undo: Option<Action>, redo: Option<Action>) -> Self {
        Self {
            label: label.into(),
            undo,
            redo,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_reversible(&self) -> bool {
        self.undo.is_some()
    }

    /// Run the backward effect; absent undo is a no-op.
    pub fn revert(&self) -> anyhow::Result<()> {
        match &self.undo {
            Some(undo) => undo(),
            None => Ok(()),
        }
    }

    /// Run the forward effect; absent redo is a no-op.
    pub fn apply(&self) -> anyhow::Result<()> {
        match &self.redo {
            Some(redo) => redo(),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum retained entries; `0` keeps everything.
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl HistoryConfig {
    pub const fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub const fn unlimited() -> Self {
        Self { max_depth: 0 }
    }
}

#[derive(Default)]
pub struct History {
    entries: Vec<Rc<HistoryEntry>>,
    /// Number of applied entries; the cursor is `applied - 1`.
    applied: usize,
    config: HistoryConfig,
    evicted: u64,
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("len", &self.entries.len())
            .field("cursor", &self.cursor())
            .field("config", &self.config)
            .finish()
    }
}

impl History {
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            entries: Vec::new(),
            applied: 0,
            config,
            evicted: 0,
        }
    }

    /// Index of the last applied entry, `-1` when none.
    pub fn cursor(&self) -> isize {
        self.applied as isize - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    pub fn can_redo(&self) -> bool {
        self.applied < self.entries.len()
    }

    pub fn config(&self) -> HistoryConfig {
        self.config
    }

    /// Entries dropped from the front because of `max_depth`.
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Labels of every entry, oldest first.
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label()).collect()
    }

    /// Append an already applied entry: drop the redoable tail, push, advance.
    pub fn record(&mut self, entry: HistoryEntry) {
        let dropped = self.entries.len() - self.applied;
        if dropped > 0 {
            self.entries.truncate(self.applied);
            trace!(target: "history", dropped, "redo_tail_truncated");
        }
        self.entries.push(Rc::new(entry));
        self.applied = self.entries.len();
        if self.config.max_depth > 0 && self.entries.len() > self.config.max_depth {
            let excess = self.entries.len() - self.config.max_depth;
            self.entries.drain(..excess);
            self.applied -= excess;
            self.evicted += excess as u64;
            trace!(target: "history", excess, max_depth = self.config.max_depth, "history_trimmed");
        }
        trace!(target: "history", len = self.entries.len(), cursor = self.cursor(), "record");
    }

    /// Entry an undo would revert (the one at the cursor).
    pub fn peek_undo(&self) -> Option<Rc<HistoryEntry>> {
        self.applied
            .checked_sub(1)
            .and_then(|idx| self.entries.get(idx))
            .cloned()
    }

    /// Entry a redo would re-apply (the one at `cursor + 1`).
    pub fn peek_redo(&self) -> Option<Rc<HistoryEntry>> {
        self.entries.get(self.applied).cloned()
    }

    /// Move the cursor back one step. Returns `false` at the start of history.
    pub fn retreat(&mut self) -> bool {
        if self.applied == 0 {
            return false;
        }
        self.applied -= 1;
        trace!(target: "history", len = self.entries.len(), cursor = self.cursor(), "retreat");
        true
    }

    /// Move the cursor forward one step. Returns `false` when nothing is redoable.
    pub fn advance(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.applied += 1;
        trace!(target: "history", len = self.entries.len(), cursor = self.cursor(), "advance");
        true
    }

    /// Revert the entry at the cursor and step back. `Ok(false)` when there is
    /// nothing to undo. On error the cursor does not move.
    ///
    /// The entry runs while `self` is borrowed; callers whose actions may
    /// re-enter the owner of this history should use `peek_undo` + `retreat`.
    pub fn undo(&mut self) -> anyhow::Result<bool> {
        let Some(entry) = self.peek_undo() else {
            trace!(target: "history", "undo_noop_empty");
            return Ok(false);
        };
        entry.revert()?;
        Ok(self.retreat())
    }

    /// Re-apply the entry after the cursor and step forward. `Ok(false)` when
    /// there is nothing to redo. On error the cursor does not move.
    pub fn redo(&mut self) -> anyhow::Result<bool> {
        let Some(entry) = self.peek_redo() else {
            trace!(target: "history", "redo_noop_no_forward_entry");
            return Ok(false);
        };
        entry.apply()?;
        Ok(self.advance())
    }

    /// Forget every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.applied = 0;
        trace!(target: "history", "cleared");
    }
}
