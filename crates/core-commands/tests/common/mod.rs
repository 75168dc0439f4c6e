#![allow(dead_code)] // Shared across integration tests; each test binary uses a subset of helpers.

use core_commands::{Commander, CommandDescriptor, DocumentAccess, Execution, SharedDocument};
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing_subscriber::fmt::MakeWriter;

/// Minimal document: a list of labelled boxes with a position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Board {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub label: &'static str,
    pub x: i32,
    pub y: i32,
}

pub fn item(label: &'static str) -> Item {
    Item { label, x: 0, y: 0 }
}

pub fn board(labels: &[&'static str]) -> SharedDocument<Board> {
    SharedDocument::new(Board {
        items: labels.iter().copied().map(item).collect(),
    })
}

pub fn labels(doc: &SharedDocument<Board>) -> Vec<&'static str> {
    doc.borrow().items.iter().map(|i| i.label).collect()
}

/// Tracked command appending `label`, written as a snapshot replacement.
pub fn push_command(name: &'static str, label: &'static str, access: DocumentAccess<Board>) -> CommandDescriptor<()> {
    CommandDescriptor::tracked(name, move |_| {
        let before = access.snapshot();
        let mut after = before.clone();
        after.items.push(item(label));
        Ok(Execution::from_actions(
            Some(access.restore(before)),
            Some(access.restore(after)),
        ))
    })
}

/// Tracked command removing every item.
pub fn clear_command(access: DocumentAccess<Board>) -> CommandDescriptor<()> {
    CommandDescriptor::tracked("clear", move |_| {
        let before = access.snapshot();
        Ok(Execution::from_actions(
            Some(access.restore(before)),
            Some(access.restore(Board::default())),
        ))
    })
}

pub fn commander() -> Commander<()> {
    Commander::default()
}

#[derive(Clone)]
pub struct BufferWriter {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl BufferWriter {
    pub fn new() -> (Self, Arc<Mutex<Vec<u8>>>) {
        let buf = Arc::new(Mutex::new(Vec::new()));
        (Self { inner: buf.clone() }, buf)
    }
}

pub struct LockedWriter<'a> {
    guard: MutexGuard<'a, Vec<u8>>,
}

impl Write for LockedWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.guard.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for BufferWriter {
    type Writer = LockedWriter<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LockedWriter {
            guard: self.inner.lock().expect("log buffer poisoned"),
        }
    }
}

/// Run `f` with a subscriber capturing formatted events; returns the log text.
pub fn capture_logs<F: FnOnce()>(f: F) -> String {
    let (writer, buffer) = BufferWriter::new();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_target(true)
        .with_ansi(false)
        .without_time()
        .with_writer(writer)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = buffer.lock().expect("log buffer poisoned").clone();
    String::from_utf8_lossy(&bytes).into_owned()
}
