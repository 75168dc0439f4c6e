use crate::Action;
use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::Rc;

/// Read accessor and write callback for the document a command edits.
///
/// The core never mutates a snapshot in place: it reads a copy and writes a
/// full replacement back through the view's update function.
pub struct DocumentAccess<D> {
    read: Rc<dyn Fn() -> D>,
    write: Rc<dyn Fn(D)>,
}

impl<D> Clone for DocumentAccess<D> {
    fn clone(&self) -> Self {
        Self {
            read: self.read.clone(),
            write: self.write.clone(),
        }
    }
}

impl<D> fmt::Debug for DocumentAccess<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DocumentAccess")
    }
}

impl<D: 'static> DocumentAccess<D> {
    pub fn new<R, W>(read: R, write: W) -> Self
    where
        R: Fn() -> D + 'static,
        W: Fn(D) + 'static,
    {
        Self {
            read: Rc::new(read),
            write: Rc::new(write),
        }
    }

    /// Copy of the current document.
    pub fn snapshot(&self) -> D {
        (self.read)()
    }

    /// Replace the document wholesale.
    pub fn replace(&self, document: D) {
        (self.write)(document)
    }

    /// Action writing a copy of `document` each time it runs.
    pub fn restore(&self, document: D) -> Action
    where
        D: Clone,
    {
        let write = self.write.clone();
        Box::new(move || {
            write(document.clone());
            Ok(())
        })
    }
}

/// Single-owner document cell with a revision counter, for hosts that do
/// not bring their own store.
pub struct SharedDocument<D> {
    cell: Rc<RefCell<D>>,
    revision: Rc<Cell<u64>>,
}

impl<D> Clone for SharedDocument<D> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            revision: self.revision.clone(),
        }
    }
}

impl<D: fmt::Debug> fmt::Debug for SharedDocument<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedDocument")
            .field("revision", &self.revision.get())
            .field("document", &*self.cell.borrow())
            .finish()
    }
}

impl<D: Clone + 'static> SharedDocument<D> {
    pub fn new(document: D) -> Self {
        Self {
            cell: Rc::new(RefCell::new(document)),
            revision: Rc::new(Cell::new(0)),
        }
    }

    pub fn get(&self) -> D {
        self.cell.borrow().clone()
    }

    /// Borrow without cloning. Do not write to the document while holding it.
    pub fn borrow(&self) -> Ref<'_, D> {
        self.cell.borrow()
    }

    pub fn set(&self, document: D) {
        *self.cell.borrow_mut() = document;
        self.revision.set(self.revision.get() + 1);
        tracing::trace!(target: "commands.document", revision = self.revision.get(), "document_replaced");
    }

    /// Number of replacements since creation.
    pub fn revision(&self) -> u64 {
        self.revision.get()
    }

    pub fn access(&self) -> DocumentAccess<D> {
        let (reader, writer) = (self.clone(), self.clone());
        DocumentAccess::new(move || reader.get(), move |d| writer.set(d))
    }
}
