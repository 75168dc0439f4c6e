//! Commands whose unit of work spans a drag gesture.
//!
//! The adapter subscribes to the gesture-start channel to snapshot the
//! document, and to the gesture-end channel to run its command, which pairs
//! that snapshot with the document as it is at the end. However many
//! intermediate mutations the drag made, one history entry results.
//!
//! There is a single capture slot: a second start before an end overwrites
//! the first snapshot (one pointer, one drag at a time).

use crate::{CommandDescriptor, Commander, Detach, DocumentAccess, Execution};
use core_events::GestureSignals;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Capture state between a gesture-start and its gesture-end.
#[derive(Debug)]
pub struct GestureCapture<D> {
    capturing: bool,
    before: Option<D>,
}

impl<D> Default for GestureCapture<D> {
    fn default() -> Self {
        Self {
            capturing: false,
            before: None,
        }
    }
}

impl<D> GestureCapture<D> {
    /// Record the pre-gesture snapshot, replacing any stale one.
    pub fn begin(&mut self, snapshot: D) {
        if self.capturing {
            trace!(target: "commands.gesture", "capture_overwritten");
        }
        self.capturing = true;
        self.before = Some(snapshot);
    }

    /// End the capture, handing back the snapshot if a start was seen.
    pub fn finish(&mut self) -> Option<D> {
        self.capturing = false;
        self.before.take()
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    pub fn before(&self) -> Option<&D> {
        self.before.as_ref()
    }
}

/// Builds a gesture-bound command and exposes its capture state.
pub struct GestureAdapter<D> {
    name: String,
    document: DocumentAccess<D>,
    signals: GestureSignals,
    capture: Rc<RefCell<GestureCapture<D>>>,
}

impl<D> fmt::Debug for GestureAdapter<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GestureAdapter")
            .field("name", &self.name)
            .field("capturing", &self.capture.borrow().capturing)
            .finish()
    }
}

impl<D: Clone + 'static> GestureAdapter<D> {
    pub fn new(name: impl Into<String>, document: DocumentAccess<D>, signals: &GestureSignals) -> Self {
        Self {
            name: name.into(),
            document,
            signals: signals.clone(),
            capture: Rc::new(RefCell::new(GestureCapture::default())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.borrow().is_capturing()
    }

    /// Whether a pre-gesture snapshot is currently held.
    pub fn has_before(&self) -> bool {
        self.capture.borrow().before().is_some()
    }

    /// The tracked command to register. Its attach hook wires both signal
    /// listeners and its detach removes them again.
    pub fn descriptor<A: Default + 'static>(&self) -> CommandDescriptor<A> {
        let attach = {
            let name = self.name.clone();
            let document = self.document.clone();
            let signals = self.signals.clone();
            let capture = self.capture.clone();
            move |commander: &Commander<A>| -> Option<Detach> {
                let start_id = {
                    let document = document.clone();
                    let capture = capture.clone();
                    signals.start.on(move || {
                        let snapshot = document.snapshot();
                        capture.borrow_mut().begin(snapshot);
                        Ok(())
                    })
                };
                let end_id = {
                    let weak = commander.downgrade();
                    let name = name.clone();
                    signals.end.on(move || match weak.upgrade() {
                        Some(commander) => commander.invoke(&name).map_err(anyhow::Error::from),
                        None => Ok(()),
                    })
                };
                debug!(target: "commands.gesture", command = %name, "gesture_listeners_attached");
                let signals = signals.clone();
                let name = name.clone();
                Some(Box::new(move || {
                    signals.start.off(start_id);
                    signals.end.off(end_id);
                    debug!(target: "commands.gesture", command = %name, "gesture_listeners_detached");
                }))
            }
        };

        let name = self.name.clone();
        let document = self.document.clone();
        let capture = self.capture.clone();
        CommandDescriptor::tracked(self.name.clone(), move |_args: A| {
            let before = capture.borrow_mut().finish();
            let after = document.snapshot();
            let redo = document.restore(after);
            match before {
                Some(before) => {
                    trace!(target: "commands.gesture", command = %name, "gesture_committed");
                    Ok(Execution::from_actions(Some(document.restore(before)), Some(redo)))
                }
                None => {
                    // End without a start: the entry is recorded but cannot be undone.
                    warn!(target: "commands.gesture", command = %name, "gesture_end_without_start");
                    Ok(Execution::from_actions(None, Some(redo)))
                }
            }
        })
        .on_attach(attach)
    }
}

/// Shorthand for `GestureAdapter::new(..).descriptor()`.
pub fn gesture_command<D, A>(
    name: impl Into<String>,
    document: DocumentAccess<D>,
    signals: &GestureSignals,
) -> CommandDescriptor<A>
where
    D: Clone + 'static,
    A: Default + 'static,
{
    GestureAdapter::new(name, document, signals).descriptor()
}
