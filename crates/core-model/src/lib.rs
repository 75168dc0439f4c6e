//! Headless visual-editor view.
//!
//! `EditorModel` plays the part of the embedding view: it owns the document
//! snapshot, builds a command session over it, and translates pointer,
//! menu-drag and keyboard input into document mutations, gesture signals and
//! command dispatches. A renderer (or the CLI script runner) drives it.
//!
//! Selection changes and intermediate drag positions are written straight to
//! the document; they are not history entries. A drag becomes one `drag`
//! entry through the gesture signals.

mod commands;
mod document;
mod resize;

pub use commands::{EditorArgs, names, place_bottom, place_top, register_editor_commands};
pub use document::{Block, Container, DocumentError, EditorDocument, FocusPartition};
pub use resize::{Edge, EdgeParseError, ResizeHandle};

use core_commands::{CommandError, Commander, HistoryConfig, KeyOutcome, SharedDocument};
use core_config::Config;
use core_events::{FocusTarget, GestureSignals, KeyEvent};
use std::cell::Ref;
use tracing::{debug, trace, warn};

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    /// A gesture listener failed while a signal was being raised.
    #[error("gesture listener failed")]
    Signal(#[source] anyhow::Error),
}

/// In-progress pointer drag of the focused blocks.
#[derive(Debug)]
struct PointerDrag {
    start_x: f64,
    start_y: f64,
    /// (block index, left, top) at press time.
    origins: Vec<(usize, f64, f64)>,
    /// Set once the first move raised the gesture-start signal.
    moved: bool,
}

/// In-progress resize of one block through one of its handles.
#[derive(Debug)]
struct ResizeDrag {
    index: usize,
    handle: ResizeHandle,
    start_x: f64,
    start_y: f64,
    origin: resize::Origin,
    moved: bool,
}

#[derive(Debug)]
struct MenuDrag {
    component_key: String,
}

pub struct EditorModel {
    document: SharedDocument<EditorDocument>,
    commander: Commander<EditorArgs>,
    signals: GestureSignals,
    focus: FocusTarget,
    pointer: Option<PointerDrag>,
    resize: Option<ResizeDrag>,
    menu: Option<MenuDrag>,
}

impl std::fmt::Debug for EditorModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorModel")
            .field("blocks", &self.document.borrow().blocks.len())
            .field("focus", &self.focus)
            .field("commander", &self.commander)
            .finish()
    }
}

impl EditorModel {
    /// Build a session over `document`: register the editor commands, apply
    /// keyboard overrides from `config`, and attach.
    pub fn new(document: EditorDocument, config: &Config) -> Result<Self, EditorError> {
        let document = SharedDocument::new(document);
        let signals = GestureSignals::new();
        let commander = Commander::new(HistoryConfig::new(config.history_max_depth()));
        register_editor_commands(&commander, &document.access(), &signals);
        for (name, combos) in config.keyboard_overrides() {
            match commander.rebind(name, combos.iter().cloned()) {
                Ok(()) => debug!(target: "model", command = name, ?combos, "keyboard_override"),
                Err(err) => warn!(target: "model", command = name, %err, "keyboard_override_ignored"),
            }
        }
        commander.init()?;
        Ok(Self {
            document,
            commander,
            signals,
            focus: FocusTarget::Body,
            pointer: None,
            resize: None,
            menu: None,
        })
    }

    /// Empty document sized from `config`.
    pub fn empty(config: &Config) -> Result<Self, EditorError> {
        let (width, height) = config.container_size();
        Self::new(EditorDocument::new(Container { width, height }), config)
    }

    pub fn document(&self) -> EditorDocument {
        self.document.get()
    }

    pub fn document_ref(&self) -> Ref<'_, EditorDocument> {
        self.document.borrow()
    }

    pub fn commander(&self) -> &Commander<EditorArgs> {
        &self.commander
    }

    pub fn signals(&self) -> &GestureSignals {
        &self.signals
    }

    // ---------------------------------------------------------------------------------------------
    // Toolbar
    // ---------------------------------------------------------------------------------------------

    pub fn undo(&self) -> Result<(), EditorError> {
        Ok(self.commander.undo()?)
    }

    pub fn redo(&self) -> Result<(), EditorError> {
        Ok(self.commander.redo()?)
    }

    pub fn delete(&self) -> Result<(), EditorError> {
        Ok(self.commander.invoke(names::DELETE)?)
    }

    pub fn clear(&self) -> Result<(), EditorError> {
        Ok(self.commander.invoke(names::CLEAR)?)
    }

    pub fn place_top(&self) -> Result<(), EditorError> {
        Ok(self.commander.invoke(names::PLACE_TOP)?)
    }

    pub fn place_bottom(&self) -> Result<(), EditorError> {
        Ok(self.commander.invoke(names::PLACE_BOTTOM)?)
    }

    pub fn update_block(&self, index: usize, block: Block) -> Result<(), EditorError> {
        commands::check_block_index(&self.document.borrow(), index)?;
        Ok(self
            .commander
            .dispatch(names::UPDATE_BLOCK, EditorArgs::UpdateBlock { index, block })?)
    }

    /// Run any registered command by name with default arguments.
    pub fn run(&self, name: &str) -> Result<(), EditorError> {
        Ok(self.commander.invoke(name)?)
    }

    // ---------------------------------------------------------------------------------------------
    // Import / export
    // ---------------------------------------------------------------------------------------------

    /// Replace the document from JSON text. Undoable.
    pub fn import_json(&self, text: &str) -> Result<(), EditorError> {
        let document = EditorDocument::from_json(text)?;
        Ok(self
            .commander
            .dispatch(names::UPDATE_DOCUMENT, EditorArgs::ReplaceDocument(document))?)
    }

    pub fn export_json(&self) -> Result<String, EditorError> {
        Ok(self.document.borrow().to_json_pretty()?)
    }

    // ---------------------------------------------------------------------------------------------
    // Keyboard
    // ---------------------------------------------------------------------------------------------

    pub fn focus(&self) -> FocusTarget {
        self.focus
    }

    /// Record what holds keyboard focus in the host.
    pub fn set_focus(&mut self, focus: FocusTarget) {
        self.focus = focus;
    }

    pub fn handle_key(&self, event: &KeyEvent) -> Result<KeyOutcome, EditorError> {
        Ok(self.commander.handle_key(event, self.focus)?)
    }

    // ---------------------------------------------------------------------------------------------
    // Selection
    // ---------------------------------------------------------------------------------------------

    /// Click on a block. With shift, toggles it into or out of a multi-block
    /// selection (a lone selection is only ever extended). Without shift, an
    /// unfocused block becomes the sole selection and a focused one is left
    /// as is so the whole selection can be dragged.
    pub fn focus_block(&self, index: usize, shift: bool) -> Result<(), EditorError> {
        let mut next = self.document.get();
        next.block(index)?;
        if shift {
            if next.focused_count() <= 1 {
                next.blocks[index].focus = true;
            } else {
                next.blocks[index].focus = !next.blocks[index].focus;
            }
        } else if !next.blocks[index].focus {
            for (i, block) in next.blocks.iter_mut().enumerate() {
                block.focus = i == index;
            }
        } else {
            return Ok(());
        }
        trace!(target: "model", index, shift, focused = next.focused_count(), "focus_block");
        self.document.set(next);
        Ok(())
    }

    /// Click on empty container space. Clears the selection unless shift is held.
    pub fn focus_container(&self, shift: bool) {
        if shift || self.document.borrow().focused_count() == 0 {
            return;
        }
        let mut next = self.document.get();
        next.blocks.iter_mut().for_each(|b| b.focus = false);
        trace!(target: "model", "focus_cleared");
        self.document.set(next);
    }

    // ---------------------------------------------------------------------------------------------
    // Pointer drag
    // ---------------------------------------------------------------------------------------------

    /// Press on a block: apply the click selection and arm a drag of the
    /// resulting selection.
    pub fn pointer_down(&mut self, index: usize, x: f64, y: f64, shift: bool) -> Result<(), EditorError> {
        self.focus_block(index, shift)?;
        let origins = self
            .document
            .borrow()
            .blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.focus)
            .map(|(i, b)| (i, b.left, b.top))
            .collect();
        self.pointer = Some(PointerDrag {
            start_x: x,
            start_y: y,
            origins,
            moved: false,
        });
        Ok(())
    }

    /// Move the armed selection. Shift locks movement to the dominant axis.
    /// The first move raises gesture-start before anything is written.
    pub fn pointer_move(&mut self, x: f64, y: f64, shift: bool) -> Result<(), EditorError> {
        let Some(drag) = self.pointer.as_mut() else {
            return Ok(());
        };
        let (mut x, mut y) = (x, y);
        if shift {
            if (x - drag.start_x).abs() > (y - drag.start_y).abs() {
                y = drag.start_y;
            } else {
                x = drag.start_x;
            }
        }
        if !drag.moved {
            drag.moved = true;
            debug!(target: "model", blocks = drag.origins.len(), "pointer_drag_start");
            self.signals.start.emit().map_err(EditorError::Signal)?;
        }
        let (dx, dy) = (x - drag.start_x, y - drag.start_y);
        let mut next = self.document.get();
        for &(index, left, top) in &drag.origins {
            if let Some(block) = next.blocks.get_mut(index) {
                block.left = left + dx;
                block.top = top + dy;
            }
        }
        self.document.set(next);
        Ok(())
    }

    /// Release. Raises gesture-end only if the drag actually moved.
    pub fn pointer_up(&mut self) -> Result<(), EditorError> {
        let Some(drag) = self.pointer.take() else {
            return Ok(());
        };
        if drag.moved {
            debug!(target: "model", "pointer_drag_end");
            self.signals.end.emit().map_err(EditorError::Signal)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------------------------------
    // Resize
    // ---------------------------------------------------------------------------------------------

    /// Press on one of a block's resize handles. Selection is left alone.
    pub fn resize_down(&mut self, index: usize, handle: ResizeHandle, x: f64, y: f64) -> Result<(), EditorError> {
        let origin = resize::Origin::of(self.document.borrow().block(index)?);
        self.resize = Some(ResizeDrag {
            index,
            handle,
            start_x: x,
            start_y: y,
            origin,
            moved: false,
        });
        Ok(())
    }

    /// Move the pressed handle. The first move raises gesture-start before
    /// anything is written.
    pub fn resize_move(&mut self, x: f64, y: f64) -> Result<(), EditorError> {
        let Some(drag) = self.resize.as_mut() else {
            return Ok(());
        };
        if !drag.moved {
            drag.moved = true;
            debug!(target: "model", index = drag.index, horizontal = %drag.handle.horizontal, vertical = %drag.handle.vertical, "resize_start");
            self.signals.start.emit().map_err(EditorError::Signal)?;
        }
        let mut next = self.document.get();
        next.block(drag.index)?;
        resize::apply(
            &mut next.blocks[drag.index],
            drag.origin,
            drag.handle,
            x - drag.start_x,
            y - drag.start_y,
        );
        self.document.set(next);
        Ok(())
    }

    /// Release the handle. Raises gesture-end only if the resize moved.
    pub fn resize_up(&mut self) -> Result<(), EditorError> {
        let Some(drag) = self.resize.take() else {
            return Ok(());
        };
        if drag.moved {
            debug!(target: "model", index = drag.index, "resize_end");
            self.signals.end.emit().map_err(EditorError::Signal)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------------------------------
    // Menu drag and drop
    // ---------------------------------------------------------------------------------------------

    /// Start dragging a component out of the menu.
    pub fn menu_drag_start(&mut self, component_key: impl Into<String>) -> Result<(), EditorError> {
        let component_key = component_key.into();
        debug!(target: "model", component = %component_key, "menu_drag_start");
        self.menu = Some(MenuDrag { component_key });
        self.signals.start.emit().map_err(EditorError::Signal)
    }

    /// Drop the dragged component at container coordinates. Returns false
    /// when no menu drag is in progress.
    pub fn drop_at(&self, x: f64, y: f64) -> bool {
        let Some(menu) = self.menu.as_ref() else {
            trace!(target: "model", "drop_without_menu_drag");
            return false;
        };
        let mut next = self.document.get();
        let mut block = Block::new(menu.component_key.clone(), x, y);
        block.adjust_position = true;
        next.blocks.push(block);
        debug!(target: "model", component = %menu.component_key, x, y, "menu_drop");
        self.document.set(next);
        true
    }

    /// End the menu drag, dropped or not.
    pub fn menu_drag_end(&mut self) -> Result<(), EditorError> {
        if self.menu.take().is_none() {
            return Ok(());
        }
        debug!(target: "model", "menu_drag_end");
        self.signals.end.emit().map_err(EditorError::Signal)
    }
}

impl Drop for EditorModel {
    fn drop(&mut self) {
        self.commander.teardown();
    }
}
