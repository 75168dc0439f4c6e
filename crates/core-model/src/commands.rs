//! The editor's domain commands.
//!
//! Every effect writes a full replacement snapshot through the document
//! accessor. Block-list commands capture the block lists on both sides and
//! keep whatever container is current when they run.

use crate::document::{Block, DocumentError, EditorDocument};
use anyhow::{Context, anyhow};
use core_commands::{Action, CommandDescriptor, Commander, DocumentAccess, Execution, gesture_command};
use core_events::GestureSignals;
use tracing::debug;

pub mod names {
    pub const DELETE: &str = "delete";
    pub const CLEAR: &str = "clear";
    pub const DRAG: &str = "drag";
    pub const PLACE_TOP: &str = "place-top";
    pub const PLACE_BOTTOM: &str = "place-bottom";
    pub const UPDATE_BLOCK: &str = "update-block";
    pub const UPDATE_DOCUMENT: &str = "update-document";
}

/// Arguments accepted by editor commands. Keyboard and gesture triggers pass
/// `EditorArgs::None`.
#[derive(Debug, Clone, Default)]
pub enum EditorArgs {
    #[default]
    None,
    UpdateBlock { index: usize, block: Block },
    ReplaceDocument(EditorDocument),
}

type Access = DocumentAccess<EditorDocument>;

/// Action writing `blocks` into the current document.
fn write_blocks(access: &Access, blocks: Vec<Block>) -> Action {
    let access = access.clone();
    Box::new(move || {
        let current = access.snapshot();
        access.replace(current.with_blocks(blocks.clone()));
        Ok(())
    })
}

fn block_swap(access: &Access, before: Vec<Block>, after: Vec<Block>) -> Execution {
    Execution::from_actions(Some(write_blocks(access, before)), Some(write_blocks(access, after)))
}

/// Register every editor command on `commander`.
pub fn register_editor_commands(
    commander: &Commander<EditorArgs>,
    access: &Access,
    signals: &GestureSignals,
) {
    let a = access.clone();
    commander.register(
        CommandDescriptor::tracked(names::DELETE, move |_| {
            let before = a.snapshot();
            let after: Vec<Block> = before.blocks.iter().filter(|b| !b.focus).cloned().collect();
            debug!(target: "model", removed = before.blocks.len() - after.len(), "delete_focused");
            Ok(block_swap(&a, before.blocks, after))
        })
        .keyboard(["delete", "backspace", "ctrl+d"]),
    );

    let a = access.clone();
    commander.register(CommandDescriptor::tracked(names::CLEAR, move |_| {
        let before = a.snapshot();
        Ok(block_swap(&a, before.blocks, Vec::new()))
    }));

    commander.register(gesture_command(names::DRAG, access.clone(), signals));

    let a = access.clone();
    commander.register(
        CommandDescriptor::tracked(names::PLACE_TOP, move |_| {
            let before = a.snapshot();
            let after = place_top(&before)?;
            Ok(block_swap(&a, before.blocks, after))
        })
        .keyboard(["ctrl+up"]),
    );

    let a = access.clone();
    commander.register(
        CommandDescriptor::tracked(names::PLACE_BOTTOM, move |_| {
            let before = a.snapshot();
            let after = place_bottom(&before)?;
            Ok(block_swap(&a, before.blocks, after))
        })
        .keyboard(["ctrl+down"]),
    );

    let a = access.clone();
    commander.register(CommandDescriptor::tracked(names::UPDATE_BLOCK, move |args: EditorArgs| {
        let EditorArgs::UpdateBlock { index, block } = args else {
            return Err(anyhow!("`{}` expects a block index and replacement", names::UPDATE_BLOCK));
        };
        let before = a.snapshot();
        before
            .block(index)
            .with_context(|| format!("`{}` target", names::UPDATE_BLOCK))?;
        let mut after = before.blocks.clone();
        after[index] = block;
        Ok(block_swap(&a, before.blocks, after))
    }));

    let a = access.clone();
    commander.register(CommandDescriptor::tracked(names::UPDATE_DOCUMENT, move |args: EditorArgs| {
        let EditorArgs::ReplaceDocument(document) = args else {
            return Err(anyhow!("`{}` expects a document", names::UPDATE_DOCUMENT));
        };
        let before = a.snapshot();
        debug!(target: "model", blocks = document.blocks.len(), "document_replaced");
        Ok(Execution::from_actions(Some(a.restore(before)), Some(a.restore(document))))
    }));
}

/// Focused blocks move above every unfocused one. No-op without unfocused blocks.
pub fn place_top(document: &EditorDocument) -> Result<Vec<Block>, DocumentError> {
    let mut blocks = document.blocks.clone();
    if let Some(max) = document.partition().max_unfocused_z() {
        let target = max.checked_add(1).ok_or(DocumentError::ZIndexOverflow)?;
        for block in blocks.iter_mut().filter(|b| b.focus) {
            block.z_index = target;
        }
    }
    Ok(blocks)
}

/// Focused blocks move below every unfocused one. z-indexes stay
/// non-negative: when the target would be negative, unfocused blocks shift up
/// and the focused ones take 0.
pub fn place_bottom(document: &EditorDocument) -> Result<Vec<Block>, DocumentError> {
    let mut blocks = document.blocks.clone();
    let Some(min) = document.partition().min_unfocused_z() else {
        return Ok(blocks);
    };
    let mut target = min.checked_sub(1).ok_or(DocumentError::ZIndexOverflow)?;
    if target < 0 {
        let shift = target.checked_neg().ok_or(DocumentError::ZIndexOverflow)?;
        for block in blocks.iter_mut().filter(|b| !b.focus) {
            block.z_index = block
                .z_index
                .checked_add(shift)
                .ok_or(DocumentError::ZIndexOverflow)?;
        }
        target = 0;
    }
    for block in blocks.iter_mut().filter(|b| b.focus) {
        block.z_index = target;
    }
    Ok(blocks)
}

/// Validate an update before dispatching it; gives a typed error instead of
/// the command's wrapped one.
pub fn check_block_index(document: &EditorDocument, index: usize) -> Result<(), DocumentError> {
    document.block(index).map(|_| ())
}
