//! Resize handles and the geometry of a resize drag.

use crate::document::Block;
use std::fmt;
use std::str::FromStr;

/// Position of a handle along one axis.
///
/// `Start` moves the top/left edge (the block grows as the pointer moves
/// away from it), `End` moves the bottom/right edge, `Center` leaves that
/// axis alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    Center,
    End,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown resize edge `{0}` (expected start, center or end)")]
pub struct EdgeParseError(pub String);

impl FromStr for Edge {
    type Err = EdgeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "start" | "left" | "top" => Ok(Edge::Start),
            "center" | "middle" => Ok(Edge::Center),
            "end" | "right" | "bottom" => Ok(Edge::End),
            _ => Err(EdgeParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Edge::Start => "start",
            Edge::Center => "center",
            Edge::End => "end",
        })
    }
}

/// One of the eight handles around a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeHandle {
    pub horizontal: Edge,
    pub vertical: Edge,
}

impl ResizeHandle {
    pub const fn new(horizontal: Edge, vertical: Edge) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }
}

/// Block geometry captured when the handle was pressed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Origin {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Origin {
    pub fn of(block: &Block) -> Self {
        Self {
            left: block.left,
            top: block.top,
            width: block.width,
            height: block.height,
        }
    }
}

/// Write the geometry for a pointer offset of `(dx, dy)` from the press point.
pub(crate) fn apply(block: &mut Block, origin: Origin, handle: ResizeHandle, dx: f64, dy: f64) {
    let (mut dx, mut dy) = (dx, dy);
    if handle.horizontal == Edge::Center {
        dx = 0.0;
    }
    if handle.vertical == Edge::Center {
        dy = 0.0;
    }
    if handle.vertical == Edge::Start {
        dy = -dy;
        block.top = origin.top - dy;
    }
    if handle.horizontal == Edge::Start {
        dx = -dx;
        block.left = origin.left - dx;
    }
    block.width = origin.width + dx;
    block.height = origin.height + dy;
    block.has_resize = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized() -> Block {
        let mut block = Block::new("img", 100.0, 50.0);
        block.width = 40.0;
        block.height = 30.0;
        block
    }

    fn geometry(b: &Block) -> (f64, f64, f64, f64) {
        (b.left, b.top, b.width, b.height)
    }

    #[test]
    fn end_handles_grow_toward_the_pointer() {
        let mut b = sized();
        let origin = Origin::of(&b);
        apply(&mut b, origin, ResizeHandle::new(Edge::End, Edge::End), 10.0, 5.0);
        assert_eq!(geometry(&b), (100.0, 50.0, 50.0, 35.0));
        assert!(b.has_resize);
    }

    #[test]
    fn start_handles_move_the_edge_and_keep_the_far_side() {
        let mut b = sized();
        let origin = Origin::of(&b);
        apply(&mut b, origin, ResizeHandle::new(Edge::Start, Edge::Start), -10.0, 8.0);
        assert_eq!(geometry(&b), (90.0, 58.0, 50.0, 22.0));
    }

    #[test]
    fn center_locks_its_axis() {
        let mut b = sized();
        let origin = Origin::of(&b);
        apply(&mut b, origin, ResizeHandle::new(Edge::Center, Edge::End), 25.0, 5.0);
        assert_eq!(geometry(&b), (100.0, 50.0, 40.0, 35.0));
    }

    #[test]
    fn edge_names_parse() {
        assert_eq!("Start".parse::<Edge>(), Ok(Edge::Start));
        assert_eq!("bottom".parse::<Edge>(), Ok(Edge::End));
        assert_eq!("middle".parse::<Edge>(), Ok(Edge::Center));
        assert!("diagonal".parse::<Edge>().is_err());
    }
}
