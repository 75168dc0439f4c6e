//! The visual-editor document: a fixed-size container holding positioned
//! component blocks. Serialized as camelCase JSON so exported files load
//! back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid document json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("block index {index} out of range (document has {len} blocks)")]
    BlockIndex { index: usize, len: usize },
    #[error("z-index out of range while reordering blocks")]
    ZIndexOverflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub width: u32,
    pub height: u32,
}

impl Default for Container {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub component_key: String,
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub z_index: i32,
    #[serde(default)]
    pub focus: bool,
    /// Set on blocks dropped from the menu; the renderer centers them on the
    /// drop point once their size is known, then clears the flag.
    #[serde(default)]
    pub adjust_position: bool,
    /// Set once the user resized the block; the renderer then keeps the
    /// stored size instead of the component's natural one.
    #[serde(default)]
    pub has_resize: bool,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub props: BTreeMap<String, Value>,
}

impl Block {
    pub fn new(component_key: impl Into<String>, left: f64, top: f64) -> Self {
        Self {
            component_key: component_key.into(),
            top,
            left,
            width: 0.0,
            height: 0.0,
            z_index: 0,
            focus: false,
            adjust_position: false,
            has_resize: false,
            props: BTreeMap::new(),
        }
    }

    pub fn focused(mut self) -> Self {
        self.focus = true;
        self
    }

    pub fn with_z(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }
}

/// Blocks split by selection state, in document order.
#[derive(Debug, Default)]
pub struct FocusPartition<'a> {
    pub focused: Vec<&'a Block>,
    pub unfocused: Vec<&'a Block>,
}

impl FocusPartition<'_> {
    pub fn max_unfocused_z(&self) -> Option<i32> {
        self.unfocused.iter().map(|b| b.z_index).max()
    }

    pub fn min_unfocused_z(&self) -> Option<i32> {
        self.unfocused.iter().map(|b| b.z_index).min()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorDocument {
    #[serde(default)]
    pub container: Container,
    #[serde(default)]
    pub blocks: Vec<Block>,
}

impl EditorDocument {
    pub fn new(container: Container) -> Self {
        Self {
            container,
            blocks: Vec::new(),
        }
    }

    pub fn partition(&self) -> FocusPartition<'_> {
        let mut partition = FocusPartition::default();
        for block in &self.blocks {
            if block.focus {
                partition.focused.push(block);
            } else {
                partition.unfocused.push(block);
            }
        }
        partition
    }

    pub fn focused_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.focus).count()
    }

    /// Same container, new block list.
    pub fn with_blocks(&self, blocks: Vec<Block>) -> Self {
        Self {
            container: self.container,
            blocks,
        }
    }

    pub fn block(&self, index: usize) -> Result<&Block, DocumentError> {
        self.blocks.get(index).ok_or(DocumentError::BlockIndex {
            index,
            len: self.blocks.len(),
        })
    }

    pub fn from_json(text: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn json_uses_camel_case_and_fills_defaults() {
        let doc = EditorDocument::from_json(
            r#"{"container":{"width":500,"height":400},"blocks":[{"componentKey":"button","top":10,"left":20,"zIndex":3}]}"#,
        )
        .unwrap();
        assert_eq!(doc.container, Container { width: 500, height: 400 });
        assert_eq!(doc.blocks[0], Block::new("button", 20.0, 10.0).with_z(3));

        let text = doc.to_json_pretty().unwrap();
        assert!(text.contains("\"componentKey\": \"button\""));
        assert!(text.contains("\"adjustPosition\": false"));
        assert!(text.contains("\"hasResize\": false"));
        assert!(!text.contains("props"));
        assert_eq!(EditorDocument::from_json(&text).unwrap(), doc);
    }

    #[test]
    fn missing_container_uses_default_size() {
        let doc = EditorDocument::from_json(r#"{"blocks":[]}"#).unwrap();
        assert_eq!(doc.container, Container::default());
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = EditorDocument::from_json("{\"blocks\": [").unwrap_err();
        assert!(matches!(err, DocumentError::Json(_)));
    }

    #[test]
    fn partition_keeps_document_order() {
        let doc = EditorDocument::default().with_blocks(vec![
            Block::new("a", 0.0, 0.0).focused(),
            Block::new("b", 0.0, 0.0).with_z(4),
            Block::new("c", 0.0, 0.0).focused(),
            Block::new("d", 0.0, 0.0).with_z(-2),
        ]);
        let partition = doc.partition();
        let keys = |v: &[&Block]| v.iter().map(|b| b.component_key.clone()).collect::<Vec<_>>();
        assert_eq!(keys(&partition.focused), vec!["a", "c"]);
        assert_eq!(keys(&partition.unfocused), vec!["b", "d"]);
        assert_eq!(partition.max_unfocused_z(), Some(4));
        assert_eq!(partition.min_unfocused_z(), Some(-2));
        assert!(matches!(doc.block(9), Err(DocumentError::BlockIndex { index: 9, len: 4 })));
    }
}
