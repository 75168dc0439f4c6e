use core_config::Config;
use core_events::{FocusTarget, KeyCode, KeyEvent, KeyModifiers};
use core_model::{Block, Edge, EditorDocument, EditorError, EditorModel, ResizeHandle, names};
use pretty_assertions::assert_eq;

fn model(blocks: Vec<Block>) -> EditorModel {
    EditorModel::new(EditorDocument::default().with_blocks(blocks), &Config::default()).unwrap()
}

fn keys(m: &EditorModel) -> Vec<String> {
    m.document_ref()
        .blocks
        .iter()
        .map(|b| b.component_key.clone())
        .collect()
}

#[test]
fn delete_focused_then_undo_redo() {
    let m = model(vec![
        Block::new("A", 0.0, 0.0).focused(),
        Block::new("B", 0.0, 0.0),
    ]);
    m.delete().unwrap();
    assert_eq!(keys(&m), vec!["B"]);
    m.undo().unwrap();
    assert_eq!(keys(&m), vec!["A", "B"]);
    m.redo().unwrap();
    assert_eq!(keys(&m), vec!["B"]);
    assert_eq!(m.commander().cursor(), 0);
}

#[test]
fn delete_key_respects_focus_target() {
    let mut m = model(vec![Block::new("A", 0.0, 0.0).focused()]);
    m.set_focus(FocusTarget::Editable);
    let outcome = m.handle_key(&KeyEvent::plain(KeyCode::Backspace)).unwrap();
    assert!(!outcome.prevents_default());
    assert_eq!(keys(&m), vec!["A"]);

    m.set_focus(FocusTarget::Body);
    assert!(m.handle_key(&KeyEvent::plain(KeyCode::Backspace)).unwrap().prevents_default());
    assert!(keys(&m).is_empty());

    let undo = KeyEvent::new(KeyCode::Char('z'), KeyModifiers::CTRL);
    m.handle_key(&undo).unwrap();
    assert_eq!(keys(&m), vec!["A"]);
}

#[test]
fn pointer_drag_is_one_history_entry() {
    let mut m = model(vec![
        Block::new("A", 0.0, 0.0),
        Block::new("B", 100.0, 100.0),
    ]);
    m.pointer_down(0, 0.0, 0.0, false).unwrap();
    for step in 1..=5 {
        let d = f64::from(step) * 10.0;
        m.pointer_move(d, d, false).unwrap();
    }
    m.pointer_up().unwrap();

    let a = m.document().blocks[0].clone();
    assert_eq!((a.left, a.top), (50.0, 50.0));
    assert_eq!(m.commander().history_labels(), vec![names::DRAG]);

    m.undo().unwrap();
    let a = m.document().blocks[0].clone();
    assert_eq!((a.left, a.top), (0.0, 0.0));
    // The selection made by the press is part of the pre-drag snapshot.
    assert!(a.focus);
    m.redo().unwrap();
    assert_eq!(m.document().blocks[0].left, 50.0);
}

#[test]
fn multi_selection_drags_together() {
    let mut m = model(vec![
        Block::new("A", 0.0, 0.0).focused(),
        Block::new("B", 10.0, 20.0).focused(),
        Block::new("C", 5.0, 5.0),
    ]);
    m.pointer_down(1, 0.0, 0.0, false).unwrap();
    m.pointer_move(7.0, 3.0, false).unwrap();
    m.pointer_up().unwrap();
    let positions: Vec<(f64, f64)> = m.document().blocks.iter().map(|b| (b.left, b.top)).collect();
    assert_eq!(positions, vec![(7.0, 3.0), (17.0, 23.0), (5.0, 5.0)]);
}

#[test]
fn menu_drop_is_undoable_as_a_drag() {
    let mut m = model(vec![]);
    m.menu_drag_start("button").unwrap();
    assert!(m.drop_at(120.0, 40.0));
    m.menu_drag_end().unwrap();

    let dropped = m.document().blocks[0].clone();
    assert_eq!(dropped.component_key, "button");
    assert_eq!((dropped.left, dropped.top), (120.0, 40.0));
    assert!(dropped.adjust_position);
    assert_eq!(m.commander().history_labels(), vec![names::DRAG]);

    m.undo().unwrap();
    assert!(keys(&m).is_empty());
}

#[test]
fn place_top_and_bottom_round_trip_through_history() {
    let m = model(vec![
        Block::new("A", 0.0, 0.0).with_z(1),
        Block::new("B", 0.0, 0.0).with_z(0).focused(),
    ]);
    m.place_top().unwrap();
    assert_eq!(m.document().blocks[1].z_index, 2);
    m.place_bottom().unwrap();
    let z: Vec<i32> = m.document().blocks.iter().map(|b| b.z_index).collect();
    assert_eq!(z, vec![1, 0]);
    m.undo().unwrap();
    assert_eq!(m.document().blocks[1].z_index, 2);
    m.undo().unwrap();
    assert_eq!(m.document().blocks[1].z_index, 0);
}

#[test]
fn import_is_undoable_and_export_round_trips() {
    let m = model(vec![Block::new("old", 0.0, 0.0)]);
    m.import_json(
        r#"{"container":{"width":320,"height":200},"blocks":[{"componentKey":"text","top":4,"left":8}]}"#,
    )
    .unwrap();
    assert_eq!(keys(&m), vec!["text"]);
    assert_eq!(m.document().container.width, 320);

    let exported = m.export_json().unwrap();
    assert_eq!(EditorDocument::from_json(&exported).unwrap(), m.document());

    m.undo().unwrap();
    assert_eq!(keys(&m), vec!["old"]);
    assert_eq!(m.document().container.width, 800);
}

#[test]
fn bad_import_leaves_history_untouched() {
    let m = model(vec![]);
    let err = m.import_json("not json").unwrap_err();
    assert!(matches!(err, EditorError::Document(_)));
    assert_eq!(m.commander().history_len(), 0);
}

#[test]
fn update_block_replaces_one_block() {
    let m = model(vec![Block::new("A", 0.0, 0.0), Block::new("B", 0.0, 0.0)]);
    m.update_block(1, Block::new("B2", 3.0, 4.0)).unwrap();
    assert_eq!(keys(&m), vec!["A", "B2"]);
    assert!(matches!(m.update_block(5, Block::new("X", 0.0, 0.0)), Err(EditorError::Document(_))));
    m.undo().unwrap();
    assert_eq!(keys(&m), vec!["A", "B"]);
}

#[test]
fn clear_after_undo_drops_the_redo_tail() {
    let m = model(vec![Block::new("A", 0.0, 0.0).focused(), Block::new("B", 0.0, 0.0)]);
    m.delete().unwrap();
    m.undo().unwrap();
    m.clear().unwrap();
    assert_eq!(m.commander().history_labels(), vec![names::CLEAR]);
    assert!(!m.commander().can_redo());
}

#[test]
fn dropping_the_model_detaches_gesture_listeners() {
    let m = model(vec![]);
    let signals = m.signals().clone();
    assert_eq!(signals.end.len(), 1);
    drop(m);
    assert!(signals.end.is_empty());
}

fn sized(key: &str, left: f64, top: f64, width: f64, height: f64) -> Block {
    let mut block = Block::new(key, left, top);
    block.width = width;
    block.height = height;
    block
}

fn geometry(m: &EditorModel, index: usize) -> (f64, f64, f64, f64) {
    let b = m.document().blocks[index].clone();
    (b.left, b.top, b.width, b.height)
}

#[test]
fn resize_is_one_drag_entry_and_undo_restores_geometry() {
    let mut m = model(vec![sized("A", 10.0, 20.0, 100.0, 50.0)]);
    let top_left = ResizeHandle::new(Edge::Start, Edge::Start);
    m.resize_down(0, top_left, 10.0, 20.0).unwrap();
    m.resize_move(5.0, 18.0).unwrap();
    m.resize_move(0.0, 10.0).unwrap();
    m.resize_up().unwrap();

    assert_eq!(geometry(&m, 0), (0.0, 10.0, 110.0, 60.0));
    assert!(m.document().blocks[0].has_resize);
    assert_eq!(m.commander().history_labels(), vec![names::DRAG]);

    m.undo().unwrap();
    assert_eq!(geometry(&m, 0), (10.0, 20.0, 100.0, 50.0));
    assert!(!m.document().blocks[0].has_resize);
    m.redo().unwrap();
    assert_eq!(geometry(&m, 0), (0.0, 10.0, 110.0, 60.0));
}

#[test]
fn resize_without_move_records_nothing() {
    let mut m = model(vec![sized("A", 0.0, 0.0, 10.0, 10.0)]);
    m.resize_down(0, ResizeHandle::new(Edge::End, Edge::Center), 10.0, 5.0)
        .unwrap();
    m.resize_up().unwrap();
    assert_eq!(m.commander().history_len(), 0);
    assert!(matches!(
        m.resize_down(4, ResizeHandle::new(Edge::End, Edge::End), 0.0, 0.0),
        Err(EditorError::Document(_))
    ));
}

#[test]
fn place_top_on_extreme_z_index_fails_without_recording() {
    let m = model(vec![]);
    m.import_json(
        r#"{"blocks":[{"componentKey":"a","zIndex":2147483647},{"componentKey":"b","focus":true}]}"#,
    )
    .unwrap();
    let before = m.document();
    let err = m.place_top().unwrap_err();
    assert!(matches!(err, EditorError::Command(_)));
    assert_eq!(m.document(), before);
    assert_eq!(m.commander().history_labels(), vec![names::UPDATE_DOCUMENT]);
}
