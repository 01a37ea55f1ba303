// Integration tests for the history system.
//
// These tests exercise full workflows on the UndoJournal through its public
// API, simulating realistic editing sessions.

use std::cell::RefCell;
use std::rc::Rc;

use html_pad_mod_history::{
    HistoryConfig, HistoryState, NodePath, Record, RecordKind, Region, SelectionPoint,
    SelectionSnapshot, UndoJournal,
};

fn caret(path: &[usize], offset: usize) -> SelectionSnapshot {
    SelectionSnapshot::collapsed(SelectionPoint::text(NodePath::new(path.to_vec()), offset))
}

fn keystroke(text_before: &str, ch: char) -> Record {
    let offset = text_before.chars().count();
    let mut record = Record::new(RecordKind::Event, "insertText");
    record.region = Some(Region::span(NodePath::root(), 0, 0));
    record.html_before = Some(format!("<div>{text_before}</div>"));
    record.html_after = Some(format!("<div>{text_before}{ch}</div>"));
    record.selection_before = Some(caret(&[0], offset));
    record.selection_after = Some(caret(&[0], offset + 1));
    record
}

fn type_word(journal: &mut UndoJournal, start: &str, word: &str) {
    let mut text = start.to_string();
    for ch in word.chars() {
        journal.push(keystroke(&text, ch));
        journal.maybe_merge_consecutive();
        text.push(ch);
    }
}

// ── Typing sessions ────────────────────────────────────────────────────

#[test]
fn test_typing_a_word_is_one_step() {
    let mut journal = UndoJournal::default();
    type_word(&mut journal, "", "hello");

    assert_eq!(journal.len(), 1);
    let record = journal.undo().expect("undo");
    assert_eq!(record.html_before.as_deref(), Some("<div></div>"));
    assert_eq!(record.html_after.as_deref(), Some("<div>hello</div>"));
    assert_eq!(record.selection_before, Some(caret(&[0], 0)));
    assert_eq!(record.selection_after, Some(caret(&[0], 5)));
    assert!(!journal.can_undo());
}

#[test]
fn test_interrupted_typing_makes_separate_steps() {
    let mut journal = UndoJournal::default();
    type_word(&mut journal, "", "ab");

    let mut attr = Record::new(RecordKind::Custom, "setAttribute::align");
    attr.selection_before = Some(caret(&[0], 2));
    attr.selection_after = Some(caret(&[0], 2));
    journal.push(attr);
    journal.maybe_merge_consecutive();

    type_word(&mut journal, "ab", "cd");

    assert_eq!(journal.len(), 3);
    assert_eq!(
        journal.undo().expect("undo").html_after.as_deref(),
        Some("<div>abcd</div>")
    );
    assert_eq!(
        journal.undo().expect("undo").op_type,
        "setAttribute::align"
    );
    assert_eq!(
        journal.undo().expect("undo").html_after.as_deref(),
        Some("<div>ab</div>")
    );
}

// ── Branching ──────────────────────────────────────────────────────────

#[test]
fn test_new_edit_after_undo_abandons_branch() {
    let mut journal = UndoJournal::default();
    for op in ["one", "two", "three"] {
        journal.push(Record::new(RecordKind::Custom, op));
    }
    journal.undo();
    journal.undo();
    journal.push(Record::new(RecordKind::Custom, "four"));

    assert!(journal.redo().is_none());
    let mut ops = Vec::new();
    while let Some(record) = journal.undo() {
        ops.push(record.op_type);
    }
    assert_eq!(ops, vec!["four", "one"]);

    // Everything undone is redoable again in order
    assert_eq!(journal.redo().expect("redo").op_type, "one");
    assert_eq!(journal.redo().expect("redo").op_type, "four");
    assert!(journal.redo().is_none());
}

// ── Capacity ───────────────────────────────────────────────────────────

#[test]
fn test_bounded_history_keeps_newest() {
    let mut journal = UndoJournal::new(HistoryConfig::with_capacity(10));
    for i in 0..25 {
        journal.push(Record::new(RecordKind::Custom, format!("op{i}")));
    }
    assert_eq!(journal.undo_depth(), 9);

    let mut count = 0;
    let mut last = String::new();
    while let Some(record) = journal.undo() {
        count += 1;
        last = record.op_type;
    }
    assert_eq!(count, 9);
    assert_eq!(last, "op16");
}

// ── Groups ─────────────────────────────────────────────────────────────

#[test]
fn test_group_of_popped_records() {
    let mut journal = UndoJournal::default();
    type_word(&mut journal, "", "x");
    let mut paragraph = Record::new(RecordKind::Event, "insertParagraph");
    paragraph.selection_before = Some(caret(&[0], 1));
    paragraph.selection_after = Some(caret(&[1], 0));
    journal.push(paragraph);

    let mut popped = vec![
        journal.undo().expect("undo"),
        journal.undo().expect("undo"),
    ];
    popped.reverse();
    journal.push(Record::group("insertParagraph::withFormat", popped));

    assert_eq!(journal.len(), 1);
    let group = journal.undo().expect("undo");
    assert_eq!(group.kind, RecordKind::Group);
    assert_eq!(group.records[0].op_type, "insertText");
    assert_eq!(group.records[1].op_type, "insertParagraph");
    assert_eq!(group.selection_before, Some(caret(&[0], 0)));
    assert_eq!(group.selection_after, Some(caret(&[1], 0)));
}

// ── Notifications ──────────────────────────────────────────────────────

#[test]
fn test_listener_tracks_menu_state() {
    let last: Rc<RefCell<Option<HistoryState>>> = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&last);
    let mut journal = UndoJournal::default();
    journal.subscribe(Box::new(move |state| {
        *sink.borrow_mut() = Some(state.clone());
    }));

    journal.push(Record::new(RecordKind::Custom, "bold"));
    journal.undo();
    let state = last.borrow().clone().expect("notified");
    assert!(!state.can_undo);
    assert!(state.can_redo);
    assert_eq!(state.redo_op_type.as_deref(), Some("bold"));

    journal.clear();
    let state = last.borrow().clone().expect("notified");
    assert_eq!(state, HistoryState::default());
}

// ── Selection strings ──────────────────────────────────────────────────

#[test]
fn test_selection_string_survives_round_trip() {
    let snapshot = SelectionSnapshot {
        anchor: SelectionPoint::text(NodePath::new(vec![3, 1]), 12),
        focus: Some(SelectionPoint::element(NodePath::new(vec![4]), 2)),
    };
    let encoded = snapshot.to_string();
    let decoded: SelectionSnapshot = encoded.parse().expect("parse");
    assert_eq!(decoded, snapshot);
}
