#[path = "common/mod.rs"]
mod common;

use common::*;
use rcex::{last_checkpoint, OutputRecord, OutputSink};
use std::fs;

const HEADER: &str = "\"timestamp\",\"comment_id\",\"comment_body\",\"parent_text\"\n";

/// Absent, empty and header-only files all mean "start from the beginning".
#[test]
fn no_checkpoint_cases() {
    let dir = scratch();
    let out = dir.path().join("conversations.csv");
    assert_eq!(last_checkpoint(&out), None);

    fs::write(&out, "").unwrap();
    assert_eq!(last_checkpoint(&out), None);

    fs::write(&out, HEADER).unwrap();
    assert_eq!(last_checkpoint(&out), None);
}

/// The id of the final row wins, even when earlier rows span several lines.
#[test]
fn last_row_id_is_the_checkpoint() {
    let dir = scratch();
    let out = dir.path().join("conversations.csv");
    fs::write(
        &out,
        format!(
            "{HEADER}\"d1\",\"c1\",\"multi\nline, with \"\"quotes\"\"\",\"p\"\n\"d2\",\"c2\",\"b\",\"p\"\n"
        ),
    )
    .unwrap();
    assert_eq!(last_checkpoint(&out).as_deref(), Some("c2"));
}

/// A directory where the output file should be is not a checkpoint.
#[test]
fn unreadable_output_degrades_to_none() {
    let dir = scratch();
    let out = dir.path().join("conversations.csv");
    fs::create_dir_all(&out).unwrap();
    assert_eq!(last_checkpoint(&out), None);
}

/// Rows written through the sink are found again by the locator,
/// and reopening the sink does not repeat the header.
#[test]
fn sink_rows_round_trip_through_locator() {
    let dir = scratch();
    let out = dir.path().join("conversations.csv");

    let mut sink = OutputSink::open(&out).unwrap();
    for id in ["a", "b"] {
        sink.append(&OutputRecord {
            timestamp: "t".into(),
            comment_id: id.into(),
            comment_body: "body".into(),
            parent_text: "parent".into(),
        })
        .unwrap();
    }
    assert_eq!(sink.rows_appended(), 2);
    sink.finish().unwrap();
    assert_eq!(last_checkpoint(&out).as_deref(), Some("b"));

    let mut sink = OutputSink::open(&out).unwrap();
    sink.append(&OutputRecord {
        timestamp: "t".into(),
        comment_id: "c".into(),
        comment_body: "body".into(),
        parent_text: "parent".into(),
    })
    .unwrap();
    sink.finish().unwrap();

    assert_eq!(output_ids(&out), vec!["a", "b", "c"]);
    let text = fs::read_to_string(&out).unwrap();
    assert_eq!(text.lines().next(), HEADER.lines().next());
    assert_eq!(text.matches("comment_id").count(), 1);
}
