//! Report rendering: RunResult → the text printed at the end of a run.

use std::path::PathBuf;

use chrono::{Duration, Utc};
use uuid::Uuid;

use harvest_common::ItemReference;
use comment_harvest::pipeline::{GroupResult, RunResult};

fn run_result(groups: Vec<GroupResult>) -> RunResult {
    let finished_at = Utc::now();
    RunResult {
        run_id: Uuid::new_v4(),
        started_at: finished_at - Duration::seconds(42),
        finished_at,
        total_items: 4,
        succeeded: 3,
        failed: 1,
        total_records: 120,
        failed_items: vec![ItemReference::from_url("https://youtu.be/dead1", 4, "cats")],
        item_outputs: vec![PathBuf::from("out/comments/a_A.csv")],
        log_file: PathBuf::from("out/logs/download_log_20260101_000000.txt"),
        groups,
    }
}

#[test]
fn flat_report_shows_totals_and_failures() {
    let text = run_result(Vec::new()).to_string();

    assert!(text.contains("=== Comment Harvest Complete ==="));
    assert!(text.contains("Succeeded:      3"));
    assert!(text.contains("Success rate:   75.0%"));
    assert!(text.contains("Comments:       120"));
    assert!(text.contains("Elapsed:        42s"));
    assert!(text.contains("download_log_20260101_000000.txt"));
    assert!(text.contains("Files written:  1"));
    assert!(text.contains("  - Video_dead1 (https://youtu.be/dead1)"));
    assert!(!text.contains("By group:"));
}

#[test]
fn grouped_report_lists_each_group() {
    let cats = GroupResult {
        group_label: "cats".to_string(),
        total_items: 3,
        succeeded: 2,
        failed: 1,
        total_records: 120,
        output_file: Some(PathBuf::from("out/comments/comments_cats_20260101_000000.csv")),
        persist_error: None,
    };
    let mut dogs = cats.clone();
    dogs.group_label = "dogs".to_string();
    dogs.total_items = 1;
    dogs.succeeded = 1;
    dogs.failed = 0;
    dogs.total_records = 0;
    dogs.output_file = None;

    let text = run_result(vec![cats, dogs]).to_string();

    assert!(text.contains("By group:"));
    assert!(text.contains("  cats: 2/3 items, 120 comments"));
    assert!(text.contains("    -> out/comments/comments_cats_20260101_000000.csv"));
    assert!(text.contains("  dogs: 1/1 items, 0 comments"));
    assert!(!text.contains("Files written"));
}

#[test]
fn failed_group_write_is_reported() {
    let group = GroupResult {
        group_label: "cats".to_string(),
        total_items: 1,
        succeeded: 1,
        failed: 0,
        total_records: 5,
        output_file: None,
        persist_error: Some("disk full".to_string()),
    };

    let text = run_result(vec![group]).to_string();
    assert!(text.contains("!! write failed: disk full"));
}
