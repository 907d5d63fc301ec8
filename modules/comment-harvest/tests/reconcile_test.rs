//! Reconciliation tests: raw downloader payload text → canonical records.
//!
//! Payloads come from the `testing` builders, which mirror the downloader's
//! `--pretty` output. No processes, no filesystem.

use harvest_common::ItemReference;
use comment_harvest::pipeline::reconcile;
use comment_harvest::testing::{array_payload, comments_payload, expected_likes, truncated_payload};

fn item() -> ItemReference {
    ItemReference::new(7, "Cats compilation", "https://www.youtube.com/watch?v=cat42&t=1", "cats")
}

// ---------------------------------------------------------------------------
// Well-formed payloads
// ---------------------------------------------------------------------------

#[test]
fn object_payload_yields_one_record_per_comment_in_order() {
    let result = reconcile(&comments_payload(5), &item());

    assert!(!result.is_rejected());
    assert!(!result.repaired);
    assert_eq!(result.records.len(), 5);
    let ids: Vec<&str> = result.records.iter().map(|r| r.comment_id.as_str()).collect();
    assert_eq!(ids, ["c0", "c1", "c2", "c3", "c4"]);
}

#[test]
fn bare_array_payload_is_accepted() {
    let result = reconcile(&array_payload(3), &item());
    assert_eq!(result.records.len(), 3);
}

#[test]
fn records_carry_item_identity() {
    let result = reconcile(&comments_payload(2), &item());

    for record in &result.records {
        assert_eq!(record.item_id, "cat42");
        assert_eq!(record.item_url, "https://www.youtube.com/watch?v=cat42&t=1");
        assert_eq!(record.item_title, "Cats compilation");
        assert_eq!(record.group_label.as_deref(), Some("cats"));
    }
}

#[test]
fn raw_fields_map_to_canonical_fields() {
    let result = reconcile(&comments_payload(3), &item());
    let record = &result.records[2];

    assert_eq!(record.text, "comment number 2");
    assert_eq!(record.author, "@user2");
    assert_eq!(record.author_channel_id, "UC0002");
    assert_eq!(record.like_count, expected_likes(2));
    assert_eq!(record.reply_count, 2);
    assert_eq!(record.published_time, "2 days ago");
    assert_eq!(record.published_timestamp, Some(1_700_000_002.0));
    assert!(record.has_heart);
    assert!(!record.is_pinned);
    assert!(result.records[0].is_pinned);
}

#[test]
fn separated_and_garbage_counts() {
    let raw = r#"[
        {"cid": "a", "votes": "1,234", "replies": "abc"},
        {"cid": "b", "votes": 17},
        {"cid": "c"}
    ]"#;
    let result = reconcile(raw, &item());

    assert_eq!(result.records[0].like_count, 1234);
    assert_eq!(result.records[0].reply_count, 0);
    assert_eq!(result.records[1].like_count, 17);
    assert_eq!(result.records[2].like_count, 0);
    assert_eq!(result.records[2].text, "");
}

#[test]
fn empty_comments_array_is_a_clean_zero() {
    let result = reconcile(r#"{"comments": []}"#, &item());
    assert!(!result.is_rejected());
    assert!(result.records.is_empty());
}

#[test]
fn non_object_elements_are_skipped() {
    let raw = r#"[{"cid": "a"}, 42, "stray", null, {"cid": "b"}]"#;
    let result = reconcile(raw, &item());

    assert_eq!(result.records.len(), 2);
    assert_eq!(result.skipped, 3);
}

#[test]
fn item_without_identifier_still_tags_records() {
    let orphan = ItemReference::new(1, "orphan", "https://example.com/v", "");
    let result = reconcile(&comments_payload(1), &orphan);

    assert_eq!(result.records[0].item_id, "");
    assert_eq!(result.records[0].item_url, "https://example.com/v");
    assert_eq!(result.records[0].group_label, None);
}

// ---------------------------------------------------------------------------
// Truncated payloads
// ---------------------------------------------------------------------------

#[test]
fn truncated_payload_keeps_complete_records() {
    for n in [1, 2, 5] {
        let result = reconcile(&truncated_payload(n), &item());
        assert!(result.repaired, "payload with {n} records should be repaired");
        assert!(!result.is_rejected());
        assert_eq!(result.records.len(), n);
        assert_eq!(result.records.last().unwrap().comment_id, format!("c{}", n - 1));
    }
}

#[test]
fn truncated_bare_array_keeps_complete_records() {
    let full = array_payload(3);
    let cut = &full[..full.find("\"cid\": \"c2\"").unwrap() + 4];
    let result = reconcile(cut, &item());

    assert!(result.repaired);
    assert_eq!(result.records.len(), 2);
}

#[test]
fn truncation_before_any_complete_record_is_rejected() {
    let result = reconcile(&truncated_payload(0), &item());
    assert!(result.is_rejected());
    assert!(result.records.is_empty());
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

#[test]
fn unsupported_shapes_are_rejected() {
    for raw in [r#"{"items": []}"#, r#"{"comments": 3}"#, "42", r#""text""#, "<html>", ""] {
        let result = reconcile(raw, &item());
        assert!(result.is_rejected(), "{raw:?} should be rejected");
        assert!(result.records.is_empty());
    }
}
