//! Keyword discovery tests with a mock search backend.

use std::time::Duration;

use harvest_common::ItemKind;
use comment_harvest::discovery::KeywordDiscovery;
use comment_harvest::pipeline::{BatchOptions, Grouping, Harvester};
use comment_harvest::store::OutputLayout;
use comment_harvest::testing::{comments_payload, MockDiscoverer, MockRetriever};
use comment_harvest::traits::ItemSource;

fn discoverer() -> MockDiscoverer {
    MockDiscoverer::new()
        .on_keyword(
            "sourdough",
            &[
                ("Starter basics", "https://www.youtube.com/watch?v=sd1&pp=abc"),
                ("Quick tip", "https://www.youtube.com/shorts/sd2"),
                ("Shaping", "https://www.youtube.com/watch?v=sd3"),
            ],
        )
        .on_keyword("baguette", &[("Baguette at home", "https://www.youtube.com/watch?v=bg1")])
        .failing("croissant")
}

fn keywords(list: &[&str]) -> Vec<String> {
    list.iter().map(|k| k.to_string()).collect()
}

#[tokio::test]
async fn one_group_per_keyword_in_keyword_order() {
    let discovery = KeywordDiscovery::new(discoverer(), keywords(&["baguette", "sourdough"]))
        .with_keyword_delay(Duration::ZERO);

    let groups = discovery.discover_groups().await;

    let labels: Vec<&str> = groups.iter().map(|g| g.label.as_str()).collect();
    assert_eq!(labels, ["baguette", "sourdough"]);

    let sourdough = &groups[1];
    assert_eq!(sourdough.items.len(), 3);
    assert!(sourdough.items.iter().all(|i| i.group_label == "sourdough"));
    assert_eq!(sourdough.items[1].kind, ItemKind::ShortForm);
    assert_eq!(sourdough.items[0].id(), Some("sd1"));
    let seqs: Vec<u32> = sourdough.items.iter().map(|i| i.sequence_number).collect();
    assert_eq!(seqs, [1, 2, 3]);
}

#[tokio::test]
async fn failing_keyword_yields_empty_group() {
    let discovery = KeywordDiscovery::new(discoverer(), keywords(&["croissant", "baguette"]))
        .with_keyword_delay(Duration::ZERO);

    let groups = discovery.discover_groups().await;

    assert_eq!(groups.len(), 2);
    assert!(groups[0].items.is_empty());
    assert_eq!(groups[1].items.len(), 1);
}

#[tokio::test]
async fn results_are_capped_at_max_results() {
    let discovery = KeywordDiscovery::new(discoverer(), keywords(&["sourdough"]))
        .with_max_results(2)
        .with_keyword_delay(Duration::ZERO);

    let groups = discovery.discover_groups().await;
    assert_eq!(groups[0].items.len(), 2);
}

#[tokio::test]
async fn discovery_as_item_source_feeds_a_grouped_run() {
    let tmp = tempfile::tempdir().unwrap();
    let discovery = KeywordDiscovery::new(discoverer(), keywords(&["sourdough", "croissant", "baguette"]))
        .with_keyword_delay(Duration::ZERO);

    let items = discovery.items().await.unwrap();
    assert_eq!(items.len(), 4);

    let retriever = MockRetriever::new()
        .on_payload("sd1", comments_payload(2))
        .on_payload("sd2", comments_payload(1))
        .on_payload("bg1", comments_payload(4));
    let harvester = Harvester::new(retriever, OutputLayout::new(tmp.path()));
    let options = BatchOptions {
        grouping: Grouping::by_label(),
        item_delay: Duration::ZERO,
        group_delay: Duration::ZERO,
        ..BatchOptions::default()
    };

    let result = harvester.run(&discovery, &options).await.unwrap();

    assert_eq!(result.total_items, 4);
    assert_eq!(result.failed, 1);
    assert_eq!(result.total_records, 7);
    let labels: Vec<&str> = result.groups.iter().map(|g| g.group_label.as_str()).collect();
    assert_eq!(labels, ["sourdough", "baguette"]);
}
