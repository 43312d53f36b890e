#![allow(clippy::float_cmp)]

use serde_json::json;
use uuid::Uuid;

use super::*;
use crate::consts::{MIN_BLOCK_HEIGHT, MIN_BLOCK_WIDTH};

fn make_block(content: BlockContent) -> Block {
    Block {
        id: Uuid::new_v4(),
        dashboard_id: Uuid::new_v4(),
        content,
        title: "Weather".into(),
        x: 10.0,
        y: 20.0,
        width: 400.0,
        height: 300.0,
        z_index: 2,
        created_at: 1_700_000_000_000,
    }
}

// =============================================================
// ElementKind
// =============================================================

#[test]
fn kind_parse_accepts_every_wire_name() {
    for kind in ElementKind::ALL {
        assert_eq!(ElementKind::parse(kind.as_str()), Some(kind));
    }
}

#[test]
fn kind_parse_rejects_unknown() {
    assert_eq!(ElementKind::parse("video"), None);
    assert_eq!(ElementKind::parse("Embed"), None);
}

#[test]
fn kind_serde_is_lowercase() {
    assert_eq!(serde_json::to_string(&ElementKind::Iframe).unwrap(), "\"iframe\"");
    let back: ElementKind = serde_json::from_str("\"file\"").unwrap();
    assert_eq!(back, ElementKind::File);
}

#[test]
fn url_kinds_require_absolute_url() {
    assert!(ElementKind::Embed.requires_absolute_url());
    assert!(ElementKind::Iframe.requires_absolute_url());
    assert!(ElementKind::Link.requires_absolute_url());
    assert!(!ElementKind::Text.requires_absolute_url());
    assert!(ElementKind::Image.requires_absolute_url());
    assert!(ElementKind::File.requires_absolute_url());
}

// =============================================================
// BlockContent
// =============================================================

#[test]
fn content_from_parts_matches_kind() {
    for kind in ElementKind::ALL {
        let content = BlockContent::from_parts(kind, "payload");
        assert_eq!(content.kind(), kind);
        assert_eq!(content.payload(), "payload");
    }
}

#[test]
fn text_content_uses_text_field() {
    let value = serde_json::to_value(BlockContent::Text { text: "hello".into() }).unwrap();
    assert_eq!(value, json!({"kind": "text", "text": "hello"}));
}

#[test]
fn content_rejects_mismatched_field() {
    let result = serde_json::from_value::<BlockContent>(json!({"kind": "embed", "text": "x"}));
    assert!(result.is_err());
}

// =============================================================
// Block serde
// =============================================================

#[test]
fn block_serializes_content_flattened() {
    let block = make_block(BlockContent::Embed { url: "https://example.com".into() });
    let value = serde_json::to_value(&block).unwrap();
    assert_eq!(value["kind"], "embed");
    assert_eq!(value["url"], "https://example.com");
    assert_eq!(value["z_index"], 2);
    assert!(value.get("content").is_none());
}

#[test]
fn block_deserializes_integer_geometry() {
    let id = Uuid::new_v4();
    let dashboard_id = Uuid::new_v4();
    let value = json!({
        "id": id,
        "dashboard_id": dashboard_id,
        "kind": "link",
        "url": "https://docs.rs",
        "title": "Docs",
        "x": 5,
        "y": 6,
        "width": 400,
        "height": 300,
        "z_index": 1,
        "created_at": 0
    });
    let block: Block = serde_json::from_value(value).unwrap();
    assert_eq!(block.id, id);
    assert_eq!(block.dashboard_id, dashboard_id);
    assert_eq!(block.content, BlockContent::Link { url: "https://docs.rs".into() });
    assert_eq!(block.x, 5.0);
    assert_eq!(block.height, 300.0);
}

// =============================================================
// Block::apply
// =============================================================

#[test]
fn apply_only_touches_present_fields() {
    let mut block = make_block(BlockContent::Text { text: "a".into() });
    block.apply(&PartialBlock::moved(50.0, 60.0));
    assert_eq!(block.x, 50.0);
    assert_eq!(block.y, 60.0);
    assert_eq!(block.width, 400.0);
    assert_eq!(block.title, "Weather");
}

#[test]
fn apply_replaces_title_and_content() {
    let mut block = make_block(BlockContent::Text { text: "a".into() });
    let partial = PartialBlock {
        title: Some("Notes".into()),
        content: Some(BlockContent::Text { text: "b".into() }),
        ..Default::default()
    };
    block.apply(&partial);
    assert_eq!(block.title, "Notes");
    assert_eq!(block.content.payload(), "b");
}

#[test]
fn set_geometry_round_trips_through_geometry() {
    let mut block = make_block(BlockContent::Image { url: "https://img".into() });
    let g = Geometry::new(1.0, 2.0, 300.0, 200.0);
    block.set_geometry(g);
    assert_eq!(block.geometry(), g);
}

// =============================================================
// PartialBlock
// =============================================================

#[test]
fn merge_prefers_later_fields() {
    let merged = PartialBlock::moved(1.0, 2.0).merge(PartialBlock::moved(3.0, 4.0));
    assert_eq!(merged, PartialBlock::moved(3.0, 4.0));
}

#[test]
fn merge_keeps_fields_missing_from_later() {
    let merged = PartialBlock::moved(1.0, 2.0).merge(PartialBlock::resized(500.0, 400.0));
    assert_eq!(merged.x, Some(1.0));
    assert_eq!(merged.y, Some(2.0));
    assert_eq!(merged.width, Some(500.0));
    assert_eq!(merged.height, Some(400.0));
}

#[test]
fn default_partial_is_empty() {
    assert!(PartialBlock::default().is_empty());
    assert!(!PartialBlock::moved(0.0, 0.0).is_empty());
}

#[test]
fn clamped_partial_enforces_bounds() {
    let partial = PartialBlock {
        x: Some(-3.0),
        width: Some(10.0),
        height: Some(10.0),
        ..Default::default()
    }
    .clamped();
    assert_eq!(partial.x, Some(0.0));
    assert_eq!(partial.y, None);
    assert_eq!(partial.width, Some(MIN_BLOCK_WIDTH));
    assert_eq!(partial.height, Some(MIN_BLOCK_HEIGHT));
}

#[test]
fn non_finite_geometry_is_detected() {
    assert!(PartialBlock::moved(1.0, 2.0).has_finite_geometry());
    assert!(!PartialBlock::moved(f64::NAN, 2.0).has_finite_geometry());
    assert!(PartialBlock::default().has_finite_geometry());
}

#[test]
fn partial_skips_absent_fields_on_the_wire() {
    let value = serde_json::to_value(PartialBlock::resized(300.0, 200.0)).unwrap();
    assert_eq!(value, json!({"width": 300.0, "height": 200.0}));
}

#[test]
fn partial_deserializes_nested_content() {
    let partial: PartialBlock =
        serde_json::from_value(json!({"content": {"kind": "text", "text": "hi"}})).unwrap();
    assert_eq!(partial.content, Some(BlockContent::Text { text: "hi".into() }));
    assert!(partial.x.is_none());
}
