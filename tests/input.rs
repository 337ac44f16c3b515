use std::fs;

use geo_types::Geometry;
use serde_json::json;

use tile_widgets::filter::FilterType;
use tile_widgets::input::{
    parse_features, parse_tiles, parse_ticks, parse_viewport, read_filters, read_tiles,
};

const TILES: &str = r#"[
  {
    "bbox": {"west": 0, "south": 0, "east": 10, "north": 10},
    "data": [
      {
        "type": "Feature",
        "geometry": {"type": "Point", "coordinates": [0.5, 0.5]},
        "properties": {"cartodb_id": 1, "revenue": 10}
      },
      {
        "type": "Feature",
        "geometry": null,
        "properties": {"cartodb_id": 2}
      }
    ]
  },
  {
    "bbox": {"west": 10, "south": 0, "east": 20, "north": 10},
    "isVisible": false
  }
]"#;

#[test]
fn parses_tiles_with_geojson_features() {
    let tiles = parse_tiles(TILES).expect("tiles");
    assert_eq!(tiles.len(), 2);

    let first = &tiles[0];
    assert!(first.is_visible);
    assert_eq!(first.bbox.east, 10.0);
    assert_eq!(first.data.len(), 2);
    assert!(matches!(first.data[0].geometry, Some(Geometry::Point(_))));
    assert!(first.data[1].geometry.is_none());
    assert_eq!(first.data[0].properties.get("revenue"), Some(&json!(10)));

    let second = &tiles[1];
    assert!(!second.is_visible);
    assert!(second.data.is_empty());
}

#[test]
fn reads_tiles_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("tiles.json");
    fs::write(&path, TILES).expect("write tiles");
    let tiles = read_tiles(&path).expect("tiles");
    assert_eq!(tiles.len(), 2);

    let missing = read_tiles(&dir.path().join("missing.json")).expect_err("missing file");
    assert!(missing.to_string().contains("failed to read tiles file"));
}

#[test]
fn rejects_malformed_tiles() {
    assert!(parse_tiles("{}").is_err());
    assert!(parse_tiles(r#"[{"data": []}]"#).is_err());
}

#[test]
fn parses_feature_arrays_and_collections() {
    let rows = parse_features(r#"[{"a": 1}, {"a": 2}]"#).expect("array");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].get("a"), Some(&json!(2)));

    let collection = r#"{
      "type": "FeatureCollection",
      "features": [
        {"type": "Feature", "geometry": null, "properties": {"a": "x"}},
        {"type": "Feature", "geometry": null, "properties": null}
      ]
    }"#;
    let rows = parse_features(collection).expect("collection");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("a"), Some(&json!("x")));
    assert!(rows[1].is_empty());

    assert!(parse_features("[1, 2]").is_err());
    assert!(parse_features("42").is_err());
}

#[test]
fn reads_filters_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("filters.json");
    fs::write(
        &path,
        r#"{"storetype": {"in": {"values": ["a", "b"], "owner": "w"}}}"#,
    )
    .expect("write filters");
    let filters = read_filters(&path).expect("filters");
    let spec = filters.get("storetype", FilterType::In).expect("in filter");
    assert_eq!(spec.values, vec![json!("a"), json!("b")]);
}

#[test]
fn parses_viewport() {
    let viewport = parse_viewport("-10, -5.5, 10, 5.5").expect("viewport");
    assert_eq!(viewport.0, [-10.0, -5.5, 10.0, 5.5]);

    assert!(parse_viewport("1,2,3").is_err());
    assert!(parse_viewport("1,2,3,x").is_err());
}

#[test]
fn parses_ticks() {
    assert_eq!(parse_ticks("").expect("empty"), Vec::<f64>::new());
    assert_eq!(parse_ticks("1, 2.5,-3").expect("ticks"), vec![1.0, 2.5, -3.0]);
    assert!(parse_ticks("1,,2").is_err());
    assert!(parse_ticks("1,inf").is_err());
}
