use chrono::Utc;
use geo_sieve::{CentralizingWriter, LogContext};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

use crate::utils::{lib_feature, read_output};

const LOCALITIES: [&str; 5] = ["Vaslui", "barlad", "BARLAD", "Husi", "iasi"];

fn writer() -> CentralizingWriter {
    CentralizingWriter::new("Centralized Case Data", "LOCALITATE", LogContext::new("geo_sieve", "test"))
}

/// Test ordering: ascending, case-insensitive, missing first, stable for ties
#[test]
fn test_sort_stability_property() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut w = writer();
    let now = Utc::now();
    for i in 0..200 {
        let props = if rng.random_bool(0.1) {
            json!({"SEQ": i})
        } else {
            json!({"SEQ": i, "LOCALITATE": LOCALITIES[rng.random_range(0..LOCALITIES.len())]})
        };
        w.add(lib_feature(props), "CASE_A.geojson", now);
    }

    let sorted = w.sorted();
    assert_eq!(sorted.len(), 200);
    let key = |i: usize| {
        sorted[i].feature.properties.get("LOCALITATE").and_then(|v| v.as_str()).unwrap_or("").to_lowercase()
    };
    let seq = |i: usize| sorted[i].feature.properties["SEQ"].as_u64().unwrap();
    for i in 1..sorted.len() {
        assert!(key(i - 1) <= key(i), "position {i} out of order");
        if key(i - 1) == key(i) {
            assert!(seq(i - 1) < seq(i), "tie at {i} lost insertion order");
        }
    }
    assert!(sorted[0].feature.properties.get("LOCALITATE").is_none());
}

/// Test the written centralized file
#[test]
fn test_flush_writes_compact_collection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("case").join("case_centralized.geojson");
    let mut w = writer();
    let now = Utc::now();
    w.add(lib_feature(json!({"localitate": "Vaslui", "cod_fttb": "VSV0001"})), "CASE_VASLUI.geojson", now);
    w.add(lib_feature(json!({"LOCALITATE": "Barlad", "COD_FTTB": "VSB0001"})), "CASE_BARLAD.geojson", now);
    w.add(lib_feature(json!({"LOCALITATE": "Barlad", "COD_FTTB": "VSB0002"})), "CASE_BARLAD.geojson", now);

    assert_eq!(w.flush(&path).unwrap(), Some(path.clone()));
    assert_eq!(w.source_file_count(), 2);

    let text = std::fs::read_to_string(&path).unwrap();
    // envelope lines plus one line per feature
    assert_eq!(text.lines().count(), 3 + 5);
    assert!(!text.contains("},\n]"));

    let doc = read_output(&path);
    assert_eq!(doc["name"], "Centralized Case Data");
    let codes: Vec<_> = doc["features"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["properties"]["COD_FTTB"].clone())
        .collect();
    // the lower-cased "localitate" key is not the sort field, so it sorts first
    assert_eq!(codes, [json!("VSV0001"), json!("VSB0001"), json!("VSB0002")]);
    assert_eq!(doc["features"][0]["geometry"], json!({"type": "Point", "coordinates": [0, 0]}));
}

/// Test flushing an empty writer
#[test]
fn test_flush_without_features() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("none.geojson");
    assert_eq!(writer().flush(&path).unwrap(), None);
    assert!(!path.exists());
}
