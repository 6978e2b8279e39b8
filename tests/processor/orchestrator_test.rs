use geo_sieve::filter::StructuralIssue;
use geo_sieve::models::Rejection;
use geo_sieve::{RejectReason, SkipReason};
use serde_json::{Value, json};

use crate::utils::{case_props, collection, feature, orchestrator, targeted, test_config, to_bytes};

fn case_batch() -> Value {
    collection(vec![
        feature(case_props("VSB0001", "Barlad", "Eroilor", "1")),
        feature(case_props("VSB0002", "Barlad", "Eroilor", "2")),
        feature(case_props("VSB0001", "Barlad", "Eroilor", "1")),
        feature(case_props("VSB000", "Barlad", "Eroilor", "3")),
    ])
}

/// Test that fresh orchestrators give identical results for identical bytes
#[test]
fn test_idempotence() {
    let bytes = to_bytes(&case_batch());
    let first = orchestrator(test_config()).process_one(&bytes, "CASE_BARLAD.geojson");
    let second = orchestrator(test_config()).process_one(&bytes, "CASE_BARLAD.geojson");

    assert!(first.success);
    assert_eq!(first.features, second.features);
    assert_eq!(first.counts, second.counts);
    assert_eq!(first.rejections, second.rejections);
    assert_eq!(first.features_extracted, 2);
    assert_eq!(first.counts.duplicates_skipped, 1);
    assert_eq!(first.counts.invalid_skipped, 1);
}

/// Test the three-feature scenario: one kept, one duplicate, one wrong-length code
#[test]
fn test_code_and_locality_scenario() {
    let doc = collection(vec![
        feature(json!({"COD_FTTB": "AB12345", "LOCALITATE": "Iasi"})),
        feature(json!({"COD_FTTB": "AB12345", "LOCALITATE": "Iasi"})),
        feature(json!({"COD_FTTB": "AB1234", "LOCALITATE": "Iasi"})),
    ]);
    let mut orch = orchestrator(test_config());
    let result = orch.process_one(&to_bytes(&doc), "SCARI_IASI.geojson");

    assert_eq!(result.model_detected.as_deref(), Some("scari_search"));
    assert_eq!(result.features.len(), 1);
    assert_eq!(result.features[0].properties["COD_FTTB"], "AB12345");
    assert_eq!(result.counts.duplicates_skipped, 1);
    assert_eq!(result.counts.invalid_skipped, 1);
    assert_eq!(
        result.rejections[1],
        Rejection {
            index: 2,
            reason: RejectReason::Structural(StructuralIssue::LengthMismatch {
                field: "COD_FTTB".into(),
                expected: 7,
                actual: 6
            })
        }
    );
    assert_eq!(orch.writer("scari_search").map(|w| w.len()), Some(1));
}

/// Test that an empty feature is counted once and never reaches the duplicate filter
#[test]
fn test_gate_independence() {
    let doc = json!({"type": "FeatureCollection", "features": [
        feature(case_props("VSB0001", "Barlad", "Eroilor", "1")),
        {"type": "Feature", "properties": {}, "geometry": null},
        feature(case_props("VSB0001", "Barlad", "Eroilor", "1")),
    ]});
    let mut orch = orchestrator(test_config());
    let result = orch.process_one(&to_bytes(&doc), "CASE_BARLAD.geojson");

    assert_eq!(result.rejections.len(), 2);
    assert_eq!(result.rejections[0], Rejection { index: 1, reason: RejectReason::EmptyProperties });
    assert!(result.rejections[1].reason.is_duplicate());
    assert_eq!(result.rejections[1].index, 2);
    assert_eq!(result.counts.empty_skipped, 1);
    assert_eq!(result.features.len(), 1);

    let stats = orch.duplicate_stats("case").unwrap();
    assert_eq!(stats.total_duplicates_skipped, 1);
    assert_eq!(stats.primary_key_duplicates, 1);
}

/// Test strict and lenient handling of rule failures
#[test]
fn test_strict_mode() {
    let long_name = "X".repeat(101);
    let doc = collection(vec![feature(case_props("VSB0001", &long_name, "Eroilor", "1"))]);
    let bytes = to_bytes(&doc);

    let lenient = orchestrator(test_config()).process_one(&bytes, "CASE_X.geojson");
    assert_eq!(lenient.features.len(), 1);
    assert!(lenient.warnings.iter().any(|w| w.starts_with("Feature 0: ") && w.contains("LOCALITATE")));

    let strict = orchestrator(test_config().with_strict_mode(true)).process_one(&bytes, "CASE_X.geojson");
    assert!(strict.success);
    assert!(strict.features.is_empty());
    assert_eq!(strict.counts.validation_rejected, 1);
    assert!(matches!(strict.rejections[0].reason, RejectReason::Validation { .. }));
}

/// Test the fallback to ISO-8859-1 for legacy exports
#[test]
fn test_latin1_input() {
    let bytes = b"{\"features\": [{\"type\": \"Feature\", \"properties\": {\"COD_FTTB\": \"VSB0001\", \
        \"DENUMIRE_ART\": \"Eroilor\", \"NR_ART\": \"1\", \"LOCALITATE\": \"B\xe2rlad\"}}]}";
    let result = orchestrator(test_config()).process_one(bytes, "CASE_BARLAD.geojson");
    assert!(result.success, "{:?}", result.errors);
    assert_eq!(result.metadata["encoding"], "iso-8859-1");
    assert_eq!(result.features[0].properties["LOCALITATE"], "B\u{e2}rlad");
}

/// Test per-file failures that do not involve features
#[test]
fn test_file_level_failures() {
    let mut orch = orchestrator(test_config());

    let unknown = orch.process_one(&to_bytes(&collection(vec![feature(json!({"foo": 1, "Bar": 2}))])), "x.geojson");
    assert!(!unknown.success);
    assert!(unknown.errors[0].contains("FOO") && unknown.errors[0].contains("BAR"));

    let no_features = orch.process_one(br#"{"type": "FeatureCollection"}"#, "x.geojson");
    assert!(!no_features.success);
    assert!(no_features.errors[0].contains("missing features"));

    let empty = orch.process_one(&to_bytes(&collection(vec![])), "x.geojson");
    assert!(empty.success);
    assert_eq!(empty.warnings, ["No features found"]);
}

/// Test that targeted runs skip files of other models
#[test]
fn test_targeted_skips() {
    let mut orch = targeted("case", test_config());
    let bytes = to_bytes(&case_batch());

    let wrong_name = orch.process_one(&bytes, "SCARI_BARLAD.geojson");
    assert!(wrong_name.success && wrong_name.is_skipped());
    assert!(matches!(wrong_name.skipped, Some(SkipReason::FileNameMismatch { .. })));

    let pairs = to_bytes(&collection(vec![feature(json!({"COD_FTTB": "VSB0001", "LOCALITATE": "Barlad"}))]));
    let missing = orch.process_one(&pairs, "CASE_BARLAD.geojson");
    match missing.skipped {
        Some(SkipReason::RequiredFieldsMissing { missing, .. }) => assert_eq!(missing, ["DENUMIRE_ART", "NR_ART"]),
        other => panic!("unexpected {other:?}"),
    }

}

/// Test that detection passes over matches whose file-name markers reject the file
#[test]
fn test_detection_falls_through_name_markers() {
    let bytes = to_bytes(&case_batch());

    // a case layout not named CASE_* goes to the next match, fttb_search
    let renamed = orchestrator(test_config()).process_one(&bytes, "SCARI_BARLAD.geojson");
    assert!(renamed.success && !renamed.is_skipped());
    assert_eq!(renamed.model_detected.as_deref(), Some("fttb_search"));
    assert_eq!(renamed.features_extracted, 2);

    let named = orchestrator(test_config()).process_one(&bytes, "CASE_BARLAD.geojson");
    assert_eq!(named.model_detected.as_deref(), Some("case"));

    // only scari_search takes bare code and locality pairs, and only from SCARI_ files
    let pairs = to_bytes(&collection(vec![feature(json!({"COD_FTTB": "VSB0001", "LOCALITATE": "Barlad"}))]));
    let skipped = orchestrator(test_config()).process_one(&pairs, "export.geojson");
    assert!(skipped.success && skipped.is_skipped());
    match skipped.skipped {
        Some(SkipReason::FileNameMismatch { markers, .. }) => assert_eq!(markers, ["SCARI_"]),
        other => panic!("unexpected {other:?}"),
    }
}

/// Test the street category tally of the search layer
#[test]
fn test_search_categories() {
    let mut orch = targeted("fttb_search", test_config());
    let mut street = case_props("VSB0001", "Barlad", "Eroilor", "1");
    let case_doc = collection(vec![
        feature(street.clone()),
        feature(case_props("VSB0002", "Barlad", "Eroilor", "2")),
        feature(json!({"COD_FTTB": "VSB0003", "LOCALITATE": "Barlad", "TIP_ART": "Bulevard", "NR_ART": "3"})),
    ]);
    street["COD_FTTB"] = json!("VSV0001");
    street["LOCALITATE"] = json!("Vaslui");
    let scari_doc = collection(vec![feature(street)]);

    assert_eq!(orch.process_one(&to_bytes(&case_doc), "CASE_BARLAD.geojson").features_extracted, 3);
    let scari = orch.process_one(&to_bytes(&scari_doc), "SCARI_VASLUI.geojson");
    assert_eq!(scari.features_extracted, 1);
    assert_eq!(
        scari.features[0].properties.keys().collect::<Vec<_>>(),
        ["COD_FTTB", "LOCALITATE"]
    );

    let summary = &orch.summaries()[0];
    assert_eq!(summary.model_type, "fttb_search");
    assert_eq!(summary.total_features, 4);
    assert_eq!(summary.files_processed, 2);
    assert_eq!(summary.categories.get("Case"), Some(&2));
    assert_eq!(summary.categories.get("Scari"), Some(&1));
    assert_eq!(summary.categories.get("Other"), Some(&1));
}
