use geo_sieve::registry::ModelLayer;
use geo_sieve::{GeoSieveError, ModelRegistry};

use crate::utils::registry;

/// Test the identity and signature split chosen for each built-in model
#[test]
fn test_builtin_key_split() {
    let registry = registry();

    let case = registry.get("case").unwrap();
    assert_eq!(case.identity.fields, ["COD_FTTB", "DENUMIRE_ART", "NR_ART"]);
    assert_eq!(case.identity.fixed_length.as_ref().map(|f| f.length), Some(7));
    assert_eq!(case.signature.fields, ["COD_FTTB", "LOCALITATE", "TIP_ART", "NR_ART"]);

    let scari = registry.get("scari_search").unwrap();
    assert_eq!(scari.identity.fields, ["COD_FTTB", "LOCALITATE"]);
    assert_eq!(
        scari.signature.fields,
        ["COD_FTTB", "TIP_ART", "DENUMIRE_ART", "NR_ART", "DENUMIRE_BLOC", "NR_SCARA"]
    );
    assert!(registry.get("hub").unwrap().signature.is_empty());

    let zones = registry.get("zone_interventie").unwrap();
    assert!(zones.identity.fields.is_empty());
    assert!(zones.signature.include_geometry);
    assert_eq!(zones.mandatory_fields, ["ZONA", "ECHIPA", "TIP_ECHIPA", "LOCALITATE"]);

    // a second pass keyed on the same fields would never fire
    for model in registry.all() {
        if model.identity.fields.is_empty() {
            continue;
        }
        assert!(
            model.identity.fields.iter().any(|f| !model.signature.fields.contains(f)),
            "{} identity is covered by its signature",
            model.id
        );
    }
}

/// Test that only intervention zones hash geometry into their signature
#[test]
fn test_only_zones_hash_geometry() {
    let registry = registry();
    let hashing: Vec<&str> = registry
        .all()
        .filter(|m| m.signature.include_geometry)
        .map(|m| m.id.as_str())
        .collect();
    assert_eq!(hashing, ["zone_interventie"]);
}

/// Test that signatures of fixed-length coded models keep the code
#[test]
fn test_signatures_keep_the_code_field() {
    let registry = registry();
    for model in registry.all() {
        let Some(code) = model.identity.fixed_length.as_ref().map(|f| &f.field) else {
            continue;
        };
        if model.signature.fields.is_empty() {
            continue;
        }
        assert!(
            model.signature.fields.contains(code),
            "{} signature drops {code}",
            model.id
        );
    }
}

/// Test the shape of the built-in catalogue
#[test]
fn test_builtin_statistics() {
    let registry = registry();
    let stats = registry.statistics();
    assert_eq!(stats.total_models, 18);
    assert_eq!(stats.models_by_layer.get("search"), Some(&4));
    assert_eq!(stats.models_by_layer.get("main"), Some(&14));
    assert_eq!(registry.by_layer(ModelLayer::Search).next().map(|m| m.id.as_str()), Some("fttb_search"));
    assert_eq!(registry.get("fttb_search").unwrap().output_directory(), "search");
}

/// Test that an identity contained in the signature is refused at load
#[test]
fn test_identity_inside_signature_is_rejected() {
    let err = ModelRegistry::from_json(
        r#"{"models": {"dup": {
            "layer": "main",
            "required_fields": ["A"],
            "extract_fields": ["A", "B"],
            "identity": {"fields": ["A"]},
            "signature": {"fields": ["A", "B"]}
        }}}"#,
    )
    .unwrap_err();
    assert!(matches!(err, GeoSieveError::Configuration(_)), "{err}");
    assert!(err.is_fatal());
}

/// Test malformed catalogues
#[test]
fn test_malformed_catalogues() {
    let unknown_layer = r#"{"models": {"m": {"layer": "overlay", "required_fields": ["A"], "extract_fields": []}}}"#;
    assert!(matches!(ModelRegistry::from_json(unknown_layer), Err(GeoSieveError::Configuration(_))));

    let missing_key = r#"{"models": {"m": {"layer": "main", "extract_fields": []}}}"#;
    assert!(matches!(ModelRegistry::from_json(missing_key), Err(GeoSieveError::Configuration(_))));

    let bad_pattern = r#"{"models": {"m": {"layer": "main", "required_fields": ["A"], "extract_fields": [],
        "field_rules": {"A": {"pattern": "("}}}}}"#;
    assert!(matches!(ModelRegistry::from_json(bad_pattern), Err(GeoSieveError::Configuration(_))));

    let missing_file = ModelRegistry::load(std::path::Path::new("/nonexistent/models.json"));
    assert!(missing_file.is_err());
}
