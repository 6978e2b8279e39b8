use geo_sieve::ModelRegistry;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::utils::registry;

const UNIVERSE: [&str; 6] = ["COD_FTTB", "LOCALITATE", "NR_ART", "TIP_ART", "ZONA", "PON"];

fn random_subset(rng: &mut StdRng) -> Vec<String> {
    UNIVERSE
        .iter()
        .filter(|_| rng.random_bool(0.5))
        .map(|f| (*f).to_string())
        .collect()
}

/// Test `detect_first` against a brute-force subset check over random field sets
#[test]
fn test_subset_detection_property() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut models = serde_json::Map::new();
    let mut requirements = Vec::new();
    for i in 0..8 {
        let mut required = random_subset(&mut rng);
        if required.is_empty() {
            required.push(UNIVERSE[i % UNIVERSE.len()].to_string());
        }
        models.insert(
            format!("m{i}"),
            serde_json::json!({"layer": "main", "required_fields": required, "extract_fields": []}),
        );
        requirements.push((format!("m{i}"), required));
    }
    let registry = ModelRegistry::from_json(&serde_json::json!({ "models": models }).to_string()).unwrap();
    let detector = registry.detector();

    for _ in 0..200 {
        // mixed case on the observed side
        let observed: Vec<String> = random_subset(&mut rng)
            .into_iter()
            .map(|f| if rng.random_bool(0.5) { f.to_lowercase() } else { f })
            .collect();
        let upper: Vec<String> = observed.iter().map(|f| f.to_uppercase()).collect();

        let expected: Vec<&str> = requirements
            .iter()
            .filter(|(_, req)| req.iter().all(|r| upper.contains(r)))
            .map(|(id, _)| id.as_str())
            .collect();

        let first = detector.detect_first(&observed).map(|m| m.id.as_str());
        assert_eq!(first, expected.first().copied(), "observed {observed:?}");
        let all: Vec<&str> = detector.detect_all(&observed).iter().map(|m| m.id.as_str()).collect();
        assert_eq!(all, expected);
    }
}

/// Test that a code and locality pair does not match models needing more
#[test]
fn test_exact_pair_does_not_match_wider_models() {
    let registry = registry();
    let detector = registry.detector();
    let observed = ["COD_FTTB", "LOCALITATE"];

    let all: Vec<&str> = detector.detect_all(&observed).iter().map(|m| m.id.as_str()).collect();
    assert_eq!(all, ["scari_search"]);
    assert!(!all.contains(&"case"));
    assert!(!all.contains(&"fttb_search"));
}

/// Test the declaration-order tie-break for a case export
#[test]
fn test_case_layout_matches_several_models() {
    let registry = registry();
    let observed = ["cod_fttb", "DENUMIRE_ART", "NR_ART", "LOCALITATE", "TIP_ART"];
    let all: Vec<&str> = registry.detector().detect_all(&observed).iter().map(|m| m.id.as_str()).collect();
    assert_eq!(all, ["case", "fttb_search", "scari_search"]);
    assert_eq!(registry.detector().detect_first(&observed).map(|m| m.id.as_str()), Some("case"));
}
