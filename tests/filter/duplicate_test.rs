use geo_sieve::filter::{FixedLength, IdentityPolicy, SignaturePolicy, StructuralIssue};
use geo_sieve::{DuplicateFilter, LogContext, Verdict};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde_json::json;

use crate::utils::lib_feature;

fn filter() -> DuplicateFilter {
    DuplicateFilter::new(
        IdentityPolicy {
            fields: vec!["COD_FTTB".into()],
            fixed_length: Some(FixedLength { field: "COD_FTTB".into(), length: 7 }),
        },
        SignaturePolicy { fields: vec!["NOTE".into()], include_geometry: false },
        LogContext::new("geo_sieve", "test"),
    )
}

/// Test that N features sharing a primary key keep exactly one, in any order
#[test]
fn test_duplicate_monotonicity() {
    for seed in 0..10u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let n = 3 + (seed as usize % 5);
        let mut features: Vec<_> = (0..n)
            .map(|i| lib_feature(json!({"COD_FTTB": "VSB0001", "NOTE": format!("note {i}")})))
            .collect();
        features.shuffle(&mut rng);

        let mut filter = filter();
        let accepted = features
            .iter()
            .filter(|f| filter.accept(f, "CASE_A.geojson").is_accepted())
            .count();
        assert_eq!(accepted, 1, "seed {seed}");
        assert_eq!(filter.stats().primary_key_duplicates, n - 1);
        assert_eq!(filter.stats().total_duplicates_skipped, n - 1);
        assert_eq!(filter.stats().duplicates_by_file.get("CASE_A.geojson"), Some(&(n - 1)));
    }
}

/// Test that a wrong-length code is rejected whether or not duplicate detection is on
#[test]
fn test_structural_rejection_ignores_enable_flag() {
    for enabled in [true, false] {
        let mut filter = filter();
        filter.configure(enabled);
        let verdict = filter.accept(&lib_feature(json!({"COD_FTTB": "AB1234"})), "x");
        assert_eq!(
            verdict,
            Verdict::StructurallyInvalid(StructuralIssue::LengthMismatch {
                field: "COD_FTTB".into(),
                expected: 7,
                actual: 6
            })
        );
        let empty = filter.accept(&lib_feature(json!({"COD_FTTB": "  "})), "x");
        assert!(matches!(empty, Verdict::StructurallyInvalid(_)));
        assert_eq!(filter.stats().total_duplicates_skipped, 0);
    }
}

/// Test that disabling detection only turns off the signature pass
#[test]
fn test_disabled_filter_keeps_primary_check() {
    let mut filter = filter();
    filter.configure(false);
    assert!(filter.accept(&lib_feature(json!({"COD_FTTB": "VSB0001", "NOTE": "a"})), "x").is_accepted());
    assert!(filter.accept(&lib_feature(json!({"COD_FTTB": "VSB0002", "NOTE": "a"})), "x").is_accepted());
    assert!(matches!(
        filter.accept(&lib_feature(json!({"COD_FTTB": "VSB0001", "NOTE": "b"})), "x"),
        Verdict::PrimaryDuplicate { .. }
    ));

    filter.reset();
    filter.configure(true);
    assert!(filter.accept(&lib_feature(json!({"COD_FTTB": "VSB0001", "NOTE": "a"})), "x").is_accepted());
    assert_eq!(
        filter.accept(&lib_feature(json!({"COD_FTTB": "VSB0002", "NOTE": "a"})), "y"),
        Verdict::SecondaryDuplicate
    );
    assert_eq!(filter.stats().secondary_duplicates(), 1);
    assert_eq!(filter.unique_primary_keys(), 2);
}
