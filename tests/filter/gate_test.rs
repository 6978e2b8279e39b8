use geo_sieve::FeatureGate;
use geo_sieve::filter::GateOutcome;
use serde_json::{Map, Value, json};

fn props(v: Value) -> Map<String, Value> {
    v.as_object().cloned().unwrap_or_default()
}

fn signal() -> Vec<String> {
    ["COD_FTTB", "DENUMIRE_ART", "NR_ART"].iter().map(|s| (*s).to_string()).collect()
}

/// Test the "any populated field" policy
#[test]
fn test_any_populated_signal() {
    let blank = props(json!({"COD_FTTB": "", "DENUMIRE_ART": null, "NR_ART": [], "EXTRA": "x"}));
    assert!(!FeatureGate::has_required_signal(&blank, &signal()));

    let one = props(json!({"COD_FTTB": "", "DENUMIRE_ART": null, "NR_ART": "3"}));
    assert!(FeatureGate::has_required_signal(&one, &signal()));

    let object = props(json!({"NR_ART": {}}));
    assert!(!FeatureGate::has_required_signal(&object, &signal()));
}

/// Test the order of gate checks
#[test]
fn test_gate_outcomes() {
    let gate = FeatureGate::new(signal(), vec!["COD_FTTB".into(), "NR_ART".into()]);
    assert_eq!(gate.check(&Map::new()), GateOutcome::EmptyProperties);
    assert_eq!(gate.check(&props(json!({"OTHER": 1}))), GateOutcome::NoSignal);
    assert_eq!(
        gate.check(&props(json!({"COD_FTTB": "VSB0001"}))),
        GateOutcome::MissingMandatory("NR_ART".into())
    );
    assert_eq!(gate.check(&props(json!({"COD_FTTB": "VSB0001", "NR_ART": 2}))), GateOutcome::Pass);
    assert!(FeatureGate::is_empty_properties(&Map::new()));
}
