use modulation_check::compliance::{ContractKind, Thresholds, Verdict, evaluate};
use modulation_check::error::ValidationError;

#[test]
fn full_time_only_checks_forty_hours() {
    for contracted in [35.0, 37.5, 39.0] {
        assert_eq!(evaluate(contracted, 40.0), Ok(Verdict::Compliant));
        assert_eq!(evaluate(contracted, 40.01), Ok(Verdict::Over40h));
        // A full-time contract is never held to the part-time ceiling.
        assert_eq!(evaluate(contracted, 38.0), Ok(Verdict::Compliant));
    }
}

#[test]
fn part_time_ceiling_takes_precedence() {
    // Both the 34h ceiling and the one-third rule are exceeded.
    assert_eq!(evaluate(20.0, 35.0), Ok(Verdict::Over34h));
}

#[test]
fn part_time_one_third_rule() {
    // 24h contract: allowance is 8h.
    assert_eq!(evaluate(24.0, 32.0), Ok(Verdict::Compliant));
    assert_eq!(evaluate(24.0, 32.5), Ok(Verdict::OverOneThird));
    assert_eq!(evaluate(15.0, 21.0), Ok(Verdict::OverOneThird));
}

#[test]
fn part_time_boundaries_are_strict() {
    assert_eq!(evaluate(30.0, 34.0), Ok(Verdict::Compliant));
    assert_eq!(evaluate(30.0, 34.01), Ok(Verdict::Over34h));
}

#[test]
fn zero_contract_skips_one_third_rule() {
    assert_eq!(evaluate(0.0, 10.0), Ok(Verdict::Compliant));
    assert_eq!(evaluate(0.0, 34.5), Ok(Verdict::Over34h));
}

#[test]
fn negative_hours_are_rejected() {
    assert!(matches!(
        evaluate(-1.0, 20.0),
        Err(ValidationError::Negative { field: "contracted", .. })
    ));
    assert!(matches!(
        evaluate(20.0, -0.5),
        Err(ValidationError::Negative { field: "worked", .. })
    ));
    assert!(matches!(
        evaluate(f64::NAN, 20.0),
        Err(ValidationError::NonFinite { .. })
    ));
}

#[test]
fn classification_threshold() {
    let t = Thresholds::default();
    assert_eq!(t.classify(35.0), ContractKind::FullTime);
    assert_eq!(t.classify(34.99), ContractKind::PartTime);
}

#[test]
fn verdict_tags_serialize_as_constants() {
    let tags: Vec<String> = [
        Verdict::Compliant,
        Verdict::Over34h,
        Verdict::Over40h,
        Verdict::OverOneThird,
    ]
    .iter()
    .map(|v| serde_json::to_string(v).unwrap())
    .collect();
    assert_eq!(
        tags,
        ["\"COMPLIANT\"", "\"OVER_34H\"", "\"OVER_40H\"", "\"OVER_ONE_THIRD\""]
    );
    assert_eq!(Verdict::OverOneThird.to_string(), "OVER_ONE_THIRD");
}
