use modulation_check::normalize::{MonthlyRecord, WeeklyRecord};
use modulation_check::sector::{DedupPolicy, SectorMap};

fn monthly(identity: &str, sector: &str) -> MonthlyRecord {
    MonthlyRecord {
        identity: identity.into(),
        sector: sector.into(),
        monthly_deviation: 0.0,
        cumulative_deviation: 0.0,
        potential_remaining: 0.0,
        note: String::new(),
    }
}

fn weekly(identity: &str, sector: Option<&str>) -> WeeklyRecord {
    WeeklyRecord {
        identity: identity.into(),
        contracted: 20.0,
        worked: 20.0,
        week_start: None,
        sector: sector.map(String::from),
    }
}

#[test]
fn dedup_policy_decides_duplicates() {
    let rows = vec![monthly("Dupont", "IDF01"), monthly("Dupont", "IDF02")];
    let last = SectorMap::build(&rows, DedupPolicy::Last, "NR");
    let first = SectorMap::build(&rows, DedupPolicy::First, "NR");
    assert_eq!(last.len(), 1);
    assert_eq!(last.resolve("Dupont"), "IDF02");
    assert_eq!(first.resolve("Dupont"), "IDF01");
}

#[test]
fn unknown_worker_resolves_to_sentinel() {
    let map = SectorMap::build(&[monthly("Dupont", "IDF01")], DedupPolicy::Last, "NON RÉPERTORIÉ");
    assert_eq!(map.resolve("Martin"), "NON RÉPERTORIÉ");
    assert_eq!(map.unregistered(), "NON RÉPERTORIÉ");
}

#[test]
fn empty_sector_in_monthly_is_unregistered() {
    let map = SectorMap::build(&[monthly("Dupont", "")], DedupPolicy::Last, "NR");
    assert_eq!(map.resolve("Dupont"), "NR");
}

#[test]
fn identity_lookup_tolerates_spacing_and_composition() {
    let map = SectorMap::build(&[monthly("Léa  Martin", "ARA12")], DedupPolicy::Last, "NR");
    assert_eq!(map.resolve(" Le\u{301}a Martin "), "ARA12");
}

#[test]
fn apply_keeps_own_sector_and_fills_missing() {
    let map = SectorMap::build(&[monthly("A", "IDF01")], DedupPolicy::Last, "NR");
    let mut rows = vec![
        weekly("A", None),
        weekly("A", Some("OWN9")),
        weekly("B", Some("  ")),
    ];
    map.apply(&mut rows);
    assert_eq!(rows[0].sector.as_deref(), Some("IDF01"));
    assert_eq!(rows[1].sector.as_deref(), Some("OWN9"));
    assert_eq!(rows[2].sector.as_deref(), Some("NR"));
}

#[test]
fn dedup_policy_reads_from_config_text() {
    let first: DedupPolicy = serde_json::from_str("\"first\"").unwrap();
    let last: DedupPolicy = serde_json::from_str("\"last\"").unwrap();
    assert_eq!(first, DedupPolicy::First);
    assert_eq!(last, DedupPolicy::Last);
    assert!(serde_json::from_str::<DedupPolicy>("\"newest\"").is_err());
}
