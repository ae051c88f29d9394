use modulation_check::config::Config;
use modulation_check::error::LoadError;
use modulation_check::ingest::parse_csv;
use modulation_check::schema::{DatasetKind, Field, Resolution, SchemaVersion, detect, resolve};

fn headers(s: &[&str]) -> Vec<String> {
    s.iter().map(|h| h.to_string()).collect()
}

#[test]
fn detects_known_monthly_layouts() {
    let v1 = headers(&[
        "Intervenant",
        "Secteur",
        "Déviation mois",
        "Déviation cumulée",
        "Hres potentielles restantes",
    ]);
    assert_eq!(detect(DatasetKind::Monthly, &v1), SchemaVersion::KnownV1);

    let v2 = headers(&[
        "Intervenant",
        "Code cellule",
        "Déviation du mois",
        "Déviation cumulée",
        "Heures potentielles",
    ]);
    assert_eq!(detect(DatasetKind::Monthly, &v2), SchemaVersion::KnownV2);
}

#[test]
fn detects_known_weekly_layouts() {
    let v1 = headers(&["Intervenant", "Hres contrat", "Total heures", "Semaine du"]);
    assert_eq!(detect(DatasetKind::Weekly, &v1), SchemaVersion::KnownV1);

    let v2 = headers(&[
        "Salarié",
        "Heures contrat",
        "Heures réalisées",
        "Début semaine",
        "Code secteur",
    ]);
    assert_eq!(detect(DatasetKind::Weekly, &v2), SchemaVersion::KnownV2);
}

#[test]
fn header_match_ignores_case_and_composition() {
    // "e" + combining acute instead of precomposed "é".
    let v1 = headers(&[
        "INTERVENANT",
        "secteur",
        "De\u{301}viation mois",
        "Déviation cumulée",
        "Hres potentielles restantes",
    ]);
    assert_eq!(detect(DatasetKind::Monthly, &v1), SchemaVersion::KnownV1);
}

#[test]
fn unknown_layout_is_unrecognized() {
    let h = headers(&["Nom", "Code"]);
    assert_eq!(
        detect(DatasetKind::Monthly, &h),
        SchemaVersion::Unrecognized(h.clone())
    );
}

#[test]
fn known_layout_resolves_exactly_without_warnings() {
    let cfg = Config::default();
    let t = parse_csv(
        "Intervenant;Code cellule;Déviation du mois;Déviation cumulée;Heures potentielles\nA;IDF01;1;2;3\n",
        ';',
    )
    .unwrap();
    let map = resolve(&cfg, DatasetKind::Monthly, &t).unwrap();
    assert_eq!(map.version, SchemaVersion::KnownV2);
    assert_eq!(map.index(Field::Sector), Some(1));
    assert!(map.warnings.is_empty());
    assert!(map.columns.values().all(|c| c.how == Resolution::Exact));
}

#[test]
fn sector_found_by_code_shape() {
    let cfg = Config::default();
    let t = parse_csv(
        "Intervenant;Code postal libellé;Code équipe;Cumul\nA;Paris centre;IDF-01;3\nB;Lyon;ARA 12;-1\n",
        ';',
    )
    .unwrap();
    let map = resolve(&cfg, DatasetKind::Monthly, &t).unwrap();
    let sector = &map.columns[&Field::Sector];
    assert_eq!(sector.index, 2);
    assert_eq!(sector.how, Resolution::Heuristic);
    assert!(map.warnings.iter().any(|w| w.contains("sector")));
    assert_eq!(map.index(Field::CumulativeDeviation), Some(3));
}

#[test]
fn sector_falls_back_to_position_with_warning() {
    let cfg = Config::default();
    let t = parse_csv("Intervenant;Zone;Cumul\nA;Nord;1\n", ';').unwrap();
    let map = resolve(&cfg, DatasetKind::Monthly, &t).unwrap();
    let sector = &map.columns[&Field::Sector];
    assert_eq!(sector.index, 1);
    assert_eq!(sector.how, Resolution::Positional);
    assert!(map.warnings.iter().any(|w| w.contains("by position")));
}

#[test]
fn weekly_without_hours_is_rejected() {
    let cfg = Config::default();
    let t = parse_csv("Intervenant;Zone\nA;Nord\n", ';').unwrap();
    assert!(matches!(
        resolve(&cfg, DatasetKind::Weekly, &t),
        Err(LoadError::MissingColumn("contracted"))
    ));
}

#[test]
fn weekly_substring_guess_does_not_steal_exact_columns() {
    let cfg = Config::default();
    let t = parse_csv("Nom;Contrat;Total heures semaine;Secteur\nA;20;30;X1\n", ';').unwrap();
    let map = resolve(&cfg, DatasetKind::Weekly, &t).unwrap();
    assert_eq!(map.index(Field::Identity), Some(0));
    assert_eq!(map.index(Field::Contracted), Some(1));
    assert_eq!(map.index(Field::Worked), Some(2));
    assert_eq!(map.index(Field::Sector), Some(3));
    assert_eq!(map.columns[&Field::Worked].how, Resolution::Heuristic);
}

#[test]
fn known_layout_picks_up_extra_sector_column() {
    let cfg = Config::default();
    let t = parse_csv(
        "Intervenant;Hres contrat;Total heures;Semaine du;Code secteur\nA;20;20;06/01/2025;IDF07\n",
        ';',
    )
    .unwrap();
    let map = resolve(&cfg, DatasetKind::Weekly, &t).unwrap();
    assert_eq!(map.version, SchemaVersion::KnownV1);
    assert_eq!(map.index(Field::Sector), Some(4));
    assert_eq!(map.columns[&Field::Sector].how, Resolution::Exact);
}

#[test]
fn positional_fallback_leaves_claimed_column_alone() {
    let cfg = Config::default();
    let t = parse_csv("Matricule;Intervenant;Cumul\n12;A;1\n", ';').unwrap();
    let map = resolve(&cfg, DatasetKind::Monthly, &t).unwrap();
    assert_eq!(map.index(Field::Identity), Some(1));
    assert_eq!(map.index(Field::Sector), None);
    assert!(map.warnings.iter().any(|w| w.contains("already holds identity")));
}
