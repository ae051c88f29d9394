mod common;

use modulation_check::config::Config;
use modulation_check::duration::DurationStyle;
use modulation_check::export::{write_monthly, write_weekly};
use modulation_check::ingest::read_table;
use modulation_check::session::{Session, SessionId};

fn utf8_body(bytes: &[u8]) -> &str {
    assert!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]), "missing byte-order mark");
    std::str::from_utf8(&bytes[3..]).unwrap()
}

#[test]
fn weekly_export_appends_sector_overage_and_verdict() {
    let s = common::session_with(Some(common::WEEKLY_V1), Some(common::MONTHLY_V1));
    let mut buf = Vec::new();
    let n = write_weekly(&s, &mut buf).unwrap();
    assert_eq!(n, 5);

    let body = utf8_body(&buf);
    let mut lines = body.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Intervenant;Hres contrat;Total heures;Semaine du;Secteur résolu;Écart semaine;Conformité"
    );
    assert_eq!(
        lines.next().unwrap(),
        "A;20.00;35.00;06/01/2025;IDF01;15.00;OVER_34H"
    );
    assert!(body.contains("E;20.00;-2.00;06/01/2025;NON RÉPERTORIÉ;-22.00;INVALID"));
    assert!(!body.contains("Somme"));
}

#[test]
fn monthly_export_carries_notes_and_edits() {
    let mut s = common::session_with(None, Some(common::MONTHLY_V1));
    s.set_note("A", "heures de formation").unwrap();

    let mut buf = Vec::new();
    write_monthly(&s, &mut buf).unwrap();
    let body = utf8_body(&buf);
    assert_eq!(
        body.lines().next().unwrap(),
        "Intervenant;Secteur;Déviation mois;Déviation cumulée;Hres potentielles restantes;Justification"
    );
    assert!(body.contains("A;IDF01;6.00;10.50;12.00;heures de formation"));
    assert!(body.contains("B;IDF02;-3.00;-4.50;8.00;"));
}

#[test]
fn hhmm_style_and_reimport() {
    let mut cfg = Config::default();
    cfg.output.duration_style = DurationStyle::Hhmm;
    let mut s = Session::new(SessionId::new("hhmm"), &cfg);
    s.load_monthly(&read_table(&cfg, common::MONTHLY_V1.as_bytes()).unwrap())
        .unwrap();

    let mut buf = Vec::new();
    write_monthly(&s, &mut buf).unwrap();
    assert!(utf8_body(&buf).contains("B;IDF02;-03:00;-04:30;08:00;"));

    // The byte-order mark makes the export read back as UTF-8.
    let again = read_table(&cfg, &buf).unwrap();
    assert_eq!(again.headers[3], "Déviation cumulée");
    assert_eq!(again.cell(1, 3), "-04:30");
}

#[test]
fn comma_decimals_without_bom() {
    let mut cfg = Config::default();
    cfg.output.decimal_comma = true;
    cfg.output.write_bom = false;
    let mut s = Session::new(SessionId::new("comma"), &cfg);
    s.load_monthly(&read_table(&cfg, common::MONTHLY_V1.as_bytes()).unwrap())
        .unwrap();

    let mut buf = Vec::new();
    write_monthly(&s, &mut buf).unwrap();
    let body = String::from_utf8(buf).unwrap();
    assert!(body.starts_with("Intervenant;"));
    assert!(body.contains("A;IDF01;6,00;10,50;12,00;"));
}
