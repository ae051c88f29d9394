use modulation_check::config::Config;
use modulation_check::error::LoadError;
use modulation_check::ingest::{decode, parse_csv, read_table};
use modulation_check::normalize::monthly_from_table;
use modulation_check::schema::SchemaVersion;

#[test]
fn legacy_bytes_decode_as_windows_1252() {
    // "Salarié;Heures contrat" with é as 0xE9.
    let bytes = b"Salari\xe9;Heures contrat\n";
    let d = decode(bytes, "windows-1252").unwrap();
    assert_eq!(d.encoding, "windows-1252");
    assert!(d.text.starts_with("Salarié;"));
}

#[test]
fn byte_order_mark_forces_utf8() {
    let mut bytes = vec![0xEF, 0xBB, 0xBF];
    bytes.extend_from_slice("Salarié;Secteur\n".as_bytes());
    let d = decode(&bytes, "windows-1252").unwrap();
    assert_eq!(d.encoding, "UTF-8");
    assert_eq!(d.text, "Salarié;Secteur\n");
}

#[test]
fn c1_controls_fall_back_to_utf8() {
    // "Ł" is C5 81 in UTF-8; 0x81 is a C1 control once read as windows-1252.
    let bytes = "Łukasz;12\n".as_bytes();
    let d = decode(bytes, "windows-1252").unwrap();
    assert_eq!(d.encoding, "UTF-8");
    assert_eq!(d.text, "Łukasz;12\n");
}

#[test]
fn unknown_legacy_label_is_an_error() {
    assert!(matches!(
        decode(b"a;b\n", "no-such-charset"),
        Err(LoadError::UnknownEncoding(_))
    ));
}

#[test]
fn undecodable_input_is_a_load_error() {
    // 0x81 is C1 in windows-1252 and an invalid lead byte in UTF-8.
    assert!(matches!(
        decode(b"a\x81b;c\n", "windows-1252"),
        Err(LoadError::Undecodable { .. })
    ));
}

#[test]
fn csv_pads_short_rows_and_skips_blank_lines() {
    let t = parse_csv(" Intervenant ;Hres contrat;Total heures\nA;20:00\n;;\n\nB;35,5;40\n", ';')
        .unwrap();
    assert_eq!(t.headers, ["Intervenant", "Hres contrat", "Total heures"]);
    assert_eq!(t.rows.len(), 2);
    assert_eq!(t.rows[0], ["A", "20:00", ""]);
    assert_eq!(t.cell(1, 1), "35,5");
    assert_eq!(t.cell(9, 9), "");
}

#[test]
fn read_table_uses_configured_delimiter() {
    let mut cfg = Config::default();
    cfg.ingest.delimiter = ',';
    let t = read_table(&cfg, b"Intervenant,Secteur\nA,IDF01\n").unwrap();
    assert_eq!(t.column("Secteur"), Some(1));
    assert_eq!(t.cell(0, 1), "IDF01");
}

#[test]
fn french_utf8_without_bom_reads_as_utf8() {
    let text = "Intervenant;Secteur;Déviation mois;Déviation cumulée;Hres potentielles restantes\n\
                Hélène;IDF01;6;10,5;12\n";
    let d = decode(text.as_bytes(), "windows-1252").unwrap();
    assert_eq!(d.encoding, "UTF-8");
    assert_eq!(d.text, text);

    let cfg = Config::default();
    let ds = monthly_from_table(&cfg, &read_table(&cfg, text.as_bytes()).unwrap()).unwrap();
    assert_eq!(ds.columns.version, SchemaVersion::KnownV1);
    assert!(ds.columns.warnings.is_empty());
    assert_eq!(ds.records[0].identity, "Hélène");
    assert_eq!(ds.records[0].monthly_deviation, 6.0);
    assert_eq!(ds.records[0].cumulative_deviation, 10.5);
}

#[test]
fn non_ascii_delimiter_is_a_load_error() {
    assert!(matches!(
        parse_csv("a§b\n", '§'),
        Err(LoadError::Delimiter('§'))
    ));
}
