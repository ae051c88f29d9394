use crate::compliance::Thresholds;
use crate::duration::DurationStyle;
use crate::sector::DedupPolicy;
use crate::util::delimiter_byte;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub ingest: Ingest,
    #[serde(default)]
    pub columns: Columns,
    #[serde(default)]
    pub sector: Sector,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks what the TOML types alone cannot express.
    pub fn validate(&self) -> Result<()> {
        for (key, c) in [
            ("ingest.delimiter", self.ingest.delimiter),
            ("output.delimiter", self.output.delimiter),
        ] {
            if delimiter_byte(c).is_none() {
                bail!("{key} {c:?} is not a single ASCII character");
            }
        }
        Ok(())
    }

    /// Loads `path` when it exists, built-in defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingest {
    pub delimiter: char,
    /// WHATWG label of the legacy encoding tried before UTF-8.
    pub legacy_encoding: String,
    pub total_row_markers: Vec<String>,
}
impl Default for Ingest {
    fn default() -> Self {
        Self {
            delimiter: ';',
            legacy_encoding: "windows-1252".into(),
            total_row_markers: crate::duration::TOTAL_ROW_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

/// Candidate column names used when a file matches no known export layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Columns {
    pub identity: Vec<String>,
    pub contracted: Vec<String>,
    pub worked: Vec<String>,
    pub week_start: Vec<String>,
    pub sector: Vec<String>,
    pub monthly_deviation: Vec<String>,
    pub cumulative_deviation: Vec<String>,
    pub potential_remaining: Vec<String>,
    /// Exact names always treated as numeric.
    pub numeric: Vec<String>,
    /// Case-insensitive substrings marking a column as numeric.
    pub numeric_tokens: Vec<String>,
}
impl Default for Columns {
    fn default() -> Self {
        Self {
            identity: vec![
                "Intervenant".into(),
                "Salarié".into(),
                "Salarie".into(),
                "Nom".into(),
            ],
            contracted: vec![
                "Hres contrat".into(),
                "Heures contrat".into(),
                "Contrat".into(),
            ],
            worked: vec![
                "Total heures".into(),
                "Heures réalisées".into(),
                "Heures_Réalisées".into(),
                "Total".into(),
            ],
            week_start: vec![
                "Semaine du".into(),
                "Début semaine".into(),
                "Semaine".into(),
                "Date".into(),
            ],
            sector: vec![
                "Secteur".into(),
                "Code cellule".into(),
                "Code secteur".into(),
                "Cellule".into(),
            ],
            monthly_deviation: vec![
                "Déviation mois".into(),
                "Déviation du mois".into(),
                "Déviation".into(),
            ],
            cumulative_deviation: vec![
                "Déviation cumulée".into(),
                "Modulation_Cumulée".into(),
                "Cumul".into(),
            ],
            potential_remaining: vec![
                "Hres potentielles restantes".into(),
                "Heures potentielles".into(),
                "Potentiel".into(),
            ],
            numeric: vec![],
            numeric_tokens: vec![
                "Hres".into(),
                "Heures".into(),
                "Déviation".into(),
                "Total".into(),
                "Contrat".into(),
                "Potentiel".into(),
                "Cumul".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sector {
    pub unregistered: String,
    /// `first` or `last`: which monthly row wins for a duplicated identity.
    pub dedup: DedupPolicy,
    /// Shape a sample value must have for a `Code*` column to be taken as the sector.
    pub code_pattern: String,
    pub code_token: String,
    pub sample_rows: usize,
    /// Zero-based column used when nothing else matches.
    pub positional_fallback: usize,
    /// Label that selects every sector in filters.
    pub all_label: String,
}
impl Default for Sector {
    fn default() -> Self {
        Self {
            unregistered: "NON RÉPERTORIÉ".into(),
            dedup: DedupPolicy::Last,
            code_pattern: r"^[A-Za-z]{1,6}[ _-]?\d{1,4}[A-Za-z]?$".into(),
            code_token: "Code".into(),
            sample_rows: 5,
            positional_fallback: 1,
            all_label: "Tous".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub delimiter: char,
    pub write_bom: bool,
    /// `decimal` or `hhmm`.
    pub duration_style: DurationStyle,
    pub decimal_comma: bool,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            delimiter: ';',
            write_bom: true,
            duration_style: DurationStyle::Decimal,
            decimal_comma: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}
