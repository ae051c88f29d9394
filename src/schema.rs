//! Export layout detection and column resolution.
//!
//! The upstream workforce tool has shipped two CSV layouts per dataset. A file
//! matching one of them resolves by exact header name. Anything else goes
//! through candidate names, then a `Code*` column whose sampled values look
//! like sector codes, then a fixed column index. Every guess is reported as a
//! warning.

use crate::config::Config;
use crate::error::LoadError;
use crate::ingest::Table;
use crate::util::folded;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaVersion {
    KnownV1,
    KnownV2,
    Unrecognized(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Identity,
    Contracted,
    Worked,
    WeekStart,
    Sector,
    MonthlyDeviation,
    CumulativeDeviation,
    PotentialRemaining,
}

impl Field {
    pub fn name(self) -> &'static str {
        match self {
            Field::Identity => "identity",
            Field::Contracted => "contracted",
            Field::Worked => "worked",
            Field::WeekStart => "week_start",
            Field::Sector => "sector",
            Field::MonthlyDeviation => "monthly_deviation",
            Field::CumulativeDeviation => "cumulative_deviation",
            Field::PotentialRemaining => "potential_remaining",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Exact,
    Heuristic,
    Positional,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedColumn {
    pub index: usize,
    pub header: String,
    pub how: Resolution,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMap {
    pub kind: DatasetKind,
    pub version: SchemaVersion,
    pub columns: BTreeMap<Field, ResolvedColumn>,
    pub warnings: Vec<String>,
}

impl ColumnMap {
    pub fn index(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).map(|c| c.index)
    }
}

type Layout = &'static [(Field, &'static str)];

const WEEKLY_V1: Layout = &[
    (Field::Identity, "Intervenant"),
    (Field::Contracted, "Hres contrat"),
    (Field::Worked, "Total heures"),
    (Field::WeekStart, "Semaine du"),
];

const WEEKLY_V2: Layout = &[
    (Field::Identity, "Salarié"),
    (Field::Contracted, "Heures contrat"),
    (Field::Worked, "Heures réalisées"),
    (Field::WeekStart, "Début semaine"),
    (Field::Sector, "Code secteur"),
];

const MONTHLY_V1: Layout = &[
    (Field::Identity, "Intervenant"),
    (Field::Sector, "Secteur"),
    (Field::MonthlyDeviation, "Déviation mois"),
    (Field::CumulativeDeviation, "Déviation cumulée"),
    (Field::PotentialRemaining, "Hres potentielles restantes"),
];

const MONTHLY_V2: Layout = &[
    (Field::Identity, "Intervenant"),
    (Field::Sector, "Code cellule"),
    (Field::MonthlyDeviation, "Déviation du mois"),
    (Field::CumulativeDeviation, "Déviation cumulée"),
    (Field::PotentialRemaining, "Heures potentielles"),
];

fn layouts(kind: DatasetKind) -> [(SchemaVersion, Layout); 2] {
    // V2 first: its columns are never a subset of V1's, but checking the
    // richer layout first keeps the order stable if that changes.
    match kind {
        DatasetKind::Weekly => [
            (SchemaVersion::KnownV2, WEEKLY_V2),
            (SchemaVersion::KnownV1, WEEKLY_V1),
        ],
        DatasetKind::Monthly => [
            (SchemaVersion::KnownV2, MONTHLY_V2),
            (SchemaVersion::KnownV1, MONTHLY_V1),
        ],
    }
}

fn fields(kind: DatasetKind) -> &'static [Field] {
    match kind {
        DatasetKind::Weekly => &[
            Field::Identity,
            Field::Contracted,
            Field::Worked,
            Field::WeekStart,
            Field::Sector,
        ],
        DatasetKind::Monthly => &[
            Field::Identity,
            Field::Sector,
            Field::CumulativeDeviation,
            Field::MonthlyDeviation,
            Field::PotentialRemaining,
        ],
    }
}

fn required(kind: DatasetKind, field: Field) -> bool {
    match kind {
        DatasetKind::Weekly => matches!(field, Field::Identity | Field::Contracted | Field::Worked),
        DatasetKind::Monthly => matches!(field, Field::Identity),
    }
}

fn find_header(headers: &[String], name: &str) -> Option<usize> {
    let key = folded(name);
    headers.iter().position(|h| folded(h) == key)
}

pub fn detect(kind: DatasetKind, headers: &[String]) -> SchemaVersion {
    for (version, layout) in layouts(kind) {
        if layout
            .iter()
            .all(|(_, name)| find_header(headers, name).is_some())
        {
            return version;
        }
    }
    SchemaVersion::Unrecognized(headers.to_vec())
}

pub fn resolve(cfg: &Config, kind: DatasetKind, table: &Table) -> Result<ColumnMap, LoadError> {
    let version = detect(kind, &table.headers);
    let mut map = ColumnMap {
        kind,
        version: version.clone(),
        columns: BTreeMap::new(),
        warnings: Vec::new(),
    };

    if let Some(layout) = layouts(kind)
        .into_iter()
        .find(|(v, _)| *v == version)
        .map(|(_, l)| l)
    {
        for (field, name) in layout {
            if let Some(index) = find_header(&table.headers, name) {
                map.columns.insert(
                    *field,
                    ResolvedColumn {
                        index,
                        header: table.headers[index].clone(),
                        how: Resolution::Exact,
                    },
                );
            }
        }
        // A known layout may carry extra columns, e.g. a sector code on a V1
        // weekly export.
        resolve_exact_candidates(cfg, kind, &table.headers, &mut map);
        return Ok(map);
    }

    resolve_unrecognized(cfg, kind, table, &mut map)?;

    for w in &map.warnings {
        warn!("{:?} export: {w}", kind);
    }
    Ok(map)
}

fn candidates(cfg: &Config, field: Field) -> &[String] {
    let c = &cfg.columns;
    match field {
        Field::Identity => &c.identity,
        Field::Contracted => &c.contracted,
        Field::Worked => &c.worked,
        Field::WeekStart => &c.week_start,
        Field::Sector => &c.sector,
        Field::MonthlyDeviation => &c.monthly_deviation,
        Field::CumulativeDeviation => &c.cumulative_deviation,
        Field::PotentialRemaining => &c.potential_remaining,
    }
}

fn claimed(map: &ColumnMap, index: usize) -> bool {
    map.columns.values().any(|c| c.index == index)
}

/// Maps every still-unmapped field whose candidate name appears verbatim
/// among the headers, skipping columns already taken.
fn resolve_exact_candidates(cfg: &Config, kind: DatasetKind, headers: &[String], map: &mut ColumnMap) {
    for &field in fields(kind) {
        if map.columns.contains_key(&field) {
            continue;
        }
        let hit = candidates(cfg, field)
            .iter()
            .filter_map(|name| find_header(headers, name))
            .find(|&idx| !claimed(map, idx));
        if let Some(index) = hit {
            map.columns.insert(
                field,
                ResolvedColumn {
                    index,
                    header: headers[index].clone(),
                    how: Resolution::Exact,
                },
            );
        }
    }
}

fn resolve_unrecognized(
    cfg: &Config,
    kind: DatasetKind,
    table: &Table,
    map: &mut ColumnMap,
) -> Result<(), LoadError> {
    let headers = &table.headers;

    // Exact names for every field before any substring guess, so a guess never
    // steals a column that another field names exactly.
    resolve_exact_candidates(cfg, kind, headers, map);

    for &field in fields(kind) {
        if map.columns.contains_key(&field) {
            continue;
        }
        let hit = if field == Field::Sector {
            sector_by_code_shape(cfg, table, map)?
        } else {
            candidates(cfg, field).iter().find_map(|name| {
                let key = folded(name);
                headers
                    .iter()
                    .enumerate()
                    .find(|(i, h)| !claimed(map, *i) && folded(h).contains(&key))
                    .map(|(i, _)| i)
            })
        };
        if let Some(index) = hit {
            map.warnings.push(format!(
                "{} column guessed as {:?}",
                field.name(),
                headers[index]
            ));
            map.columns.insert(
                field,
                ResolvedColumn {
                    index,
                    header: headers[index].clone(),
                    how: Resolution::Heuristic,
                },
            );
        }
    }

    if kind == DatasetKind::Monthly && !map.columns.contains_key(&Field::Sector) {
        let index = cfg.sector.positional_fallback;
        let holder = map
            .columns
            .iter()
            .find(|(_, c)| c.index == index)
            .map(|(f, _)| *f);
        if let Some(field) = holder {
            map.warnings.push(format!(
                "sector column not found; column {} ({:?}) already holds {}",
                index,
                headers[index],
                field.name()
            ));
        } else if index < headers.len() {
            map.warnings.push(format!(
                "sector column not found; using column {} ({:?}) by position",
                index, headers[index]
            ));
            map.columns.insert(
                Field::Sector,
                ResolvedColumn {
                    index,
                    header: headers[index].clone(),
                    how: Resolution::Positional,
                },
            );
        }
    }

    for &field in fields(kind) {
        if map.columns.contains_key(&field) {
            continue;
        }
        if required(kind, field) {
            return Err(LoadError::MissingColumn(field.name()));
        }
        if field != Field::Sector || kind == DatasetKind::Monthly {
            map.warnings
                .push(format!("no {} column; values default to empty", field.name()));
        }
    }

    Ok(())
}

/// First unclaimed column named like `Code*` whose leading non-blank values
/// all look like sector codes.
fn sector_by_code_shape(
    cfg: &Config,
    table: &Table,
    map: &ColumnMap,
) -> Result<Option<usize>, LoadError> {
    let shape = Regex::new(&cfg.sector.code_pattern)?;
    let token = folded(&cfg.sector.code_token);

    for (index, header) in table.headers.iter().enumerate() {
        if claimed(map, index) || !folded(header).contains(&token) {
            continue;
        }
        let sample: Vec<&str> = (0..table.rows.len())
            .map(|r| table.cell(r, index).trim())
            .filter(|v| !v.is_empty())
            .take(cfg.sector.sample_rows.max(1))
            .collect();
        if !sample.is_empty() && sample.iter().all(|v| shape.is_match(v)) {
            return Ok(Some(index));
        }
    }
    Ok(None)
}
