use crate::config::Config;
use crate::duration;
use crate::error::LoadError;
use crate::ingest::Table;
use crate::schema::{self, ColumnMap, DatasetKind, Field};
use crate::util::{folded, identity_key};
use serde::{Deserialize, Serialize};
use time::Date;
use time::macros::format_description;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn as_f64(&self) -> f64 {
        match self {
            Cell::Number(v) => *v,
            Cell::Text(_) => 0.0,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Cell::Number(_) => "",
            Cell::Text(s) => s,
        }
    }
}

/// A cell the lenient parser zeroed but the strict parser rejects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataIssue {
    /// 1-based line in the source file, header included.
    pub line: usize,
    pub column: String,
    pub text: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedTable {
    pub headers: Vec<String>,
    pub numeric: Vec<bool>,
    pub rows: Vec<Vec<Cell>>,
    /// Rows removed as subtotals or for a blank identity.
    pub dropped: usize,
    pub issues: Vec<DataIssue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyRecord {
    pub identity: String,
    pub contracted: f64,
    pub worked: f64,
    #[serde(with = "iso_date")]
    pub week_start: Option<Date>,
    pub sector: Option<String>,
}

impl WeeklyRecord {
    pub fn overage(&self) -> f64 {
        self.worked - self.contracted
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyRecord {
    pub identity: String,
    pub sector: String,
    pub monthly_deviation: f64,
    pub cumulative_deviation: f64,
    pub potential_remaining: f64,
    /// Entered by the user; never read from the export.
    pub note: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyDataset {
    pub columns: ColumnMap,
    pub table: NormalizedTable,
    pub records: Vec<WeeklyRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyDataset {
    pub columns: ColumnMap,
    pub table: NormalizedTable,
    pub records: Vec<MonthlyRecord>,
}

pub fn is_numeric_column(cfg: &Config, header: &str) -> bool {
    let h = folded(header);
    cfg.columns.numeric.iter().any(|n| folded(n) == h)
        || cfg
            .columns
            .numeric_tokens
            .iter()
            .map(|t| folded(t))
            .any(|t| !t.is_empty() && h.contains(&t))
}

/// Cleans every row of `table`: numeric columns become hours, the rest
/// trimmed text, and subtotal rows disappear.
pub fn normalize(cfg: &Config, table: &Table, columns: &ColumnMap) -> NormalizedTable {
    let markers = &cfg.ingest.total_row_markers;
    let text_fields = [Field::Identity, Field::Sector, Field::WeekStart];
    let forced_numeric = [
        Field::Contracted,
        Field::Worked,
        Field::MonthlyDeviation,
        Field::CumulativeDeviation,
        Field::PotentialRemaining,
    ];

    let numeric: Vec<bool> = table
        .headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if text_fields.iter().any(|f| columns.index(*f) == Some(i)) {
                false
            } else {
                forced_numeric.iter().any(|f| columns.index(*f) == Some(i))
                    || is_numeric_column(cfg, h)
            }
        })
        .collect();

    let id_col = columns.index(Field::Identity);
    let mut out = NormalizedTable {
        headers: table.headers.clone(),
        numeric,
        ..Default::default()
    };

    for (r, raw) in table.rows.iter().enumerate() {
        let identity = id_col.map(|c| table.cell(r, c)).unwrap_or("");
        if duration::is_blank(identity) || duration::is_total_row(identity, markers) {
            debug!("dropping line {}: identity {:?}", r + 2, identity);
            out.dropped += 1;
            continue;
        }

        let mut row = Vec::with_capacity(out.headers.len());
        for (c, header) in out.headers.iter().enumerate() {
            let text = raw.get(c).map(String::as_str).unwrap_or("");
            if out.numeric[c] {
                if let Err(e) = duration::parse_strict_with_markers(text, markers) {
                    out.issues.push(DataIssue {
                        line: r + 2,
                        column: header.clone(),
                        text: e.text,
                        reason: e.reason,
                    });
                }
                row.push(Cell::Number(duration::parse_with_markers(text, markers)));
            } else if Some(c) == id_col {
                row.push(Cell::Text(identity_key(text)));
            } else {
                row.push(Cell::Text(text.trim().to_string()));
            }
        }
        out.rows.push(row);
    }

    if !out.issues.is_empty() {
        warn!(
            "{} cell(s) could not be read and were counted as zero",
            out.issues.len()
        );
    }
    out
}

fn number(row: &[Cell], col: Option<usize>) -> f64 {
    col.and_then(|c| row.get(c)).map(Cell::as_f64).unwrap_or(0.0)
}

fn text(row: &[Cell], col: Option<usize>) -> String {
    col.and_then(|c| row.get(c))
        .map(|c| c.as_str().to_string())
        .unwrap_or_default()
}

/// Reads a week-start date written day-first, with ISO dates also accepted.
pub fn parse_week_start(s: &str) -> Option<Date> {
    let token = s.split_whitespace().next()?;
    // Unpadded components still accept two digits, so `6/1/2025` and
    // `06/01/2025` both read.
    let day_first = format_description!("[day padding:none]/[month padding:none]/[year]");
    let day_first_dash = format_description!("[day padding:none]-[month padding:none]-[year]");
    let iso = format_description!("[year]-[month]-[day]");
    Date::parse(token, day_first)
        .or_else(|_| Date::parse(token, day_first_dash))
        .or_else(|_| Date::parse(token, iso))
        .ok()
}

pub fn weekly_from_table(cfg: &Config, table: &Table) -> Result<WeeklyDataset, LoadError> {
    let columns = schema::resolve(cfg, DatasetKind::Weekly, table)?;
    let normalized = normalize(cfg, table, &columns);

    let (id, contracted, worked, week, sector) = (
        columns.index(Field::Identity),
        columns.index(Field::Contracted),
        columns.index(Field::Worked),
        columns.index(Field::WeekStart),
        columns.index(Field::Sector),
    );

    let records = normalized
        .rows
        .iter()
        .map(|row| WeeklyRecord {
            identity: text(row, id),
            contracted: number(row, contracted),
            worked: number(row, worked),
            week_start: parse_week_start(&text(row, week)),
            sector: Some(text(row, sector)).filter(|s| !s.is_empty()),
        })
        .collect();

    Ok(WeeklyDataset {
        columns,
        table: normalized,
        records,
    })
}

pub fn monthly_from_table(cfg: &Config, table: &Table) -> Result<MonthlyDataset, LoadError> {
    let columns = schema::resolve(cfg, DatasetKind::Monthly, table)?;
    let normalized = normalize(cfg, table, &columns);

    let (id, sector, dev, cumul, potential) = (
        columns.index(Field::Identity),
        columns.index(Field::Sector),
        columns.index(Field::MonthlyDeviation),
        columns.index(Field::CumulativeDeviation),
        columns.index(Field::PotentialRemaining),
    );

    let records = normalized
        .rows
        .iter()
        .map(|row| MonthlyRecord {
            identity: text(row, id),
            sector: text(row, sector),
            monthly_deviation: number(row, dev),
            cumulative_deviation: number(row, cumul),
            potential_remaining: number(row, potential),
            note: String::new(),
        })
        .collect();

    Ok(MonthlyDataset {
        columns,
        table: normalized,
        records,
    })
}

mod iso_date {
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;
    use time::macros::format_description;

    pub fn serialize<S: Serializer>(d: &Option<Date>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => {
                let text = d
                    .format(format_description!("[year]-[month]-[day]"))
                    .map_err(serde::ser::Error::custom)?;
                s.serialize_some(&text)
            }
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Date>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw {
            Some(s) => Date::parse(&s, format_description!("[year]-[month]-[day]"))
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
