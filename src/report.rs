use crate::compliance::{ContractKind, Verdict};
use crate::duration::format;
use crate::normalize::{DataIssue, MonthlyRecord};
use crate::session::Session;
use crate::util::now_rfc3339;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectorFilter {
    All,
    Only(String),
}

impl SectorFilter {
    /// `None`, the configured "all" label, or `all` select every sector.
    pub fn from_label(label: Option<&str>, all_label: &str) -> Self {
        match label.map(str::trim) {
            None | Some("") => SectorFilter::All,
            Some(l) if l.eq_ignore_ascii_case(all_label) || l.eq_ignore_ascii_case("all") => {
                SectorFilter::All
            }
            Some(l) => SectorFilter::Only(l.to_string()),
        }
    }

    pub fn matches(&self, sector: &str) -> bool {
        match self {
            SectorFilter::All => true,
            SectorFilter::Only(s) => s == sector,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyRow {
    pub identity: String,
    pub sector: String,
    pub week_start: Option<String>,
    pub contracted: f64,
    pub worked: f64,
    pub overage: f64,
    pub contracted_hhmm: String,
    pub worked_hhmm: String,
    pub overage_hhmm: String,
    pub contract: ContractKind,
    pub verdict: Option<Verdict>,
    /// Set instead of `verdict` when the row is outside the rules' domain.
    pub invalid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    pub generated_at: String,
    pub session: String,
    pub sector: SectorFilter,
    pub rows: Vec<WeeklyRow>,
    pub counts: BTreeMap<String, usize>,
    pub alerts: usize,
    pub invalid: usize,
    pub warnings: Vec<String>,
    pub issues: Vec<DataIssue>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviationTotals {
    pub positive: f64,
    pub negative: f64,
    pub net: f64,
}

impl DeviationTotals {
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Self {
        let mut t = DeviationTotals::default();
        for v in values {
            if v > 0.0 {
                t.positive += v;
            } else {
                t.negative += v;
            }
        }
        t.net = t.positive + t.negative;
        t
    }

    pub fn formatted(&self) -> FormattedTotals {
        FormattedTotals {
            positive: format(self.positive),
            negative: format(self.negative),
            net: format(self.net),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedTotals {
    pub positive: String,
    pub negative: String,
    pub net: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub generated_at: String,
    pub session: String,
    pub sector: SectorFilter,
    pub workers: usize,
    pub monthly: DeviationTotals,
    pub monthly_hhmm: FormattedTotals,
    pub cumulative: DeviationTotals,
    pub cumulative_hhmm: FormattedTotals,
    pub rows: Vec<MonthlyRecord>,
    pub warnings: Vec<String>,
    pub issues: Vec<DataIssue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub identity: String,
    pub cumulative_deviation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub generated_at: String,
    pub session: String,
    pub sectors: Vec<String>,
    pub sector: SectorFilter,
    pub total_worked: f64,
    pub total_worked_hhmm: String,
    pub alerts: usize,
    pub mean_cumulative_deviation: f64,
    pub mean_cumulative_hhmm: String,
    pub chart: Vec<ChartPoint>,
}

pub fn weekly_report(session: &Session, filter: &SectorFilter) -> Result<WeeklyReport> {
    let weekly = session
        .weekly()
        .context("no weekly dataset loaded in this session")?;
    let sectors = session.sector_map();
    let thresholds = &session.config().thresholds;

    let mut rows = Vec::new();
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let (mut alerts, mut invalid) = (0, 0);

    for rec in &weekly.records {
        let sector = sectors.sector_of(rec);
        if !filter.matches(sector) {
            continue;
        }
        let (verdict, error) = match thresholds.evaluate(rec.contracted, rec.worked) {
            Ok(v) => (Some(v), None),
            Err(e) => (None, Some(e.to_string())),
        };
        match verdict {
            Some(v) => {
                *counts.entry(v.as_str().to_string()).or_default() += 1;
                if v.is_alert() {
                    alerts += 1;
                }
            }
            None => invalid += 1,
        }
        rows.push(WeeklyRow {
            identity: rec.identity.clone(),
            sector: sector.to_string(),
            week_start: rec.week_start.map(|d| d.to_string()),
            contracted: rec.contracted,
            worked: rec.worked,
            overage: rec.overage(),
            contracted_hhmm: format(rec.contracted),
            worked_hhmm: format(rec.worked),
            overage_hhmm: format(rec.overage()),
            contract: thresholds.classify(rec.contracted),
            verdict,
            invalid: error,
        });
    }

    Ok(WeeklyReport {
        generated_at: now_rfc3339(),
        session: session.id().to_string(),
        sector: filter.clone(),
        rows,
        counts,
        alerts,
        invalid,
        warnings: weekly.columns.warnings.clone(),
        issues: weekly.table.issues.clone(),
    })
}

pub fn monthly_summary(session: &Session, filter: &SectorFilter) -> Result<MonthlySummary> {
    let monthly = session
        .monthly()
        .context("no monthly dataset loaded in this session")?;
    let unregistered = &session.config().sector.unregistered;

    let rows: Vec<MonthlyRecord> = monthly
        .records
        .iter()
        .filter(|r| {
            let sector = if r.sector.is_empty() { unregistered } else { &r.sector };
            filter.matches(sector)
        })
        .cloned()
        .collect();

    let monthly_totals = DeviationTotals::from_values(rows.iter().map(|r| r.monthly_deviation));
    let cumulative = DeviationTotals::from_values(rows.iter().map(|r| r.cumulative_deviation));

    Ok(MonthlySummary {
        generated_at: now_rfc3339(),
        session: session.id().to_string(),
        sector: filter.clone(),
        workers: rows.len(),
        monthly_hhmm: monthly_totals.formatted(),
        monthly: monthly_totals,
        cumulative_hhmm: cumulative.formatted(),
        cumulative,
        rows,
        warnings: monthly.columns.warnings.clone(),
        issues: monthly.table.issues.clone(),
    })
}

/// Sectors present in the loaded datasets, preceded by the "all" label.
pub fn available_sectors(session: &Session) -> Result<Vec<String>> {
    let cfg = session.config();
    let mut set = BTreeSet::new();
    if let Some(m) = session.monthly() {
        for r in &m.records {
            if r.sector.is_empty() {
                set.insert(cfg.sector.unregistered.clone());
            } else {
                set.insert(r.sector.clone());
            }
        }
    }
    if let Some(w) = session.weekly() {
        let map = session.sector_map();
        for r in &w.records {
            set.insert(map.sector_of(r).to_string());
        }
    }
    let mut out = vec![cfg.sector.all_label.clone()];
    out.extend(set);
    Ok(out)
}

pub fn dashboard(session: &Session, filter: &SectorFilter) -> Result<Dashboard> {
    let (total_worked, alerts) = match session.weekly() {
        Some(_) => {
            let report = weekly_report(session, filter)?;
            let worked = report.rows.iter().map(|r| r.worked).sum::<f64>();
            (worked, report.alerts)
        }
        None => (0.0, 0),
    };

    let (mean, chart) = match session.monthly() {
        Some(_) => {
            let summary = monthly_summary(session, filter)?;
            let n = summary.rows.len();
            let mean = if n == 0 {
                0.0
            } else {
                summary.rows.iter().map(|r| r.cumulative_deviation).sum::<f64>() / n as f64
            };
            let chart = summary
                .rows
                .iter()
                .map(|r| ChartPoint {
                    identity: r.identity.clone(),
                    cumulative_deviation: r.cumulative_deviation,
                })
                .collect();
            (mean, chart)
        }
        None => (0.0, Vec::new()),
    };

    Ok(Dashboard {
        generated_at: now_rfc3339(),
        session: session.id().to_string(),
        sectors: available_sectors(session)?,
        sector: filter.clone(),
        total_worked,
        total_worked_hhmm: format(total_worked),
        alerts,
        mean_cumulative_deviation: mean,
        mean_cumulative_hhmm: format(mean),
        chart,
    })
}
