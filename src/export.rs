//! CSV re-export of the normalized datasets: `;`-delimited UTF-8 with a
//! byte-order mark so legacy spreadsheet editors pick the right encoding.

use crate::config::Config;
use crate::normalize::Cell;
use crate::schema::Field;
use crate::session::Session;
use crate::util::delimiter_byte;
use anyhow::{Context, Result, bail};
use std::io::Write;
use tracing::info;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

pub const SECTOR_HEADER: &str = "Secteur résolu";
pub const OVERAGE_HEADER: &str = "Écart semaine";
pub const VERDICT_HEADER: &str = "Conformité";
pub const NOTE_HEADER: &str = "Justification";

fn render_hours(cfg: &Config, hours: f64) -> String {
    cfg.output.duration_style.render(hours, cfg.output.decimal_comma)
}

fn render(cfg: &Config, cell: &Cell) -> String {
    match cell {
        Cell::Number(v) => render_hours(cfg, *v),
        Cell::Text(s) => s.clone(),
    }
}

fn writer<W: Write>(cfg: &Config, mut out: W) -> Result<csv::Writer<W>> {
    let Some(delimiter) = delimiter_byte(cfg.output.delimiter) else {
        bail!("output.delimiter {:?} is not a single ASCII character", cfg.output.delimiter);
    };
    if cfg.output.write_bom {
        out.write_all(UTF8_BOM).context("writing byte-order mark")?;
    }
    Ok(csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(out))
}

/// Weekly rows with the resolved sector, the weekly overage and the verdict appended.
pub fn write_weekly<W: Write>(session: &Session, out: W) -> Result<usize> {
    let cfg = session.config();
    let weekly = session
        .weekly()
        .context("no weekly dataset loaded in this session")?;
    let sectors = session.sector_map();
    let mut w = writer(cfg, out)?;

    let mut headers = weekly.table.headers.clone();
    headers.extend([SECTOR_HEADER, OVERAGE_HEADER, VERDICT_HEADER].map(String::from));
    w.write_record(&headers)?;

    let contracted_col = weekly.columns.index(Field::Contracted);
    let worked_col = weekly.columns.index(Field::Worked);

    for (row, rec) in weekly.table.rows.iter().zip(&weekly.records) {
        let mut line: Vec<String> = row.iter().map(|c| render(cfg, c)).collect();
        if let Some(c) = contracted_col {
            line[c] = render_hours(cfg, rec.contracted);
        }
        if let Some(c) = worked_col {
            line[c] = render_hours(cfg, rec.worked);
        }
        let verdict = match cfg.thresholds.evaluate(rec.contracted, rec.worked) {
            Ok(v) => v.as_str().to_string(),
            Err(_) => "INVALID".to_string(),
        };
        line.push(sectors.sector_of(rec).to_string());
        line.push(render_hours(cfg, rec.overage()));
        line.push(verdict);
        w.write_record(&line)?;
    }
    w.flush()?;
    info!("exported {} weekly row(s)", weekly.records.len());
    Ok(weekly.records.len())
}

/// Monthly rows, including saved edits, with the justification note appended.
pub fn write_monthly<W: Write>(session: &Session, out: W) -> Result<usize> {
    let cfg = session.config();
    let monthly = session
        .monthly()
        .context("no monthly dataset loaded in this session")?;
    let mut w = writer(cfg, out)?;

    let mut headers = monthly.table.headers.clone();
    headers.push(NOTE_HEADER.to_string());
    w.write_record(&headers)?;

    let col = |f: Field| monthly.columns.index(f);
    for (row, rec) in monthly.table.rows.iter().zip(&monthly.records) {
        let mut line: Vec<String> = row.iter().map(|c| render(cfg, c)).collect();
        if let Some(c) = col(Field::Sector) {
            line[c] = rec.sector.clone();
        }
        for (field, value) in [
            (Field::MonthlyDeviation, rec.monthly_deviation),
            (Field::CumulativeDeviation, rec.cumulative_deviation),
            (Field::PotentialRemaining, rec.potential_remaining),
        ] {
            if let Some(c) = col(field) {
                line[c] = render_hours(cfg, value);
            }
        }
        line.push(rec.note.clone());
        w.write_record(&line)?;
    }
    w.flush()?;
    info!("exported {} monthly row(s)", monthly.records.len());
    Ok(monthly.records.len())
}
