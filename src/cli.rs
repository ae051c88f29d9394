use crate::{
    config::Config,
    duration, export, ingest,
    report::{self, SectorFilter},
    schema::{self, DatasetKind},
    session::{MonthlyEdit, Session, SessionId},
    util::{ensure_dir, sha256_hex},
};
use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "modulation-check")]
#[command(about = "Work-hour modulation compliance checker for weekly and monthly timesheet exports")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./modulation-check.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Weekly compliance verdict for every worker.
    Check {
        #[arg(long)]
        weekly: PathBuf,
        /// Monthly export used to resolve sectors missing from the weekly one.
        #[arg(long)]
        monthly: Option<PathBuf>,
        #[arg(long)]
        sector: Option<String>,
    },
    /// Positive, negative and net deviation totals for the month.
    Monthly {
        #[arg(long)]
        monthly: PathBuf,
        /// TOML file with `[notes]` and `[[edit]]` entries.
        #[arg(long)]
        corrections: Option<PathBuf>,
        #[arg(long)]
        sector: Option<String>,
    },
    /// Headline figures and the per-worker modulation series.
    Dashboard {
        #[arg(long)]
        monthly: Option<PathBuf>,
        #[arg(long)]
        weekly: Option<PathBuf>,
        #[arg(long)]
        corrections: Option<PathBuf>,
        #[arg(long)]
        sector: Option<String>,
    },
    /// Re-export a normalized dataset as CSV (`-` writes to stdout).
    Export {
        #[arg(long, value_enum)]
        kind: DatasetKind,
        #[arg(long)]
        weekly: Option<PathBuf>,
        #[arg(long)]
        monthly: Option<PathBuf>,
        #[arg(long)]
        corrections: Option<PathBuf>,
        #[arg(long)]
        out: PathBuf,
    },
    /// Show which export layout a file matches and how its columns resolve.
    Schema {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_enum)]
        kind: DatasetKind,
    },
    /// Parse durations and print them as decimal hours and HH:MM.
    Convert {
        #[arg(required = true, allow_hyphen_values = true)]
        values: Vec<String>,
        /// Report unreadable values instead of reading them as zero.
        #[arg(long)]
        strict: bool,
    },
}

/// User corrections carried between runs: notes and edited monthly rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Corrections {
    #[serde(default)]
    pub notes: BTreeMap<String, String>,
    #[serde(default)]
    pub edit: Vec<MonthlyEdit>,
}

impl Corrections {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading corrections: {}", path.display()))?;
        toml::from_str(&raw).with_context(|| "parsing corrections TOML")
    }
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg_path = resolve_config_path(args.config.as_deref());
    let cfg = match &args.config {
        Some(p) => Config::load(p)?,
        None => Config::load_or_default(&cfg_path)?,
    };
    let _guard = init_logging(&args, &cfg, resolve_log_path(&cfg).as_deref())?;

    match args.cmd {
        Command::Check {
            weekly,
            monthly,
            sector,
        } => {
            let session = open_session(&cfg, Some(weekly.as_path()), monthly.as_deref(), None)?;
            let filter = SectorFilter::from_label(sector.as_deref(), &cfg.sector.all_label);
            print_json(&report::weekly_report(&session, &filter)?)
        }
        Command::Monthly {
            monthly,
            corrections,
            sector,
        } => {
            let session = open_session(&cfg, None, Some(monthly.as_path()), corrections.as_deref())?;
            let filter = SectorFilter::from_label(sector.as_deref(), &cfg.sector.all_label);
            print_json(&report::monthly_summary(&session, &filter)?)
        }
        Command::Dashboard {
            monthly,
            weekly,
            corrections,
            sector,
        } => {
            if monthly.is_none() && weekly.is_none() {
                bail!("dashboard needs --monthly, --weekly or both");
            }
            let session = open_session(
                &cfg,
                weekly.as_deref(),
                monthly.as_deref(),
                corrections.as_deref(),
            )?;
            let filter = SectorFilter::from_label(sector.as_deref(), &cfg.sector.all_label);
            print_json(&report::dashboard(&session, &filter)?)
        }
        Command::Export {
            kind,
            weekly,
            monthly,
            corrections,
            out,
        } => {
            match kind {
                DatasetKind::Weekly if weekly.is_none() => bail!("weekly export needs --weekly"),
                DatasetKind::Monthly if monthly.is_none() => {
                    bail!("monthly export needs --monthly")
                }
                _ => {}
            }
            let session = open_session(
                &cfg,
                weekly.as_deref(),
                monthly.as_deref(),
                corrections.as_deref(),
            )?;
            export_to(&session, kind, &out)
        }
        Command::Schema { input, kind } => {
            let table = ingest::load_table(&cfg, &input)
                .with_context(|| format!("loading {}", input.display()))?;
            let map = schema::resolve(&cfg, kind, &table)?;
            print_json(&map)
        }
        Command::Convert { values, strict } => convert(&values, strict),
    }
}

fn resolve_config_path(user: Option<&Path>) -> PathBuf {
    if let Some(p) = user {
        return p.to_path_buf();
    }
    let default = PathBuf::from("modulation-check.toml");
    if default.exists() {
        default
    } else {
        PathBuf::from("modulation-check.example.toml")
    }
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from("modulation-check.log"))
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries the JSON results, so logs go to stderr.
    let stderr_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

/// Loads the given exports into a fresh session whose id is derived from
/// their contents, then applies any saved corrections.
fn open_session(
    cfg: &Config,
    weekly: Option<&Path>,
    monthly: Option<&Path>,
    corrections: Option<&Path>,
) -> Result<Session> {
    let weekly_bytes = weekly.map(read_input).transpose()?;
    let monthly_bytes = monthly.map(read_input).transpose()?;
    let digest_input: Vec<u8> = [&weekly_bytes, &monthly_bytes]
        .into_iter()
        .flatten()
        .flat_map(|b| b.iter().copied())
        .collect();
    let id = SessionId::new(&sha256_hex(&digest_input)[..16]);
    let mut session = Session::new(id, cfg);
    info!("session {}", session.id());

    if let (Some(path), Some(bytes)) = (monthly, &monthly_bytes) {
        let table = ingest::read_table(cfg, bytes)
            .with_context(|| format!("loading monthly export {}", path.display()))?;
        session
            .load_monthly(&table)
            .with_context(|| format!("reading monthly export {}", path.display()))?;
    }
    if let (Some(path), Some(bytes)) = (weekly, &weekly_bytes) {
        let table = ingest::read_table(cfg, bytes)
            .with_context(|| format!("loading weekly export {}", path.display()))?;
        session
            .load_weekly(&table)
            .with_context(|| format!("reading weekly export {}", path.display()))?;
    }

    if let Some(path) = corrections {
        if session.monthly().is_none() {
            warn!("corrections ignored: they apply to the monthly export, which was not given");
        } else {
            let c = Corrections::load(path)?;
            session.apply_edits(&c.edit)?;
            let skipped = session.import_notes(&c.notes);
            if !skipped.is_empty() {
                warn!("{} note(s) name workers absent from the monthly export", skipped.len());
            }
        }
    }

    Ok(session)
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

fn export_to(session: &Session, kind: DatasetKind, out: &Path) -> Result<()> {
    let rows = if out == Path::new("-") {
        let stdout = std::io::stdout();
        let handle = stdout.lock();
        write_kind(session, kind, handle)?
    } else {
        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }
        let file = std::fs::File::create(out)
            .with_context(|| format!("failed to create {}", out.display()))?;
        write_kind(session, kind, file)?
    };
    info!("wrote {rows} row(s) to {}", out.display());
    Ok(())
}

fn write_kind<W: Write>(session: &Session, kind: DatasetKind, out: W) -> Result<usize> {
    match kind {
        DatasetKind::Weekly => export::write_weekly(session, out),
        DatasetKind::Monthly => export::write_monthly(session, out),
    }
}

#[derive(Debug, Serialize)]
struct Converted<'a> {
    input: &'a str,
    hours: f64,
    hhmm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn convert(values: &[String], strict: bool) -> Result<()> {
    let mut out = Vec::with_capacity(values.len());
    for v in values {
        let (hours, error) = if strict {
            match duration::parse_strict(v) {
                Ok(h) => (h, None),
                Err(e) => (0.0, Some(e.to_string())),
            }
        } else {
            (duration::parse(v), None)
        };
        out.push(Converted {
            input: v,
            hours,
            hhmm: duration::format(hours),
            error,
        });
    }
    print_json(&out)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
