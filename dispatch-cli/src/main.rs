mod loader;
mod reports;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs::{self, File};
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;

use dispatch_engine::{CatalogLoader, PlannerConfig, PlannerEngine, Strategy};
use loader::{EmbeddedCatalogLoader, FsCatalogLoader, load_roster};
use reports::PlanReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    /// Maximize mission value, then use the fewest characters
    BaseFirst,
    /// Maximize bonus-satisfied missions first
    BonusFirst,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::BaseFirst => Self::BaseFirst,
            StrategyArg::BonusFirst => Self::BonusFirst,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "dispatch-planner", version)]
#[command(about = "Plan disjoint mission teams and rank characters worth training")]
struct Args {
    /// Directory holding tags.json, characters.json and missions.json (default: bundled sample)
    #[arg(long)]
    data: Option<PathBuf>,

    /// User roster JSON (default: bundled sample roster)
    #[arg(long)]
    roster: Option<PathBuf>,

    /// Missions to plan (comma-separated), replacing the roster's selection
    #[arg(long)]
    missions: Option<String>,

    /// Optimization strategy; overrides the config file
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Planner configuration JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also list every ready and blocked team per mission
    #[arg(long)]
    candidates: bool,

    /// List catalog missions and exit
    #[arg(long)]
    list_missions: bool,

    /// Preferred label locale (falls back to English)
    #[arg(long, default_value = "en")]
    locale: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    let config = load_config(&args)?;

    match &args.data {
        Some(dir) => run(&args, PlannerEngine::new(FsCatalogLoader::new(dir), config)),
        None => run(&args, PlannerEngine::new(EmbeddedCatalogLoader, config)),
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn load_config(args: &Args) -> Result<PlannerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            PlannerConfig::from_json(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => PlannerConfig::default(),
    };
    if let Some(strategy) = args.strategy {
        config = config.with_strategy(strategy.into());
    }
    Ok(config)
}

fn run<L: CatalogLoader>(args: &Args, engine: PlannerEngine<L>) -> Result<()> {
    let catalog = engine.load_catalog().context("failed to load catalog")?;
    if args.output.is_some() {
        colored::control::set_override(false);
    }

    if args.list_missions {
        let mut output_target = OutputTarget::new(args.output.clone())?;
        reports::write_mission_list(output_target.writer(), &catalog, &args.locale)?;
        output_target.flush_inner()?;
        return Ok(());
    }

    let mut state = load_roster(args.roster.as_deref()).context("failed to load roster")?;
    if let Some(missions) = &args.missions {
        state.selected_missions = split_csv(missions);
    }
    log::info!(
        "planning {} missions with {} owned characters ({})",
        state.selected_missions.len(),
        state.owned.len(),
        engine.config().strategy
    );

    let result = engine.plan(&catalog, &state).context("planning failed")?;
    let candidates = if args.candidates {
        Some(engine.candidates(&catalog, &state)?)
    } else {
        None
    };
    let report = PlanReport::build(
        &catalog,
        &state,
        &result,
        candidates.as_deref(),
        &args.locale,
    );
    write_report(args, &report)
}

fn write_report(args: &Args, report: &PlanReport) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Json => reports::generate_json_report(&mut output_target, report)?,
        ReportFormat::Markdown => reports::generate_markdown_report(&mut output_target, report)?,
        ReportFormat::Console => reports::generate_console_report(&mut output_target, report)?,
    }
    output_target.flush_inner()?;
    Ok(())
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
