use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

mod cluster;
mod config;
mod error;
mod filter;
mod hypothesis;
mod insight;
mod loader;
mod models;
mod report;
mod shell;

use filter::{Criterion, FilterValue, Session};
use models::{NumericColumn, TextColumn};
use report::{Format, ViewKind, ViewParams};

#[derive(Parser)]
#[command(name = "tracer-insight")]
#[command(
    about = "Alumni tracer study analytics for the electrical engineering programme",
    long_about = None
)]
struct Cli {
    /// Tracer study CSV export
    #[arg(long, global = true, env = "TRACER_DATA", default_value = config::DEFAULT_DATA_PATH)]
    data: PathBuf,
    /// Emit views as JSON instead of Markdown
    #[arg(long, global = true)]
    json: bool,
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(flatten)]
    filters: FilterArgs,
    #[command(subcommand)]
    command: Commands,
}

/// Narrowing applied before any view is computed. Repeat a flag to allow
/// several values.
#[derive(Args)]
struct FilterArgs {
    #[arg(long = "year", global = true)]
    years: Vec<i32>,
    #[arg(long = "program", global = true)]
    programs: Vec<String>,
    #[arg(long = "specialization", global = true)]
    specializations: Vec<String>,
    #[arg(long = "location", global = true)]
    locations: Vec<String>,
}

impl FilterArgs {
    fn apply(&self, session: &mut Session) -> anyhow::Result<()> {
        if !self.years.is_empty() {
            session.filters_mut().write(
                Criterion::CohortYear,
                self.years.iter().copied().map(FilterValue::Year),
            )?;
        }
        for (criterion, raw) in [
            (Criterion::Program, &self.programs),
            (Criterion::Specialization, &self.specializations),
            (Criterion::Location, &self.locations),
        ] {
            if raw.is_empty() {
                continue;
            }
            let values = raw
                .iter()
                .map(|value| criterion.parse_value(value))
                .collect::<Result<Vec<_>, _>>()?;
            session.filters_mut().write(criterion, values)?;
        }
        Ok(())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Headline KPIs, province spread and automatic insights
    Overview,
    /// Salary by industry and location, top employers and positions
    Career,
    /// Chi-square and ANOVA tests plus the GPA trend
    Stats,
    /// Feedback sentiment distribution and samples
    Sentiment,
    /// Group alumni with k-means
    Cluster {
        #[arg(
            long,
            default_value_t = config::DEFAULT_CLUSTER_COUNT,
            value_parser = clap::value_parser!(u8)
                .range(config::MIN_CLUSTER_COUNT as i64..=config::MAX_CLUSTER_COUNT as i64)
        )]
        k: u8,
        /// Attribute to cluster on; defaults to every available one
        #[arg(long = "attr", value_enum)]
        attributes: Vec<NumericColumn>,
        #[arg(long, default_value_t = config::CLUSTER_SEED)]
        seed: u64,
    },
    /// Correlation matrix, strong pairs and one distribution
    Correlate {
        #[arg(long, value_enum, requires = "y")]
        x: Option<NumericColumn>,
        #[arg(long, value_enum, requires = "x")]
        y: Option<NumericColumn>,
        #[arg(long, value_enum)]
        column: Option<NumericColumn>,
    },
    /// Descriptive statistics, category counts, outliers and cross tabulation
    Eda {
        #[arg(long, value_enum)]
        column: Option<NumericColumn>,
        #[arg(long, visible_alias = "cat", value_enum)]
        category: Option<TextColumn>,
        #[arg(long, value_enum, num_args = 2, value_names = ["ROWS", "COLUMNS"])]
        cross: Vec<TextColumn>,
    },
    /// Write every view to a Markdown report
    Report {
        #[arg(long, default_value = "tracer-report.md")]
        out: PathBuf,
    },
    /// Print the active filter selections: defaults narrowed by any filter flags
    Filters,
    /// Interactive dashboard session on stdin
    Shell,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    config::init_tracing(cli.verbose);

    let mut session = Session::open(&cli.data)
        .with_context(|| format!("failed to load tracer data from {}", cli.data.display()))?;
    cli.filters
        .apply(&mut session)
        .context("invalid filter flags")?;
    info!(
        selected = session.view().len(),
        total = session.dataset().len(),
        "filters applied"
    );
    if session.view().is_empty() {
        warn!("no respondents match the active filters");
    }

    let format = if cli.json { Format::Json } else { Format::Markdown };
    let mut params = ViewParams::default();

    let kind = match cli.command {
        Commands::Overview => ViewKind::Overview,
        Commands::Career => ViewKind::Career,
        Commands::Stats => ViewKind::Stats,
        Commands::Sentiment => ViewKind::Sentiment,
        Commands::Cluster { k, attributes, seed } => {
            params.k = usize::from(k);
            params.attributes = attributes;
            params.seed = seed;
            ViewKind::Clusters
        }
        Commands::Correlate { x, y, column } => {
            params.pair = x.zip(y);
            params.numeric = column;
            ViewKind::Correlation
        }
        Commands::Eda {
            column,
            category,
            cross,
        } => {
            params.numeric = column;
            params.category = category;
            params.cross = match cross.as_slice() {
                [rows, columns] => Some((*rows, *columns)),
                _ => None,
            };
            ViewKind::Eda
        }
        Commands::Report { out } => {
            let report = report::build_report(&session, &params, chrono::Utc::now());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
            return Ok(());
        }
        Commands::Filters => {
            if cli.json {
                println!("{}", serde_json::to_string_pretty(session.filters())?);
            } else {
                print!("{}", report::render_filters(session.filters()));
            }
            return Ok(());
        }
        Commands::Shell => {
            let stdin = io::stdin();
            return shell::run(&mut session, stdin.lock(), io::stdout().lock(), format);
        }
    };

    println!("{}", report::render(kind, &session, &params, format)?);
    Ok(())
}
