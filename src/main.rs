use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use linebal::balance::{balance, Construction, Objective};
use linebal::config::{expand_tilde, Config};
use linebal::log::LogLevel;
use linebal::{loader, report, lblog, lblog_error, Result};

/// Output rendering of the balancing result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// linebal - assign precedence-constrained tasks to workstations
#[derive(Parser, Debug)]
#[command(name = "linebal")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    LINEBAL_LOG=<level> Log level: error, warn, info, debug or trace\n    LINEBAL_DEBUG=1     Enable debug logging (alternative to --debug)\n\nEXIT CODES:\n    2 CycleError, 3 InfeasibleError, 4 InvalidInputError, 1 usage and other failures")]
pub struct Cli {
    /// Task data file: one `id cycle_time metabolic_cost` record per line
    pub data_file: PathBuf,

    /// Precedence diagram in Graphviz DOT format
    pub precedence_file: PathBuf,

    /// Number of workstations (operators)
    pub num_stations: usize,

    /// Objective to balance: CYCLE_TIME, METABOLIC or BOTH
    pub objective: Option<Objective>,

    /// Minimum imbalance reduction for an improvement move
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Weight of cycle time when balancing BOTH
    #[arg(long)]
    pub w_cost_time: Option<f64>,

    /// Weight of metabolic cost when balancing BOTH
    #[arg(long)]
    pub w_cost_metabolic: Option<f64>,

    /// Maximum number of improvement moves
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Require predecessors on strictly earlier stations
    #[arg(long)]
    pub strict: bool,

    /// Initial assignment strategy: least-loaded or sequential
    #[arg(long)]
    pub construction: Option<Construction>,

    /// Percent over the average load a sequentially filled station may reach once
    #[arg(long)]
    pub overshoot: Option<f64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Also draw a bar chart of the station loads
    #[arg(long)]
    pub chart: bool,

    /// Config file (defaults to ~/.linebal/linebal.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging (writes to ~/.linebal/linebal.log)
    #[arg(short = 'd', long)]
    pub debug: bool,

    /// Log every improvement move (implies --debug)
    #[arg(long)]
    pub trace: bool,
}

fn main() -> ExitCode {
    // Usage errors exit 1; clap's own code 2 is taken by CycleError.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let level = if cli.trace {
        LogLevel::Trace
    } else if cli.debug {
        LogLevel::Debug
    } else {
        LogLevel::from_env().unwrap_or(LogLevel::Info)
    };
    linebal::log::init(level);

    match run(&cli) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            lblog_error!("{}: {}", err.kind(), err);
            eprintln!("{}: {}", err.kind(), err);
            ExitCode::from(err.exit_code())
        }
    }
}

/// Load inputs, balance, and render. Nothing is printed on failure.
fn run(cli: &Cli) -> Result<String> {
    lblog!(
        "Run: data={}, precedence={}, stations={}",
        cli.data_file.display(),
        cli.precedence_file.display(),
        cli.num_stations
    );

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let mut options = config.balance_options();
    if let Some(objective) = cli.objective {
        options.objective = objective;
    }
    if let Some(threshold) = cli.threshold {
        options.threshold = threshold;
    }
    if let Some(w) = cli.w_cost_time {
        options.weights.cycle_time = w;
    }
    if let Some(w) = cli.w_cost_metabolic {
        options.weights.metabolic_cost = w;
    }
    if let Some(max) = cli.max_iterations {
        options.max_iterations = max;
    }
    if let Some(construction) = cli.construction {
        options.construction = construction;
    }
    if let Some(overshoot) = cli.overshoot {
        options.overshoot = overshoot;
    }
    options.strict_precedence |= cli.strict;

    let tasks = loader::read_task_data(&expand_tilde(&cli.data_file.to_string_lossy()))?;
    let graph = loader::read_precedence(&expand_tilde(&cli.precedence_file.to_string_lossy()))?;
    let result = balance(&graph, &tasks, cli.num_stations, &options)?;
    lblog!(
        "Balanced {} tasks: imbalance={:.4}, moves={}",
        result.assignment.len(),
        result.imbalance,
        result.moves
    );

    let mut output = match cli.format {
        OutputFormat::Text => report::render_text(&result),
        OutputFormat::Json => format!("{}\n", report::render_json(&result)?),
    };
    if cli.chart {
        output.push('\n');
        output.push_str(&report::render_chart(&result, config.effective_chart_width()));
        output.push('\n');
    }
    Ok(output)
}
