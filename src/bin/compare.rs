//! CLI for comparing two snippets.
//!
//! Usage:
//!   snippet-compare                          # Compare the two default snippets
//!   snippet-compare -1 a.sh -2 b.sh          # Compare two shell snippets
//!   snippet-compare --snippet1 noop --snippet2 sleep-1ms
//!   snippet-compare --list                   # List built-in snippets

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueEnum};
use log::{error, info, LevelFilter};

use snippet_compare::compare::{Comparer, ComparisonResult};
use snippet_compare::error::Error;
use snippet_compare::registry::{build_registry, SnippetRegistry, DEFAULT_FIRST, DEFAULT_SECOND};
use snippet_compare::report::json::{self, ExportDocument};
use snippet_compare::report::{host, terminal};
use snippet_compare::snippet::script::{self, DEFAULT_SHELL};
use snippet_compare::snippet::{LabeledSnippet, DEFAULT_SEED};
use snippet_compare::utils::{PinStrategy, TimingConfig};

#[derive(Parser, Debug)]
#[command(name = "snippet-compare")]
#[command(version, about = "Compare the execution time of two code snippets")]
#[command(after_help = terminal::REPETITION_GUIDE)]
struct Cli {
    /// Shell script for the first snippet
    #[arg(short = '1', long)]
    file1: Option<PathBuf>,

    /// Shell script for the second snippet
    #[arg(short = '2', long)]
    file2: Option<PathBuf>,

    /// Built-in snippet used as the first snippet (see --list)
    #[arg(long, conflicts_with = "file1")]
    snippet1: Option<String>,

    /// Built-in snippet used as the second snippet (see --list)
    #[arg(long, conflicts_with = "file2")]
    snippet2: Option<String>,

    /// Shell script run untimed before every repetition
    #[arg(long)]
    setup: Option<PathBuf>,

    /// Number of measured repetitions
    #[arg(short, long, default_value_t = 20_000)]
    reps: usize,

    /// Executions per repetition
    #[arg(short, long, default_value_t = 3)]
    num: usize,

    /// Discarded warm-up runs
    #[arg(long, default_value_t = 5)]
    warmup: usize,

    /// Base random seed
    #[arg(long, default_value_t = DEFAULT_SEED)]
    seed: u64,

    /// CPU pinning during measurement
    #[arg(long, value_enum, default_value_t = PinArg::Global)]
    pin: PinArg,

    /// Shell used to run script snippets
    #[arg(long, default_value = DEFAULT_SHELL)]
    shell: String,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Write an extra copy of the JSON log here (relative paths land in outputs/)
    #[arg(long)]
    export_json: Option<PathBuf>,

    /// List built-in snippets and exit
    #[arg(long)]
    list: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PinArg {
    Off,
    Global,
    PerRepetition,
}

impl From<PinArg> for PinStrategy {
    fn from(arg: PinArg) -> Self {
        match arg {
            PinArg::Off => PinStrategy::Off,
            PinArg::Global => PinStrategy::Global,
            PinArg::PerRepetition => PinStrategy::PerRepetition,
        }
    }
}

fn log_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Log to stderr so progress bars and results keep stdout.
fn init_logging(verbosity: u8) {
    env_logger::Builder::new()
        .filter_level(log_level(verbosity))
        .target(env_logger::Target::Stderr)
        .init();
}

/// A named built-in or a script file; the registry default otherwise.
fn resolve_snippet(
    registry: &SnippetRegistry,
    file: Option<&Path>,
    name: Option<&str>,
    default_name: &str,
    default_label: &str,
    shell: &str,
) -> Result<LabeledSnippet, String> {
    if let Some(name) = name {
        let info = registry.find(name).ok_or_else(|| {
            format!(
                "unknown snippet '{}'; available: {}",
                name,
                registry.list_names().join(", ")
            )
        })?;
        return Ok(info.labeled());
    }

    let default = registry
        .find(default_name)
        .ok_or_else(|| format!("default snippet '{}' is not registered", default_name))?;
    Ok(script::load_snippet(file, default_label, default.instantiate(), shell))
}

fn write_logs(result: &ComparisonResult, export: Option<&Path>) -> Result<(), Error> {
    let cwd = std::env::current_dir().map_err(|e| Error::Io {
        path: PathBuf::from("."),
        source: e,
    })?;
    let outputs = json::ensure_outputs_dir(&cwd)?;
    let doc = ExportDocument::new(result, host::env_info(), host::system_load());

    let log_path = outputs.join(json::log_file_name(chrono::Local::now()));
    doc.write_to(&log_path)?;
    println!("Results logged to: {}", log_path.display());

    if let Some(export) = export {
        let path = json::resolve_export_path(&outputs, export);
        doc.write_to(&path)?;
        println!("Results exported to: {}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    terminal::set_color_enabled(!cli.no_color);

    let registry = build_registry();
    if cli.list {
        terminal::print_available_snippets(&registry);
        return ExitCode::SUCCESS;
    }

    let first = resolve_snippet(
        &registry,
        cli.file1.as_deref(),
        cli.snippet1.as_deref(),
        DEFAULT_FIRST,
        "Default Snippet 1",
        &cli.shell,
    );
    let second = resolve_snippet(
        &registry,
        cli.file2.as_deref(),
        cli.snippet2.as_deref(),
        DEFAULT_SECOND,
        "Default Snippet 2",
        &cli.shell,
    );
    let (first, second) = match (first, second) {
        (Ok(first), Ok(second)) => (first, second),
        (Err(e), _) | (_, Err(e)) => {
            error!("{e}");
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let setup = script::load_setup(cli.setup.as_deref(), cli.seed, &cli.shell);

    let config = TimingConfig {
        repetitions: cli.reps,
        executions_per_rep: cli.num,
        warmup_runs: cli.warmup,
        pin_strategy: cli.pin.into(),
    };

    terminal::print_banner();
    terminal::print_parameters(
        &config,
        cli.seed,
        [first.source.as_str(), second.source.as_str()],
        &setup.source,
    );

    let mut comparer = Comparer::new(first, second, setup);
    let mut progress = terminal::RepetitionProgress::new(config.repetitions);
    let mut on_repeat_end = |rep: usize, elapsed: f64| progress.observe(rep, elapsed);
    let outcome = comparer.compare(&config, Some(&mut on_repeat_end));
    drop(progress);

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            terminal::print_fault(&e);
            return ExitCode::FAILURE;
        }
    };

    terminal::print_results(&result);
    if let Err(e) = write_logs(&result, cli.export_json.as_deref()) {
        error!("could not write result log: {e}");
        eprintln!("Failed to write result log: {e}");
    }

    terminal::print_winner(&result.verdict);
    match result.verdict.percent_faster {
        Some(percent) if result.verdict.is_computable() => println!(
            "Relative Performance: {:.2}x ({:.2}%)",
            result.verdict.ratio, percent
        ),
        _ => println!("Relative Performance: Not computable"),
    }
    info!("done in {}", result.total_duration_human);

    ExitCode::SUCCESS
}
