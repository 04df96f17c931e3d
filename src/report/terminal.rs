//! Terminal rendering of a comparison run.
//!
//! Banner and parameters up front, a progress bar per timed snippet, then
//! the per-snippet statistics and the verdict.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use terminal_size::{terminal_size, Width};

use crate::compare::{ComparisonResult, SnippetId, SnippetReport, Verdict};
use crate::error::Error;
use crate::registry::SnippetRegistry;
use crate::utils::TimingConfig;

const BANNER_ART: &str = r"
   ╔══════════╗     ╔══════════╗
   ║          ║     ║          ║
   ║   ░░░░   ║ <-> ║   ████   ║
   ║   ░░░░   ║ <-> ║   ████   ║
   ║          ║     ║          ║
   ╚══════════╝     ╚══════════╝
";

/// Guidance shown in `--help`
pub const REPETITION_GUIDE: &str = "\
Recommended repetitions for microbenchmarking:

+---------------+------------------------+--------------------+
| Code Duration | Recommended Repetitions| Executions per Rep |
+---------------+------------------------+--------------------+
|   < 10 μs     |   50,000 – 100,000     |      5 – 10        |
|  10–100 μs    |   10,000 – 50,000      |      3 – 10        |
|  0.1–1 ms     |   5,000 – 10,000       |      3 – 5         |
|   > 1 ms      |   1,000 – 5,000        |      1 – 3         |
+---------------+------------------------+--------------------+";

/// Get the current terminal width, constrained to a reasonable range
fn get_term_width() -> usize {
    if let Some((Width(w), _)) = terminal_size() {
        (w as usize).clamp(40, 200)
    } else {
        80
    }
}

/// Turn ANSI styling on or off for everything printed afterwards
pub fn set_color_enabled(enabled: bool) {
    if enabled {
        colored::control::unset_override();
    } else {
        colored::control::set_override(false);
    }
}

fn rule() -> String {
    "─".repeat(get_term_width().min(64))
}

fn micros(seconds: f64) -> String {
    format!("{:.2} μs", seconds * 1e6)
}

pub fn print_banner() {
    println!("{}", BANNER_ART.bright_cyan());
}

/// Print the run parameters before timing starts
pub fn print_parameters(config: &TimingConfig, seed: u64, sources: [&str; 2], setup: &str) {
    println!("{}", "--- Starting Code Comparison ---".bold());
    println!(
        "Repetitions: {}, Executions per repetition: {}",
        config.repetitions.to_string().bright_yellow(),
        config.executions_per_rep.to_string().bright_yellow()
    );
    println!("Warm-up runs: {}", config.warmup_runs.to_string().bright_yellow());
    println!("Random seed fixed for determinism: {}", seed.to_string().bright_yellow());
    println!("Setup: {}", setup.bright_cyan());
    println!("Source for Code 1: {}", sources[0].bright_magenta());
    println!("Source for Code 2: {}", sources[1].bright_magenta());
    println!();
}

/// Human-readable relative-performance sentence
pub fn relative_message(verdict: &Verdict) -> String {
    match verdict.percent_faster {
        Some(percent) if verdict.is_computable() => format!(
            "{} is {} faster than {} ({} faster).",
            verdict.faster.to_string().bold(),
            format!("{:.2}x", verdict.ratio).bright_green(),
            verdict.slower.to_string().bold(),
            format!("{:.2}%", percent).bright_green()
        ),
        _ => "Relative speed: Not computable (division by zero)."
            .red()
            .to_string(),
    }
}

fn print_snippet(id: SnippetId, report: &SnippetReport) {
    let stats = &report.stats;
    let ci = &report.confidence_interval;
    println!(
        "{}: mean = {}, stdev = {}, median = {}",
        id.to_string().bright_cyan(),
        micros(stats.mean).bright_green(),
        micros(stats.stdev).bright_yellow(),
        micros(stats.median).bright_green()
    );
    println!(
        "    {:.0}% CI: {} - {}",
        ci.level * 100.0,
        micros(ci.lower).bright_yellow(),
        micros(ci.upper).bright_yellow()
    );
    let percentile = |p: Option<f64>| p.map(micros).unwrap_or_else(|| "n/a".to_string());
    println!(
        "    p5 = {}, p95 = {}, min = {}, max = {} ({} samples)",
        percentile(stats.percentile_5),
        percentile(stats.percentile_95),
        micros(stats.min),
        micros(stats.max),
        stats.count
    );
    println!("    source: {}", report.source.bright_magenta());
}

/// Print the full results block
pub fn print_results(result: &ComparisonResult) {
    println!();
    println!("{}", "--- Results ---".bold());
    println!("{}", rule());
    print_snippet(SnippetId::First, &result.first);
    print_snippet(SnippetId::Second, &result.second);
    println!("{}", rule());
    println!();
    println!("{}", relative_message(&result.verdict));
    println!(
        "{}",
        format!(
            "Total test time: {}",
            result.total_duration_human.bright_blue()
        )
        .bold()
    );
}

/// Print the closing winner line
pub fn print_winner(verdict: &Verdict) {
    println!();
    println!("{}", "--- Comparison Complete ---".bold());
    println!("{}", format!(" Winner: {} ", verdict.faster).bold().reversed());
}

/// Print a timing fault with enough context to debug the snippet
pub fn print_fault(err: &Error) {
    eprintln!();
    eprintln!("{}", "--- ERROR during timing ---".red().bold());
    if let Some(snippet) = err.snippet() {
        eprintln!("{}", format!("An error occurred while executing {}:", snippet).red());
    }
    eprintln!("{}", format!("Error details: {}", err).red());
    eprintln!("{}", "Check setup code and snippet syntax/logic.".bright_yellow());
    eprintln!("{}", "---------------------------".red().bold());
}

/// Print the list of built-in snippets
pub fn print_available_snippets(registry: &SnippetRegistry) {
    println!("Available snippets:");
    println!();
    for snippet in registry.all() {
        println!(
            "  {:<20} [{}] - {}",
            snippet.name,
            snippet.category,
            snippet.description
        );
    }
}

/// Progress bar fed by the per-repetition callback.
///
/// A new bar is started whenever repetition 0 is reported, i.e. once per
/// timed snippet.
pub struct RepetitionProgress {
    total: u64,
    runs: usize,
    bar: Option<ProgressBar>,
}

impl RepetitionProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total: total as u64,
            runs: 0,
            bar: None,
        }
    }

    pub fn observe(&mut self, rep: usize, _elapsed: f64) {
        if rep == 0 {
            if let Some(bar) = self.bar.take() {
                bar.finish();
            }
            self.runs += 1;
            let bar = ProgressBar::new(self.total);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{msg} [{bar:32.green/white}] {percent:>3}% {pos}/{len} [{elapsed_precise}]")
            {
                bar.set_style(style.progress_chars("█░"));
            }
            bar.set_message(format!("Timing Snippet {}", self.runs));
            self.bar = Some(bar);
        }
        if let Some(bar) = &self.bar {
            bar.set_position(rep as u64 + 1);
            if rep as u64 + 1 == self.total {
                bar.finish();
            }
        }
    }

    /// Number of snippets whose timing has started
    pub fn runs_started(&self) -> usize {
        self.runs
    }
}

impl Drop for RepetitionProgress {
    fn drop(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.abandon();
        }
    }
}
