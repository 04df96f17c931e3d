//! JSON result log.
//!
//! Every run leaves `outputs/compare_log_<timestamp>.json` behind; an extra
//! copy can be requested with an explicit export path.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use super::host::{EnvInfo, SystemLoad};
use crate::compare::{ComparisonResult, SnippetReport, Verdict};
use crate::error::{Error, Result};
use crate::stats::{ConfidenceInterval, DescriptiveStats};

/// Directory (relative to the working directory) holding result logs
pub const OUTPUTS_DIR: &str = "outputs";

#[derive(Debug, Serialize)]
pub struct SnippetSection<'a> {
    pub source: &'a str,
    pub code: Option<&'a str>,
    pub stats: &'a DescriptiveStats,
    pub confidence_interval: &'a ConfidenceInterval,
    pub measurements: &'a [f64],
}

impl<'a> From<&'a SnippetReport> for SnippetSection<'a> {
    fn from(report: &'a SnippetReport) -> Self {
        Self {
            source: &report.source,
            code: report.code.as_deref(),
            stats: &report.stats,
            confidence_interval: &report.confidence_interval,
            measurements: &report.measurements,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Parameters {
    pub num_repetitions: usize,
    pub num_executions_per_rep: usize,
    pub warmup_runs: usize,
    pub fixed_seed: u64,
}

/// Full export document
#[derive(Debug, Serialize)]
pub struct ExportDocument<'a> {
    pub snippet_1: SnippetSection<'a>,
    pub snippet_2: SnippetSection<'a>,
    pub relative_performance: &'a Verdict,
    pub env_info: EnvInfo,
    pub system_load: SystemLoad,
    pub parameters: Parameters,
    pub total_test_time_seconds: f64,
    pub total_test_time_human: &'a str,
}

impl<'a> ExportDocument<'a> {
    pub fn new(result: &'a ComparisonResult, env_info: EnvInfo, system_load: SystemLoad) -> Self {
        Self {
            snippet_1: SnippetSection::from(&result.first),
            snippet_2: SnippetSection::from(&result.second),
            relative_performance: &result.verdict,
            env_info,
            system_load,
            parameters: Parameters {
                num_repetitions: result.config.repetitions,
                num_executions_per_rep: result.config.executions_per_rep,
                warmup_runs: result.config.warmup_runs,
                fixed_seed: result.base_seed,
            },
            total_test_time_seconds: result.total_duration_secs,
            total_test_time_human: &result.total_duration_human,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the document to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::write(path, self.to_json()?).map_err(|e| Error::io(path, e))
    }
}

/// `compare_log_YYYYmmdd_HHMMSS.json`
pub fn log_file_name(now: DateTime<Local>) -> String {
    format!("compare_log_{}.json", now.format("%Y%m%d_%H%M%S"))
}

/// Create `<base>/outputs` if needed and return it
pub fn ensure_outputs_dir(base: &Path) -> Result<PathBuf> {
    let dir = base.join(OUTPUTS_DIR);
    fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
    Ok(dir)
}

/// Absolute export paths are used as given; relative ones land in `outputs`.
pub fn resolve_export_path(outputs_dir: &Path, requested: &Path) -> PathBuf {
    if requested.is_absolute() {
        requested.to_path_buf()
    } else {
        outputs_dir.join(requested)
    }
}
