//! Head-to-head comparison of two snippets.
//!
//! Both snippets are timed strictly one after the other on the calling
//! thread; nothing is interleaved or parallelized. If either timing run
//! faults, no verdict is produced.

use std::fmt;
use std::time::Instant;

use log::info;
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};
use crate::snippet::{LabeledSnippet, SetupContext};
use crate::stats::{self, ConfidenceInterval, DescriptiveStats};
use crate::utils::format_duration;
use crate::utils::reclaim::{HeapTrim, ReclaimControl};
use crate::utils::timer::{RepeatCallback, SnippetTimer, TimingConfig, TimingSeries};

/// Which of the two compared snippets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SnippetId {
    #[serde(rename = "Snippet 1")]
    First,
    #[serde(rename = "Snippet 2")]
    Second,
}

impl SnippetId {
    pub fn other(self) -> Self {
        match self {
            SnippetId::First => SnippetId::Second,
            SnippetId::Second => SnippetId::First,
        }
    }
}

impl fmt::Display for SnippetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnippetId::First => write!(f, "Snippet 1"),
            SnippetId::Second => write!(f, "Snippet 2"),
        }
    }
}

/// Relative-performance verdict between two mean latencies
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Verdict {
    pub faster: SnippetId,
    pub slower: SnippetId,
    /// `slower_mean / faster_mean`; `+inf` when the faster mean is zero
    #[serde(serialize_with = "serialize_ratio")]
    pub ratio: f64,
    /// `(1 - faster/slower) * 100`; `None` when the ratio is not finite
    pub percent_faster: Option<f64>,
}

impl Verdict {
    /// Rank two means. On an exact tie the second snippet is labelled
    /// faster, since `mean_first < mean_second` does not hold.
    pub fn rank(mean_first: f64, mean_second: f64) -> Self {
        let (faster, faster_mean, slower_mean) = if mean_first < mean_second {
            (SnippetId::First, mean_first, mean_second)
        } else {
            (SnippetId::Second, mean_second, mean_first)
        };

        let ratio = if faster_mean > 0.0 {
            slower_mean / faster_mean
        } else {
            f64::INFINITY
        };
        // a finite ratio implies 0 < faster_mean <= slower_mean
        let percent_faster = ratio
            .is_finite()
            .then(|| (1.0 - faster_mean / slower_mean) * 100.0);

        Self {
            faster,
            slower: faster.other(),
            ratio,
            percent_faster,
        }
    }

    /// Whether a finite ratio could be computed
    pub fn is_computable(&self) -> bool {
        self.ratio.is_finite()
    }
}

fn serialize_ratio<S: Serializer>(ratio: &f64, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    if ratio.is_finite() {
        serializer.serialize_f64(*ratio)
    } else {
        serializer.serialize_str("inf")
    }
}

/// Everything measured for one snippet
#[derive(Debug, Clone)]
pub struct SnippetReport {
    pub source: String,
    /// Source text, when the snippet came from a file
    pub code: Option<String>,
    pub stats: DescriptiveStats,
    pub confidence_interval: ConfidenceInterval,
    pub measurements: TimingSeries,
}

impl SnippetReport {
    fn from_series(
        labeled: &LabeledSnippet,
        snippet: SnippetId,
        measurements: TimingSeries,
    ) -> Result<Self> {
        let stats = stats::describe(&measurements).ok_or_else(|| Error::NoSamples {
            snippet: snippet.to_string(),
        })?;
        Ok(Self {
            source: labeled.source.clone(),
            code: labeled.code.clone(),
            stats,
            confidence_interval: stats::confidence_interval(&measurements),
            measurements,
        })
    }
}

/// Outcome of a full comparison
#[derive(Debug, Clone)]
pub struct ComparisonResult {
    pub first: SnippetReport,
    pub second: SnippetReport,
    pub verdict: Verdict,
    pub config: TimingConfig,
    pub base_seed: u64,
    pub total_duration_secs: f64,
    pub total_duration_human: String,
}

impl ComparisonResult {
    pub fn report(&self, snippet: SnippetId) -> &SnippetReport {
        match snippet {
            SnippetId::First => &self.first,
            SnippetId::Second => &self.second,
        }
    }
}

/// Owns two snippets and their shared setup for the duration of a run.
pub struct Comparer {
    first: LabeledSnippet,
    second: LabeledSnippet,
    setup: SetupContext,
    reclaim: Box<dyn ReclaimControl>,
}

impl Comparer {
    pub fn new(first: LabeledSnippet, second: LabeledSnippet, setup: SetupContext) -> Self {
        Self {
            first,
            second,
            setup,
            reclaim: Box::new(HeapTrim),
        }
    }

    /// Replace the memory-reclamation switch paused during measurement.
    pub fn with_reclaim_control(mut self, reclaim: Box<dyn ReclaimControl>) -> Self {
        self.reclaim = reclaim;
        self
    }

    pub fn source(&self, snippet: SnippetId) -> &str {
        match snippet {
            SnippetId::First => &self.first.source,
            SnippetId::Second => &self.second.source,
        }
    }

    pub fn setup(&self) -> &SetupContext {
        &self.setup
    }

    /// Time both snippets and rank them.
    pub fn compare(
        &mut self,
        config: &TimingConfig,
        mut on_repeat_end: Option<RepeatCallback<'_>>,
    ) -> Result<ComparisonResult> {
        info!(
            "comparing '{}' against '{}' (seed {})",
            self.first.source,
            self.second.source,
            self.setup.base_seed()
        );
        let timer = SnippetTimer::new(config, self.reclaim.as_ref());

        let total_start = Instant::now();
        let first = timer.time(
            &SnippetId::First.to_string(),
            self.first.unit.as_mut(),
            &self.setup,
            reborrow(&mut on_repeat_end),
        )?;
        let second = timer.time(
            &SnippetId::Second.to_string(),
            self.second.unit.as_mut(),
            &self.setup,
            reborrow(&mut on_repeat_end),
        )?;
        let total_duration_secs = total_start.elapsed().as_secs_f64();

        let first = SnippetReport::from_series(&self.first, SnippetId::First, first)?;
        let second = SnippetReport::from_series(&self.second, SnippetId::Second, second)?;
        let verdict = Verdict::rank(first.stats.mean, second.stats.mean);
        info!(
            "{} is faster (ratio {:.2}) after {}",
            verdict.faster,
            verdict.ratio,
            format_duration(total_duration_secs)
        );

        Ok(ComparisonResult {
            first,
            second,
            verdict,
            config: config.clone(),
            base_seed: self.setup.base_seed(),
            total_duration_secs,
            total_duration_human: format_duration(total_duration_secs),
        })
    }
}

fn reborrow<'s>(callback: &'s mut Option<RepeatCallback<'_>>) -> Option<RepeatCallback<'s>> {
    match callback {
        Some(cb) => Some(&mut **cb),
        None => None,
    }
}
