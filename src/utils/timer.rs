//! Timing loop for a single snippet.
//!
//! This module provides the measurement infrastructure with:
//! - Discarded warm-up runs before measurement
//! - Per-repetition seeding (`base_seed + repetition`)
//! - Automatic memory reclamation paused while measuring
//! - Snippet output silenced and the thread pinned to one core
//! - All raw measurements preserved for external analysis

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use log::{debug, error, info};

pub use super::cpu_affinity::AffinityGuard;
use super::reclaim::{ReclaimControl, ReclaimPause};
use super::silence::OutputSilencer;
use crate::error::{Error, Phase, Result, SnippetError};
use crate::snippet::{SetupContext, Snippet, SnippetContext};

// ============================================================================
// Configuration
// ============================================================================

/// CPU pinning strategy during measurements
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PinStrategy {
    /// Leave scheduling to the OS
    Off,
    /// Pin once for the whole timing run
    #[default]
    Global,
    /// Pin/unpin around every repetition
    PerRepetition,
}

/// Configuration for timing measurements
#[derive(Clone, Debug)]
pub struct TimingConfig {
    /// Number of measured repetitions (default: 20000)
    pub repetitions: usize,
    /// Back-to-back executions inside one repetition (default: 3)
    pub executions_per_rep: usize,
    /// Discarded runs before measurement (default: 5)
    pub warmup_runs: usize,
    /// CPU pinning strategy (default: Global)
    pub pin_strategy: PinStrategy,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            repetitions: 20_000,
            executions_per_rep: 3,
            warmup_runs: 5,
            pin_strategy: PinStrategy::default(),
        }
    }
}

/// Per-execution elapsed times in seconds, one entry per repetition
pub type TimingSeries = Vec<f64>;

/// Progress callback: `(repetition_index, elapsed_seconds)`
pub type RepeatCallback<'a> = &'a mut dyn FnMut(usize, f64);

// ============================================================================
// Timer
// ============================================================================

/// Runs one snippet through warm-up and measured repetitions.
pub struct SnippetTimer<'a> {
    config: &'a TimingConfig,
    reclaim: &'a dyn ReclaimControl,
}

impl<'a> SnippetTimer<'a> {
    pub fn new(config: &'a TimingConfig, reclaim: &'a dyn ReclaimControl) -> Self {
        Self { config, reclaim }
    }

    /// Time `snippet` and return one sample per repetition.
    ///
    /// Any fault, in setup or in the snippet, aborts the whole run; no
    /// partial series is returned.
    pub fn time(
        &self,
        name: &str,
        snippet: &mut dyn Snippet,
        setup: &SetupContext,
        mut on_repeat_end: Option<RepeatCallback<'_>>,
    ) -> Result<TimingSeries> {
        let config = self.config;
        info!(
            "timing {} ({} repetitions x {} executions)",
            name, config.repetitions, config.executions_per_rep
        );

        let result = self.warm_up(snippet, setup).and_then(|()| {
            let _global_pin =
                (config.pin_strategy == PinStrategy::Global).then(AffinityGuard::pin_current);
            let _reclaim = ReclaimPause::new(self.reclaim);

            let mut series = Vec::with_capacity(config.repetitions);
            for rep in 0..config.repetitions {
                let elapsed = self.repetition(snippet, setup, rep)?;
                series.push(elapsed);
                if let Some(callback) = on_repeat_end.as_mut() {
                    callback(rep, elapsed);
                }
            }
            Ok(series)
        });

        result.map_err(|(phase, message)| {
            error!("{} faulted during {}: {}", name, phase, message);
            Error::SnippetFault {
                snippet: name.to_string(),
                phase,
                message,
            }
        })
    }

    fn warm_up(
        &self,
        snippet: &mut dyn Snippet,
        setup: &SetupContext,
    ) -> std::result::Result<(), (Phase, String)> {
        if self.config.warmup_runs == 0 {
            return Ok(());
        }
        debug!("{} warm-up runs", self.config.warmup_runs);

        let mut ctx = SnippetContext::new(setup.base_seed());
        let _silence = OutputSilencer::new();
        for _ in 0..self.config.warmup_runs {
            execute(|| setup.prepare(&mut ctx)).map_err(|m| (Phase::Setup, m))?;
            execute(|| snippet.run(&mut ctx)).map_err(|m| (Phase::WarmUp, m))?;
        }
        Ok(())
    }

    fn repetition(
        &self,
        snippet: &mut dyn Snippet,
        setup: &SetupContext,
        rep: usize,
    ) -> std::result::Result<f64, (Phase, String)> {
        let executions = self.config.executions_per_rep;
        let mut ctx = SnippetContext::new(setup.seed_for(rep));

        let _pin = (self.config.pin_strategy == PinStrategy::PerRepetition)
            .then(AffinityGuard::pin_current);
        let _silence = OutputSilencer::new();

        execute(|| setup.prepare(&mut ctx)).map_err(|m| (Phase::Setup, m))?;

        let start = Instant::now();
        for _ in 0..executions {
            execute(|| snippet.run(&mut ctx)).map_err(|m| (Phase::Measurement, m))?;
        }
        Ok(per_execution(start.elapsed(), executions))
    }
}

/// Average a repetition's elapsed time over its executions.
pub fn per_execution(elapsed: Duration, executions: usize) -> f64 {
    if executions == 0 {
        0.0
    } else {
        elapsed.as_secs_f64() / executions as f64
    }
}

/// Run a body, turning both `Err` returns and panics into a message.
fn execute<F>(body: F) -> std::result::Result<(), String>
where
    F: FnOnce() -> std::result::Result<(), SnippetError>,
{
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::reclaim::HeapTrim;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn config(repetitions: usize, executions_per_rep: usize, warmup_runs: usize) -> TimingConfig {
        TimingConfig {
            repetitions,
            executions_per_rep,
            warmup_runs,
            pin_strategy: PinStrategy::Off,
        }
    }

    fn ok(_ctx: &mut SnippetContext) -> std::result::Result<(), SnippetError> {
        Ok(())
    }

    #[test]
    fn test_one_sample_per_repetition() {
        let config = config(25, 3, 2);
        let timer = SnippetTimer::new(&config, &HeapTrim);
        let mut snippet = ok;
        let series = timer
            .time("Snippet 1", &mut snippet, &SetupContext::default(), None)
            .unwrap();
        assert_eq!(series.len(), 25);
        assert!(series.iter().all(|&t| t >= 0.0));
    }

    #[test]
    fn test_zero_repetitions_is_empty() {
        let config = config(0, 3, 0);
        let timer = SnippetTimer::new(&config, &HeapTrim);
        let mut snippet = ok;
        let series = timer
            .time("Snippet 1", &mut snippet, &SetupContext::default(), None)
            .unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_zero_executions_yield_zero() {
        let config = config(4, 0, 0);
        let timer = SnippetTimer::new(&config, &HeapTrim);
        let calls = Cell::new(0);
        let mut snippet = |_ctx: &mut SnippetContext| -> std::result::Result<(), SnippetError> {
            calls.set(calls.get() + 1);
            Ok(())
        };
        let series = timer
            .time("Snippet 1", &mut snippet, &SetupContext::default(), None)
            .unwrap();
        assert_eq!(series, vec![0.0; 4]);
        assert_eq!(calls.get(), 0);
        assert_eq!(per_execution(Duration::from_millis(5), 0), 0.0);
    }

    #[test]
    fn test_execution_count() {
        let config = config(10, 3, 5);
        let timer = SnippetTimer::new(&config, &HeapTrim);
        let calls = Cell::new(0);
        let mut snippet = |_ctx: &mut SnippetContext| -> std::result::Result<(), SnippetError> {
            calls.set(calls.get() + 1);
            Ok(())
        };
        timer
            .time("Snippet 1", &mut snippet, &SetupContext::default(), None)
            .unwrap();
        assert_eq!(calls.get(), 5 + 10 * 3);
    }

    #[test]
    fn test_seed_sequence_injected_into_setup() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let recorder = Rc::clone(&seen);
        let setup = SetupContext::new(
            "recording",
            1000,
            move |ctx: &mut SnippetContext| -> std::result::Result<(), SnippetError> {
                recorder.borrow_mut().push(ctx.seed());
                Ok(())
            },
        );

        let config = config(6, 2, 2);
        let timer = SnippetTimer::new(&config, &HeapTrim);
        let mut snippet = ok;
        timer.time("Snippet 1", &mut snippet, &setup, None).unwrap();

        // two warm-up runs at the base seed, then base + i per repetition
        assert_eq!(
            *seen.borrow(),
            vec![1000, 1000, 1000, 1001, 1002, 1003, 1004, 1005]
        );
    }

    #[test]
    fn test_seed_sequence_is_reproducible() {
        let run = || {
            let seen = Rc::new(RefCell::new(Vec::new()));
            let recorder = Rc::clone(&seen);
            let config = config(5, 1, 0);
            let timer = SnippetTimer::new(&config, &HeapTrim);
            let mut snippet = move |ctx: &mut SnippetContext| -> std::result::Result<(), SnippetError> {
                use rand::Rng;
                recorder.borrow_mut().push(ctx.rng().random::<u64>());
                Ok(())
            };
            timer
                .time("Snippet 1", &mut snippet, &SetupContext::seeded(42), None)
                .unwrap();
            let values = seen.borrow().clone();
            values
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_progress_callback() {
        let config = config(7, 1, 0);
        let timer = SnippetTimer::new(&config, &HeapTrim);
        let mut snippet = ok;
        let mut indices = Vec::new();
        let mut callback = |rep: usize, elapsed: f64| {
            assert!(elapsed >= 0.0);
            indices.push(rep);
        };
        timer
            .time(
                "Snippet 1",
                &mut snippet,
                &SetupContext::default(),
                Some(&mut callback),
            )
            .unwrap();
        assert_eq!(indices, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn test_fault_aborts_run() {
        let config = config(50, 1, 0);
        let timer = SnippetTimer::new(&config, &HeapTrim);
        let calls = Cell::new(0);
        let mut snippet = |_ctx: &mut SnippetContext| -> std::result::Result<(), SnippetError> {
            calls.set(calls.get() + 1);
            if calls.get() == 3 {
                Err("third call fails".into())
            } else {
                Ok(())
            }
        };
        let err = timer
            .time("Snippet 2", &mut snippet, &SetupContext::default(), None)
            .unwrap_err();
        match err {
            Error::SnippetFault {
                snippet,
                phase,
                message,
            } => {
                assert_eq!(snippet, "Snippet 2");
                assert_eq!(phase, Phase::Measurement);
                assert!(message.contains("third call fails"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_panic_is_a_fault() {
        let config = config(5, 1, 1);
        let timer = SnippetTimer::new(&config, &HeapTrim);
        let mut snippet = |_ctx: &mut SnippetContext| -> std::result::Result<(), SnippetError> {
            panic!("index out of range");
        };
        let err = timer
            .time("Snippet 1", &mut snippet, &SetupContext::default(), None)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::SnippetFault { phase: Phase::WarmUp, ref message, .. } if message.contains("index out of range")
        ));
    }

    #[test]
    fn test_setup_fault_names_phase() {
        let setup = SetupContext::new(
            "broken",
            1,
            |_ctx: &mut SnippetContext| -> std::result::Result<(), SnippetError> {
                Err("missing fixture".into())
            },
        );
        let config = config(3, 1, 0);
        let timer = SnippetTimer::new(&config, &HeapTrim);
        let mut snippet = ok;
        let err = timer.time("Snippet 1", &mut snippet, &setup, None).unwrap_err();
        assert!(matches!(err, Error::SnippetFault { phase: Phase::Setup, .. }));
    }

    #[test]
    fn test_reclaim_restored_after_fault() {
        struct Flag(Cell<bool>);
        impl ReclaimControl for Flag {
            fn is_enabled(&self) -> bool {
                self.0.get()
            }
            fn set_enabled(&self, enabled: bool) {
                self.0.set(enabled);
            }
        }

        let flag = Flag(Cell::new(true));
        let config = config(3, 1, 0);
        let timer = SnippetTimer::new(&config, &flag);
        let mut snippet = |_ctx: &mut SnippetContext| -> std::result::Result<(), SnippetError> {
            Err("always".into())
        };
        assert!(timer
            .time("Snippet 1", &mut snippet, &SetupContext::default(), None)
            .is_err());
        assert!(flag.is_enabled());
    }
}
