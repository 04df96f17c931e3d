use std::cell::RefCell;
use std::rc::Rc;

use snippet_compare::error::{Error, Phase, SnippetError};
use snippet_compare::prelude::*;
use snippet_compare::report::host::SystemLoad;
use snippet_compare::report::json::ExportDocument;
use snippet_compare::utils::reclaim::ReclaimControl;

fn config(repetitions: usize) -> TimingConfig {
    TimingConfig {
        repetitions,
        executions_per_rep: 1,
        warmup_runs: 0,
        pin_strategy: PinStrategy::Off,
    }
}

fn builtin(name: &str) -> LabeledSnippet {
    build_registry()
        .find(name)
        .unwrap_or_else(|| panic!("missing built-in '{name}'"))
        .labeled()
}

#[test]
fn test_noop_beats_sleep() {
    let mut comparer = Comparer::new(builtin("noop"), builtin("sleep-1ms"), SetupContext::default());
    let result = comparer.compare(&config(100), None).unwrap();

    assert_eq!(result.first.measurements.len(), 100);
    assert_eq!(result.second.measurements.len(), 100);
    assert_eq!(result.verdict.faster, SnippetId::First);
    assert!(result.verdict.ratio >= 100.0, "ratio {}", result.verdict.ratio);
    assert!(result.verdict.percent_faster.unwrap() > 99.0);
    assert!(result.second.stats.min >= 1e-3);
    assert!(result.first.stats.percentile_5.is_some());
    assert_eq!(result.first.source, "Built-in 'noop'");
    assert!(result.total_duration_secs >= 0.1);
}

#[test]
fn test_second_snippet_fault_aborts() {
    let mut comparer = Comparer::new(builtin("noop"), builtin("faulty"), SetupContext::default());
    let err = comparer.compare(&config(10), None).unwrap_err();
    match err {
        Error::SnippetFault { ref snippet, phase, .. } => {
            assert_eq!(snippet, "Snippet 2");
            assert_eq!(phase, Phase::Measurement);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.snippet(), Some("Snippet 2"));
}

#[test]
fn test_first_snippet_fault_skips_second() {
    let second_runs = Rc::new(RefCell::new(0usize));
    let counter = Rc::clone(&second_runs);
    let second = LabeledSnippet::new(
        "counting",
        move |_ctx: &mut SnippetContext| -> Result<(), SnippetError> {
            *counter.borrow_mut() += 1;
            Ok(())
        },
    );

    let mut comparer = Comparer::new(builtin("faulty"), second, SetupContext::default());
    let err = comparer.compare(&config(10), None).unwrap_err();
    assert_eq!(err.snippet(), Some("Snippet 1"));
    assert_eq!(*second_runs.borrow(), 0);
}

#[test]
fn test_zero_repetitions_has_no_verdict() {
    let mut comparer = Comparer::new(builtin("noop"), builtin("noop"), SetupContext::default());
    let err = comparer.compare(&config(0), None).unwrap_err();
    assert!(matches!(err, Error::NoSamples { ref snippet } if snippet == "Snippet 1"));
}

#[test]
fn test_both_snippets_see_same_seeds() {
    let seeds = Rc::new(RefCell::new(Vec::new()));
    let record = |tag: usize| {
        let seeds = Rc::clone(&seeds);
        move |ctx: &mut SnippetContext| -> Result<(), SnippetError> {
            seeds.borrow_mut().push((tag, ctx.seed()));
            Ok(())
        }
    };

    let mut comparer = Comparer::new(
        LabeledSnippet::new("first", record(1)),
        LabeledSnippet::new("second", record(2)),
        SetupContext::seeded(7),
    );
    let result = comparer.compare(&config(3), None).unwrap();
    assert_eq!(result.base_seed, 7);
    assert_eq!(
        *seeds.borrow(),
        vec![(1, 7), (1, 8), (1, 9), (2, 7), (2, 8), (2, 9)]
    );
}

#[test]
fn test_progress_reports_both_snippets() {
    let mut comparer = Comparer::new(builtin("noop"), builtin("noop"), SetupContext::default());
    let mut reported = Vec::new();
    let mut on_repeat_end = |rep: usize, _elapsed: f64| reported.push(rep);
    comparer.compare(&config(4), Some(&mut on_repeat_end)).unwrap();
    assert_eq!(reported, vec![0, 1, 2, 3, 0, 1, 2, 3]);
}

struct Recording {
    enabled: RefCell<bool>,
    history: Rc<RefCell<Vec<bool>>>,
}

impl ReclaimControl for Recording {
    fn is_enabled(&self) -> bool {
        *self.enabled.borrow()
    }

    fn set_enabled(&self, enabled: bool) {
        *self.enabled.borrow_mut() = enabled;
        self.history.borrow_mut().push(enabled);
    }
}

#[test]
fn test_reclaim_paused_per_snippet() {
    let history = Rc::new(RefCell::new(Vec::new()));
    let control = Recording {
        enabled: RefCell::new(true),
        history: Rc::clone(&history),
    };
    let mut comparer = Comparer::new(builtin("noop"), builtin("noop"), SetupContext::default())
        .with_reclaim_control(Box::new(control));
    comparer.compare(&config(2), None).unwrap();
    assert_eq!(*history.borrow(), vec![false, true, false, true]);
}

#[test]
fn test_result_exports_as_json() {
    let mut comparer = Comparer::new(builtin("noop"), builtin("alloc-1k"), SetupContext::seeded(99));
    let result = comparer.compare(&config(25), None).unwrap();

    let doc = ExportDocument::new(
        &result,
        snippet_compare::report::host::env_info(),
        SystemLoad::default(),
    );
    let value: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
    assert_eq!(value["parameters"]["fixed_seed"], 99);
    assert_eq!(value["snippet_2"]["source"], "Built-in 'alloc-1k'");
    assert_eq!(value["snippet_1"]["measurements"].as_array().unwrap().len(), 25);
    assert!(value["relative_performance"]["faster"].is_string());
    assert!(value["snippet_1"]["code"].is_null());
}

#[test]
fn test_snippet_code_reaches_report() {
    let first = builtin("noop").with_code("# no-op\n");
    let mut comparer = Comparer::new(first, builtin("noop"), SetupContext::default());
    let result = comparer.compare(&config(3), None).unwrap();
    assert_eq!(result.first.code.as_deref(), Some("# no-op\n"));
    assert_eq!(result.second.code, None);
}
