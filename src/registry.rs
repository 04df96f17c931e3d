//! Registry of built-in snippets.
//!
//! Lets the CLI pick snippets by name without a source file, and provides
//! the defaults used when nothing is specified.

use crate::snippet::builtin;
use crate::snippet::{LabeledSnippet, Snippet, SnippetContext};

/// Name of the snippet compared first by default
pub const DEFAULT_FIRST: &str = "random-sleep";
/// Name of the snippet compared second by default
pub const DEFAULT_SECOND: &str = "random-accumulate";

/// Information about a built-in snippet.
pub struct SnippetInfo {
    /// Unique identifier (e.g., "noop", "sleep-1ms")
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Category (e.g., "default", "timing", "diagnostic")
    pub category: &'static str,
    build: fn() -> Box<dyn Snippet>,
}

impl SnippetInfo {
    pub fn new(
        name: &'static str,
        description: &'static str,
        category: &'static str,
        build: fn() -> Box<dyn Snippet>,
    ) -> Self {
        Self {
            name,
            description,
            category,
            build,
        }
    }

    /// Fresh executable instance
    pub fn instantiate(&self) -> Box<dyn Snippet> {
        (self.build)()
    }

    /// Instance labelled `Built-in '<name>'`
    pub fn labeled(&self) -> LabeledSnippet {
        LabeledSnippet::boxed(format!("Built-in '{}'", self.name), self.instantiate())
    }

    /// Run the snippet once to check it executes cleanly.
    pub fn verify(&self) -> Result<(), String> {
        let mut ctx = SnippetContext::new(crate::snippet::DEFAULT_SEED);
        self.instantiate()
            .run(&mut ctx)
            .map_err(|e| format!("snippet '{}' failed: {}", self.name, e))
    }
}

/// Collection of all built-in snippets
pub struct SnippetRegistry {
    snippets: Vec<SnippetInfo>,
}

impl SnippetRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            snippets: Vec::new(),
        }
    }

    pub fn register(&mut self, info: SnippetInfo) {
        self.snippets.push(info);
    }

    pub fn all(&self) -> &[SnippetInfo] {
        &self.snippets
    }

    /// Find snippet by name
    pub fn find(&self, name: &str) -> Option<&SnippetInfo> {
        self.snippets.iter().find(|s| s.name == name)
    }

    pub fn list_names(&self) -> Vec<&'static str> {
        self.snippets.iter().map(|s| s.name).collect()
    }

    pub fn by_category(&self, category: &str) -> Vec<&SnippetInfo> {
        self.snippets
            .iter()
            .filter(|s| s.category == category)
            .collect()
    }
}

impl Default for SnippetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the registry with every built-in snippet
pub fn build_registry() -> SnippetRegistry {
    let mut registry = SnippetRegistry::new();

    registry.register(SnippetInfo::new(
        DEFAULT_FIRST,
        "Sleeps for a random 0-5 ms",
        "default",
        || Box::new(builtin::random_sleep),
    ));
    registry.register(SnippetInfo::new(
        DEFAULT_SECOND,
        "Multiply-accumulates over 50-150 random values",
        "default",
        || Box::new(builtin::random_accumulate),
    ));
    registry.register(SnippetInfo::new(
        "noop",
        "Does nothing",
        "timing",
        || Box::new(builtin::noop),
    ));
    registry.register(SnippetInfo::new(
        "sleep-1ms",
        "Sleeps for one millisecond",
        "timing",
        || Box::new(builtin::sleep_1ms),
    ));
    registry.register(SnippetInfo::new(
        "spin-1us",
        "Busy-waits for one microsecond",
        "timing",
        || Box::new(builtin::spin_1us),
    ));
    registry.register(SnippetInfo::new(
        "alloc-1k",
        "Allocates and frees a 1 KiB buffer",
        "memory",
        || Box::new(builtin::alloc_1k),
    ));
    registry.register(SnippetInfo::new(
        "sort-256",
        "Sorts 256 random integers",
        "compute",
        || Box::new(builtin::sort_256),
    ));
    registry.register(SnippetInfo::new(
        "faulty",
        "Fails on every execution",
        "diagnostic",
        || Box::new(builtin::faulty),
    ));

    registry
}
