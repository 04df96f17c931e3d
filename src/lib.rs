//! # Snippet-Compare
//!
//! Head-to-head micro-benchmarking of two code snippets under controlled,
//! reproducible conditions: seeded randomness, warm-up runs, paused memory
//! reclamation and silenced snippet output.

pub mod compare;
pub mod error;
pub mod registry;
pub mod report;
pub mod snippet;
pub mod stats;
pub mod utils;

/// Re-export commonly used items
pub mod prelude {
    pub use crate::compare::{Comparer, ComparisonResult, SnippetId, Verdict};
    pub use crate::error::{Error, SnippetError};
    pub use crate::registry::{build_registry, SnippetInfo, SnippetRegistry};
    pub use crate::snippet::{LabeledSnippet, SetupContext, Snippet, SnippetContext};
    pub use crate::utils::{PinStrategy, TimingConfig};
}
