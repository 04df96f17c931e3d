//! Utility modules for measurement.

pub mod cpu_affinity;
pub mod format;
pub mod reclaim;
pub mod silence;
pub mod timer;

// Re-export commonly used items
pub use cpu_affinity::AffinityGuard;
pub use format::format_duration;
pub use reclaim::{HeapTrim, ReclaimControl, ReclaimPause};
pub use silence::OutputSilencer;
pub use timer::{per_execution, PinStrategy, SnippetTimer, TimingConfig, TimingSeries};
