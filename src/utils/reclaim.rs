//! Pausing automatic memory reclamation during measurement.
//!
//! The allocator may hand freed memory back to the OS at unpredictable
//! points, which shows up as latency spikes in otherwise stable timings.
//! [`ReclaimPause`] turns that behaviour off for a scope and restores the
//! previous state when dropped, including during unwinding.

use std::sync::atomic::{AtomicBool, Ordering};

/// A process-wide automatic reclamation switch.
pub trait ReclaimControl {
    fn is_enabled(&self) -> bool;
    fn set_enabled(&self, enabled: bool);
}

static HEAP_TRIM_ENABLED: AtomicBool = AtomicBool::new(true);

/// Environment variable glibc reads its startup trim threshold from
pub const TRIM_THRESHOLD_ENV: &str = "MALLOC_TRIM_THRESHOLD_";

/// glibc's default `M_TRIM_THRESHOLD`
pub const DEFAULT_TRIM_THRESHOLD: libc::c_int = 128 * 1024;

/// Threshold to restore when trimming is switched back on: the value the
/// process was started with through `MALLOC_TRIM_THRESHOLD_`, or glibc's
/// default. Values that do not fit a `c_int` saturate.
pub fn restore_threshold(env_value: Option<&str>) -> libc::c_int {
    env_value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|v| libc::c_int::try_from(v).unwrap_or(libc::c_int::MAX))
        .unwrap_or(DEFAULT_TRIM_THRESHOLD)
}

/// Automatic heap trimming of the system allocator.
///
/// On Linux/glibc this maps to `mallopt(M_TRIM_THRESHOLD)`; elsewhere only
/// the flag is tracked. Re-enabling restores the startup threshold from
/// [`restore_threshold`]. Any explicit `M_TRIM_THRESHOLD` also turns off
/// glibc's dynamic threshold adjustment, so after the first pause the
/// threshold stays pinned at that value for the rest of the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeapTrim;

impl ReclaimControl for HeapTrim {
    fn is_enabled(&self) -> bool {
        HEAP_TRIM_ENABLED.load(Ordering::Relaxed)
    }

    fn set_enabled(&self, enabled: bool) {
        #[cfg(all(target_os = "linux", target_env = "gnu"))]
        {
            // -1 disables trimming entirely
            let threshold = if enabled {
                restore_threshold(std::env::var(TRIM_THRESHOLD_ENV).ok().as_deref())
            } else {
                -1
            };
            unsafe {
                libc::mallopt(libc::M_TRIM_THRESHOLD, threshold);
            }
        }
        HEAP_TRIM_ENABLED.store(enabled, Ordering::Relaxed);
    }
}

/// RAII guard - disables reclamation on creation, restores it on drop.
pub struct ReclaimPause<'a> {
    control: &'a dyn ReclaimControl,
    was_enabled: bool,
}

impl<'a> ReclaimPause<'a> {
    pub fn new(control: &'a dyn ReclaimControl) -> Self {
        let was_enabled = control.is_enabled();
        if was_enabled {
            control.set_enabled(false);
        }
        Self {
            control,
            was_enabled,
        }
    }
}

impl Drop for ReclaimPause<'_> {
    fn drop(&mut self) {
        if self.was_enabled {
            self.control.set_enabled(true);
        }
    }
}
