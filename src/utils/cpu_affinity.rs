//! Thread pinning for stable measurements.
//!
//! Migrating between cores mid-measurement costs cold caches and shows up
//! as noise. [`AffinityGuard`] pins the calling thread to the core it is
//! running on and restores the original affinity mask when dropped.
//!
//! Only Linux has a real implementation; on other platforms the guard is a
//! no-op that reports itself as unpinned.

#[cfg(target_os = "linux")]
mod platform {
    pub type Mask = libc::cpu_set_t;

    pub fn current_cpu() -> Option<usize> {
        let cpu = unsafe { libc::sched_getcpu() };
        (cpu >= 0).then_some(cpu as usize)
    }

    pub fn first_allowed_cpu(mask: &Mask) -> Option<usize> {
        let cpus = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
        (0..cpus.max(0) as usize).find(|&cpu| unsafe { libc::CPU_ISSET(cpu, mask) })
    }

    pub fn get_mask() -> Option<Mask> {
        unsafe {
            let mut set: Mask = std::mem::zeroed();
            (libc::sched_getaffinity(0, std::mem::size_of::<Mask>(), &mut set) == 0).then_some(set)
        }
    }

    pub fn pin(cpu: usize) -> bool {
        unsafe {
            let mut set: Mask = std::mem::zeroed();
            libc::CPU_ZERO(&mut set);
            libc::CPU_SET(cpu, &mut set);
            libc::sched_setaffinity(0, std::mem::size_of::<Mask>(), &set) == 0
        }
    }

    pub fn restore(mask: &Mask) -> bool {
        unsafe { libc::sched_setaffinity(0, std::mem::size_of::<Mask>(), mask) == 0 }
    }
}

#[cfg(not(target_os = "linux"))]
mod platform {
    pub type Mask = ();

    pub fn current_cpu() -> Option<usize> {
        None
    }
    pub fn first_allowed_cpu(_mask: &Mask) -> Option<usize> {
        None
    }
    pub fn get_mask() -> Option<Mask> {
        None
    }
    pub fn pin(_cpu: usize) -> bool {
        false
    }
    pub fn restore(_mask: &Mask) -> bool {
        true
    }
}

/// RAII guard for CPU pinning - pins on creation, restores on drop.
///
/// ```ignore
/// {
///     let _pin = AffinityGuard::pin_current(); // thread pinned
///     // ... timed repetitions ...
/// } // original affinity restored here, even when unwinding
/// ```
pub struct AffinityGuard {
    original: Option<platform::Mask>,
    core: Option<usize>,
}

impl AffinityGuard {
    /// Pin to the core the thread currently runs on, or the first core the
    /// thread is allowed on if that cannot be determined.
    pub fn pin_current() -> Self {
        let Some(original) = platform::get_mask() else {
            return Self::unpinned();
        };
        let core = platform::current_cpu().or_else(|| platform::first_allowed_cpu(&original));
        match core {
            Some(core) if platform::pin(core) => Self {
                original: Some(original),
                core: Some(core),
            },
            _ => Self::unpinned(),
        }
    }

    fn unpinned() -> Self {
        Self {
            original: None,
            core: None,
        }
    }

    /// Core the thread is pinned to, if pinning succeeded
    pub fn core_id(&self) -> Option<usize> {
        self.core
    }

    pub fn is_pinned(&self) -> bool {
        self.core.is_some()
    }
}

impl Drop for AffinityGuard {
    fn drop(&mut self) {
        if let Some(mask) = self.original.take() {
            platform::restore(&mask);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_guard() {
        let guard = AffinityGuard::pin_current();
        if guard.is_pinned() {
            assert!(guard.core_id().is_some());
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_mask_restored_on_drop() {
        let before = platform::get_mask().expect("affinity readable");
        let guard = AffinityGuard::pin_current();
        drop(guard);
        let after = platform::get_mask().expect("affinity readable");
        let count = |m: &platform::Mask| unsafe { libc::CPU_COUNT(m) };
        assert_eq!(count(&before), count(&after));
    }
}
