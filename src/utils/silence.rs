//! Scoped suppression of the process's stdout/stderr.
//!
//! Snippets may print; their output must not end up interleaved with the
//! harness's own report. [`OutputSilencer`] points file descriptors 1 and 2
//! at `/dev/null` and puts the originals back on drop.
//!
//! The redirect is process-wide. Overlapping guards (e.g. from parallel test
//! threads) share one redirect: the first guard installs it and the last one
//! to drop restores the original descriptors.

use std::io::Write;
use std::sync::{Mutex, MutexGuard};

struct Redirect {
    depth: usize,
    #[cfg(unix)]
    saved: Option<(libc::c_int, libc::c_int)>,
}

static REDIRECT: Mutex<Redirect> = Mutex::new(Redirect {
    depth: 0,
    #[cfg(unix)]
    saved: None,
});

fn lock() -> MutexGuard<'static, Redirect> {
    REDIRECT.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn flush_std() {
    let _ = std::io::stdout().flush();
    let _ = std::io::stderr().flush();
}

/// RAII guard - silences stdout/stderr while alive.
pub struct OutputSilencer {
    _private: (),
}

impl OutputSilencer {
    pub fn new() -> Self {
        let mut state = lock();
        if state.depth == 0 {
            flush_std();
            #[cfg(unix)]
            {
                state.saved = redirect_to_null();
            }
        }
        state.depth += 1;
        Self { _private: () }
    }

    /// Whether the descriptors are currently redirected
    pub fn is_active() -> bool {
        #[cfg(unix)]
        {
            lock().saved.is_some()
        }
        #[cfg(not(unix))]
        {
            false
        }
    }
}

impl Default for OutputSilencer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for OutputSilencer {
    fn drop(&mut self) {
        let mut state = lock();
        state.depth = state.depth.saturating_sub(1);
        if state.depth == 0 {
            flush_std();
            #[cfg(unix)]
            if let Some((out, err)) = state.saved.take() {
                unsafe {
                    libc::dup2(out, libc::STDOUT_FILENO);
                    libc::dup2(err, libc::STDERR_FILENO);
                    libc::close(out);
                    libc::close(err);
                }
            }
        }
    }
}

#[cfg(unix)]
fn redirect_to_null() -> Option<(libc::c_int, libc::c_int)> {
    const DEV_NULL: &[u8] = b"/dev/null\0";
    unsafe {
        let null = libc::open(DEV_NULL.as_ptr() as *const libc::c_char, libc::O_WRONLY);
        if null < 0 {
            return None;
        }
        let out = libc::dup(libc::STDOUT_FILENO);
        let err = libc::dup(libc::STDERR_FILENO);
        if out < 0 || err < 0 {
            for fd in [out, err, null] {
                if fd >= 0 {
                    libc::close(fd);
                }
            }
            return None;
        }
        libc::dup2(null, libc::STDOUT_FILENO);
        libc::dup2(null, libc::STDERR_FILENO);
        libc::close(null);
        Some((out, err))
    }
}
