//! Snippet output must never reach the harness's stdout.
//!
//! Kept in its own test binary: it rewires fd 1, which would race with any
//! other test holding an `OutputSilencer`.

#![cfg(unix)]

use std::fs;
use std::os::unix::io::AsRawFd;

use snippet_compare::error::{Error, SnippetError};
use snippet_compare::snippet::{SetupContext, SnippetContext};
use snippet_compare::utils::{HeapTrim, PinStrategy, SnippetTimer, TimingConfig};

fn identity(fd: libc::c_int) -> (libc::dev_t, libc::ino_t) {
    unsafe {
        let mut stat: libc::stat = std::mem::zeroed();
        assert_eq!(libc::fstat(fd, &mut stat), 0);
        (stat.st_dev, stat.st_ino)
    }
}

fn write_stdout(msg: &str) {
    unsafe {
        libc::write(
            libc::STDOUT_FILENO,
            msg.as_ptr() as *const libc::c_void,
            msg.len(),
        );
    }
}

#[test]
fn test_snippet_output_is_suppressed() {
    let capture = tempfile::NamedTempFile::new().unwrap();
    let saved = unsafe { libc::dup(libc::STDOUT_FILENO) };
    assert!(saved >= 0);
    unsafe {
        assert!(libc::dup2(capture.as_file().as_raw_fd(), libc::STDOUT_FILENO) >= 0);
    }
    let captured = identity(capture.as_file().as_raw_fd());

    let config = TimingConfig {
        repetitions: 5,
        executions_per_rep: 2,
        warmup_runs: 1,
        pin_strategy: PinStrategy::Off,
    };
    let timer = SnippetTimer::new(&config, &HeapTrim);

    let mut chatty = |_ctx: &mut SnippetContext| -> Result<(), SnippetError> {
        write_stdout("chatty snippet output\n");
        println!("buffered snippet output");
        Ok(())
    };
    let series = timer.time("Snippet 1", &mut chatty, &SetupContext::default(), None);
    let restored_after_success = identity(libc::STDOUT_FILENO);

    let mut failing = |ctx: &mut SnippetContext| -> Result<(), SnippetError> {
        write_stdout("output before the fault\n");
        if ctx.seed() > SetupContext::default().base_seed() {
            Err("fault after printing".into())
        } else {
            Ok(())
        }
    };
    let fault = timer.time("Snippet 2", &mut failing, &SetupContext::default(), None);
    let restored_after_fault = identity(libc::STDOUT_FILENO);

    unsafe {
        libc::dup2(saved, libc::STDOUT_FILENO);
        libc::close(saved);
    }

    assert_eq!(series.unwrap().len(), 5);
    assert!(matches!(fault, Err(Error::SnippetFault { .. })));
    assert_eq!(restored_after_success, captured);
    assert_eq!(restored_after_fault, captured);
    assert_eq!(fs::read_to_string(capture.path()).unwrap(), "");
}
