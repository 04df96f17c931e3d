//! Built-in snippet bodies.
//!
//! The two defaults mirror what the harness compares when no sources are
//! given: a variable-length sleep against a variable-length arithmetic loop.

use super::SnippetContext;
use crate::error::SnippetError;
use rand::Rng;
use std::hint::black_box;
use std::time::{Duration, Instant};

/// Sleep for a random duration in `[0, 5 ms)`.
pub fn random_sleep(ctx: &mut SnippetContext) -> Result<(), SnippetError> {
    let secs = ctx.rng().random::<f64>() * 0.005;
    std::thread::sleep(Duration::from_secs_f64(secs));
    Ok(())
}

/// Multiply-accumulate over a random number of iterations in `[50, 150]`.
pub fn random_accumulate(ctx: &mut SnippetContext) -> Result<(), SnippetError> {
    let rng = ctx.rng();
    let iterations: u32 = rng.random_range(50..=150);
    let mut result = 0.0f64;
    for i in 0..iterations {
        result += f64::from(i) * rng.random::<f64>();
    }
    black_box(result);
    Ok(())
}

pub fn noop(_ctx: &mut SnippetContext) -> Result<(), SnippetError> {
    black_box(());
    Ok(())
}

pub fn sleep_1ms(_ctx: &mut SnippetContext) -> Result<(), SnippetError> {
    std::thread::sleep(Duration::from_millis(1));
    Ok(())
}

/// Busy-wait for one microsecond without yielding the thread.
pub fn spin_1us(_ctx: &mut SnippetContext) -> Result<(), SnippetError> {
    let deadline = Instant::now() + Duration::from_micros(1);
    while Instant::now() < deadline {
        std::hint::spin_loop();
    }
    Ok(())
}

pub fn alloc_1k(_ctx: &mut SnippetContext) -> Result<(), SnippetError> {
    black_box(vec![0u8; 1024]);
    Ok(())
}

/// Sort 256 random integers drawn from the context's stream.
pub fn sort_256(ctx: &mut SnippetContext) -> Result<(), SnippetError> {
    let rng = ctx.rng();
    let mut values: Vec<u32> = (0..256).map(|_| rng.random()).collect();
    values.sort_unstable();
    black_box(values);
    Ok(())
}

/// Always fails; useful for checking fault reporting end to end.
pub fn faulty(_ctx: &mut SnippetContext) -> Result<(), SnippetError> {
    Err("deliberate fault raised by the 'faulty' snippet".into())
}
