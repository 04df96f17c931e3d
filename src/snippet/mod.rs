//! # Snippets
//!
//! A snippet is the executable unit under comparison. Anything implementing
//! [`Snippet`] can be timed, including plain closures and `fn` items taking a
//! `&mut SnippetContext`.
//!
//! Each repetition gets a fresh [`SnippetContext`] seeded with
//! `base_seed + repetition`, so every repetition is reproducible while still
//! being decorrelated from its neighbours.

pub mod builtin;
pub mod script;

use crate::error::SnippetError;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Seed used when the caller does not pick one
pub const DEFAULT_SEED: u64 = 42;

/// Per-repetition state handed to setup and snippet bodies.
pub struct SnippetContext {
    seed: u64,
    rng: StdRng,
}

impl SnippetContext {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seed injected for this repetition
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Deterministic random stream derived from [`seed`](Self::seed)
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

/// An executable code unit that can be timed.
pub trait Snippet {
    fn run(&mut self, ctx: &mut SnippetContext) -> Result<(), SnippetError>;
}

impl<F> Snippet for F
where
    F: FnMut(&mut SnippetContext) -> Result<(), SnippetError>,
{
    fn run(&mut self, ctx: &mut SnippetContext) -> Result<(), SnippetError> {
        self(ctx)
    }
}

/// Untimed preamble executed before each repetition and warm-up run.
pub trait Setup {
    fn prepare(&self, ctx: &mut SnippetContext) -> Result<(), SnippetError>;
}

impl<F> Setup for F
where
    F: Fn(&mut SnippetContext) -> Result<(), SnippetError>,
{
    fn prepare(&self, ctx: &mut SnippetContext) -> Result<(), SnippetError> {
        self(ctx)
    }
}

/// Setup that does nothing beyond seeding the context.
pub struct NoSetup;

impl Setup for NoSetup {
    fn prepare(&self, _ctx: &mut SnippetContext) -> Result<(), SnippetError> {
        Ok(())
    }
}

/// A snippet together with where it came from.
pub struct LabeledSnippet {
    /// Provenance, e.g. `Default Snippet 1` or `File ('a.sh')`
    pub source: String,
    /// Source text for snippets loaded from a file
    pub code: Option<String>,
    pub unit: Box<dyn Snippet>,
}

impl LabeledSnippet {
    pub fn new(source: impl Into<String>, unit: impl Snippet + 'static) -> Self {
        Self {
            source: source.into(),
            code: None,
            unit: Box::new(unit),
        }
    }

    pub fn boxed(source: impl Into<String>, unit: Box<dyn Snippet>) -> Self {
        Self {
            source: source.into(),
            code: None,
            unit,
        }
    }

    /// Attach the source text the snippet was built from.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Setup shared by both snippets of a comparison, plus the base seed.
pub struct SetupContext {
    pub source: String,
    base_seed: u64,
    setup: Box<dyn Setup>,
}

impl SetupContext {
    pub fn new(source: impl Into<String>, base_seed: u64, setup: impl Setup + 'static) -> Self {
        Self::boxed(source, base_seed, Box::new(setup))
    }

    pub fn boxed(source: impl Into<String>, base_seed: u64, setup: Box<dyn Setup>) -> Self {
        Self {
            source: source.into(),
            base_seed,
            setup,
        }
    }

    /// Context with no preamble, only seeding.
    pub fn seeded(base_seed: u64) -> Self {
        Self::new("Default Setup", base_seed, NoSetup)
    }

    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// Seed for repetition `rep`: `base_seed + rep`.
    pub fn seed_for(&self, rep: usize) -> u64 {
        self.base_seed.wrapping_add(rep as u64)
    }

    pub fn prepare(&self, ctx: &mut SnippetContext) -> Result<(), SnippetError> {
        self.setup.prepare(ctx)
    }
}

impl Default for SetupContext {
    fn default() -> Self {
        Self::seeded(DEFAULT_SEED)
    }
}
