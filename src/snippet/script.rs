//! Snippets and setup loaded from script files.
//!
//! A script is executed through a shell (`<shell> -c <body>`) with the
//! repetition seed exported as `SNIPPET_SEED`. A non-zero exit status is a
//! fault carrying the tail of the script's stderr.

use super::{LabeledSnippet, Setup, SetupContext, Snippet, SnippetContext};
use crate::error::{Error, Result, SnippetError};
use log::{info, warn};
use std::path::Path;
use std::process::{Command, Stdio};

/// Environment variable carrying the repetition seed
pub const SEED_ENV: &str = "SNIPPET_SEED";

/// Shell used when none is configured
pub const DEFAULT_SHELL: &str = "sh";

/// Bytes of stderr kept in a fault message
const STDERR_TAIL: usize = 512;

/// A script body run once per execution
pub struct ScriptSnippet {
    shell: String,
    body: String,
}

impl ScriptSnippet {
    pub fn new(shell: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            body: body.into(),
        }
    }
}

impl Snippet for ScriptSnippet {
    fn run(&mut self, ctx: &mut SnippetContext) -> std::result::Result<(), SnippetError> {
        run_script(&self.shell, &self.body, ctx.seed())
    }
}

/// A script body run, untimed, before each repetition
pub struct ScriptSetup {
    shell: String,
    body: String,
}

impl ScriptSetup {
    pub fn new(shell: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
            body: body.into(),
        }
    }
}

impl Setup for ScriptSetup {
    fn prepare(&self, ctx: &mut SnippetContext) -> std::result::Result<(), SnippetError> {
        run_script(&self.shell, &self.body, ctx.seed())
    }
}

fn run_script(shell: &str, body: &str, seed: u64) -> std::result::Result<(), SnippetError> {
    let output = Command::new(shell)
        .arg("-c")
        .arg(body)
        .env(SEED_ENV, seed.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    let tail = match stderr.char_indices().rev().nth(STDERR_TAIL) {
        Some((idx, _)) => &stderr[idx..],
        None => stderr,
    };
    if tail.is_empty() {
        Err(format!("script exited with {}", output.status).into())
    } else {
        Err(format!("script exited with {}: {}", output.status, tail).into())
    }
}

/// Read a source file as UTF-8 text.
pub fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Provenance label for a file-backed source
pub fn file_label(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    format!("File ('{}')", name)
}

/// Load a snippet from `path`, or fall back to `default` when no path is
/// given or the file cannot be read.
pub fn load_snippet(
    path: Option<&Path>,
    default_label: &str,
    default: Box<dyn Snippet>,
    shell: &str,
) -> LabeledSnippet {
    let Some(path) = path else {
        return LabeledSnippet::boxed(default_label, default);
    };

    info!("loading snippet from {}", path.display());
    match read_source(path) {
        Ok(body) => {
            LabeledSnippet::new(file_label(path), ScriptSnippet::new(shell, body.as_str()))
                .with_code(body)
        }
        Err(e) => {
            warn!("{e}; using default: {default_label}");
            LabeledSnippet::boxed(format!("{} (Fallback)", default_label), default)
        }
    }
}

/// Load the setup preamble from `path`, falling back to a seeding-only setup.
pub fn load_setup(path: Option<&Path>, base_seed: u64, shell: &str) -> SetupContext {
    let Some(path) = path else {
        return SetupContext::seeded(base_seed);
    };

    info!("loading setup from {}", path.display());
    match read_source(path) {
        Ok(body) => SetupContext::new(file_label(path), base_seed, ScriptSetup::new(shell, body)),
        Err(e) => {
            warn!("{e}; falling back to default setup");
            SetupContext::seeded(base_seed)
        }
    }
}
