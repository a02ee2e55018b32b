//! Process inputs captured once at startup
//!
//! The wrapper reads its arguments, working directory and `P4*` environment
//! exactly once and hands them around explicitly, so the record formatter
//! never reaches for ambient process state.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use p4_wrapper_common::Platform;

/// Label the diagnostic record uses for the wrapped tool.
pub const TOOL_NAME: &str = "p4";
/// Flag pair asking `p4` for detailed internal logging.
pub const VERBOSE_FLAGS: [&str; 2] = ["-v", "4"];

/// `NAME=VALUE` assignments whose name starts with `P4` plus at least one more character.
static TOOL_ENV_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new("^P4[^=]+=").expect("tool env pattern is valid"));

/// Arguments the wrapper was invoked with, program name excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Invocation {
    args: Vec<OsString>,
}

impl Invocation {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(env::args_os().skip(1))
    }

    /// Arguments handed to the real executable.
    pub fn effective_args(&self, verbose: bool) -> Vec<OsString> {
        let mut effective: Vec<OsString> = if verbose {
            VERBOSE_FLAGS.iter().map(OsString::from).collect()
        } else {
            Vec::with_capacity(self.args.len())
        };
        effective.extend(self.args.iter().cloned());
        effective
    }

    /// Caller's arguments joined by spaces, as recorded in the log.
    pub fn display(&self) -> String {
        self.args
            .iter()
            .map(|arg| arg.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// `P4*` environment assignments in the order the OS reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    entries: Vec<String>,
}

impl EnvironmentSnapshot {
    pub fn capture() -> Self {
        Self::from_vars(env::vars_os())
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<OsString>,
        V: Into<OsString>,
    {
        let entries = vars
            .into_iter()
            .map(|(key, value)| {
                format!(
                    "{}={}",
                    key.into().to_string_lossy(),
                    value.into().to_string_lossy()
                )
            })
            .filter(|entry| TOOL_ENV_PATTERN.is_match(entry))
            .collect();

        Self { entries }
    }

    /// Newline-joined assignments.
    pub fn joined(&self) -> String {
        self.entries.join("\n")
    }
}

/// Everything the wrapper reads from its own process at startup
#[derive(Debug, Clone)]
pub struct ShimContext {
    pub invocation: Invocation,
    /// Directory the wrapper was invoked from
    pub cwd: PathBuf,
    pub environment: EnvironmentSnapshot,
    pub platform: Platform,
}

impl ShimContext {
    pub fn from_process() -> Result<Self> {
        let cwd = env::current_dir().context("Failed to determine working directory")?;

        Ok(Self {
            invocation: Invocation::from_env(),
            cwd,
            environment: EnvironmentSnapshot::capture(),
            platform: Platform::current(),
        })
    }
}
