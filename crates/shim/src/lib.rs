//! p4 debugging wrapper
//!
//! This library stands in for the Perforce `p4` client so that the exact
//! commands an editor plugin or build script issues can be inspected after
//! the fact.
//!
//! ## Architecture
//!
//! The wrapper works by:
//! 1. Being installed under the name the caller expects (`p4`)
//! 2. Forwarding its arguments and standard input to the real executable
//! 3. Capturing stdout and stderr as one stream along with the exit status
//! 4. Appending a plain-text record to `<logDirectory>/p4-debug.log`
//! 5. Relaying the (optionally truncated) output and the exit code
//!
//! ## Usage
//!
//! ```rust,no_run
//! use p4_wrapper_shim::run_shim;
//!
//! fn main() -> anyhow::Result<()> {
//!     let exit_code = run_shim()?;
//!     std::process::exit(exit_code);
//! }
//! ```

pub use context::{EnvironmentSnapshot, Invocation, ShimContext};
pub use exec::{run_shim, run_with, ExecutionResult};
pub use logger::{append_record, format_timestamp, LogRecord};
pub use output::{relay_output, visible_output};

mod context;
mod exec;
mod logger;
mod output;

/// Exit status used when the wrapper itself fails.
pub const FATAL_EXIT_CODE: i32 = 126;
/// `env_logger` filter for the wrapper's own diagnostics.
pub const LOG_FILTER_VAR: &str = "P4_WRAPPER_LOG";
/// Crate version plus git hash when built from a checkout.
pub const VERSION: &str = env!("P4_WRAPPER_VERSION");

/// Send the wrapper's own diagnostics to stderr, filtered by `P4_WRAPPER_LOG`.
///
/// Safe to call more than once.
pub fn init_logging() {
    let env = env_logger::Env::default().filter_or(LOG_FILTER_VAR, "warn");
    let _ = env_logger::Builder::from_env(env)
        .target(env_logger::Target::Stderr)
        .try_init();
    log::debug!("p4-wrapper {VERSION}");
}

/// Entry point shared by the binaries: run, report, and exit.
pub fn main_exit() -> ! {
    init_logging();
    let code = match run_shim() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("p4-wrapper error: {err:?}");
            FATAL_EXIT_CODE
        }
    };
    std::process::exit(code)
}

// Re-export commonly used types
pub use anyhow::{Context, Result};
pub use p4_wrapper_common::{Platform, Preferences};
