mod relay;
mod spawn;

pub use self::spawn::ExecutionResult;

use self::spawn::execute_command;
use crate::context::ShimContext;
use crate::logger::{append_record, LogRecord};
use crate::output::relay_output;
use anyhow::{Context, Result};
use p4_wrapper_common::{PreferenceSources, Preferences};
use std::fs;
use std::io::{self, Read, Write};

/// Main shim execution function
pub fn run_shim() -> Result<i32> {
    let ctx = ShimContext::from_process()?;
    let sources = PreferenceSources::from_env(&ctx.cwd);
    let prefs = Preferences::load(&sources, ctx.platform)?;

    let stdout = io::stdout();
    run_with(&ctx, &prefs, io::stdin(), &mut stdout.lock())
}

/// Run one interception with explicit inputs.
///
/// Returns the child's exit code. Errors are wrapper failures: the log could
/// not be written or the child could not be started. In that case nothing
/// has been relayed to `out`.
pub fn run_with<R, W>(ctx: &ShimContext, prefs: &Preferences, input: R, out: &mut W) -> Result<i32>
where
    R: Read + Send + 'static,
    W: Write,
{
    fs::create_dir_all(&prefs.log_directory).with_context(|| {
        format!(
            "Failed to create log directory {}",
            prefs.log_directory.display()
        )
    })?;

    let args = ctx.invocation.effective_args(prefs.verbose);
    log::debug!(
        "executing {} with {} args",
        prefs.executable_path.display(),
        args.len()
    );

    let result = execute_command(&prefs.executable_path, &args, input)?;

    let record = LogRecord {
        invocation: &ctx.invocation,
        cwd: &ctx.cwd,
        environment: &ctx.environment,
        result: &result,
    };
    let log_path = prefs.log_file();
    append_record(&log_path, &record.render(ctx.platform))?;
    log::debug!(
        "appended record to {} (exit {}, {} ms)",
        log_path.display(),
        result.exit_code,
        result.duration_ms()
    );

    if let Err(err) = relay_output(
        out,
        &result.combined_output,
        prefs.max_output_lines,
        prefs.mark_truncation,
    ) {
        // the caller went away; its exit code is all that is left to deliver
        log::warn!("failed to relay output: {err}");
    }

    Ok(result.exit_code)
}
