//! Diagnostic record formatting and the append-only log
//!
//! Rendering is a pure function of the captured inputs; only [`append_record`]
//! touches the filesystem.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::SystemTime;

use crate::context::{EnvironmentSnapshot, Invocation, TOOL_NAME};
use crate::exec::ExecutionResult;
use p4_wrapper_common::Platform;

/// One invocation's worth of diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct LogRecord<'a> {
    pub invocation: &'a Invocation,
    pub cwd: &'a Path,
    pub environment: &'a EnvironmentSnapshot,
    pub result: &'a ExecutionResult,
}

impl LogRecord<'_> {
    /// Render the record for `platform`.
    ///
    /// The fixed template text and the environment block use the platform's
    /// line ending; the captured output is spliced in as raw bytes.
    pub fn render(&self, platform: Platform) -> Vec<u8> {
        let nl = platform.line_ending();
        let joined_env = self.environment.joined();
        let environment = platform.native_line_endings(&joined_env);

        let head = format!(
            "{nl}----------{nl}\
             Time: {time}{nl}\
             Executing: {tool} {args}{nl}\
             {nl}\
             CWD: {cwd}{nl}\
             {nl}\
             {tool_upper} Environment:{nl}\
             {nl}\
             {environment}{nl}\
             {nl}\
             Full Output:{nl}\
             {nl}",
            time = format_timestamp(self.result.started_at),
            tool = TOOL_NAME,
            tool_upper = TOOL_NAME.to_ascii_uppercase(),
            args = self.invocation.display(),
            cwd = self.cwd.display(),
        );
        let tail = format!(
            "{nl}\
             {nl}\
             Exit Status: {code}{nl}\
             {nl}\
             Exec Time: {ms} ms{nl}",
            code = self.result.exit_code,
            ms = self.result.duration_ms(),
        );

        let output = &self.result.combined_output;
        let mut record = Vec::with_capacity(head.len() + output.len() + tail.len());
        record.extend_from_slice(head.as_bytes());
        record.extend_from_slice(output);
        record.extend_from_slice(tail.as_bytes());
        record
    }
}

/// Append `record` to the log at `log_path` with a single write.
///
/// The log directory must already exist. The handle is dropped on every path
/// out of this function, including a failed write.
pub fn append_record(log_path: &Path, record: &[u8]) -> Result<()> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }

    let mut file = options
        .open(log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
    file.write_all(record)
        .with_context(|| format!("Failed to write log file {}", log_path.display()))?;

    Ok(())
}

/// Format timestamp as RFC3339 in local time, whole seconds
pub fn format_timestamp(timestamp: SystemTime) -> String {
    let dt: chrono::DateTime<chrono::Local> = timestamp.into();
    dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}
