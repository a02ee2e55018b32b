use anyhow::{Context, Result};
use std::ffi::OsString;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant, SystemTime};

use super::relay::StdinRelay;

/// What one run of the wrapped executable produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Wall-clock time taken just before spawning.
    pub started_at: SystemTime,
    pub duration: Duration,
    /// Interleaved stdout and stderr of the child.
    pub combined_output: Vec<u8>,
    pub exit_code: i32,
}

impl ExecutionResult {
    pub fn duration_ms(&self) -> u128 {
        self.duration.as_millis()
    }
}

/// Run `binary` to completion, relaying `input` to its stdin and capturing
/// stdout and stderr as one stream.
///
/// Fails only when the child cannot be started or its output cannot be read;
/// a non-zero exit or a signal is reported through [`ExecutionResult::exit_code`].
pub(crate) fn execute_command<R>(
    binary: &Path,
    args: &[OsString],
    input: R,
) -> Result<ExecutionResult>
where
    R: Read + Send + 'static,
{
    let started_at = SystemTime::now();
    let start_time = Instant::now();

    let mut cmd = Command::new(binary);
    cmd.args(args).stdin(Stdio::piped());
    let output = CombinedOutput::attach(&mut cmd)?;

    let mut child = cmd
        .spawn()
        .with_context(|| format!("Failed to execute {}", binary.display()))?;
    // the command still owns our copies of the output pipe's write end
    drop(cmd);

    let relay = match child.stdin.take() {
        Some(sink) => match StdinRelay::start(input, sink) {
            Ok(relay) => Some(relay),
            Err(err) => {
                log::warn!("failed to start stdin relay: {err}");
                None
            }
        },
        None => None,
    };

    let combined_output = output
        .collect(&mut child)
        .with_context(|| format!("Failed to read output of {}", binary.display()))?;
    let status = child
        .wait()
        .with_context(|| format!("Failed to wait for {}", binary.display()))?;
    let duration = start_time.elapsed();

    if let Some(relay) = relay {
        relay.settle().report();
    }

    Ok(ExecutionResult {
        started_at,
        duration,
        combined_output,
        exit_code: exit_code_from_status(&status),
    })
}

/// Exit code reported when the child ended without one (killed by a signal).
pub(crate) const NO_EXIT_CODE: i32 = -1;

/// Exit code the wrapper reports for a finished child.
///
/// A status without a code, such as a signal death, maps to [`NO_EXIT_CODE`];
/// exiting with it leaves the wrapper's own status at 255.
pub(crate) fn exit_code_from_status(status: &ExitStatus) -> i32 {
    status.code().unwrap_or(NO_EXIT_CODE)
}

/// Read side of the child's merged stdout/stderr.
#[cfg(unix)]
struct CombinedOutput {
    reader: std::fs::File,
}

#[cfg(unix)]
impl CombinedOutput {
    /// Point both stdout and stderr of `cmd` at the write end of one pipe.
    fn attach(cmd: &mut Command) -> Result<Self> {
        let (read_end, write_end) =
            nix::unistd::pipe().context("Failed to create output pipe")?;
        // try_clone duplicates with FD_CLOEXEC, keeping stray pipe ends out of the child
        let reader = read_end
            .try_clone()
            .context("Failed to duplicate output pipe")?;
        let stdout_end = write_end
            .try_clone()
            .context("Failed to duplicate output pipe")?;
        let stderr_end = write_end
            .try_clone()
            .context("Failed to duplicate output pipe")?;

        cmd.stdout(Stdio::from(stdout_end))
            .stderr(Stdio::from(stderr_end));

        Ok(Self {
            reader: std::fs::File::from(reader),
        })
    }

    fn collect(mut self, _child: &mut std::process::Child) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.reader.read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}

/// Without a shared pipe the two streams are drained on separate threads and
/// merged in arrival order.
#[cfg(not(unix))]
struct CombinedOutput;

#[cfg(not(unix))]
impl CombinedOutput {
    fn attach(cmd: &mut Command) -> Result<Self> {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        Ok(Self)
    }

    fn collect(self, child: &mut std::process::Child) -> io::Result<Vec<u8>> {
        use std::sync::mpsc;

        let (tx, rx) = mpsc::channel();
        let mut collectors = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            collectors.push(spawn_chunk_forwarder(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            collectors.push(spawn_chunk_forwarder(stderr, tx));
        } else {
            drop(tx);
        }

        let buffer: Vec<u8> = rx.iter().flatten().collect();
        for collector in collectors {
            collector
                .join()
                .map_err(|_| io::Error::other("output collector panicked"))??;
        }
        Ok(buffer)
    }
}

#[cfg(not(unix))]
fn spawn_chunk_forwarder<R: Read + Send + 'static>(
    mut reader: R,
    tx: std::sync::mpsc::Sender<Vec<u8>>,
) -> std::thread::JoinHandle<io::Result<()>> {
    std::thread::spawn(move || {
        let mut chunk = [0u8; 8192];
        loop {
            let read = reader.read(&mut chunk)?;
            if read == 0 {
                break;
            }
            if tx.send(chunk[..read].to_vec()).is_err() {
                break;
            }
        }
        Ok(())
    })
}
