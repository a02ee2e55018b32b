//! Standard input forwarding to the child.
//!
//! The relay runs on its own thread so the child can start consuming input
//! before the caller has finished producing it. Its completion is observed
//! separately from the child's exit and never decides the run's outcome.

use std::io::{self, Read, Write};
use std::thread::{self, JoinHandle};

pub(crate) struct StdinRelay {
    handle: JoinHandle<io::Result<u64>>,
}

/// How the relay had ended by the time the child exited.
#[derive(Debug)]
pub(crate) enum RelayOutcome {
    /// Input reached end-of-stream and the child's stdin was closed.
    Finished(u64),
    Failed(io::Error),
    /// Still waiting on the caller's input; left to die with the process.
    Pending,
}

impl StdinRelay {
    pub(crate) fn start<R, W>(mut input: R, mut sink: W) -> io::Result<Self>
    where
        R: Read + Send + 'static,
        W: Write + Send + 'static,
    {
        let handle = thread::Builder::new()
            .name("stdin-relay".to_string())
            .spawn(move || {
                let copied = io::copy(&mut input, &mut sink)?;
                sink.flush()?;
                // dropping the sink closes the pipe so the child sees EOF
                drop(sink);
                Ok(copied)
            })?;

        Ok(Self { handle })
    }

    /// Collect the outcome without blocking on a relay that is still running.
    pub(crate) fn settle(self) -> RelayOutcome {
        if !self.handle.is_finished() {
            return RelayOutcome::Pending;
        }

        RelayOutcome::from_join(self.handle.join())
    }

    /// Wait for the relay to end. Only used where the input is known to be finite.
    #[cfg(test)]
    pub(crate) fn join(self) -> RelayOutcome {
        RelayOutcome::from_join(self.handle.join())
    }
}

impl RelayOutcome {
    fn from_join(result: thread::Result<io::Result<u64>>) -> Self {
        match result {
            Ok(Ok(copied)) => RelayOutcome::Finished(copied),
            Ok(Err(err)) => RelayOutcome::Failed(err),
            Err(_) => RelayOutcome::Failed(io::Error::other("stdin relay thread panicked")),
        }
    }

    pub(crate) fn report(&self) {
        match self {
            RelayOutcome::Finished(bytes) => log::debug!("stdin relay forwarded {bytes} bytes"),
            RelayOutcome::Failed(err) if err.kind() == io::ErrorKind::BrokenPipe => {
                log::debug!("child closed stdin before consuming all input");
            }
            RelayOutcome::Failed(err) => log::warn!("stdin relay failed: {err}"),
            RelayOutcome::Pending => log::debug!("stdin relay still waiting on input"),
        }
    }
}
