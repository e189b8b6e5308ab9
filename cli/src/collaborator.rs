//! External decoders that turn an artifact file into text.
//!
//! The dispatcher only sees [`Collaborator`]: a path goes in, combined output
//! and an exit status come out. [`ShellCommand`] runs a command template
//! through `sh -c`, which is how OpenSSL is wired in by default.

use std::io::{self, Read};
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use tracing::{debug, warn};

use crate::utils::shell_quote;

/// Replaced by the artifact path in command templates.
pub(crate) const PLACEHOLDER: &str = "{}";

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Result of one decoder run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Invocation {
    /// stdout and stderr, interleaved as the decoder wrote them
    pub(crate) output: String,
    /// `None` when the decoder was killed by a signal
    pub(crate) status: Option<i32>,
}

impl Invocation {
    pub(crate) fn success(&self) -> bool {
        self.status == Some(0)
    }
}

pub(crate) trait Collaborator {
    /// Decode the artifact at `artifact` into text.
    ///
    /// # Errors
    ///
    /// Returns an error when the decoder cannot be started or does not finish
    /// in time. A decoder that runs and exits nonzero is not an error.
    fn invoke(&self, artifact: &Path) -> io::Result<Invocation>;
}

#[derive(Debug, Clone)]
pub(crate) struct ShellCommand {
    template: String,
    timeout: Option<Duration>,
}

impl ShellCommand {
    pub(crate) fn new(template: impl Into<String>) -> Self {
        ShellCommand {
            template: template.into(),
            timeout: None,
        }
    }

    pub(crate) fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The template with `{}` replaced by `path`, as is.
    pub(crate) fn render(&self, path: &str) -> String {
        self.template.replace(PLACEHOLDER, path)
    }

    fn command_line(&self, artifact: &Path) -> String {
        let command = self.render(&shell_quote(&artifact.to_string_lossy()));
        // merge stderr into the captured stdout for every command in the line
        format!("exec 2>&1; {}", command)
    }
}

impl Collaborator for ShellCommand {
    fn invoke(&self, artifact: &Path) -> io::Result<Invocation> {
        let command_line = self.command_line(artifact);
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&command_line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            // own group, so a timeout reaches everything the line started
            .process_group(0)
            .spawn()?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("decoder output is not captured"))?;
        // drain the pipe while waiting so a chatty decoder cannot block on it
        let reader = thread::spawn(move || {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).map(|_| buf)
        });

        let status = match self.timeout {
            None => child.wait()?,
            Some(limit) => match wait_with_timeout(&mut child, limit)? {
                Some(status) => status,
                None => {
                    kill_process_group(&child)?;
                    child.wait()?;
                    let _ = reader.join();
                    warn!(command = %command_line, "decoder timed out");
                    return Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("decoder did not finish within {}s", limit.as_secs_f32()),
                    ));
                }
            },
        };

        let output = reader
            .join()
            .map_err(|_| io::Error::other("decoder output reader panicked"))??;
        let invocation = Invocation {
            output: String::from_utf8_lossy(&output).into_owned(),
            status: status.code(),
        };

        if invocation.success() {
            debug!(command = %command_line, "decoder succeeded");
            if !invocation.output.is_empty() {
                debug!("decoder output (stdout, stderr) =\n{}", invocation.output);
            }
        } else {
            warn!(command = %command_line, status = ?invocation.status, "decoder failed");
            if !invocation.output.is_empty() {
                warn!("decoder output (stdout, stderr) =\n{}", invocation.output);
            }
        }

        Ok(invocation)
    }
}

fn kill_process_group(child: &Child) -> io::Result<()> {
    let pgid = Pid::from_raw(child.id() as i32);
    match killpg(pgid, Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn wait_with_timeout(child: &mut Child, limit: Duration) -> io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= limit {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
