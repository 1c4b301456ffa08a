use std::borrow::Cow;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use log::Level::Debug;
use log::{debug, log_enabled, trace};

/// Recorded as raw output when the probe facility itself fails and there is
/// no useful text to keep.
pub const FAILURE_MARKER: &str = "ping failed";

// Windows spells the repeat/wait flags differently. Callers never see this.
#[cfg(windows)]
const COUNT_FLAG: &str = "-n";
#[cfg(windows)]
const TIMEOUT_FLAG: &str = "-w";
#[cfg(not(windows))]
const COUNT_FLAG: &str = "-c";
#[cfg(not(windows))]
const TIMEOUT_FLAG: &str = "-W";

/// Result of one probe against one host. Created exactly once per host per
/// round and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub host: String,
    pub succeeded: bool,
    pub raw_output: String,
    /// Wall clock from invocation start to child exit, covering spawn and
    /// all echo requests. Not the round-trip time ping itself reports.
    pub elapsed: Duration,
}

impl ProbeOutcome {
    pub fn failed(host: impl Into<String>, elapsed: Duration) -> Self {
        ProbeOutcome {
            host: host.into(),
            succeeded: false,
            raw_output: FAILURE_MARKER.to_string(),
            elapsed,
        }
    }
}

/// Base config for calling ping
#[derive(Debug)]
pub struct Caller {
    cmd: Command,
    host: String,
}

impl Caller {
    pub fn new(bin_path: &str, host: &str, count: u32, timeout_secs: u32) -> Self {
        let mut cmd = Command::new(bin_path);
        cmd.arg(COUNT_FLAG)
            .arg(count.to_string())
            .arg(TIMEOUT_FLAG)
            .arg(timeout_secs.to_string())
            .arg(host);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        Caller {
            cmd,
            host: host.to_string(),
        }
    }

    /// Runs the configured command, consuming this instance. Blocks until the
    /// child exits; drive through `spawn_blocking` from async contexts.
    ///
    /// A failed probe of any kind (non-zero exit, spawn error, garbled
    /// output) is data, not an error. Unreachable, unresolvable and facility
    /// errors all look the same here; distinguishing partial loss is left to
    /// the packet-loss extraction on the raw text.
    pub fn consume_run(mut self) -> ProbeOutcome {
        if log_enabled!(Debug) {
            let args: Vec<Cow<'_, str>> = self
                .cmd
                .get_args()
                .map(|os_str| os_str.to_string_lossy())
                .collect();
            debug!("Calling ping with arguments: {}", args.join(" "));
        }

        let start = Instant::now();
        let output = self.cmd.output();
        let elapsed = start.elapsed();

        match output {
            Ok(out) if out.status.success() => match String::from_utf8(out.stdout) {
                Ok(text) => {
                    log_excerpt(&self.host, &text);
                    ProbeOutcome {
                        host: self.host,
                        succeeded: true,
                        raw_output: text,
                        elapsed,
                    }
                }
                Err(_) => {
                    debug!("ping produced non-UTF-8 output for {}", self.host);
                    ProbeOutcome::failed(self.host, elapsed)
                }
            },
            Ok(out) => {
                debug!("ping exited with {} for {}", out.status, self.host);
                ProbeOutcome::failed(self.host, elapsed)
            }
            Err(e) => {
                debug!("Failed to spawn ping for {}: {}", self.host, e);
                ProbeOutcome::failed(self.host, elapsed)
            }
        }
    }
}

/// First and last summary lines of the ping output, for the curious.
fn log_excerpt(host: &str, text: &str) {
    let mut lines = text.lines().filter(|line| !line.is_empty());
    let first = lines.next();
    let last = lines.last();
    for line in first.into_iter().chain(last) {
        trace!("ping[{}]: {}", host, line);
    }
}
