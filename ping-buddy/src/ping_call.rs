use clap::Args;

pub use caller::{Caller, ProbeOutcome, FAILURE_MARKER};

mod caller;

#[derive(Args, Debug, Clone)]
#[group(id = "ping")]
pub struct Params {
    /// FQ path to the ping binary
    #[arg(long, default_value = "/usr/bin/ping", env = "PING_PATH")]
    ping_path: String,

    /// How many echo requests to send per probe
    #[arg(long, default_value = "4", env = "PING_COUNT")]
    count: u32,

    /// How long to wait for each reply, in seconds
    #[arg(long, default_value = "1", env = "PING_TIMEOUT_SECS")]
    timeout_secs: u32,
}

impl Params {
    pub fn to_caller(&self, host: &str) -> Caller {
        Caller::new(&self.ping_path, host, self.count, self.timeout_secs)
    }
}
