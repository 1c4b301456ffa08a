use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, error, info};

use crate::ping_call::{self, ProbeOutcome};
use crate::report::Reporter;
use crate::schedule::Round;

/// Probes every host concurrently and collects exactly one outcome per host.
///
/// Completion waits for the slowest probe; there is no round-level timeout
/// beyond the per-probe bound baked into each call. Each probe future owns
/// its result, the map is only assembled after the join.
pub async fn run_round<P, Fut>(hosts: &[String], probe: P) -> HashMap<String, ProbeOutcome>
where
    P: Fn(String) -> Fut,
    Fut: Future<Output = ProbeOutcome>,
{
    let probes = hosts.iter().cloned().map(probe);
    join_all(probes)
        .await
        .into_iter()
        .map(|outcome| (outcome.host.clone(), outcome))
        .collect()
}

/// Production probe: one blocking ping child per host, off the async runtime.
pub async fn probe_host(params: ping_call::Params, host: String) -> ProbeOutcome {
    let caller = params.to_caller(&host);
    match tokio::task::spawn_blocking(move || caller.consume_run()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            // A panicked probe task still yields an outcome for its host.
            error!("Probe task for {} did not finish: {}", host, e);
            ProbeOutcome::failed(host, Duration::ZERO)
        }
    }
}

/// One full probe-and-report pass over the configured host set.
pub struct Pipeline {
    ping: ping_call::Params,
    reporter: Reporter,
    hosts: Vec<String>,
}

impl Pipeline {
    pub fn new(ping: ping_call::Params, reporter: Reporter, hosts: Vec<String>) -> Self {
        Pipeline {
            ping,
            reporter,
            hosts,
        }
    }
}

#[async_trait]
impl Round for Pipeline {
    async fn execute(&mut self) -> Result<()> {
        let start = Instant::now();
        let ping = self.ping.clone();
        let outcomes = run_round(&self.hosts, |host| probe_host(ping.clone(), host)).await;

        for (host, outcome) in &outcomes {
            info!(
                "Pinged {}: {} ({:.3}s)",
                host,
                if outcome.succeeded { "success" } else { "failed" },
                outcome.elapsed.as_secs_f64(),
            );
            // One send attempt per outcome; a failed report never stalls the
            // round or the other hosts.
            match self.reporter.report(outcome).await {
                Ok(delivery) => debug!("Report for {} delivered: {}", host, delivery.body),
                Err(failure) => error!("Report for {} failed: {}", host, failure),
            }
        }

        info!(
            "Round over {} hosts finished in {}ms.",
            outcomes.len(),
            start.elapsed().as_millis()
        );
        Ok(())
    }
}
