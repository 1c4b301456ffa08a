use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use clap::Args;
use log::{error, info};
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Args, Debug)]
#[group(id = "schedule")]
pub struct Params {
    /// Seconds between the start of consecutive probe rounds
    #[arg(long, default_value = "300", env = "ROUND_INTERVAL_SECS")]
    pub round_interval_secs: u64,

    /// Hosts to probe each round (IPv4/IPv6 addresses or hostnames)
    #[arg(required = true, env = "PING_HOSTS", value_delimiter = ',')]
    pub hosts: Vec<String>,
}

/// One complete pass of probing every configured host and reporting each
/// result. The seam between cadence and round work.
#[async_trait]
pub trait Round {
    async fn execute(&mut self) -> Result<()>;
}

/// Drives rounds until the stop token fires: round 0 immediately, each
/// following round no earlier than one interval after the previous round's
/// start. Rounds never overlap since tick work is awaited inline.
pub async fn run(
    round: impl Round + Send + 'static,
    every: Duration,
    stop_rx: CancellationToken,
) -> Result<()> {
    Timer { round }.run(every, stop_rx).await
}

struct Timer<R> {
    round: R,
}

impl<R: Round + Send> Timer<R> {
    async fn run(mut self, every: Duration, stop_rx: CancellationToken) -> Result<()> {
        info!(
            "Probe timer is ready; round 0 starts now, then every {}s.",
            every.as_secs()
        );
        let mut trigger = interval(every);
        // A round that overruns the interval delays the cadence instead of
        // causing a burst of catch-up rounds.
        trigger.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased; // Stop should take prio
                _ = stop_rx.cancelled() => {
                    info!("Probe timer stopping.");
                    return Ok(());
                }
                _ = trigger.tick() => self.tick().await?,
            }
        }
    }

    async fn tick(&mut self) -> Result<()> {
        match self.round.execute().await {
            Err(e) => {
                error!("Probe round failed: {:?}", e);
                Ok(())
            }
            ok => ok,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use anyhow::anyhow;
    use assertor::{assert_that, EqualityAssertion};
    use tokio::time::Instant;

    use super::*;

    struct RecordingRound {
        starts: Arc<Mutex<Vec<Instant>>>,
    }

    #[async_trait]
    impl Round for RecordingRound {
        async fn execute(&mut self) -> Result<()> {
            self.starts.lock().unwrap().push(Instant::now());
            Ok(())
        }
    }

    struct FailingRound {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Round for FailingRound {
        async fn execute(&mut self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(anyhow!("collector is on fire"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn round_zero_fires_immediately_then_on_interval() {
        // given
        let starts = Arc::new(Mutex::new(Vec::new()));
        let stop = CancellationToken::new();
        let begin = Instant::now();
        let handle = tokio::spawn(run(
            RecordingRound {
                starts: starts.clone(),
            },
            Duration::from_secs(300),
            stop.clone(),
        ));

        // when
        tokio::time::sleep(Duration::from_secs(650)).await;
        stop.cancel();
        handle.await.unwrap().unwrap();

        // then - rounds at t+0, t+300, t+600
        let starts = starts.lock().unwrap();
        assert_that!(starts.len()).is_equal_to(3);
        assert_that!(starts[0] - begin).is_equal_to(Duration::from_secs(0));
        assert_that!(starts[1] - begin).is_equal_to(Duration::from_secs(300));
        assert_that!(starts[2] - begin).is_equal_to(Duration::from_secs(600));
    }

    #[tokio::test(start_paused = true)]
    async fn failing_rounds_keep_the_timer_alive() {
        // given
        let calls = Arc::new(AtomicUsize::new(0));
        let stop = CancellationToken::new();
        let handle = tokio::spawn(run(
            FailingRound {
                calls: calls.clone(),
            },
            Duration::from_secs(300),
            stop.clone(),
        ));

        // when
        tokio::time::sleep(Duration::from_secs(350)).await;
        stop.cancel();

        // then - timer survived the first failure and ran the second round
        handle.await.unwrap().expect("timer must not propagate round errors");
        assert_that!(calls.load(Ordering::SeqCst)).is_equal_to(2);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_before_first_tick_stops_cleanly() {
        // given
        let starts = Arc::new(Mutex::new(Vec::new()));
        let stop = CancellationToken::new();
        stop.cancel();

        // when
        run(
            RecordingRound {
                starts: starts.clone(),
            },
            Duration::from_secs(300),
            stop,
        )
        .await
        .unwrap();

        // then - biased select sees the stop before dispatching round 0
        assert_that!(starts.lock().unwrap().len()).is_equal_to(0);
    }
}
