use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use futures::executor;
use log::info;
use pingherd::helpers::{self, bootstrap, logging, signal_handler};

mod packet_loss;
mod ping_call;
mod report;
mod round;
mod schedule;

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[clap(flatten)]
    logging: logging::Params,

    #[clap(flatten)]
    ping: ping_call::Params,

    #[clap(flatten)]
    report: report::Params,

    #[clap(flatten)]
    schedule: schedule::Params,
}

fn main() -> Result<()> {
    bootstrap::run(Cli::parse, |cli: &Cli| &cli.logging, do_run)
}

fn do_run(cli: Cli) -> Result<()> {
    let schedule::Params {
        round_interval_secs,
        hosts,
    } = cli.schedule;

    // Collector configuration is validated before the first round; a missing
    // URL refuses startup instead of silently probing into the void.
    let reporter = report::Reporter::new(cli.report)?;

    info!(
        "Probing {} host(s), one round every {}s.",
        hosts.len(),
        round_interval_secs
    );
    let pipeline = round::Pipeline::new(cli.ping, reporter, hosts);

    let sig_handler = signal_handler::new();
    let stop_rx = sig_handler.subscribe_stop();
    tokio::spawn(sig_handler.wait_for_signal());

    let timer_handle = tokio::spawn(schedule::run(
        pipeline,
        Duration::from_secs(round_interval_secs),
        stop_rx,
    ));

    executor::block_on(helpers::flatten(timer_handle))
}
