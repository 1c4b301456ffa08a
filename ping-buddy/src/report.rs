use std::time::Duration;

use anyhow::Context;
use chrono::Local;
use clap::Args;
use log::trace;

use crate::ping_call::ProbeOutcome;

pub use payload::{PingStatus, ReportPayload};

mod payload;

#[derive(Args, Debug, Clone)]
#[group(id = "report")]
pub struct Params {
    /// Collector endpoint receiving one POST per probe outcome.
    /// Required: without a collector, probing is pointless, so startup fails.
    #[arg(long, env = "COLLECTOR_URL")]
    collector_url: String,

    /// Asset identifier the collector files our reports under
    #[arg(long, env = "ASSET_ID")]
    asset_id: i64,

    /// How long to wait for the collector to accept a report, in seconds
    #[arg(long, default_value = "30", env = "REPORT_TIMEOUT_SECS")]
    send_timeout_secs: u64,
}

/// Tagged outcome of a single send attempt. Ephemeral, logged by the round.
pub type ReportResult = Result<Delivery, ReportFailure>;

/// Successful delivery (collector answered 200 or 201). The body is the
/// parsed JSON response when there was one, `null` otherwise.
#[derive(Debug)]
pub struct Delivery {
    pub body: serde_json::Value,
}

#[derive(Debug, thiserror::Error)]
pub enum ReportFailure {
    #[error("collector rejected our credentials (401)")]
    Auth,
    #[error("collector denied access to this asset (403)")]
    Forbidden,
    #[error("collector answered {status}: {body}")]
    Http { status: u16, body: String },
    #[error("collector did not answer within the send timeout")]
    Timeout,
    #[error("could not reach the collector")]
    Connection,
}

pub struct Reporter {
    client: reqwest::Client,
    params: Params,
}

impl Reporter {
    pub fn new(params: Params) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(params.send_timeout_secs))
            .build()
            .context("Failed to build collector HTTP client")?;
        Ok(Reporter { client, params })
    }

    /// Builds the wire payload (wall clock read now, not at probe time) and
    /// delivers it with exactly one send attempt. No retry at any layer.
    pub async fn report(&self, outcome: &ProbeOutcome) -> ReportResult {
        let payload = ReportPayload::for_outcome(self.params.asset_id, outcome, Local::now());
        trace!("Reporting {:?}", payload);
        self.send(&payload).await
    }

    async fn send(&self, payload: &ReportPayload) -> ReportResult {
        let response = self
            .client
            .post(&self.params.collector_url)
            .json(payload)
            .send()
            .await;
        match response {
            Ok(resp) => classify_response(resp).await,
            Err(e) if e.is_timeout() => Err(ReportFailure::Timeout),
            // Any other transport-level problem is a connectivity failure as
            // far as the round is concerned.
            Err(_) => Err(ReportFailure::Connection),
        }
    }
}

async fn classify_response(response: reqwest::Response) -> ReportResult {
    use reqwest::StatusCode;

    match response.status() {
        StatusCode::OK | StatusCode::CREATED => {
            // Non-JSON success bodies are tolerated; the report still counts.
            let body = response
                .json()
                .await
                .unwrap_or(serde_json::Value::Null);
            Ok(Delivery { body })
        }
        StatusCode::UNAUTHORIZED => Err(ReportFailure::Auth),
        StatusCode::FORBIDDEN => Err(ReportFailure::Forbidden),
        status => Err(ReportFailure::Http {
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        }),
    }
}
