use chrono::{DateTime, Local};
use serde::Serialize;

use crate::packet_loss;
use crate::ping_call::ProbeOutcome;

/// Wire payload the collector expects, built exactly once per probe outcome.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ReportPayload {
    pub asset_id: i64,
    pub ping_status: PingStatus,
    /// Measured probe duration with three decimals; null when the probe failed.
    pub ping_time: Option<String>,
    pub ping_date: String,
    pub ping_time_offset: String,
    pub ping_packet_loss: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PingStatus {
    Up,
    Down,
}

impl ReportPayload {
    pub fn for_outcome(asset_id: i64, outcome: &ProbeOutcome, now: DateTime<Local>) -> Self {
        let ping_time = outcome
            .succeeded
            .then(|| format!("{:.3}", outcome.elapsed.as_secs_f64()));
        ReportPayload {
            asset_id,
            ping_status: if outcome.succeeded {
                PingStatus::Up
            } else {
                PingStatus::Down
            },
            ping_time,
            ping_date: now.format("%Y-%m-%d").to_string(),
            ping_time_offset: now.format("%H:%M:%S").to_string(),
            ping_packet_loss: packet_loss::extract(outcome),
        }
    }
}
