//! Packet-loss extraction from raw ping output.
//!
//! Deliberately not a general parser: the first line containing the loss
//! marker is split on `%`, and the first preceding token that is digits with
//! at most one dot wins. Anything else falls back to the `0%` default.

use crate::ping_call::ProbeOutcome;

const LOSS_MARKER: &str = "packet loss";
const DEFAULT_LOSS: &str = "0%";

/// Packet loss for an outcome, formatted as `"<number>%"`.
///
/// Failed probes and unrecognizable output yield the default, not an error.
pub fn extract(outcome: &ProbeOutcome) -> String {
    if !outcome.succeeded {
        return DEFAULT_LOSS.to_string();
    }
    extract_from_text(&outcome.raw_output)
}

fn extract_from_text(raw: &str) -> String {
    raw.lines()
        .find(|line| line.to_lowercase().contains(LOSS_MARKER))
        .and_then(first_percent_token)
        .map(|token| format!("{}%", token))
        .unwrap_or_else(|| DEFAULT_LOSS.to_string())
}

/// First whitespace-delimited token immediately preceding a `%` that is
/// numeric. Each segment produced by splitting on `%` ends right before one.
fn first_percent_token(line: &str) -> Option<&str> {
    let mut segments: Vec<&str> = line.split('%').collect();
    segments.pop(); // text after the last `%` precedes none

    segments
        .into_iter()
        .filter_map(|segment| segment.split_whitespace().last())
        .find(|token| is_numeric(token))
}

fn is_numeric(token: &str) -> bool {
    let mut dots = 0;
    let mut digits = 0;
    for c in token.chars() {
        match c {
            '.' => dots += 1,
            d if d.is_ascii_digit() => digits += 1,
            _ => return false,
        }
    }
    dots <= 1 && digits > 0
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assertor::{assert_that, EqualityAssertion};

    use super::*;

    const LINUX_SUMMARY: &str = "\
--- 10.0.0.1 ping statistics ---
4 packets transmitted, 4 received, 12.5% packet loss, time 300ms
rtt min/avg/max/mdev = 0.045/0.058/0.079/0.013 ms";

    fn succeeded(raw_output: &str) -> ProbeOutcome {
        ProbeOutcome {
            host: "10.0.0.1".to_string(),
            succeeded: true,
            raw_output: raw_output.to_string(),
            elapsed: Duration::from_millis(300),
        }
    }

    #[test]
    fn extracts_fractional_loss_from_summary_line() {
        assert_that!(extract(&succeeded(LINUX_SUMMARY))).is_equal_to("12.5%".to_string());
    }

    #[test]
    fn extracts_zero_loss() {
        let raw = "4 packets transmitted, 4 received, 0% packet loss, time 3ms";
        assert_that!(extract(&succeeded(raw))).is_equal_to("0%".to_string());
    }

    #[test]
    fn marker_is_case_insensitive() {
        let raw = "4 packets transmitted, 4 received, 25% Packet Loss";
        assert_that!(extract(&succeeded(raw))).is_equal_to("25%".to_string());
    }

    #[test]
    fn failed_probe_defaults_regardless_of_output() {
        // given
        let mut outcome = succeeded(LINUX_SUMMARY);
        outcome.succeeded = false;

        // when, then
        assert_that!(extract(&outcome)).is_equal_to("0%".to_string());
    }

    #[test]
    fn missing_marker_defaults() {
        assert_that!(extract(&succeeded("64 bytes from 10.0.0.1: icmp_seq=1")))
            .is_equal_to("0%".to_string());
    }

    #[test]
    fn non_numeric_token_defaults() {
        assert_that!(extract(&succeeded("some% packet loss"))).is_equal_to("0%".to_string());
    }

    #[test]
    fn token_with_two_dots_is_not_numeric() {
        assert_that!(extract(&succeeded("1.2.3% packet loss"))).is_equal_to("0%".to_string());
    }

    #[test]
    fn first_valid_token_wins() {
        let raw = "n/a% sent, 7% packet loss";
        assert_that!(extract(&succeeded(raw))).is_equal_to("7%".to_string());
    }

    #[test]
    fn only_first_marker_line_is_considered() {
        let raw = "garbage packet loss line\n4 received, 50% packet loss";
        // First marker line has no numeric token, so the default applies even
        // though a later line would parse.
        assert_that!(extract(&succeeded(raw))).is_equal_to("0%".to_string());
    }

    #[test]
    fn extraction_is_idempotent() {
        // given
        let outcome = succeeded(LINUX_SUMMARY);

        // when
        let first = extract(&outcome);
        let second = extract(&outcome);

        // then
        assert_that!(first).is_equal_to(second);
    }
}
