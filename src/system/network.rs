//! Network transfer totals from `nettop`.
//!
//! Each per-process row ends with the `name.pid` suffix followed by the
//! cumulative bytes in and bytes out:
//!
//! ```text
//! mDNSResponder.312              84213        52310
//! ```

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use super::delta::Throughput;
use super::error::ParseError;

pub const NETWORK_STATS_COMMAND: &str = "nettop -x -k state -k interface -k rx_dupe -k rx_ooo \
     -k re-tx -k rtt_avg -k rcvsize -k tx_win -k tc_class -k tc_mgt -k cc_algo -k P -k C -k R \
     -k W -l 1 -t wifi -t wired";

/// Decimal megabytes, matching what `nettop` consumers expect for MB/s.
pub const BYTES_PER_MEGABYTE: f64 = 1_000_000.0;

static ROW_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)\.\d+[ \t]+(\d+)[ \t]+(\d+)[ \t]*$").expect("row pattern is valid")
});

/// Summed cumulative byte counters across all matching rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransferTotals {
    pub download_bytes: u64,
    pub upload_bytes: u64,
    pub rows: usize,
}

pub fn parse_transfer_totals(text: &str) -> Result<TransferTotals, ParseError> {
    let mut totals = TransferTotals::default();

    for caps in ROW_TAIL.captures_iter(text) {
        totals.download_bytes = accumulate(totals.download_bytes, &caps[1], "bytes_in")?;
        totals.upload_bytes = accumulate(totals.upload_bytes, &caps[2], "bytes_out")?;
        totals.rows += 1;
    }

    if totals.rows == 0 {
        return Err(ParseError::NoConnections);
    }
    Ok(totals)
}

fn accumulate(total: u64, token: &str, field: &'static str) -> Result<u64, ParseError> {
    let value: u64 = token
        .parse()
        .map_err(|_| ParseError::InvalidNumber(token.to_string()))?;
    total
        .checked_add(value)
        .ok_or(ParseError::Overflow { field })
}

/// Scales cumulative bytes to MB per second of the sampling interval.
pub fn normalize(totals: &TransferTotals, interval: Duration) -> Throughput {
    let divisor = BYTES_PER_MEGABYTE * interval.as_secs_f64();
    if divisor <= 0.0 {
        return Throughput::default();
    }
    Throughput {
        upload: totals.upload_bytes as f64 / divisor,
        download: totals.download_bytes as f64 / divisor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NETTOP: &str = "\
                                              bytes_in       bytes_out
launchd.1                                          0               0
mDNSResponder.312                            1500000          500000
Safari.8841                                  3000000         1000000
";

    #[test]
    fn sums_rows_as_download_then_upload() {
        let totals = parse_transfer_totals(NETTOP).unwrap();
        assert_eq!(totals.download_bytes, 4_500_000);
        assert_eq!(totals.upload_bytes, 1_500_000);
        assert_eq!(totals.rows, 3);
    }

    #[test]
    fn header_and_unrelated_lines_are_skipped() {
        let text = format!("garbage line\n{NETTOP}tcp4 10.0.0.2:443<->1.2.3.4:5000 en0 Established\n");
        let totals = parse_transfer_totals(&text).unwrap();
        assert_eq!(totals.rows, 3);
    }

    #[test]
    fn last_row_without_newline_is_counted() {
        let totals = parse_transfer_totals("kernel_task.0   42   7").unwrap();
        assert_eq!(totals.download_bytes, 42);
        assert_eq!(totals.upload_bytes, 7);
    }

    #[test]
    fn no_rows_is_parse_error() {
        assert_eq!(
            parse_transfer_totals("bytes_in bytes_out\n"),
            Err(ParseError::NoConnections)
        );
    }

    #[test]
    fn counter_sum_overflow_is_parse_error() {
        let text = format!("a.1 {} 0\nb.2 1 0\n", u64::MAX);
        assert_eq!(
            parse_transfer_totals(&text),
            Err(ParseError::Overflow { field: "bytes_in" })
        );
    }

    #[test]
    fn counter_wider_than_u64_is_parse_error() {
        assert!(matches!(
            parse_transfer_totals("a.1 0 99999999999999999999999\n"),
            Err(ParseError::InvalidNumber(_))
        ));
    }

    #[test]
    fn normalizes_by_interval_seconds() {
        let totals = TransferTotals {
            download_bytes: 4_000_000,
            upload_bytes: 1_000_000,
            rows: 2,
        };
        let rate = normalize(&totals, Duration::from_millis(2000));
        assert_eq!(rate.download, 2.0);
        assert_eq!(rate.upload, 0.5);
    }

    #[test]
    fn zero_interval_normalizes_to_zero() {
        let totals = TransferTotals {
            download_bytes: 10,
            upload_bytes: 10,
            rows: 1,
        };
        assert_eq!(normalize(&totals, Duration::ZERO), Throughput::default());
    }
}
