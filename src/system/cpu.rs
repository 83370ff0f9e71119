//! CPU usage from the `CPU usage:` line of `top`.
//!
//! ```text
//! CPU usage: 12.3% user, 4.5% sys, 83.2% idle
//! ```

use std::sync::LazyLock;

use regex::Regex;

use super::error::ParseError;
use super::snapshot::CpuStats;

pub const CPU_USAGE_COMMAND: &str = r#"top -l 1 -stats "pid,command,cpu" -n 0 | grep CPU"#;

static PERCENTAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.\d+)%").expect("percentage pattern is valid"));

/// Parses the user, system, and idle percentages, in that order.
///
/// Each value is truncated toward zero; `used` is the sum of the truncated
/// user and system values.
pub fn parse_cpu_usage(text: &str) -> Result<CpuStats, ParseError> {
    let values = PERCENTAGE
        .captures_iter(text)
        .take(3)
        .map(|caps| {
            let token = &caps[1];
            token
                .parse::<f64>()
                .map(|v| v.trunc() as u32)
                .map_err(|_| ParseError::InvalidNumber(token.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let &[user, system, idle] = values.as_slice() else {
        return Err(ParseError::PercentageCount {
            expected: 3,
            found: values.len(),
        });
    };

    Ok(CpuStats {
        used_percentage: user + system,
        user_percentage: user,
        system_percentage: system,
        idle_percentage: idle,
    })
}
