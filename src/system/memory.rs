//! Memory usage from `vm_stat` and `sysctl -n hw.memsize`.
//!
//! `vm_stat` is read by line position, not by label:
//!
//! ```text
//! 0  Mach Virtual Memory Statistics: (page size of 4096 bytes)
//! 1  Pages free:                               12345.
//! 3  Pages inactive:                           ...
//! 6  Pages wired down:                         ...
//! 7  Pages purgeable:                          ...
//! 14 Anonymous pages:                          ...
//! 16 Pages occupied by compressor:             ...
//! ```

use std::sync::LazyLock;

use regex::Regex;

use super::error::ParseError;
use super::snapshot::MemoryStats;

pub const MEMORY_STATS_COMMAND: &str = "vm_stat";
pub const MEMORY_SIZE_COMMAND: &str = "sysctl -n hw.memsize";

pub const BYTES_PER_MB: f64 = 1_048_576.0;
pub const PAGE_SIZE_BYTES: u64 = 4096;

const FREE_LINE: usize = 1;
const INACTIVE_LINE: usize = 3;
const WIRED_LINE: usize = 6;
const PURGEABLE_LINE: usize = 7;
const ANONYMOUS_LINE: usize = 14;
const COMPRESSED_LINE: usize = 16;

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("integer pattern is valid"));

/// Raw page counts pulled out of `vm_stat`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PageCounts {
    pub free: u64,
    pub inactive: u64,
    pub wired: u64,
    pub purgeable: u64,
    pub anonymous: u64,
    pub compressed: u64,
}

pub fn parse_page_counts(text: &str) -> Result<PageCounts, ParseError> {
    let lines: Vec<&str> = text.lines().collect();
    let page_count = |line: usize, field: &'static str| -> Result<u64, ParseError> {
        let content = lines
            .get(line)
            .ok_or(ParseError::MissingLine { line, field })?;
        let token = INTEGER
            .find(content)
            .ok_or(ParseError::MissingNumber { line, field })?
            .as_str();
        let pages: u64 = token
            .parse()
            .map_err(|_| ParseError::InvalidNumber(token.to_string()))?;
        // Reject counts whose byte size cannot be represented.
        pages
            .checked_mul(PAGE_SIZE_BYTES)
            .map(|_| pages)
            .ok_or(ParseError::Overflow { field })
    };

    Ok(PageCounts {
        free: page_count(FREE_LINE, "free")?,
        inactive: page_count(INACTIVE_LINE, "inactive")?,
        wired: page_count(WIRED_LINE, "wired")?,
        purgeable: page_count(PURGEABLE_LINE, "purgeable")?,
        anonymous: page_count(ANONYMOUS_LINE, "anonymous")?,
        compressed: page_count(COMPRESSED_LINE, "compressed")?,
    })
}

/// Parses the `hw.memsize` byte count into whole megabytes.
pub fn parse_total_mb(text: &str) -> Result<u64, ParseError> {
    let trimmed = text.trim();
    let bytes: u64 = trimmed
        .parse()
        .map_err(|_| ParseError::InvalidNumber(trimmed.to_string()))?;
    let total_mb = bytes / BYTES_PER_MB as u64;
    if total_mb == 0 {
        return Err(ParseError::ZeroTotal);
    }
    Ok(total_mb)
}

fn pages_to_mb(pages: u64) -> f64 {
    pages as f64 * PAGE_SIZE_BYTES as f64 / BYTES_PER_MB
}

/// Integer percentage of `used` over `total`, truncated and capped at 100.
pub fn used_percentage(used_mb: f64, total_mb: u64) -> u32 {
    let ratio = used_mb / total_mb as f64 * 100.0;
    (ratio.trunc().max(0.0) as u32).min(100)
}

pub fn memory_stats(pages: &PageCounts, total_mb: u64) -> MemoryStats {
    let app = pages_to_mb(pages.anonymous) + pages_to_mb(pages.purgeable);
    let used_mb = app + pages_to_mb(pages.wired) + pages_to_mb(pages.compressed);
    let free_mb = pages_to_mb(pages.free) + pages_to_mb(pages.inactive);

    MemoryStats {
        used_percentage: used_percentage(used_mb, total_mb),
        used_mb,
        free_mb,
    }
}

pub fn parse_memory(vm_stat: &str, memsize: &str) -> Result<MemoryStats, ParseError> {
    let total_mb = parse_total_mb(memsize)?;
    let pages = parse_page_counts(vm_stat)?;
    Ok(memory_stats(&pages, total_mb))
}
