//! Numeric-range list selectors.
//!
//! Operator list commands accept selectors like `1,3-5,9`, resolved
//! against current slot positions (1-based). Slot stability only holds
//! within a single command invocation.

use crate::error::{ServiceError, ServiceResult};

/// Parse a selector into a sorted, deduplicated list of 1-based indices.
pub fn parse_ranges(selector: &str, len: usize) -> ServiceResult<Vec<usize>> {
    let mut out = Vec::new();
    for part in selector.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (lo, hi) = match part.split_once('-') {
            Some((a, b)) => (parse_index(a)?, parse_index(b)?),
            None => {
                let n = parse_index(part)?;
                (n, n)
            }
        };
        if lo > hi {
            return Err(ServiceError::InvalidArgument(format!(
                "bad range {}-{}",
                lo, hi
            )));
        }
        for n in lo..=hi {
            if n >= 1 && n <= len {
                out.push(n);
            }
        }
    }
    out.sort_unstable();
    out.dedup();
    if out.is_empty() {
        return Err(ServiceError::InvalidArgument(
            "no matching entries".to_owned(),
        ));
    }
    Ok(out)
}

fn parse_index(s: &str) -> ServiceResult<usize> {
    s.trim()
        .parse::<usize>()
        .map_err(|_| ServiceError::InvalidArgument(format!("bad list index: {}", s)))
}
