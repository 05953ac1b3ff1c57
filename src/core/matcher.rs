// csv2timeline - core/matcher.rs
//
// Picks the configuration that best fits a CSV header row.
// Core layer: pure logic, no I/O.

use crate::core::model::TimelineConfig;
use std::collections::HashSet;

/// Result of matching a header row against the configurations.
#[derive(Debug, Clone, Copy)]
pub struct MatchResult<'a> {
    pub config: &'a TimelineConfig,

    /// Distinct CSV header names found in the configuration's header list.
    pub score: usize,

    /// True if the CSV's header set equals the configuration's header set.
    pub exact: bool,
}

/// Number of distinct names in `csv_headers` that the configuration declares.
/// Order-independent; a repeated CSV header counts once.
pub fn score(csv_headers: &[&str], config: &TimelineConfig) -> usize {
    let distinct: HashSet<&str> = csv_headers.iter().copied().collect();
    distinct
        .iter()
        .filter(|h| config.headers.iter().any(|c| c == *h))
        .count()
}

fn is_exact(csv_headers: &[&str], config: &TimelineConfig) -> bool {
    let csv: HashSet<&str> = csv_headers.iter().copied().collect();
    let declared: HashSet<&str> = config.headers.iter().map(String::as_str).collect();
    csv == declared
}

/// Select the best configuration for a CSV header row.
///
/// The highest score wins. On a tie an exact header-set match beats an
/// inexact one, otherwise the earlier configuration is kept. Returns `None`
/// when every configuration scores zero.
pub fn best_match<'a>(
    csv_headers: &[&str],
    configs: &'a [TimelineConfig],
) -> Option<MatchResult<'a>> {
    let mut best: Option<MatchResult<'a>> = None;

    for config in configs {
        let score = score(csv_headers, config);
        if score == 0 {
            continue;
        }
        let exact = is_exact(csv_headers, config);

        let better = match &best {
            None => true,
            Some(b) => score > b.score || (score == b.score && exact && !b.exact),
        };
        if better {
            best = Some(MatchResult {
                config,
                score,
                exact,
            });
        }
    }

    tracing::debug!(
        headers = csv_headers.len(),
        config = best.map(|b| b.config.name.as_str()),
        score = best.map_or(0, |b| b.score),
        "Configuration matching complete"
    );

    best
}
