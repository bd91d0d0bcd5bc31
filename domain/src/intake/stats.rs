//! Turn stats tracker
//!
//! Counts the turns spent overall and per domain against soft targets.
//! Counters only grow and the per-domain `completed` flag is a latch.

use super::category::IntakeDomain;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default per-domain turn budget used to derive the overall target.
pub const DEFAULT_TURN_TARGET: u32 = 5;
/// Hard cap on the overall turn target.
pub const MAX_TOTAL_TURN_TARGET: u32 = 30;
/// Soft target for a single domain.
pub const DEFAULT_DOMAIN_TARGET: u32 = 6;
/// Accepted overshoot on a single domain.
pub const DEFAULT_DOMAIN_TOLERANCE: u32 = 2;

/// Overall target derived from the domain count: 70% of the per-domain
/// budget across every domain, capped at [`MAX_TOTAL_TURN_TARGET`].
pub fn default_total_target() -> u32 {
    let scaled = (IntakeDomain::ALL.len() as u32 * DEFAULT_TURN_TARGET) as f64 * 0.7;
    MAX_TOTAL_TURN_TARGET.min(scaled as u32)
}

/// Progress of a single domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainTurnStat {
    turns: u32,
    target: u32,
    tolerance: u32,
    completed: bool,
}

impl Default for DomainTurnStat {
    fn default() -> Self {
        Self {
            turns: 0,
            target: DEFAULT_DOMAIN_TARGET,
            tolerance: DEFAULT_DOMAIN_TOLERANCE,
            completed: false,
        }
    }
}

impl DomainTurnStat {
    pub fn turns(&self) -> u32 {
        self.turns
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn tolerance(&self) -> u32 {
        self.tolerance
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn remaining(&self) -> u32 {
        self.target.saturating_sub(self.turns)
    }

    /// Whether turns have gone past target + tolerance.
    pub fn is_over_budget(&self) -> bool {
        self.turns > self.target + self.tolerance
    }

    fn summary_row(&self) -> String {
        let tag = if self.completed {
            " [marked as completed]"
        } else {
            ""
        };
        format!(
            "{} / {} (+/- {}){}",
            self.turns, self.target, self.tolerance, tag
        )
    }
}

/// Session-wide turn counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnStats {
    total_turns: u32,
    total_target: u32,
    domain_stats: BTreeMap<IntakeDomain, DomainTurnStat>,
}

impl Default for TurnStats {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnStats {
    /// Zeroed stats with one entry per known domain.
    pub fn new() -> Self {
        Self {
            total_turns: 0,
            total_target: default_total_target(),
            domain_stats: IntakeDomain::ALL
                .iter()
                .map(|d| (*d, DomainTurnStat::default()))
                .collect(),
        }
    }

    pub fn total_turns(&self) -> u32 {
        self.total_turns
    }

    pub fn total_target(&self) -> u32 {
        self.total_target
    }

    pub fn total_remaining(&self) -> u32 {
        self.total_target.saturating_sub(self.total_turns)
    }

    pub fn domain(&self, domain: IntakeDomain) -> Option<&DomainTurnStat> {
        self.domain_stats.get(&domain)
    }

    pub fn remaining(&self, domain: IntakeDomain) -> u32 {
        self.domain(domain).map(DomainTurnStat::remaining).unwrap_or(0)
    }

    pub fn completed_domains(&self) -> impl Iterator<Item = IntakeDomain> + '_ {
        self.domain_stats
            .iter()
            .filter(|(_, s)| s.completed)
            .map(|(d, _)| *d)
    }

    /// Count one turn against `domain`.
    ///
    /// Fails without touching any counter if the domain has no entry, which
    /// only happens with a tampered persisted record.
    pub fn record_turn(&mut self, domain: IntakeDomain) -> Result<(), DomainError> {
        let stat = self
            .domain_stats
            .get_mut(&domain)
            .ok_or_else(|| DomainError::UnknownDomain(domain.to_string()))?;
        stat.turns += 1;
        self.total_turns += 1;
        Ok(())
    }

    /// Latch `domain` as complete. Repeating is a no-op.
    pub fn mark_completed(&mut self, domain: IntakeDomain) -> Result<(), DomainError> {
        let stat = self
            .domain_stats
            .get_mut(&domain)
            .ok_or_else(|| DomainError::UnknownDomain(domain.to_string()))?;
        stat.completed = true;
        Ok(())
    }

    /// Restore entries for domains missing from a persisted record.
    pub fn fill_missing_domains(&mut self) {
        for domain in IntakeDomain::ALL {
            self.domain_stats.entry(domain).or_default();
        }
    }

    /// Human readable multi-line progress report, e.g.
    ///
    /// ```text
    /// - Total turns spent: 7
    /// - Total turns left: 23
    /// - Turns count per domain
    ///   - sleep 3 / 6 (+/- 2)
    ///   - nutrition 2 / 6 (+/- 2) [marked as completed]
    /// ```
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("- Total turns spent: {}", self.total_turns),
            format!("- Total turns left: {}", self.total_remaining()),
            "- Turns count per domain".to_string(),
        ];
        for (domain, stat) in &self.domain_stats {
            lines.push(format!("  - {} {}", domain, stat.summary_row()));
        }
        lines.join("\n")
    }
}
