//! Budget ceiling and risk banding.
//!
//! The ceiling is the only money the allocator is allowed to spend;
//! the band is a hard gate in front of commit. RED has no override
//! path — the operator fixes the catalog or the policy and
//! re-previews.

use serde::{Deserialize, Serialize};

/// Spend/budget ratio above which the band turns AMBER.
pub const AMBER_THRESHOLD: f64 = 0.90;
/// Spend/budget ratio above which the band turns RED.
pub const RED_THRESHOLD: f64 = 0.95;

/// Allocatable spend ceiling. Never negative: a kit that costs more
/// than the entry fee clamps to zero rather than going into debt.
pub fn allocatable_budget(
    entry_fee: f64,
    kit_cost_per_player: f64,
    player_count: usize,
    risk_percentage: f64,
) -> f64 {
    let budget = (entry_fee - kit_cost_per_player) * player_count as f64 * risk_percentage;
    budget.max(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskBand {
    Green,
    Amber,
    Red,
}

impl RiskBand {
    /// Classify a proposed spend against the ceiling.
    ///
    /// A zero budget with zero spend is GREEN (nothing to spend,
    /// nothing spent); a zero budget with any spend is RED.
    pub fn classify(spend: f64, budget: f64) -> Self {
        if budget <= 0.0 {
            return if spend > 0.0 { Self::Red } else { Self::Green };
        }
        let ratio = spend / budget;
        if ratio <= AMBER_THRESHOLD {
            Self::Green
        } else if ratio <= RED_THRESHOLD {
            Self::Amber
        } else {
            Self::Red
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Green => "GREEN",
            Self::Amber => "AMBER",
            Self::Red => "RED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_formula() {
        // 8 players, $15 entry, no kit cost, 95% risk → $114.00
        let budget = allocatable_budget(15.0, 0.0, 8, 0.95);
        assert!((budget - 114.0).abs() < 1e-9);
    }

    #[test]
    fn budget_clamps_at_zero() {
        assert_eq!(allocatable_budget(10.0, 25.0, 8, 0.9), 0.0);
    }

    #[test]
    fn zero_players_means_zero_budget() {
        assert_eq!(allocatable_budget(15.0, 0.0, 0, 0.95), 0.0);
        assert_eq!(RiskBand::classify(0.0, 0.0), RiskBand::Green);
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(RiskBand::classify(90.0, 100.0), RiskBand::Green);
        assert_eq!(RiskBand::classify(90.01, 100.0), RiskBand::Amber);
        assert_eq!(RiskBand::classify(95.0, 100.0), RiskBand::Amber);
        assert_eq!(RiskBand::classify(95.01, 100.0), RiskBand::Red);
    }

    #[test]
    fn spend_against_zero_budget_is_red() {
        assert_eq!(RiskBand::classify(0.01, 0.0), RiskBand::Red);
    }
}
