//! Desk configuration: policy defaults and protocol knobs.
//!
//! The throttle_policy table holds per-store numeric overrides; this
//! struct is the baseline those overrides land on. Rank tiers and the
//! artifact TTL are operator configuration, not policy, so they live
//! only here.

use crate::allocator::{RankTiers, ThrottlePolicy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskConfig {
    #[serde(default = "defaults::risk_percentage")]
    pub risk_percentage: f64,
    #[serde(default = "defaults::ev_clamp_min")]
    pub ev_clamp_min: f64,
    #[serde(default = "defaults::ev_clamp_max")]
    pub ev_clamp_max: f64,
    #[serde(default = "defaults::consolation_ratio")]
    pub consolation_ratio: f64,
    #[serde(default = "defaults::entry_fee")]
    pub entry_fee: f64,
    #[serde(default)]
    pub kit_cost_per_player: f64,
    #[serde(default = "defaults::top_rank_max")]
    pub top_rank_max: u32,
    #[serde(default = "defaults::mid_rank_max")]
    pub mid_rank_max: u32,
    #[serde(default = "defaults::artifact_ttl_hours")]
    pub artifact_ttl_hours: i64,
}

mod defaults {
    pub fn risk_percentage() -> f64 {
        0.95
    }
    pub fn ev_clamp_min() -> f64 {
        0.5
    }
    pub fn ev_clamp_max() -> f64 {
        10.0
    }
    pub fn consolation_ratio() -> f64 {
        0.5
    }
    pub fn entry_fee() -> f64 {
        15.0
    }
    pub fn top_rank_max() -> u32 {
        4
    }
    pub fn mid_rank_max() -> u32 {
        8
    }
    pub fn artifact_ttl_hours() -> i64 {
        24
    }
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            risk_percentage: defaults::risk_percentage(),
            ev_clamp_min: defaults::ev_clamp_min(),
            ev_clamp_max: defaults::ev_clamp_max(),
            consolation_ratio: defaults::consolation_ratio(),
            entry_fee: defaults::entry_fee(),
            kit_cost_per_player: 0.0,
            top_rank_max: defaults::top_rank_max(),
            mid_rank_max: defaults::mid_rank_max(),
            artifact_ttl_hours: defaults::artifact_ttl_hours(),
        }
    }
}

impl DeskConfig {
    /// Load from a JSON file; absent keys take the built-in defaults.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read desk config {path}: {e}"))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse desk config {path}: {e}"))?;
        Ok(config)
    }

    /// Baseline throttle policy before store overrides are applied.
    pub fn base_policy(&self) -> ThrottlePolicy {
        ThrottlePolicy {
            risk_percentage: self.risk_percentage,
            ev_clamp_min: self.ev_clamp_min,
            ev_clamp_max: self.ev_clamp_max,
            consolation_ratio: self.consolation_ratio,
            entry_fee: self.entry_fee,
            kit_cost_per_player: self.kit_cost_per_player,
        }
    }

    pub fn rank_tiers(&self) -> RankTiers {
        RankTiers {
            top_rank_max: self.top_rank_max,
            mid_rank_max: self.mid_rank_max,
        }
    }
}
