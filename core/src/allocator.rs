//! Deterministic prize allocation.
//!
//! RULE: the allocator never touches the real store. It works on a
//! catalog snapshot and an in-memory stock counter, so the same
//! (roster, snapshot, policy, seed) always produces the same lines.
//! Every RNG draw is consumed in roster order, which is what lets
//! commit replay the preview bit-for-bit from the stored seed.

use crate::{budget, rng::SeedRng, selector};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One finisher on the event roster. Rank 1 is the best finish;
/// ranks are unique per event but need not be contiguous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub player: String,
    pub rank: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogItem {
    pub code: String,
    pub name: String,
    pub level: u32,
    pub cogs: f64,
    pub expected_value: f64,
    pub stock: i64,
    pub eligible_round: bool,
    pub eligible_end: bool,
    pub min_player_threshold: u32,
}

impl CatalogItem {
    pub fn eligible_for(&self, scope_type: ScopeType, player_count: usize) -> bool {
        let flag = match scope_type {
            ScopeType::Round => self.eligible_round,
            ScopeType::End => self.eligible_end,
        };
        flag && player_count >= self.min_player_threshold as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeType {
    Round,
    End,
}

impl ScopeType {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Round => "round",
            Self::End => "end",
        }
    }
}

/// Read-only allocation knobs. May change between preview and commit;
/// the hash re-check is what catches that race.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottlePolicy {
    pub risk_percentage: f64,
    pub ev_clamp_min: f64,
    pub ev_clamp_max: f64,
    pub consolation_ratio: f64,
    pub entry_fee: f64,
    pub kit_cost_per_player: f64,
}

/// Rank cutoffs mapping finish position to catalog tier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RankTiers {
    pub top_rank_max: u32,
    pub mid_rank_max: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationLine {
    pub player: String,
    pub item_code: String,
    pub item_name: String,
    pub level: u32,
    pub qty: i64,
    pub cogs: f64,
}

/// Outcome of one allocation pass over a roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub lines: Vec<AllocationLine>,
    pub spend: f64,
    pub budget: f64,
}

/// Allocate prizes across the roster, best finish first.
///
/// Tiering: distinct catalog levels sorted descending form the tier
/// ladder (index 0 = premium, last = floor). Rank thresholds pick the
/// target tier; a target with no stock falls back one step, choosing
/// between the next-lower tier and the floor with a single draw
/// against `consolation_ratio`. A player with no affordable in-stock
/// item in the resolved tier simply gets no line — that is an
/// expected outcome, not an error.
///
/// Items are assumed pre-filtered for scope eligibility; stock and
/// budget are tracked here, in memory, per call.
pub fn allocate(
    roster: &[RosterEntry],
    catalog: &[CatalogItem],
    policy: &ThrottlePolicy,
    tiers: RankTiers,
    seed: &str,
) -> Allocation {
    let budget = budget::allocatable_budget(
        policy.entry_fee,
        policy.kit_cost_per_player,
        roster.len(),
        policy.risk_percentage,
    );

    if roster.is_empty() || catalog.is_empty() {
        return Allocation {
            lines: Vec::new(),
            spend: 0.0,
            budget,
        };
    }

    let mut ordered: Vec<&RosterEntry> = roster.iter().collect();
    ordered.sort_by_key(|entry| entry.rank);

    // Tier ladder: highest level first. Within a tier, catalog order
    // (item code) is fixed so the weighted draw sees a stable pool.
    let mut levels: Vec<u32> = catalog.iter().map(|item| item.level).collect();
    levels.sort_unstable();
    levels.dedup();
    levels.reverse();

    let mut by_level: HashMap<u32, Vec<&CatalogItem>> = HashMap::new();
    for item in catalog {
        by_level.entry(item.level).or_default().push(item);
    }
    for pool in by_level.values_mut() {
        pool.sort_by(|a, b| a.code.cmp(&b.code));
    }

    let mut stock: HashMap<&str, i64> = catalog
        .iter()
        .map(|item| (item.code.as_str(), item.stock))
        .collect();

    let mut rng = SeedRng::new(seed);
    let mut remaining_budget = budget;
    let mut lines = Vec::new();

    let floor_tier = levels.len() - 1;

    for entry in ordered {
        let target = if entry.rank <= tiers.top_rank_max {
            0
        } else if entry.rank <= tiers.mid_rank_max {
            1.min(floor_tier)
        } else {
            floor_tier
        };

        let tier_has_stock = |tier: usize| {
            by_level[&levels[tier]]
                .iter()
                .any(|item| stock[item.code.as_str()] > 0)
        };

        let resolved = if tier_has_stock(target) {
            target
        } else {
            // One draw, always consumed, so later players' draws stay
            // aligned whether or not the fallback fires high or low.
            let next_lower = (target + 1).min(floor_tier);
            if rng.chance(policy.consolation_ratio) {
                next_lower
            } else {
                floor_tier
            }
        };

        let pool: Vec<&CatalogItem> = by_level[&levels[resolved]]
            .iter()
            .copied()
            .filter(|item| stock[item.code.as_str()] > 0)
            .collect();

        let Some(picked) = selector::pick_weighted(
            &pool,
            policy.ev_clamp_min,
            policy.ev_clamp_max,
            &mut rng,
        ) else {
            continue;
        };

        if picked.cogs > remaining_budget {
            continue;
        }

        if let Some(count) = stock.get_mut(picked.code.as_str()) {
            *count -= 1;
        }
        remaining_budget -= picked.cogs;
        lines.push(AllocationLine {
            player: entry.player.clone(),
            item_code: picked.code.clone(),
            item_name: picked.name.clone(),
            level: picked.level,
            qty: 1,
            cogs: picked.cogs,
        });
    }

    let spend = budget - remaining_budget;
    Allocation {
        lines,
        spend,
        budget,
    }
}
