//! The prize desk — preview/commit protocol and artifact lifecycle.
//!
//! RULES:
//!   - preview never mutates: it reads a snapshot, allocates in
//!     memory, and persists only the artifact and an audit row.
//!   - commit mutates only in step 5, inside one store transaction,
//!     after every check has passed. Steps 1–4 touch nothing.
//!   - The hash re-check is the race detector: it does not prevent a
//!     concurrent edit between preview and commit, it refuses to act
//!     on one. The per-scope lock is what keeps two commits from
//!     racing each other on stock.
//!
//! Scope id grammar:
//!   `spring-open`          — end-of-event prizes for event spring-open
//!   `spring-open#r2@1-4`   — round 2, seat ranks 1 and 4

use crate::{
    allocator::{self, Allocation, CatalogItem, RosterEntry, ScopeType, ThrottlePolicy},
    budget::RiskBand,
    config::DeskConfig,
    error::{DeskError, DeskResult},
    hashing,
    store::{AuditEntry, DeskStore, PreviewArtifact},
    types::{BatchId, ScopeId},
};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Serialize)]
pub struct PreviewOutcome {
    pub scope_id: ScopeId,
    pub lines: Vec<allocator::AllocationLine>,
    pub spend: f64,
    pub budget: f64,
    pub band: RiskBand,
    pub hash: String,
    pub seed: String,
    pub artifact_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitOutcome {
    pub scope_id: ScopeId,
    pub allocated: usize,
    pub spend: f64,
    pub budget: f64,
    pub band: RiskBand,
    pub batch_id: BatchId,
}

/// Parsed form of a scope id.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeRef {
    pub event_id: String,
    pub scope_type: ScopeType,
    pub round: Option<u32>,
    pub seats: Vec<u32>,
}

impl ScopeRef {
    pub fn parse(scope_id: &str) -> DeskResult<Self> {
        let Some((event_id, round_part)) = scope_id.split_once("#r") else {
            return Ok(Self {
                event_id: scope_id.to_string(),
                scope_type: ScopeType::End,
                round: None,
                seats: Vec::new(),
            });
        };

        let invalid = || DeskError::SchemaInvalid {
            detail: format!("malformed round scope id '{scope_id}'"),
        };

        let (round_str, seats_str) = round_part.split_once('@').ok_or_else(invalid)?;
        let round: u32 = round_str.parse().map_err(|_| invalid())?;
        let seats = seats_str
            .split('-')
            .map(|s| s.parse::<u32>().map_err(|_| invalid()))
            .collect::<DeskResult<Vec<u32>>>()?;
        if event_id.is_empty() || seats.is_empty() {
            return Err(invalid());
        }

        Ok(Self {
            event_id: event_id.to_string(),
            scope_type: ScopeType::Round,
            round: Some(round),
            seats,
        })
    }

    /// Round scope id for an event, e.g. `spring-open#r2@1-4`.
    pub fn round_scope_id(event_id: &str, round: u32, seats: &[u32]) -> ScopeId {
        let seat_list: Vec<String> = seats.iter().map(|s| s.to_string()).collect();
        format!("{event_id}#r{round}@{}", seat_list.join("-"))
    }
}

/// Everything one allocation pass produced, ready to hash or commit.
struct Derived {
    scope: ScopeRef,
    roster: Vec<RosterEntry>,
    eligible: Vec<CatalogItem>,
    allocation: Allocation,
    hash: String,
}

pub struct PrizeDesk {
    store: Mutex<DeskStore>,
    config: DeskConfig,
    scope_locks: Mutex<HashMap<ScopeId, Arc<Mutex<()>>>>,
}

impl PrizeDesk {
    pub fn new(store: DeskStore, config: DeskConfig) -> Self {
        Self {
            store: Mutex::new(store),
            config,
            scope_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Direct store access for seeding and inspection.
    pub fn store(&self) -> MutexGuard<'_, DeskStore> {
        lock_unpoisoned(&self.store)
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    // ── Preview ────────────────────────────────────────────────

    /// Run a preview with a freshly generated seed.
    pub fn preview(&self, scope_id: &str) -> DeskResult<PreviewOutcome> {
        self.preview_with_seed(scope_id, &uuid::Uuid::new_v4().to_string())
    }

    /// Convenience wrapper building the round scope id.
    pub fn preview_round(
        &self,
        event_id: &str,
        round: u32,
        seats: &[u32],
    ) -> DeskResult<PreviewOutcome> {
        self.preview(&ScopeRef::round_scope_id(event_id, round, seats))
    }

    /// Preview with a caller-chosen seed. The seed is opaque text;
    /// reusing one reproduces the allocation exactly.
    pub fn preview_with_seed(&self, scope_id: &str, seed: &str) -> DeskResult<PreviewOutcome> {
        let now = Utc::now();
        let store = self.store();

        let derived = derive(&store, scope_id, seed, &self.config)?;
        if derived.roster.is_empty() {
            return Err(DeskError::NoPlayers {
                scope_id: scope_id.to_string(),
            });
        }
        if derived.eligible.is_empty() {
            return Err(DeskError::NoPrizes {
                scope_id: scope_id.to_string(),
            });
        }

        let band = RiskBand::classify(derived.allocation.spend, derived.allocation.budget);
        let artifact = PreviewArtifact {
            artifact_id: uuid::Uuid::new_v4().to_string(),
            scope_id: scope_id.to_string(),
            seed: seed.to_string(),
            preview_hash: derived.hash.clone(),
            created_at: timestamp(now),
            expires_at: timestamp(now + Duration::hours(self.config.artifact_ttl_hours)),
        };
        store.put_artifact(&artifact)?;

        append_audit(
            &store,
            scope_id,
            "preview",
            seed,
            &derived.hash,
            band.label(),
            "ok",
            Some(format!("{} lines", derived.allocation.lines.len())),
            now,
        );
        log::info!(
            "preview {scope_id}: {} lines, spend {:.2}/{:.2}, band {}, hash {}",
            derived.allocation.lines.len(),
            derived.allocation.spend,
            derived.allocation.budget,
            band.label(),
            hashing::short_hash(&derived.hash),
        );

        Ok(PreviewOutcome {
            scope_id: scope_id.to_string(),
            lines: derived.allocation.lines,
            spend: derived.allocation.spend,
            budget: derived.allocation.budget,
            band,
            hash: derived.hash,
            seed: seed.to_string(),
            artifact_id: artifact.artifact_id,
        })
    }

    // ── Commit ─────────────────────────────────────────────────

    /// Commit a previously previewed allocation. Holds the scope lock
    /// for the whole call, so stock decrement and ledger append are
    /// atomic relative to any other commit on this scope.
    pub fn commit(&self, scope_id: &str, supplied_hash: &str) -> DeskResult<CommitOutcome> {
        let scope_lock = self.scope_lock(scope_id);
        let _guard = lock_unpoisoned(&scope_lock);

        let outcome = self.commit_inner(scope_id, supplied_hash);
        if let Err(err) = &outcome {
            let store = self.store();
            append_audit(
                &store,
                scope_id,
                "commit",
                "",
                supplied_hash,
                "-",
                error_code(err),
                Some(err.to_string()),
                Utc::now(),
            );
        }
        outcome
    }

    fn commit_inner(&self, scope_id: &str, supplied_hash: &str) -> DeskResult<CommitOutcome> {
        let now = Utc::now();
        let mut store = self.store();

        // Step 1: a live artifact must exist. Expiry is lazy.
        let artifact = store
            .live_artifact(scope_id, &timestamp(now))?
            .ok_or_else(|| DeskError::NoPreview {
                scope_id: scope_id.to_string(),
            })?;

        // Step 2: the caller must hold the hash this artifact bound.
        if supplied_hash != artifact.preview_hash {
            return Err(DeskError::HashMismatch {
                scope_id: scope_id.to_string(),
                supplied: supplied_hash.to_string(),
                computed: artifact.preview_hash,
            });
        }

        // Step 3: replay the stored seed against live state. A roster
        // or catalog edit since preview shifts the allocation, the
        // hash moves, and the commit is refused.
        let derived = derive(&store, scope_id, &artifact.seed, &self.config)?;
        if derived.hash != supplied_hash {
            return Err(DeskError::HashMismatch {
                scope_id: scope_id.to_string(),
                supplied: supplied_hash.to_string(),
                computed: derived.hash,
            });
        }

        // Step 4: RED blocks, no override.
        let band = RiskBand::classify(derived.allocation.spend, derived.allocation.budget);
        if band == RiskBand::Red {
            return Err(DeskError::BudgetRed {
                scope_id: scope_id.to_string(),
                spend: derived.allocation.spend,
                budget: derived.allocation.budget,
            });
        }

        // Step 5: the one mutation. Assignments, stock, ledger, and
        // artifact removal land in a single transaction.
        let batch_id = uuid::Uuid::new_v4().to_string();
        store.commit_allocation(
            &derived.scope.event_id,
            scope_id,
            derived.scope.scope_type,
            &derived.allocation.lines,
            &batch_id,
            &artifact.artifact_id,
            &timestamp(now),
        )?;

        append_audit(
            &store,
            scope_id,
            "commit",
            &artifact.seed,
            &derived.hash,
            band.label(),
            "ok",
            Some(format!("batch {batch_id}")),
            now,
        );
        log::info!(
            "commit {scope_id}: {} lines, spend {:.2}/{:.2}, band {}, batch {batch_id}",
            derived.allocation.lines.len(),
            derived.allocation.spend,
            derived.allocation.budget,
            band.label(),
        );

        Ok(CommitOutcome {
            scope_id: scope_id.to_string(),
            allocated: derived.allocation.lines.len(),
            spend: derived.allocation.spend,
            budget: derived.allocation.budget,
            band,
            batch_id,
        })
    }

    // ── Maintenance ────────────────────────────────────────────

    /// Append reversal rows for a committed batch and restore stock.
    pub fn revert(&self, batch_id: &str) -> DeskResult<usize> {
        let now = Utc::now();
        let mut store = self.store();
        let reverted = store.revert_batch(batch_id, &timestamp(now))?;

        append_audit(
            &store,
            batch_id,
            "revert",
            "",
            "",
            "-",
            "ok",
            Some(format!("{reverted} rows reverted")),
            now,
        );
        log::info!("revert batch {batch_id}: {reverted} rows");
        Ok(reverted)
    }

    /// Remove artifacts past their expiry. Optional hygiene — the
    /// lazy check in commit already distrusts them.
    pub fn sweep_expired(&self) -> DeskResult<usize> {
        self.store().sweep_expired_artifacts(&timestamp(Utc::now()))
    }

    fn scope_lock(&self, scope_id: &str) -> Arc<Mutex<()>> {
        let mut locks = lock_unpoisoned(&self.scope_locks);
        locks
            .entry(scope_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

/// Run the full allocation pipeline for a scope against current
/// store state. Shared by preview and the commit replay; empty-roster
/// and empty-catalog gating stays with the caller because commit must
/// report those as a hash mismatch, not a missing input.
fn derive(store: &DeskStore, scope_id: &str, seed: &str, config: &DeskConfig) -> DeskResult<Derived> {
    let scope = ScopeRef::parse(scope_id)?;

    let event = store
        .event(&scope.event_id)?
        .ok_or_else(|| DeskError::EventNotFound {
            event_id: scope.event_id.clone(),
        })?;

    let full_roster = store.roster(&scope.event_id)?;
    let roster: Vec<RosterEntry> = match scope.scope_type {
        ScopeType::End => full_roster.clone(),
        ScopeType::Round => full_roster
            .iter()
            .filter(|entry| scope.seats.contains(&entry.rank))
            .cloned()
            .collect(),
    };

    // Item thresholds gate on event attendance, not on how many seats
    // a round awards.
    let attendance = full_roster.len();
    let eligible: Vec<CatalogItem> = store
        .catalog_snapshot()?
        .into_iter()
        .filter(|item| item.eligible_for(scope.scope_type, attendance))
        .collect();

    let mut policy = config.base_policy();
    policy.entry_fee = event.entry_fee;
    policy.kit_cost_per_player = event.kit_cost_per_player;
    apply_policy_overrides(store, &mut policy)?;

    let allocation = allocator::allocate(&roster, &eligible, &policy, config.rank_tiers(), seed);
    let hash = hashing::preview_hash(scope_id, seed, &allocation.lines);

    Ok(Derived {
        scope,
        roster,
        eligible,
        allocation,
        hash,
    })
}

/// Throttle-policy table overrides win over config and event values.
fn apply_policy_overrides(store: &DeskStore, policy: &mut ThrottlePolicy) -> DeskResult<()> {
    let slots: [(&str, &mut f64); 6] = [
        ("risk_percentage", &mut policy.risk_percentage),
        ("ev_clamp_min", &mut policy.ev_clamp_min),
        ("ev_clamp_max", &mut policy.ev_clamp_max),
        ("consolation_ratio", &mut policy.consolation_ratio),
        ("entry_fee", &mut policy.entry_fee),
        ("kit_cost_per_player", &mut policy.kit_cost_per_player),
    ];
    for (key, slot) in slots {
        if let Some(value) = store.policy_value(key)? {
            *slot = value;
        }
    }
    Ok(())
}

/// Audit writes never abort the primary operation; a failure is
/// logged locally and swallowed.
#[allow(clippy::too_many_arguments)]
fn append_audit(
    store: &DeskStore,
    scope_id: &str,
    action: &str,
    seed: &str,
    hash: &str,
    band: &str,
    outcome: &str,
    detail: Option<String>,
    at: DateTime<Utc>,
) {
    let entry = AuditEntry {
        scope_id: scope_id.to_string(),
        action: action.to_string(),
        seed: seed.to_string(),
        hash: hash.to_string(),
        band: band.to_string(),
        outcome: outcome.to_string(),
        detail,
        created_at: timestamp(at),
    };
    if let Err(err) = store.append_audit(&entry) {
        log::warn!("audit write failed for {scope_id} ({action}): {err}");
    }
}

fn error_code(err: &DeskError) -> &'static str {
    match err {
        DeskError::EventNotFound { .. } => "EVENT_NOT_FOUND",
        DeskError::NoPlayers { .. } => "NO_PLAYERS",
        DeskError::NoPrizes { .. } => "NO_PRIZES",
        DeskError::NoPreview { .. } => "NO_PREVIEW",
        DeskError::HashMismatch { .. } => "HASH_MISMATCH",
        DeskError::BudgetRed { .. } => "BUDGET_RED",
        DeskError::SchemaInvalid { .. } => "SCHEMA_INVALID",
        DeskError::BatchNotFound { .. } => "BATCH_NOT_FOUND",
        DeskError::BatchAlreadyReverted { .. } => "BATCH_ALREADY_REVERTED",
        DeskError::StockExhausted { .. } => "STOCK_EXHAUSTED",
        DeskError::Database(_) => "DATABASE",
        DeskError::Serialization(_) => "SERIALIZATION",
        DeskError::Other(_) => "OTHER",
    }
}

/// Fixed-width UTC timestamp (microseconds, `Z` suffix) so stored
/// strings compare lexicographically in time order.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// A poisoned mutex only means another thread panicked mid-read; the
/// SQLite state underneath is still consistent, so keep serving.
fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
