//! Weighted prize selection.
//!
//! One draw per slot. The weight of each candidate is its expected
//! value clamped to the policy's [ev_clamp_min, ev_clamp_max] range,
//! so a single flashy item cannot dominate the pool.

use crate::{allocator::CatalogItem, rng::SeedRng};

/// Pick one item with probability proportional to clamped expected
/// value. Consumes exactly one RNG draw. Returns None only when
/// `items` is empty.
pub fn pick_weighted<'a>(
    items: &[&'a CatalogItem],
    ev_min: f64,
    ev_max: f64,
    rng: &mut SeedRng,
) -> Option<&'a CatalogItem> {
    if items.is_empty() {
        return None;
    }

    let weights: Vec<f64> = items
        .iter()
        .map(|item| item.expected_value.clamp(ev_min, ev_max))
        .collect();
    let total: f64 = weights.iter().sum();

    let r = rng.next_f64();
    if total <= 0.0 {
        // Degenerate pool: all weights clamp to zero. Fall back to a
        // uniform index so the draw count stays fixed at one.
        let idx = ((r * items.len() as f64) as usize).min(items.len() - 1);
        return Some(items[idx]);
    }

    let target = r * total;
    let mut cumulative = 0.0;
    for (item, weight) in items.iter().zip(weights.iter()) {
        cumulative += weight;
        if target < cumulative {
            return Some(item);
        }
    }
    // Float rounding can leave target fractionally past the last
    // cumulative edge; the last candidate owns that sliver.
    items.last().copied()
}
