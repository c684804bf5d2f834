//! Content hashing for the preview/commit handshake.
//!
//! The hash is a commitment over the allocation decision. Commit
//! recomputes it from the stored seed against live state; any edit to
//! the roster, catalog, or policy since preview shifts the allocation
//! and therefore the hash, and the commit is refused.
//!
//! Serialization format, version 1 (fixed — bump the version tag to
//! change anything here):
//!
//! ```text
//! v1\n
//! scope=<scope_id>\n
//! seed=<seed>\n
//! lines=<count>\n
//! <player>\x1f<item_code>\x1f<qty>\x1f<cogs>\n      (per line, in order)
//! ```
//!
//! `qty` is a decimal integer; `cogs` is rendered with exactly two
//! decimals (all COGS values are currency at cent precision). Lines
//! keep allocation order — the allocator is already deterministic, so
//! no sorting happens here.

use crate::allocator::AllocationLine;
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Characters of the full hash shown in logs and audit detail.
pub const SHORT_HASH_LEN: usize = 12;

/// SHA-256 over the v1 serialization, lowercase hex (64 chars).
pub fn preview_hash(scope_id: &str, seed: &str, lines: &[AllocationLine]) -> String {
    let mut buf = String::new();
    buf.push_str("v1\n");
    let _ = writeln!(buf, "scope={scope_id}");
    let _ = writeln!(buf, "seed={seed}");
    let _ = writeln!(buf, "lines={}", lines.len());
    for line in lines {
        let _ = writeln!(
            buf,
            "{}\x1f{}\x1f{}\x1f{:.2}",
            line.player, line.item_code, line.qty, line.cogs
        );
    }

    let digest = Sha256::digest(buf.as_bytes());
    let mut hex = String::with_capacity(64);
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex
}

/// Display prefix for logs; never used in equality checks.
pub fn short_hash(hash: &str) -> &str {
    &hash[..hash.len().min(SHORT_HASH_LEN)]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(player: &str, code: &str, qty: i64, cogs: f64) -> AllocationLine {
        AllocationLine {
            player: player.into(),
            item_code: code.into(),
            item_name: code.to_uppercase(),
            level: 2,
            qty,
            cogs,
        }
    }

    #[test]
    fn identical_inputs_hash_identically() {
        let lines = vec![line("Ana", "box-l2", 1, 12.5), line("Bo", "deck-l1", 1, 4.0)];
        let a = preview_hash("evt-1", "seed-x", &lines);
        let b = preview_hash("evt-1", "seed-x", &lines);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn any_field_change_changes_hash() {
        let base = vec![line("Ana", "box-l2", 1, 12.5)];
        let h = preview_hash("evt-1", "seed-x", &base);

        assert_ne!(h, preview_hash("evt-2", "seed-x", &base));
        assert_ne!(h, preview_hash("evt-1", "seed-y", &base));
        assert_ne!(h, preview_hash("evt-1", "seed-x", &[line("Ann", "box-l2", 1, 12.5)]));
        assert_ne!(h, preview_hash("evt-1", "seed-x", &[line("Ana", "box-l3", 1, 12.5)]));
        assert_ne!(h, preview_hash("evt-1", "seed-x", &[line("Ana", "box-l2", 2, 12.5)]));
        assert_ne!(h, preview_hash("evt-1", "seed-x", &[line("Ana", "box-l2", 1, 12.51)]));
        assert_ne!(h, preview_hash("evt-1", "seed-x", &[]));
    }

    #[test]
    fn reordering_lines_changes_hash() {
        let ab = vec![line("Ana", "a", 1, 1.0), line("Bo", "b", 1, 2.0)];
        let ba = vec![line("Bo", "b", 1, 2.0), line("Ana", "a", 1, 1.0)];
        assert_ne!(
            preview_hash("evt-1", "s", &ab),
            preview_hash("evt-1", "s", &ba)
        );
    }

    #[test]
    fn short_hash_is_a_prefix() {
        let h = preview_hash("evt-1", "s", &[]);
        assert_eq!(short_hash(&h), &h[..SHORT_HASH_LEN]);
    }
}
