//! Shared primitive types used across the desk.

/// An allocation scope: the whole event's end-of-event prizes, or one
/// round within it (`<event_id>#r<round>@<seats>`).
pub type ScopeId = String;

/// Identifier grouping all ledger rows written by one commit.
pub type BatchId = String;
