use super::DeskStore;
use crate::error::DeskResult;
use rusqlite::{params, OptionalExtension};

/// Preview artifact row: the server-held binding between a scope, the
/// seed the preview ran with, and the hash the operator saw.
#[derive(Debug, Clone)]
pub struct PreviewArtifact {
    pub artifact_id: String,
    pub scope_id: String,
    pub seed: String,
    pub preview_hash: String,
    pub created_at: String,
    pub expires_at: String,
}

impl DeskStore {
    /// Store an artifact. One row per scope: a second preview for the
    /// same scope replaces the first, which is exactly the
    /// supersession the protocol wants.
    pub fn put_artifact(&self, artifact: &PreviewArtifact) -> DeskResult<()> {
        self.conn.execute(
            "INSERT INTO preview_artifact
                (artifact_id, scope_id, seed, preview_hash, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(scope_id) DO UPDATE SET
                artifact_id = excluded.artifact_id,
                seed = excluded.seed,
                preview_hash = excluded.preview_hash,
                created_at = excluded.created_at,
                expires_at = excluded.expires_at",
            params![
                artifact.artifact_id,
                artifact.scope_id,
                artifact.seed,
                artifact.preview_hash,
                artifact.created_at,
                artifact.expires_at,
            ],
        )?;
        Ok(())
    }

    /// Artifact for a scope that has not passed its expiry, if any.
    /// Expiry is a lazy check against the caller's clock — an expired
    /// row is treated as absent and cleaned up on the spot.
    pub fn live_artifact(&self, scope_id: &str, now: &str) -> DeskResult<Option<PreviewArtifact>> {
        let artifact = self
            .conn
            .prepare(
                "SELECT artifact_id, scope_id, seed, preview_hash, created_at, expires_at
                 FROM preview_artifact WHERE scope_id = ?1",
            )?
            .query_row(params![scope_id], |row| {
                Ok(PreviewArtifact {
                    artifact_id: row.get(0)?,
                    scope_id: row.get(1)?,
                    seed: row.get(2)?,
                    preview_hash: row.get(3)?,
                    created_at: row.get(4)?,
                    expires_at: row.get(5)?,
                })
            })
            .optional()?;

        match artifact {
            Some(a) if a.expires_at.as_str() <= now => {
                self.delete_artifact(&a.artifact_id)?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    pub fn delete_artifact(&self, artifact_id: &str) -> DeskResult<()> {
        self.conn.execute(
            "DELETE FROM preview_artifact WHERE artifact_id = ?1",
            params![artifact_id],
        )?;
        Ok(())
    }

    /// Optional hygiene pass; the lazy check above already keeps
    /// expired artifacts from being trusted.
    pub fn sweep_expired_artifacts(&self, now: &str) -> DeskResult<usize> {
        let swept = self.conn.execute(
            "DELETE FROM preview_artifact WHERE expires_at <= ?1",
            params![now],
        )?;
        Ok(swept)
    }
}
