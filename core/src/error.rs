use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Event '{event_id}' not found")]
    EventNotFound { event_id: String },

    #[error("Roster is empty for scope '{scope_id}'")]
    NoPlayers { scope_id: String },

    #[error("No eligible catalog items for scope '{scope_id}'")]
    NoPrizes { scope_id: String },

    #[error("No live preview artifact for scope '{scope_id}'")]
    NoPreview { scope_id: String },

    #[error("Hash mismatch for scope '{scope_id}': supplied {supplied}, computed {computed}")]
    HashMismatch {
        scope_id: String,
        supplied: String,
        computed: String,
    },

    #[error("Budget band RED for scope '{scope_id}': spend {spend:.2} against budget {budget:.2}")]
    BudgetRed {
        scope_id: String,
        spend: f64,
        budget: f64,
    },

    #[error("Schema invalid: {detail}")]
    SchemaInvalid { detail: String },

    #[error("Batch '{batch_id}' not found in ledger")]
    BatchNotFound { batch_id: String },

    #[error("Batch '{batch_id}' is already reverted")]
    BatchAlreadyReverted { batch_id: String },

    #[error("Insufficient stock for item '{item_code}' at commit time")]
    StockExhausted { item_code: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DeskResult<T> = Result<T, DeskError>;
