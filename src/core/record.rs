use super::legacy::Expenses;
use super::request::CalculatorRequest;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("could not write record: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Saved summary of one calculation, optionally owned by a user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRecord {
    /// Hex SHA-256 of the request and outcome; equal calculations share an id
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub request: CalculatorRequest,
    pub outcome: Expenses,
}

impl CalculationRecord {
    pub fn new(
        request: CalculatorRequest,
        outcome: Expenses,
        user_id: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, RecordError> {
        let id = content_id(&request, &outcome)?;
        Ok(CalculationRecord {
            id,
            user_id,
            created_at,
            request,
            outcome,
        })
    }
}

fn content_id(request: &CalculatorRequest, outcome: &Expenses) -> Result<String, RecordError> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(request)?);
    hasher.update(serde_json::to_vec(outcome)?);
    Ok(hex::encode(hasher.finalize()))
}

/// Append-only JSON-lines file of calculation records
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        RecordStore { path: path.into() }
    }

    pub fn append(&self, record: &CalculationRecord) -> Result<(), RecordError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        file.write_all(&line)?;
        log::info!("Saved calculation {} to {}", record.id, self.path.display());
        Ok(())
    }
}
