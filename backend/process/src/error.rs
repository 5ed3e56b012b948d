use bank::{BankError, remote::StoreError};
use thiserror::Error;

use crate::{config::ConfigError, models::UploadSummary};

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Could not read existing meals: {0}")]
    RemoteUnavailable(#[source] StoreError),

    #[error("Meal at position {position} (id {id:?}) is missing a required field")]
    MalformedRecord { position: usize, id: String },

    #[error("Batch {batch} failed to commit after {summary}: {source}")]
    BatchCommitFailure {
        batch: usize,
        summary: UploadSummary,
        source: StoreError,
    },

    #[error("Batch size must be between 1 and {max}, got {size}")]
    InvalidBatchSize { size: usize, max: usize },

    #[error(transparent)]
    Dataset(#[from] BankError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
