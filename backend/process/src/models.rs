use std::{collections::HashSet, fmt};

use bank::remote::StoredMeal;

pub const BATCH_SIZE: usize = 450;

/// Firestore rejects commits with more writes than this.
pub const MAX_BATCH_SIZE: usize = 500;

/// Snapshot of the remote collection taken once at the start of a run.
#[derive(Debug, Default, Clone)]
pub struct ExistingRecordIndex {
    pub existing_ids: HashSet<String>,
    pub existing_names: HashSet<String>,
}

impl ExistingRecordIndex {
    pub fn from_stored(stored: Vec<StoredMeal>) -> Self {
        let mut index = Self::default();

        for meal in stored {
            // empty names never count as taken
            if let Some(name) = meal.name.filter(|name| !name.is_empty()) {
                index.existing_names.insert(name.to_lowercase());
            }
            index.existing_ids.insert(meal.id);
        }

        index
    }

    pub fn contains(&self, id: &str, lower_name: &str) -> bool {
        self.existing_ids.contains(id) || self.existing_names.contains(lower_name)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UploadSummary {
    pub total: usize,
    pub skipped: usize,
    pub written: usize,
    pub batches: usize,
    pub partial_failure: bool,
}

impl fmt::Display for UploadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} total, {} skipped, {} written in {} batches",
            self.total, self.skipped, self.written, self.batches
        )?;

        if self.partial_failure {
            f.write_str(" (partial)")?;
        }

        Ok(())
    }
}
