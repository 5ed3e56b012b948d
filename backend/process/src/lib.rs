//! # Meal Upload
//!
//! One-shot job that pushes the local meal dataset into Firestore.
//!
//! ## Flow
//! 1. Read the whole target collection once. Keep two sets: document ids, and lowercase names.
//! - If this read fails we stop. Without it there is nothing to dedup against.
//!
//! 2. Drop every local meal whose id is already stored, or whose lowercase name is already stored.
//! - Order of the dataset is kept.
//! - A meal with no name (or an empty id) stops the run and reports its position.
//!
//! 3. Nothing left means nothing to do. No batch is opened.
//!
//! 4. Split the rest into chunks of 450 by position. The last chunk is whatever remains.
//!
//! 5. For each chunk: attach `searchIndex` to every meal, commit, wait for the commit, then move on.
//!
//! 6. A failed commit ends the run. Earlier batches stay committed, the summary says how far we got.
//!
//! ## Notes
//! - The snapshot is never refreshed. Anything written to the collection by someone else between
//!   step 1 and the last commit can still end up duplicated. Only a unique constraint on the store
//!   side would close that gap, so we accept it.
//!
//! - Rerunning is safe. Meals committed by an earlier (possibly interrupted) run show up in the
//!   fresh snapshot and get skipped.
use bank::{
    get_meals,
    meals::MealRecord,
    remote::{Firestore, RemoteStore},
};
use tracing::{debug, error, info, warn};

pub mod config;
pub mod error;
pub mod models;
pub mod utils;

use config::Config;
use error::UploadError;
use models::{ExistingRecordIndex, MAX_BATCH_SIZE, UploadSummary};
use utils::{index_meal, progress_bar};

pub async fn upload_meals(
    dataset: &str,
    collection: Option<String>,
    batch_size: usize,
) -> Result<UploadSummary, UploadError> {
    let mut config = Config::load()?;
    if let Some(collection) = collection {
        config.collection = collection;
    }

    let meals = get_meals(dataset)?;
    info!("Loaded Meals: {}", meals.len());

    let store = Firestore::open(config.firestore()).map_err(UploadError::RemoteUnavailable)?;

    let result = run_upload(&store, meals, batch_size).await;

    if let Err(e) = store.close().await {
        warn!("Failed to close store: {e}");
    }

    result
}

pub async fn load_existing_index<S: RemoteStore>(
    store: &S,
) -> Result<ExistingRecordIndex, UploadError> {
    let stored = store
        .list_meals()
        .await
        .map_err(UploadError::RemoteUnavailable)?;

    let index = ExistingRecordIndex::from_stored(stored);

    info!("Existing IDs: {}", index.existing_ids.len());
    info!("Existing Names: {}", index.existing_names.len());

    Ok(index)
}

pub fn filter_new_records(
    all: Vec<MealRecord>,
    index: &ExistingRecordIndex,
) -> Result<Vec<MealRecord>, UploadError> {
    let mut new_meals = Vec::new();

    for (position, meal) in all.into_iter().enumerate() {
        let lower_name = match &meal.name {
            Some(name) if !meal.id.is_empty() => name.to_lowercase(),
            _ => {
                return Err(UploadError::MalformedRecord {
                    position,
                    id: meal.id,
                });
            }
        };

        if index.contains(&meal.id, &lower_name) {
            debug!("Skipping existing meal {} ({lower_name})", meal.id);
            continue;
        }

        new_meals.push(meal);
    }

    Ok(new_meals)
}

pub async fn run_upload<S: RemoteStore>(
    store: &S,
    records: Vec<MealRecord>,
    batch_size: usize,
) -> Result<UploadSummary, UploadError> {
    if batch_size == 0 || batch_size > MAX_BATCH_SIZE {
        return Err(UploadError::InvalidBatchSize {
            size: batch_size,
            max: MAX_BATCH_SIZE,
        });
    }

    let index = load_existing_index(store).await?;

    let total = records.len();
    let new_meals = filter_new_records(records, &index)?;

    let mut summary = UploadSummary {
        total,
        skipped: total - new_meals.len(),
        ..UploadSummary::default()
    };

    if new_meals.is_empty() {
        info!("No new meals to upload!");
        return Ok(summary);
    }

    let pb = progress_bar(new_meals.len().div_ceil(batch_size));

    let mut meals = new_meals.into_iter().peekable();
    while meals.peek().is_some() {
        let batch: Vec<_> = meals.by_ref().take(batch_size).map(index_meal).collect();
        pb.set_message(format!("Committing batch {}", summary.batches + 1));

        if let Err(source) = store.commit(&batch).await {
            summary.partial_failure = true;
            pb.abandon_with_message("Failed");
            error!("Batch {} failed: {source}", summary.batches + 1);

            return Err(UploadError::BatchCommitFailure {
                batch: summary.batches + 1,
                summary,
                source,
            });
        }

        summary.batches += 1;
        summary.written += batch.len();
        pb.inc(1);

        if batch.len() == batch_size {
            info!("Committed batch of {} meals", batch.len());
        } else {
            info!("Committed final batch of {} meals", batch.len());
        }
    }

    pb.finish_with_message("Done");
    info!("Uploaded {} new meals.", summary.written);

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn index(ids: &[&str], names: &[&str]) -> ExistingRecordIndex {
        ExistingRecordIndex {
            existing_ids: ids.iter().map(|s| s.to_string()).collect(),
            existing_names: names.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn ids(meals: &[MealRecord]) -> Vec<&str> {
        meals.iter().map(|meal| meal.id.as_str()).collect()
    }

    #[test]
    fn test_filter_by_id_and_name() {
        let meals = vec![
            MealRecord::new("a1", "Anything"),
            MealRecord::new("b2", "STEW"),
            MealRecord::new("c3", "Curry"),
            MealRecord::new("d4", "Dal"),
        ];

        let kept = filter_new_records(meals, &index(&["a1"], &["stew"])).unwrap();

        assert_eq!(ids(&kept), vec!["c3", "d4"]);
    }

    #[test]
    fn test_filter_never_returns_existing() {
        let existing = index(&["a1", "b2"], &["soup", "stew"]);
        let meals = vec![
            MealRecord::new("a1", "New Name"),
            MealRecord::new("x1", "Soup"),
            MealRecord::new("x2", "sOuP"),
            MealRecord::new("b2", "Stew"),
            MealRecord::new("x3", "Salad"),
        ];

        let kept = filter_new_records(meals, &existing).unwrap();
        let kept_ids: HashSet<&str> = kept.iter().map(|meal| meal.id.as_str()).collect();

        assert_eq!(kept_ids, HashSet::from(["x3"]));
        for meal in &kept {
            let lower = meal.name.as_deref().unwrap().to_lowercase();
            assert!(!existing.existing_ids.contains(&meal.id));
            assert!(!existing.existing_names.contains(&lower));
        }
    }

    #[test]
    fn test_filter_keeps_order() {
        let meals = vec![
            MealRecord::new("z", "Zucchini"),
            MealRecord::new("a", "Apple"),
            MealRecord::new("m", "Mango"),
        ];

        let kept = filter_new_records(meals, &ExistingRecordIndex::default()).unwrap();

        assert_eq!(ids(&kept), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_filter_missing_name() {
        let mut nameless = MealRecord::new("b2", "");
        nameless.name = None;

        let result = filter_new_records(
            vec![MealRecord::new("a1", "Soup"), nameless],
            &ExistingRecordIndex::default(),
        );

        match result {
            Err(UploadError::MalformedRecord { position, id }) => {
                assert_eq!(position, 1);
                assert_eq!(id, "b2");
            }
            other => panic!("expected malformed record, got {other:?}"),
        }
    }

    #[test]
    fn test_filter_empty_id() {
        let result = filter_new_records(
            vec![MealRecord::new("", "Soup")],
            &ExistingRecordIndex::default(),
        );

        assert!(matches!(
            result,
            Err(UploadError::MalformedRecord { position: 0, .. })
        ));
    }
}
