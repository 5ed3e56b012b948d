use std::{
    collections::BTreeMap,
    sync::{
        Mutex, MutexGuard,
        atomic::{AtomicUsize, Ordering},
    },
};

use serde_json::{Map, Value};

use crate::{
    meals::{IndexedMealRecord, MEAL_NAME},
    remote::{RemoteStore, StoreError, StoredMeal},
};

/// In-process collection keyed by document id.
///
/// Counts every call so runs can be checked for exactly which remote traffic
/// they caused. Failures can be injected for the scan or for the n-th commit.
#[derive(Default)]
pub struct MemoryStore {
    documents: Mutex<BTreeMap<String, Map<String, Value>>>,
    commit_sizes: Mutex<Vec<usize>>,
    list_calls: AtomicUsize,
    fail_list: bool,
    fail_commit: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, id: &str, fields: Map<String, Value>) -> Self {
        self.lock_documents().insert(id.to_string(), fields);
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    /// Fails the commit with the given zero-based position.
    pub fn failing_commit(mut self, position: usize) -> Self {
        self.fail_commit = Some(position);
        self
    }

    pub fn documents(&self) -> BTreeMap<String, Map<String, Value>> {
        self.lock_documents().clone()
    }

    pub fn commit_sizes(&self) -> Vec<usize> {
        self.lock_commits().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn lock_documents(&self) -> MutexGuard<'_, BTreeMap<String, Map<String, Value>>> {
        self.documents.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_commits(&self) -> MutexGuard<'_, Vec<usize>> {
        self.commit_sizes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RemoteStore for MemoryStore {
    async fn list_meals(&self) -> Result<Vec<StoredMeal>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_list {
            return Err(StoreError::Unavailable("scan refused".to_string()));
        }

        Ok(self
            .lock_documents()
            .iter()
            .map(|(id, fields)| StoredMeal {
                id: id.clone(),
                name: fields
                    .get(MEAL_NAME)
                    .and_then(Value::as_str)
                    .map(str::to_string),
            })
            .collect())
    }

    async fn commit(&self, meals: &[IndexedMealRecord]) -> Result<(), StoreError> {
        // failed commits are not recorded, the batch never landed
        let position = self.lock_commits().len();
        if self.fail_commit == Some(position) {
            return Err(StoreError::Unavailable(format!("commit {position} refused")));
        }

        let mut documents = self.lock_documents();
        for meal in meals {
            documents.insert(meal.id().to_string(), meal.to_fields());
        }

        self.lock_commits().push(meals.len());
        Ok(())
    }
}
