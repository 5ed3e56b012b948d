//! # Meal Bank
//!
//! Everything the uploader knows about meals and where they live.
//!
//! ## Local Dataset
//! - JSON array of meal objects, `data/recipes.json` by default.
//! - Each meal needs an `id` (**string**, document key) and a `name` (**string**, human readable).
//! - Every other field (nutrition, ingredients, instructions, ...) is kept as is and written through untouched.
//!
//! ## Firestore
//! - Collection of meals (`recipes` by default), document id is the meal `id`.
//! - Fields: the meal's own fields plus `searchIndex` (**list of strings**), every prefix of the lowercase name.
//!   Prefix search is then a plain `array-contains` query, no full-text engine needed.
//! - Writes go through `documents:commit`, which is atomic per call and capped at 500 writes.
//! - Reads list the whole collection with a `name` field mask, paging 300 documents at a time.
//!
//! ### Emulator
//! Set `FIRESTORE_EMULATOR_HOST` (e.g. `localhost:8080`) to talk to a local emulator instead. No token needed.
//! ```sh
//! gcloud emulators firestore start --host-port=localhost:8080
//! ```
use std::{fs, io, path::Path};

use thiserror::Error;

pub mod meals;
pub mod memory;
pub mod remote;
pub mod value;

use meals::MealRecord;

pub const MEALS_PATH: &str = "data/recipes.json";

#[derive(Error, Debug)]
pub enum BankError {
    #[error("Failed to read {path}: {source}")]
    Io { path: String, source: io::Error },

    #[error("Malformed dataset {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
}

pub fn get_meals(path: impl AsRef<Path>) -> Result<Vec<MealRecord>, BankError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path).map_err(|source| BankError::Io {
        path: path.display().to_string(),
        source,
    })?;

    serde_json::from_str(&data).map_err(|source| BankError::Json {
        path: path.display().to_string(),
        source,
    })
}
