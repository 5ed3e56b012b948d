use bank::meals::{IndexedMealRecord, MealRecord};
use indicatif::{ProgressBar, ProgressStyle};

/// Every non-empty prefix of the lowercase name, shortest first.
pub fn compute_search_index(name: &str) -> Vec<String> {
    let lower = name.to_lowercase();

    lower
        .char_indices()
        .map(|(start, c)| lower[..start + c.len_utf8()].to_string())
        .collect()
}

/// Callers must have checked the name already; a missing name indexes as empty.
pub fn index_meal(meal: MealRecord) -> IndexedMealRecord {
    let search_index = meal
        .name
        .as_deref()
        .map(compute_search_index)
        .unwrap_or_default();

    IndexedMealRecord { meal, search_index }
}

pub fn progress_bar(batches: usize) -> ProgressBar {
    let pb = ProgressBar::new(batches as u64);

    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
    ) {
        pb.set_style(style.progress_chars("=> "));
    }

    pb
}
