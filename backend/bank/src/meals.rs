use serde::Deserialize;
use serde_json::{Map, Value};

pub const MEAL_ID: &str = "id";
pub const MEAL_NAME: &str = "name";
pub const MEAL_SEARCH_INDEX: &str = "searchIndex";

/// One entry of the local dataset.
///
/// Only `id` and `name` are interpreted, everything else rides along in
/// `attributes` and is written back untouched.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct MealRecord {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl MealRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexedMealRecord {
    pub meal: MealRecord,
    pub search_index: Vec<String>,
}

impl IndexedMealRecord {
    pub fn id(&self) -> &str {
        &self.meal.id
    }

    /// Stored shape of the document: the record's own fields plus `searchIndex`.
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = self.meal.attributes.clone();

        fields.insert(MEAL_ID.to_string(), Value::String(self.meal.id.clone()));
        if let Some(name) = &self.meal.name {
            fields.insert(MEAL_NAME.to_string(), Value::String(name.clone()));
        }
        fields.insert(
            MEAL_SEARCH_INDEX.to_string(),
            Value::Array(
                self.search_index
                    .iter()
                    .cloned()
                    .map(Value::String)
                    .collect(),
            ),
        );

        fields
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_extra_fields_survive() {
        let meal: MealRecord = serde_json::from_value(json!({
            "id": "r1",
            "name": "Pad Thai",
            "nutrition": { "calories": 520 },
            "ingredients": ["noodles", "peanuts"]
        }))
        .unwrap();

        assert_eq!(meal.id, "r1");
        assert_eq!(meal.name.as_deref(), Some("Pad Thai"));
        assert_eq!(meal.attributes["nutrition"], json!({ "calories": 520 }));
        assert!(!meal.attributes.contains_key("id"));
    }

    #[test]
    fn test_missing_name_is_none() {
        let meal: MealRecord = serde_json::from_value(json!({ "id": "r2" })).unwrap();

        assert_eq!(meal.name, None);
    }

    #[test]
    fn test_missing_id_rejected() {
        let result = serde_json::from_value::<MealRecord>(json!({ "name": "Soup" }));

        assert!(result.is_err());
    }

    #[test]
    fn test_to_fields() {
        let indexed = IndexedMealRecord {
            meal: MealRecord::new("r3", "Tea").with_attribute("cuisine", json!("chinese")),
            search_index: vec!["t".into(), "te".into(), "tea".into()],
        };

        assert_eq!(
            Value::Object(indexed.to_fields()),
            json!({
                "id": "r3",
                "name": "Tea",
                "cuisine": "chinese",
                "searchIndex": ["t", "te", "tea"]
            })
        );
    }
}
