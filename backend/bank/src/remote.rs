use std::future::Future;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    meals::{IndexedMealRecord, MEAL_NAME},
    value::{decode_string, encode_fields},
};

const FIRESTORE_URL: &str = "https://firestore.googleapis.com/v1";
const EMULATOR_TOKEN: &str = "owner";
const PAGE_SIZE: u32 = 300;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Firestore returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Unreadable response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// What the dedup pass needs to know about a document already in the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMeal {
    pub id: String,
    pub name: Option<String>,
}

/// Document collection the uploader reads from and writes to.
pub trait RemoteStore {
    /// Full scan of the collection.
    fn list_meals(&self) -> impl Future<Output = Result<Vec<StoredMeal>, StoreError>> + Send;

    /// Sets every meal as one atomic write, overwriting documents with the same id.
    fn commit(
        &self,
        meals: &[IndexedMealRecord],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn close(self) -> impl Future<Output = Result<(), StoreError>> + Send
    where
        Self: Sized,
    {
        async { Ok(()) }
    }
}

pub struct FirestoreConfig {
    pub project_id: String,
    pub database: String,
    pub collection: String,
    pub emulator_host: Option<String>,
    pub token: Option<String>,
}

pub struct Firestore {
    client: Client,
    base_url: String,
    database_path: String,
    collection: String,
    token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<Document>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

impl Firestore {
    pub fn open(config: FirestoreConfig) -> Result<Self, StoreError> {
        let (base_url, token) = match config.emulator_host {
            Some(host) => (format!("http://{host}/v1"), EMULATOR_TOKEN.to_string()),
            None => (
                FIRESTORE_URL.to_string(),
                config.token.ok_or_else(|| {
                    StoreError::Unavailable("no access token configured".to_string())
                })?,
            ),
        };

        let database_path = format!(
            "projects/{}/databases/{}",
            config.project_id, config.database
        );

        info!("Opened Firestore {database_path} at {base_url}");

        Ok(Self {
            client: Client::new(),
            base_url,
            database_path,
            collection: config.collection,
            token,
        })
    }

    fn document_path(&self, id: &str) -> String {
        format!("{}/documents/{}/{id}", self.database_path, self.collection)
    }

    fn commit_body(&self, meals: &[IndexedMealRecord]) -> Value {
        let writes: Vec<Value> = meals
            .iter()
            .map(|meal| {
                json!({
                    "update": {
                        "name": self.document_path(meal.id()),
                        "fields": encode_fields(&meal.to_fields()),
                    }
                })
            })
            .collect();

        json!({ "writes": writes })
    }

    async fn list_page(&self, page_token: Option<&str>) -> Result<ListResponse, StoreError> {
        let url = format!(
            "{}/{}/documents/{}",
            self.base_url, self.database_path, self.collection
        );

        let mut query = vec![
            ("pageSize", PAGE_SIZE.to_string()),
            ("mask.fieldPaths", MEAL_NAME.to_string()),
        ];
        if let Some(page_token) = page_token {
            query.push(("pageToken", page_token.to_string()));
        }

        let res = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .query(&query)
            .send()
            .await?;

        let body = check_status(res).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl RemoteStore for Firestore {
    async fn list_meals(&self) -> Result<Vec<StoredMeal>, StoreError> {
        collect_pages(|page_token| async move { self.list_page(page_token.as_deref()).await })
            .await
    }

    async fn commit(&self, meals: &[IndexedMealRecord]) -> Result<(), StoreError> {
        let res = self
            .client
            .post(format!(
                "{}/{}/documents:commit",
                self.base_url, self.database_path
            ))
            .bearer_auth(&self.token)
            .json(&self.commit_body(meals))
            .send()
            .await?;

        check_status(res).await?;
        Ok(())
    }

    async fn close(self) -> Result<(), StoreError> {
        info!("Closed Firestore {}", self.database_path);
        Ok(())
    }
}

async fn check_status(res: reqwest::Response) -> Result<String, StoreError> {
    let status = res.status();
    let body = res.text().await?;

    if !status.is_success() {
        return Err(StoreError::Status { status, body });
    }

    Ok(body)
}

/// Follows `nextPageToken` until a page comes back without one.
async fn collect_pages<F, Fut>(mut fetch: F) -> Result<Vec<StoredMeal>, StoreError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<ListResponse, StoreError>>,
{
    let mut meals = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = fetch(page_token.take()).await?;

        debug!("Listed page of {} documents", page.documents.len());

        meals.extend(page.documents.into_iter().map(|doc| StoredMeal {
            name: decode_string(&doc.fields, MEAL_NAME).map(str::to_string),
            id: document_id(&doc.name).to_string(),
        }));

        match page.next_page_token {
            Some(token) if !token.is_empty() => page_token = Some(token),
            _ => break,
        }
    }

    Ok(meals)
}

/// Last segment of a full document resource name.
fn document_id(resource_name: &str) -> &str {
    resource_name
        .rsplit_once('/')
        .map_or(resource_name, |(_, id)| id)
}
