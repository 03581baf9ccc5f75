//! Webflow CMS record store (API v2).
//!
//! Items live in one collection. The video id is stored in the `video-id`
//! field and the live status in `is-live`; both are read back from the same
//! fields they are written to.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::RecordStore;
use crate::core::SyncError;
use crate::domain::{ContentRecord, LiveStatus, NewRecord, RecordUpdate, UpdateOutcome};

const API_BASE: &str = "https://api.webflow.com/v2";

/// Items per listing (single page, no pagination)
const LIST_LIMIT: u32 = 100;

const FIELD_NAME: &str = "name";
const FIELD_SLUG: &str = "slug";
const FIELD_PUBLISH_DATE: &str = "publish-date";
const FIELD_VIDEO_ID: &str = "video-id";
const FIELD_LIVE: &str = "is-live";
const FIELD_ASSET_URL: &str = "bunny-link";

/// Configuration for the Webflow store
#[derive(Clone, Serialize, Deserialize)]
pub struct WebflowConfig {
    pub api_key: String,
    pub collection_id: String,
}

impl std::fmt::Debug for WebflowConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebflowConfig")
            .field("api_key", &"<redacted>")
            .field("collection_id", &self.collection_id)
            .finish()
    }
}

/// A collection item as returned by the API
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Item {
    id: String,
    #[serde(default)]
    is_archived: bool,
    #[serde(default)]
    is_draft: bool,
    #[serde(default)]
    field_data: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ItemList {
    #[serde(default)]
    items: Vec<Item>,
}

/// Failure of a single API call
#[derive(Debug)]
enum ApiError {
    Status { status: StatusCode, body: String },
    Transport(anyhow::Error),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Status { status, body } => write!(f, "Webflow error ({}): {}", status, body),
            ApiError::Transport(e) => write!(f, "{:#}", e),
        }
    }
}

impl ApiError {
    fn into_anyhow(self) -> anyhow::Error {
        match self {
            ApiError::Transport(e) => e,
            status => anyhow::anyhow!("{}", status),
        }
    }
}

/// Webflow collection as a record store
pub struct WebflowStore {
    api_key: String,
    collection_id: String,
    client: reqwest::Client,
}

impl WebflowStore {
    pub fn new(api_key: String, collection_id: String) -> Self {
        Self {
            api_key,
            collection_id,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: WebflowConfig) -> Self {
        Self::new(config.api_key, config.collection_id)
    }

    fn items_url(&self) -> String {
        format!("{}/collections/{}/items", API_BASE, self.collection_id)
    }

    fn item_url(&self, record_id: &str) -> String {
        format!("{}/{}", self.items_url(), record_id)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request
            .bearer_auth(&self.api_key)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Transport(anyhow::Error::new(e).context("Failed to reach Webflow")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Transport(anyhow::Error::new(e).context("Failed to parse Webflow response")))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        self.send(self.client.get(url)).await
    }

    async fn post_json<T: DeserializeOwned>(&self, url: &str, body: &Value) -> Result<T, ApiError> {
        self.send(self.client.post(url).json(body)).await
    }

    async fn patch_json<T: DeserializeOwned>(&self, url: &str, body: &Value) -> Result<T, ApiError> {
        self.send(self.client.patch(url).json(body)).await
    }

    /// Fetch one record; `None` if the store has no such item
    pub async fn get(&self, record_id: &str) -> Result<Option<ContentRecord>> {
        match self.get_json::<Item>(&self.item_url(record_id)).await {
            Ok(item) => Ok(Some(item_to_record(item))),
            Err(ApiError::Status { status, .. }) if status == StatusCode::NOT_FOUND => Ok(None),
            Err(e) => Err(e
                .into_anyhow()
                .context(format!("Failed to fetch item {}", record_id))),
        }
    }

    async fn post_item(&self, record: &NewRecord) -> Result<ContentRecord, ApiError> {
        self.post_json::<Item>(&self.items_url(), &create_payload(record))
            .await
            .map(item_to_record)
    }

    async fn list(&self) -> Result<HashMap<String, ContentRecord>> {
        let url = format!("{}?limit={}", self.items_url(), LIST_LIMIT);
        let list: ItemList = self
            .get_json(&url)
            .await
            .map_err(|e| e.into_anyhow().context("Failed to list collection items"))?;

        let mut records = HashMap::new();
        for item in list.items {
            let record = item_to_record(item);
            if record.video_id.is_empty() {
                continue;
            }
            if let Some(previous) = records.insert(record.video_id.clone(), record) {
                warn!(video_id = %previous.video_id, record_id = %previous.id, "Collection holds more than one item for video");
            }
        }
        Ok(records)
    }
}

/// Cause of a 409 on create
#[derive(Debug, PartialEq, Eq)]
enum Conflict {
    SameVideo,
    SlugTaken,
}

fn classify_conflict(existing: &HashMap<String, ContentRecord>, video_id: &str) -> Conflict {
    if existing.contains_key(video_id) {
        Conflict::SameVideo
    } else {
        Conflict::SlugTaken
    }
}

/// The same record with the video id appended to its slug
fn with_unique_slug(record: &NewRecord) -> NewRecord {
    let suffix = record.video_id.to_lowercase();
    let slug = if record.slug.is_empty() {
        suffix
    } else {
        format!("{}-{}", record.slug, suffix)
    };
    NewRecord {
        slug,
        ..record.clone()
    }
}

/// Read a collection item into a record
fn item_to_record(item: Item) -> ContentRecord {
    let text = |key: &str| {
        item.field_data
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    };

    ContentRecord {
        video_id: text(FIELD_VIDEO_ID).unwrap_or_default(),
        title: text(FIELD_NAME).unwrap_or_default(),
        slug: text(FIELD_SLUG).unwrap_or_default(),
        published_at: text(FIELD_PUBLISH_DATE)
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|d| d.with_timezone(&Utc)),
        live_status: live_status_field(item.field_data.get(FIELD_LIVE)),
        asset_url: text(FIELD_ASSET_URL).filter(|s| !s.is_empty()),
        archived: item.is_archived,
        draft: item.is_draft,
        id: item.id,
    }
}

/// Interpret the `is-live` field. Older items stored a boolean there.
fn live_status_field(value: Option<&Value>) -> LiveStatus {
    match value {
        Some(Value::String(s)) => s.parse().unwrap_or_default(),
        Some(Value::Bool(true)) => LiveStatus::Live,
        _ => LiveStatus::None,
    }
}

fn create_payload(record: &NewRecord) -> Value {
    json!({
        "isArchived": record.archived,
        "isDraft": record.draft,
        "fieldData": {
            FIELD_NAME: record.title,
            FIELD_SLUG: record.slug,
            FIELD_PUBLISH_DATE: record.published_at.to_rfc3339(),
            FIELD_VIDEO_ID: record.video_id,
            FIELD_LIVE: record.live_status.as_str(),
            FIELD_ASSET_URL: record.asset_url,
        }
    })
}

fn update_payload(fields: &RecordUpdate) -> Value {
    let mut field_data = Map::new();
    if let Some(url) = &fields.asset_url {
        field_data.insert(FIELD_ASSET_URL.to_string(), json!(url));
    }
    if let Some(status) = fields.live_status {
        field_data.insert(FIELD_LIVE.to_string(), json!(status.as_str()));
    }

    let mut payload = Map::new();
    if let Some(archived) = fields.archived {
        payload.insert("isArchived".to_string(), json!(archived));
    }
    if let Some(draft) = fields.draft {
        payload.insert("isDraft".to_string(), json!(draft));
    }
    payload.insert("fieldData".to_string(), Value::Object(field_data));
    Value::Object(payload)
}

#[async_trait]
impl RecordStore for WebflowStore {
    fn name(&self) -> &str {
        "webflow"
    }

    async fn list_existing(&self) -> Result<HashMap<String, ContentRecord>, SyncError> {
        self.list()
            .await
            .map_err(SyncError::record_list_unavailable)
    }

    async fn create(&self, record: &NewRecord) -> Result<ContentRecord, SyncError> {
        let body = match self.post_item(record).await {
            Ok(created) => return Ok(created),
            Err(ApiError::Status { status, body }) if status == StatusCode::CONFLICT => body,
            Err(e) => {
                return Err(SyncError::record_write_failure(
                    &record.video_id,
                    e.into_anyhow().context("Failed to create item"),
                ))
            }
        };

        // A 409 is also returned for a slug taken by an unrelated item
        let existing = self
            .list()
            .await
            .map_err(|e| SyncError::record_write_failure(&record.video_id, e))?;
        match classify_conflict(&existing, &record.video_id) {
            Conflict::SameVideo => Err(SyncError::DuplicateConflict {
                video_id: record.video_id.clone(),
            }),
            Conflict::SlugTaken => {
                let retry = with_unique_slug(record);
                warn!(
                    video_id = %record.video_id,
                    slug = %record.slug,
                    retry_slug = %retry.slug,
                    conflict = %body,
                    "Slug already in use, retrying create"
                );
                self.post_item(&retry).await.map_err(|e| {
                    SyncError::record_write_failure(
                        &record.video_id,
                        e.into_anyhow().context("Failed to create item with unique slug"),
                    )
                })
            }
        }
    }

    async fn update(
        &self,
        record_id: &str,
        fields: &RecordUpdate,
    ) -> Result<UpdateOutcome, SyncError> {
        let current = self
            .get(record_id)
            .await
            .map_err(|e| SyncError::record_write_failure(record_id, e))?
            .ok_or_else(|| {
                SyncError::record_write_failure(record_id, anyhow::anyhow!("Item no longer exists"))
            })?;

        if fields.is_empty() || fields.is_satisfied_by(&current) {
            debug!(record_id, "Item already matches, skipping patch");
            return Ok(UpdateOutcome::Unchanged);
        }

        self.patch_json::<Value>(&self.item_url(record_id), &update_payload(fields))
            .await
            .map_err(|e| {
                SyncError::record_write_failure(
                    record_id,
                    e.into_anyhow().context("Failed to patch item"),
                )
            })?;
        Ok(UpdateOutcome::Updated)
    }
}
