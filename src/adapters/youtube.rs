//! YouTube Data API v3 video source.
//!
//! Two calls per listing: `search.list` finds the channel's videos
//! published within the window, `videos.list` fetches their snippet and
//! live-streaming details.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::VideoSource;
use crate::core::SyncError;
use crate::domain::{LiveStatus, Video};

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Search page size (single page, no pagination)
const MAX_RESULTS: u32 = 50;

/// Configuration for the YouTube source
#[derive(Clone, Serialize, Deserialize)]
pub struct YouTubeConfig {
    pub api_key: String,
    pub channel_id: String,
}

impl std::fmt::Debug for YouTubeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YouTubeConfig")
            .field("api_key", &"<redacted>")
            .field("channel_id", &self.channel_id)
            .finish()
    }
}

/// YouTube channel as a video source
pub struct YouTubeSource {
    api_key: String,
    channel_id: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    #[serde(default)]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: Snippet,
    #[serde(default)]
    live_streaming_details: Option<LiveStreamingDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    published_at: DateTime<Utc>,
    #[serde(default)]
    live_broadcast_content: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveStreamingDetails {
    #[serde(default)]
    actual_end_time: Option<DateTime<Utc>>,
}

impl YouTubeSource {
    pub fn new(api_key: String, channel_id: String) -> Self {
        Self {
            api_key,
            channel_id,
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: YouTubeConfig) -> Self {
        Self::new(config.api_key, config.channel_id)
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/{}", API_BASE, endpoint);
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .with_context(|| format!("Failed to call YouTube {}", endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("YouTube {} error ({}): {}", endpoint, status, text);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse YouTube {} response", endpoint))
    }

    async fn fetch(&self, window: Duration) -> Result<Vec<Video>> {
        let published_after =
            (Utc::now() - window).to_rfc3339_opts(SecondsFormat::Secs, true);

        let search: SearchResponse = self
            .get(
                "search",
                &[
                    ("part", "snippet".to_string()),
                    ("channelId", self.channel_id.clone()),
                    ("maxResults", MAX_RESULTS.to_string()),
                    ("order", "date".to_string()),
                    ("publishedAfter", published_after),
                    ("type", "video".to_string()),
                ],
            )
            .await?;

        let ids: Vec<String> = search
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let details: VideosResponse = self
            .get(
                "videos",
                &[
                    ("part", "snippet,liveStreamingDetails".to_string()),
                    ("id", ids.join(",")),
                ],
            )
            .await?;

        details.items.into_iter().map(into_video).collect()
    }
}

/// Map a `videos.list` item onto a `Video`
fn into_video(item: VideoItem) -> Result<Video> {
    let broadcast = item
        .snippet
        .live_broadcast_content
        .as_deref()
        .unwrap_or("none");
    let mut live_status: LiveStatus = broadcast
        .parse()
        .with_context(|| format!("Video {} has malformed live status", item.id))?;

    let ended = item
        .live_streaming_details
        .as_ref()
        .and_then(|d| d.actual_end_time)
        .is_some();
    if live_status == LiveStatus::None && ended {
        live_status = LiveStatus::Completed;
    }

    Ok(Video::new(
        item.id,
        item.snippet.title,
        item.snippet.published_at,
        live_status,
    ))
}

#[async_trait]
impl VideoSource for YouTubeSource {
    fn name(&self) -> &str {
        "youtube"
    }

    async fn list_recent(&self, window: Duration) -> Result<Vec<Video>, SyncError> {
        self.fetch(window)
            .await
            .map_err(SyncError::source_unavailable)
    }

    fn source_locator(&self, video_id: &str) -> String {
        format!("https://www.youtube.com/watch?v={}", video_id)
    }
}
