use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use image::DynamicImage;
use reqwest::{Client, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::constants::constants;

/// A single video as shown in the result list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VideoResult {
  pub id: String,
  pub title: String,
  pub channel_name: String,
  pub thumbnail_url: String,
}

impl VideoResult {
  pub fn watch_url(&self) -> String {
    format!("{}{}", constants().watch_url_prefix, self.id)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Category {
  pub id: String,
  pub display_name: String,
}

/// Everything that can go wrong talking to the YouTube Data API.
///
/// Callers in the engine treat all variants alike; the distinction only
/// matters for logs.
#[derive(Debug, Error)]
pub enum GatewayError {
  #[error("no YouTube API key configured")]
  MissingApiKey,
  #[error("invalid request URL: {0}")]
  InvalidUrl(String),
  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),
  #[error("API returned {status}: {message}")]
  Api { status: u16, message: String },
  #[error("unexpected response shape: {0}")]
  Decode(#[from] serde_json::Error),
  #[error("request task ended before completing")]
  Interrupted,
}

/// The two queries the app issues against the video platform.
#[async_trait]
pub trait Gateway: Send + Sync {
  async fn search_videos(&self, query: &str, max_results: u32) -> Result<Vec<VideoResult>, GatewayError>;
  async fn list_categories(&self) -> Result<Vec<Category>, GatewayError>;
}

// --- Wire format ---

#[derive(Deserialize)]
struct ListResponse<T> {
  items: Vec<T>,
}

#[derive(Deserialize)]
struct SearchItem {
  id: SearchItemId,
  snippet: SearchSnippet,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
  video_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
  title: String,
  channel_title: String,
  #[serde(default)]
  thumbnails: Thumbnails,
}

#[derive(Deserialize, Default)]
struct Thumbnails {
  medium: Option<Thumbnail>,
}

#[derive(Deserialize)]
struct Thumbnail {
  url: String,
}

#[derive(Deserialize)]
struct CategoryItem {
  id: String,
  snippet: CategorySnippet,
}

#[derive(Deserialize)]
struct CategorySnippet {
  title: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
  error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
  message: String,
}

/// Snippet titles come HTML-escaped from the search endpoint.
fn unescape_html(s: &str) -> String {
  s.replace("&quot;", "\"").replace("&#39;", "'").replace("&lt;", "<").replace("&gt;", ">").replace("&amp;", "&")
}

/// Parse a `search` response body. Items without a video id (channels, playlists) are skipped.
fn parse_search_response(body: &str) -> Result<Vec<VideoResult>, GatewayError> {
  let response: ListResponse<SearchItem> = serde_json::from_str(body)?;
  Ok(
    response
      .items
      .into_iter()
      .filter_map(|item| {
        let id = item.id.video_id.filter(|id| !id.is_empty())?;
        let thumbnail_url = item
          .snippet
          .thumbnails
          .medium
          .map(|t| t.url)
          .unwrap_or_else(|| format!("https://i.ytimg.com/vi/{}/mqdefault.jpg", id));
        Some(VideoResult {
          id,
          title: unescape_html(&item.snippet.title),
          channel_name: unescape_html(&item.snippet.channel_title),
          thumbnail_url,
        })
      })
      .collect(),
  )
}

fn parse_categories_response(body: &str) -> Result<Vec<Category>, GatewayError> {
  let response: ListResponse<CategoryItem> = serde_json::from_str(body)?;
  Ok(response.items.into_iter().map(|item| Category { id: item.id, display_name: item.snippet.title }).collect())
}

/// Pull `error.message` out of an API error body, falling back to the raw text.
fn api_error_message(body: &str) -> String {
  match serde_json::from_str::<ApiErrorBody>(body) {
    Ok(parsed) => parsed.error.message,
    Err(_) => body.trim().chars().take(200).collect(),
  }
}

// --- HTTP client ---

pub struct YouTubeClient {
  http: Client,
  api_key: Option<String>,
  base_url: String,
  region_code: String,
}

impl YouTubeClient {
  pub fn new(http: Client, api_key: Option<String>, region_code: String) -> Self {
    Self {
      http,
      api_key: api_key.filter(|k| !k.trim().is_empty()),
      base_url: constants().api_base_url.clone(),
      region_code,
    }
  }

  async fn get(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, GatewayError> {
    let key = self.api_key.as_deref().ok_or(GatewayError::MissingApiKey)?;
    let mut query: Vec<(&str, &str)> = params.to_vec();
    query.push(("key", key));
    let url = Url::parse_with_params(&format!("{}/{}", self.base_url, endpoint), &query)
      .map_err(|e| GatewayError::InvalidUrl(e.to_string()))?;

    debug!(endpoint, "gateway: request");
    let response = self.http.get(url).send().await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
      let message = api_error_message(&body);
      warn!(endpoint, status = status.as_u16(), message = %message, "gateway: request rejected");
      return Err(GatewayError::Api { status: status.as_u16(), message });
    }
    Ok(body)
  }
}

#[async_trait]
impl Gateway for YouTubeClient {
  async fn search_videos(&self, query: &str, max_results: u32) -> Result<Vec<VideoResult>, GatewayError> {
    let max = max_results.to_string();
    let body = self
      .get(
        "search",
        &[("part", "snippet"), ("q", query), ("maxResults", max.as_str()), ("type", "video"), ("pageToken", "")],
      )
      .await?;
    parse_search_response(&body)
  }

  async fn list_categories(&self) -> Result<Vec<Category>, GatewayError> {
    let body = self.get("videoCategories", &[("part", "snippet"), ("regionCode", self.region_code.as_str())]).await?;
    parse_categories_response(&body)
  }
}

pub async fn fetch_thumbnail(client: &Client, url: &str) -> Result<DynamicImage> {
  let response = client.get(url).send().await.with_context(|| format!("Failed to request thumbnail {}", url))?;
  if !response.status().is_success() {
    return Err(anyhow!("Thumbnail request returned {} for {}", response.status(), url));
  }
  let image_bytes = response.bytes().await.with_context(|| format!("Failed to read image bytes from {}", url))?;
  image::load_from_memory(&image_bytes).with_context(|| format!("Failed to decode image from memory (URL: {})", url))
}

#[cfg(test)]
mod tests {
  use super::*;

  const SEARCH_BODY: &str = r#"{
    "kind": "youtube#searchListResponse",
    "items": [
      {
        "id": { "kind": "youtube#video", "videoId": "abc123" },
        "snippet": {
          "title": "Tiere &amp; Farben",
          "channelTitle": "Kanal",
          "thumbnails": { "medium": { "url": "https://i.ytimg.com/vi/abc123/mqdefault.jpg" } }
        }
      },
      {
        "id": { "kind": "youtube#channel", "channelId": "UCxyz" },
        "snippet": { "title": "Some channel", "channelTitle": "Some channel" }
      },
      {
        "id": { "kind": "youtube#video", "videoId": "def456" },
        "snippet": { "title": "Ohne Bild", "channelTitle": "Kanal", "thumbnails": {} }
      }
    ]
  }"#;

  #[test]
  fn search_response_parses_videos() {
    let videos = parse_search_response(SEARCH_BODY).unwrap();
    assert_eq!(videos.len(), 2);
    assert_eq!(videos[0].id, "abc123");
    assert_eq!(videos[0].title, "Tiere & Farben");
    assert_eq!(videos[0].channel_name, "Kanal");
    assert_eq!(videos[0].thumbnail_url, "https://i.ytimg.com/vi/abc123/mqdefault.jpg");
  }

  #[test]
  fn search_response_missing_thumbnail_uses_default_url() {
    let videos = parse_search_response(SEARCH_BODY).unwrap();
    assert_eq!(videos[1].thumbnail_url, "https://i.ytimg.com/vi/def456/mqdefault.jpg");
  }

  #[test]
  fn search_response_empty_items() {
    let videos = parse_search_response(r#"{ "items": [] }"#).unwrap();
    assert!(videos.is_empty());
  }

  #[test]
  fn search_response_without_items_is_an_error() {
    let err = parse_search_response(r#"{ "kind": "youtube#searchListResponse" }"#).unwrap_err();
    assert!(matches!(err, GatewayError::Decode(_)));
  }

  #[test]
  fn search_response_garbage_is_an_error() {
    assert!(matches!(parse_search_response("<html>"), Err(GatewayError::Decode(_))));
  }

  #[test]
  fn categories_response_parses() {
    let body = r#"{ "items": [
      { "id": "1", "snippet": { "title": "Film & Animation" } },
      { "id": "10", "snippet": { "title": "Musik" } }
    ] }"#;
    let cats = parse_categories_response(body).unwrap();
    assert_eq!(
      cats,
      vec![
        Category { id: "1".into(), display_name: "Film & Animation".into() },
        Category { id: "10".into(), display_name: "Musik".into() },
      ]
    );
  }

  #[test]
  fn api_error_message_extracted() {
    let body = r#"{ "error": { "code": 403, "message": "The request cannot be completed because you have exceeded your quota." } }"#;
    assert_eq!(api_error_message(body), "The request cannot be completed because you have exceeded your quota.");
  }

  #[test]
  fn api_error_message_falls_back_to_body() {
    assert_eq!(api_error_message("  Bad Gateway \n"), "Bad Gateway");
  }

  #[test]
  fn unescape_common_entities() {
    assert_eq!(unescape_html("Tom &amp; Jerry &quot;Best of&quot; &#39;24"), "Tom & Jerry \"Best of\" '24");
    assert_eq!(unescape_html("&amp;lt;"), "&lt;");
  }

  #[test]
  fn blank_api_key_is_treated_as_missing() {
    let client = YouTubeClient::new(Client::new(), Some("   ".into()), "DE".into());
    assert!(client.api_key.is_none());
  }

  #[tokio::test]
  async fn missing_api_key_fails_without_network() {
    let client = YouTubeClient::new(Client::new(), None, "DE".into());
    assert!(matches!(client.search_videos("kinderlieder", 20).await, Err(GatewayError::MissingApiKey)));
    assert!(matches!(client.list_categories().await, Err(GatewayError::MissingApiKey)));
  }

  #[test]
  fn watch_url_uses_video_id() {
    let v = VideoResult {
      id: "riF8E7wtZH8".into(),
      title: String::new(),
      channel_name: String::new(),
      thumbnail_url: String::new(),
    };
    assert_eq!(v.watch_url(), "https://www.youtube.com/watch?v=riF8E7wtZH8");
  }
}
