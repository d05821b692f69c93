//! Async HTTP client wrapping the journey JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use journey_core::{
  blessing::Blessing,
  chain::Handoff,
  event::{HistoryEvent, JourneySummary, KeychainStatus},
  keychain::KeychainId,
  reaction::{EmotionType, ReactionCategory},
  validate::BlessingDraft,
};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};

/// Connection settings for the journey API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub timeout:  Duration,
}

// ─── Response shapes ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct Overview {
  pub summary:   JourneySummary,
  pub keychains: Vec<KeychainStatus>,
}

#[derive(Debug, Deserialize)]
pub struct CreatedBlessing {
  #[serde(flatten)]
  pub blessing: Blessing,
  #[serde(default)]
  pub reaction: Option<ReactionText>,
}

#[derive(Debug, Deserialize)]
pub struct ReactionText {
  pub reaction_text: String,
}

#[derive(Debug, Deserialize)]
pub struct ReactionCard {
  pub id:            i64,
  pub reaction_text: String,
  pub category:      ReactionCategory,
  pub emotion_type:  EmotionType,
  pub seed:          u32,
}

/// The JSON error envelope every failing endpoint returns.
#[derive(Debug, Deserialize)]
struct ErrorBody {
  error:   String,
  message: String,
}

#[derive(Serialize)]
struct NewHolder<'a> {
  to_name: &'a str,
}

// ─── Client ───────────────────────────────────────────────────────────────────

/// Async HTTP client for the journey JSON API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  // ── Keychains ─────────────────────────────────────────────────────────────

  /// `GET /api/keychains`
  pub async fn overview(&self) -> Result<Overview> {
    let resp = self
      .client
      .get(self.url("/keychains"))
      .send()
      .await
      .context("GET /keychains failed")?;
    ok_or_error(resp, "GET /keychains")
      .await?
      .json()
      .await
      .context("deserialising overview")
  }

  /// `GET /api/keychains/:id/events`
  pub async fn list_events(&self, id: KeychainId) -> Result<Vec<HistoryEvent>> {
    let resp = self
      .client
      .get(self.url(&format!("/keychains/{id}/events")))
      .send()
      .await
      .context("GET /keychains/:id/events failed")?;
    ok_or_error(resp, "GET /keychains/:id/events")
      .await?
      .json()
      .await
      .context("deserialising events")
  }

  /// `POST /api/keychains/:id/events`
  pub async fn append_event(&self, id: KeychainId, to_name: &str) -> Result<Handoff> {
    let resp = self
      .client
      .post(self.url(&format!("/keychains/{id}/events")))
      .json(&NewHolder { to_name })
      .send()
      .await
      .context("POST /keychains/:id/events failed")?;
    ok_or_error(resp, "POST /keychains/:id/events")
      .await?
      .json()
      .await
      .context("deserialising hand-off")
  }

  /// `GET /api/keychains/:id/story`
  pub async fn story(&self, id: KeychainId) -> Result<String> {
    let resp = self
      .client
      .get(self.url(&format!("/keychains/{id}/story")))
      .send()
      .await
      .context("GET /keychains/:id/story failed")?;
    ok_or_error(resp, "GET /keychains/:id/story")
      .await?
      .text()
      .await
      .context("reading story")
  }

  // ── Blessings ─────────────────────────────────────────────────────────────

  /// `GET /api/blessings?keychain_id=<id>&visibility=public`
  pub async fn public_blessings(&self, id: KeychainId) -> Result<Vec<Blessing>> {
    let resp = self
      .client
      .get(self.url("/blessings"))
      .query(&[("keychain_id", id.to_string()), ("visibility", "public".to_string())])
      .send()
      .await
      .context("GET /blessings failed")?;
    ok_or_error(resp, "GET /blessings")
      .await?
      .json()
      .await
      .context("deserialising blessings")
  }

  /// `POST /api/blessings`
  pub async fn create_blessing(&self, draft: &BlessingDraft) -> Result<CreatedBlessing> {
    let resp = self
      .client
      .post(self.url("/blessings"))
      .json(draft)
      .send()
      .await
      .context("POST /blessings failed")?;
    ok_or_error(resp, "POST /blessings")
      .await?
      .json()
      .await
      .context("deserialising blessing")
  }

  // ── Reactions ─────────────────────────────────────────────────────────────

  /// `GET /api/reactions?journey_id=<j>&station_number=<n>`
  pub async fn reaction(&self, journey_id: &str, station_number: u32) -> Result<ReactionCard> {
    let resp = self
      .client
      .get(self.url("/reactions"))
      .query(&[
        ("journey_id", journey_id.to_string()),
        ("station_number", station_number.to_string()),
      ])
      .send()
      .await
      .context("GET /reactions failed")?;
    ok_or_error(resp, "GET /reactions")
      .await?
      .json()
      .await
      .context("deserialising reaction")
  }
}

/// Pass successful responses through; turn the rest into an error carrying
/// the server's message.
async fn ok_or_error(resp: Response, what: &str) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  match resp.json::<ErrorBody>().await {
    Ok(body) => {
      tracing::warn!(%status, code = %body.error, "{what} rejected");
      Err(anyhow!("{}", body.message))
    }
    Err(_) => Err(anyhow!("{what} → {status}")),
  }
}
