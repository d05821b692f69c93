//! Building the next hand-off event from a chain's tail.
//!
//! The builder is pure: it takes the quest to assign as an argument and never
//! persists anything. Callers draw the quest with
//! [`crate::prompt::assign_quest`] and append the returned event themselves.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  event::HistoryEvent,
  keychain::KeychainId,
  prompt::{Prompt, START_KEY, UNKNOWN_KEY},
};

/// Giver recorded on the first event of every chain.
pub const ORIGIN_GIVER: &str = "大象女士";

/// Reason recorded on the first event of every chain.
pub const ORIGIN_REASON: &str = "這是一次偶然的相遇";

/// Reason used when the tail event has no `next_prompt_text`.
pub const FALLBACK_REASON: &str = "命運的安排";

/// What the new holder is shown right after receiving the keychain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Explanation {
  pub giver_name:           String,
  /// Why the new holder received it.
  pub previous_prompt_text: String,
  /// Whom the new holder should look for next.
  pub next_prompt_text:     String,
}

/// A built event plus its display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handoff {
  pub event:       HistoryEvent,
  pub explanation: Explanation,
}

/// Build the event recording that `to_name` now holds the keychain.
///
/// `chain` is the keychain's current ordered chain (possibly empty) and
/// `to_name` must already be validated as non-blank.
pub fn build_handoff(
  keychain_id: KeychainId,
  chain: &[HistoryEvent],
  to_name: &str,
  quest: &Prompt,
  now: DateTime<Utc>,
) -> Handoff {
  let (from_name, prompt_key, prompt_text) = match chain.last() {
    None => (ORIGIN_GIVER.to_owned(), START_KEY.to_owned(), ORIGIN_REASON.to_owned()),
    Some(tail) => (
      tail.to_name.clone(),
      tail.next_prompt_key.clone().unwrap_or_else(|| UNKNOWN_KEY.to_owned()),
      tail
        .next_prompt_text
        .clone()
        .unwrap_or_else(|| FALLBACK_REASON.to_owned()),
    ),
  };

  let explanation = Explanation {
    giver_name:           from_name.clone(),
    previous_prompt_text: prompt_text.clone(),
    next_prompt_text:     quest.text.to_owned(),
  };

  let event = HistoryEvent {
    id: Uuid::new_v4(),
    keychain_id,
    timestamp: now,
    from_name,
    to_name: to_name.to_owned(),
    prompt_key,
    prompt_text,
    next_prompt_key: Some(quest.key.to_owned()),
    next_prompt_text: Some(quest.text.to_owned()),
  };

  Handoff { event, explanation }
}

/// Render the shareable plain-text story of a keychain's journey.
pub fn render_story(keychain_id: KeychainId, chain: &[HistoryEvent]) -> String {
  let mut sorted: Vec<&HistoryEvent> = chain.iter().collect();
  sorted.sort_by_key(|e| e.timestamp);

  let paragraphs: Vec<String> = sorted
    .iter()
    .enumerate()
    .map(|(i, e)| {
      let date = e.timestamp.format("%Y-%m-%d");
      if i == 0 {
        format!("【旅程開始】{date}\n由 {} 開始傳遞給 {}。", e.from_name, e.to_name)
      } else {
        format!(
          "【第 {} 站】{date}\n{} 交給了 {}\n原因：{}",
          i + 1,
          e.from_name,
          e.to_name,
          e.prompt_text
        )
      }
    })
    .collect();

  format!("🐘 大象女士的旅程記錄 (ID: #{keychain_id})\n\n{}", paragraphs.join("\n\n"))
}
