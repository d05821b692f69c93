//! Deterministic reaction selection.
//!
//! A reaction is chosen by hashing `"{journey_id}-{station_number}"` with the
//! 31-multiplier rolling hash over UTF-16 code units, wrapping to a signed
//! 32-bit integer after every step. The absolute value of the final hash is
//! the `seed`; `seed % active_pool_len` indexes the pool ordered by ascending
//! id. The arithmetic is reproduced bit for bit so that assignments agree with
//! every other implementation of the same scheme.

use serde::{Deserialize, Serialize};

use crate::{Error, Result, ValidationError};

/// Upper bound on `reaction_text`, in characters.
pub const REACTION_TEXT_MAX: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReactionCategory {
  Blessing,
  Encouragement,
  Resonance,
  Ritual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmotionType {
  Emotion,
  Ritual,
  Gratitude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionStatus {
  Active,
  Inactive,
}

/// A curated canned response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
  pub id:            i64,
  pub reaction_text: String,
  pub category:      ReactionCategory,
  pub emotion_type:  EmotionType,
  pub status:        ReactionStatus,
}

impl Reaction {
  pub fn is_active(&self) -> bool { self.status == ReactionStatus::Active }

  pub fn validate(&self) -> Result<(), ValidationError> {
    let len = self.reaction_text.chars().count();
    if len == 0 {
      return Err(ValidationError::Missing("reaction_text"));
    }
    if len > REACTION_TEXT_MAX {
      return Err(ValidationError::TooLong {
        field:    "reaction_text",
        max:      REACTION_TEXT_MAX,
        provided: len,
      });
    }
    Ok(())
  }
}

/// The outcome of [`select_reaction`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection<'a> {
  pub reaction: &'a Reaction,
  pub seed:     u32,
  /// Position of `reaction` within the active pool.
  pub index:    usize,
}

/// The 32-bit rolling hash of `"{journey_id}-{station_number}"`, made
/// non-negative.
pub fn seed_for(journey_id: &str, station_number: u32) -> u32 {
  let key = format!("{journey_id}-{station_number}");
  let hash = key.encode_utf16().fold(0_i32, |h, unit| {
    h.wrapping_mul(31).wrapping_add(i32::from(unit))
  });
  hash.unsigned_abs()
}

/// Filter `reactions` down to the active ones, ordered by ascending id.
pub fn active_pool(reactions: &[Reaction]) -> Vec<&Reaction> {
  let mut pool: Vec<&Reaction> = reactions.iter().filter(|r| r.is_active()).collect();
  pool.sort_by_key(|r| r.id);
  pool
}

/// Pick the reaction for `(journey_id, station_number)`.
///
/// Inactive reactions are ignored; the order of `reactions` does not matter.
pub fn select_reaction<'a>(
  reactions: &'a [Reaction],
  journey_id: &str,
  station_number: u32,
) -> Result<Selection<'a>> {
  let pool = active_pool(reactions);
  if pool.is_empty() {
    return Err(Error::ReactionUnavailable);
  }
  let seed = seed_for(journey_id, station_number);
  let index = (seed as usize) % pool.len();
  Ok(Selection { reaction: pool[index], seed, index })
}

/// The pool a fresh store is seeded with.
pub fn default_reactions() -> Vec<Reaction> {
  use EmotionType as E;
  use ReactionCategory as C;

  [
    ("小將收到你嘅祝福，旅程又暖咗一啲。", C::Blessing, E::Emotion),
    ("願你今日都被溫柔對待。", C::Blessing, E::Gratitude),
    ("慢慢行，唔使急，小將陪住你。", C::Encouragement, E::Emotion),
    ("你已經做得好好，繼續向前行！", C::Encouragement, E::Emotion),
    ("原來你都係咁諗，小將好有共鳴。", C::Resonance, E::Emotion),
    ("每一站嘅相遇都唔係偶然。", C::Resonance, E::Ritual),
    ("合十，為下一位主人祈福。", C::Ritual, E::Ritual),
    ("摸一摸小將，許一個小小願望。", C::Ritual, E::Ritual),
    ("多謝你將小將帶到呢度。", C::Blessing, E::Gratitude),
    ("小將記住咗你，後會有期！", C::Encouragement, E::Gratitude),
  ]
  .into_iter()
  .zip(1..)
  .map(|((text, category, emotion_type), id)| Reaction {
    id,
    reaction_text: text.to_owned(),
    category,
    emotion_type,
    status: ReactionStatus::Active,
  })
  .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn pool_of(n: i64) -> Vec<Reaction> {
    (1..=n)
      .map(|id| Reaction {
        id,
        reaction_text: format!("reaction {id}"),
        category: ReactionCategory::Blessing,
        emotion_type: EmotionType::Emotion,
        status: ReactionStatus::Active,
      })
      .collect()
  }

  #[test]
  fn seeds_match_reference_values() {
    assert_eq!(seed_for("7", 1), 54_299);
    assert_eq!(seed_for("7", 2), 54_300);
    assert_eq!(seed_for("42", 3), 1_598_628);
    // Wraps past i32::MAX and comes back negative before `abs`.
    assert_eq!(seed_for("journey-abc-123456", 7), 358_128_315);
    assert_eq!(seed_for("abcdefghijklmnop", 1), 2_121_913_516);
  }

  #[test]
  fn seeds_hash_utf16_code_units() {
    assert_eq!(seed_for("大象", 5), 714_456_898);
    // Astral characters contribute both surrogate halves.
    assert_eq!(seed_for("🐘", 1), 1_703_288_415);
  }

  #[test]
  fn known_example_selects_index_nine() {
    let pool = pool_of(10);
    let selection = select_reaction(&pool, "7", 1).unwrap();
    assert_eq!(selection.index, 9);
    assert_eq!(selection.reaction.id, 10);
    assert_eq!(selection.seed, 54_299);
  }

  #[test]
  fn selection_is_deterministic_and_order_independent() {
    let pool = pool_of(10);
    let mut shuffled = pool.clone();
    shuffled.reverse();
    for station in 0..50 {
      let a = select_reaction(&pool, "journey", station).unwrap();
      let b = select_reaction(&shuffled, "journey", station).unwrap();
      assert_eq!(a.reaction.id, b.reaction.id);
      assert!(a.index < 10);
    }
  }

  #[test]
  fn inactive_reactions_are_skipped() {
    let mut pool = pool_of(3);
    pool[0].status = ReactionStatus::Inactive;
    pool[2].status = ReactionStatus::Inactive;
    for station in 0..10 {
      let selection = select_reaction(&pool, "x", station).unwrap();
      assert_eq!(selection.reaction.id, 2);
    }
  }

  #[test]
  fn empty_active_pool_is_unavailable() {
    assert!(matches!(select_reaction(&[], "7", 1), Err(Error::ReactionUnavailable)));
    let mut pool = pool_of(2);
    for r in &mut pool {
      r.status = ReactionStatus::Inactive;
    }
    assert!(matches!(select_reaction(&pool, "7", 1), Err(Error::ReactionUnavailable)));
  }

  #[test]
  fn default_pool_is_valid() {
    let pool = default_reactions();
    assert_eq!(pool.len(), 10);
    assert!(pool.iter().all(|r| r.validate().is_ok() && r.is_active()));
    let ids: Vec<_> = pool.iter().map(|r| r.id).collect();
    assert_eq!(ids, (1..=10).collect::<Vec<_>>());
  }

  #[test]
  fn oversized_reaction_text_is_rejected() {
    let mut r = pool_of(1).remove(0);
    r.reaction_text = "x".repeat(REACTION_TEXT_MAX + 1);
    assert!(matches!(r.validate(), Err(ValidationError::TooLong { .. })));
  }
}
