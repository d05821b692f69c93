//! The closed pool of quests a holder can be given.
//!
//! Assignment draws from a real entropy source; it is intentionally not
//! reproducible. Compare [`crate::reaction::seed_for`], which is.

use rand_core::RngCore;
use serde::Serialize;

/// Key recorded as `prompt_key` on the first event of every chain.
pub const START_KEY: &str = "START";

/// Key recorded when the tail event carries no `next_prompt_key`.
pub const UNKNOWN_KEY: &str = "UNKNOWN";

/// An instruction describing whom to pass the keychain to next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Prompt {
  pub key:  &'static str,
  pub text: &'static str,
}

pub const PROMPT_POOL: &[Prompt] = &[
  Prompt { key: "MOST_WORRIED", text: "最擔心嘅人" },
  Prompt { key: "MOST_COMFORTABLE", text: "相處最舒服嘅人" },
  Prompt { key: "FAVORITE_PERSON", text: "最喜歡嘅人" },
  Prompt { key: "MOST_BLESSED", text: "最想祝福嘅人" },
  Prompt { key: "MOST_TRUSTED", text: "最信任嘅人" },
  Prompt { key: "MOST_GRATEFUL", text: "最想多謝嘅人" },
  Prompt { key: "NEEDS_HUG", text: "最需要被安慰嘅人" },
  Prompt { key: "SECRET_ADMIRER", text: "一直默默留意嘅人" },
  Prompt { key: "MADE_YOU_LAUGH", text: "最近令你大笑嘅人" },
  Prompt { key: "LONG_TIME_NO_SEE", text: "好耐無見嘅舊朋友" },
  Prompt { key: "HARD_WORKING", text: "最近好努力加油緊嘅人" },
  Prompt { key: "KIND_STRANGER", text: "對你好好嘅陌生人" },
  Prompt { key: "CRAZY_FRIEND", text: "性格最瘋狂但最真誠嘅朋友" },
  Prompt { key: "INSPIRE_YOU", text: "帶畀你啟發或者動力嘅人" },
  Prompt { key: "FOODIE_PARTNER", text: "最想同佢一齊去食好嘢嘅人" },
];

/// Look a prompt up by key.
pub fn lookup(key: &str) -> Option<&'static Prompt> {
  PROMPT_POOL.iter().find(|p| p.key == key)
}

/// Draw a quest uniformly at random from [`PROMPT_POOL`].
pub fn assign_quest(rng: &mut impl RngCore) -> &'static Prompt {
  &PROMPT_POOL[uniform_index(rng, PROMPT_POOL.len())]
}

/// Unbiased index in `0..len` by rejection sampling. `len` must be non-zero.
fn uniform_index(rng: &mut impl RngCore, len: usize) -> usize {
  let len = len as u32;
  let zone = u32::MAX - (u32::MAX % len);
  loop {
    let v = rng.next_u32();
    if v < zone {
      return (v % len) as usize;
    }
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use std::collections::HashSet;

  use rand_core::{OsRng, impls};

  use super::*;

  /// Deterministic counter RNG for tests.
  pub struct StepRng(pub u32);

  impl RngCore for StepRng {
    fn next_u32(&mut self) -> u32 {
      let v = self.0;
      self.0 = self.0.wrapping_add(1);
      v
    }
    fn next_u64(&mut self) -> u64 { impls::next_u64_via_u32(self) }
    fn fill_bytes(&mut self, dest: &mut [u8]) { impls::fill_bytes_via_next(self, dest) }
    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
      self.fill_bytes(dest);
      Ok(())
    }
  }

  #[test]
  fn pool_keys_are_unique_and_texts_nonempty() {
    let keys: HashSet<_> = PROMPT_POOL.iter().map(|p| p.key).collect();
    assert_eq!(keys.len(), PROMPT_POOL.len());
    assert!(PROMPT_POOL.iter().all(|p| !p.text.is_empty()));
    assert!(!keys.contains(START_KEY) && !keys.contains(UNKNOWN_KEY));
  }

  #[test]
  fn assign_quest_walks_the_pool() {
    let mut rng = StepRng(0);
    let picked: Vec<_> = (0..PROMPT_POOL.len()).map(|_| assign_quest(&mut rng).key).collect();
    let expected: Vec<_> = PROMPT_POOL.iter().map(|p| p.key).collect();
    assert_eq!(picked, expected);
  }

  #[test]
  fn assign_quest_with_os_rng_returns_pool_member() {
    let prompt = assign_quest(&mut OsRng);
    assert_eq!(lookup(prompt.key), Some(prompt));
  }

  #[test]
  fn rejection_zone_skips_biased_tail() {
    // u32::MAX itself lies in the biased tail for a pool of 15.
    let mut rng = StepRng(u32::MAX);
    // Wraps to 0 after rejecting u32::MAX.
    assert_eq!(uniform_index(&mut rng, 15), 0);
  }
}
