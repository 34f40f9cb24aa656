//! Process-wide learner progress. Mutated only through the named operations below.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::domain::Tier;
use crate::history::{AnswerKind, HistoryLog, HistoryRecord};
use crate::landfill::{Landfill, ReviewOutcome};
use crate::taxonomy::ModifierCode;

pub const BASE_EXPERIENCE: u64 = 10;
pub const COMBO_BONUS: u64 = 2;

#[derive(Clone, Debug, Serialize)]
pub struct UserProgress {
  pub experience: u64,
  pub combo: u32,
  pub landfill: Landfill,
  pub history: HistoryLog,
  pub tutorial_done: bool,
  pub unlocked: BTreeSet<Tier>,
}

impl Default for UserProgress {
  fn default() -> Self {
    Self {
      experience: 0,
      combo: 0,
      landfill: Landfill::new(),
      history: HistoryLog::new(),
      tutorial_done: false,
      unlocked: [Tier::Basic].into_iter().collect(),
    }
  }
}

impl UserProgress {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn record_answer(
    &mut self,
    sentence_id: &str,
    kind: AnswerKind,
    correct: bool,
    modifier_code: Option<ModifierCode>,
    now: DateTime<Utc>,
  ) {
    self.history.append(HistoryRecord {
      sentence_id: sentence_id.to_string(),
      kind,
      correct,
      modifier_code,
      at: now,
    });
  }

  pub fn reset_combo(&mut self) {
    self.combo = 0;
  }

  pub fn commit_to_landfill(&mut self, sentence_id: &str, code: Option<ModifierCode>, now: DateTime<Utc>) {
    self.landfill.commit(sentence_id, code, now);
  }

  pub fn note_landfill_miss(&mut self, sentence_id: &str, now: DateTime<Utc>) {
    self.landfill.record_miss(sentence_id, now);
  }

  /// Experience for a solved sentence at the current combo, before it is incremented.
  pub fn experience_for_solve(&self) -> u64 {
    BASE_EXPERIENCE + COMBO_BONUS * self.combo as u64
  }

  pub fn award_experience(&mut self, points: u64) {
    self.experience += points;
  }

  /// Main verb found: award experience and extend the combo. `review_pass` is a
  /// clean pass in the landfill deck; only those move a landfill entry towards
  /// clearing. Returns the points awarded.
  pub fn complete_sentence(&mut self, sentence_id: &str, review_pass: bool, now: DateTime<Utc>) -> u64 {
    let points = self.experience_for_solve();
    self.award_experience(points);
    self.combo += 1;
    if review_pass {
      let outcome = self.landfill.record_success(sentence_id, now);
      if outcome != ReviewOutcome::NotTracked {
        debug!(target: "game", %sentence_id, ?outcome, "Landfill review pass");
      }
    }
    points
  }

  pub fn complete_tutorial(&mut self) {
    self.tutorial_done = true;
  }

  /// Returns true if the tier was newly unlocked.
  pub fn unlock(&mut self, tier: Tier) -> bool {
    self.unlocked.insert(tier)
  }

  /// Highest tier the learner may play; landfill top-ups are generated at this level.
  pub fn highest_unlocked(&self) -> Tier {
    self.unlocked.iter().next_back().copied().unwrap_or(Tier::Basic)
  }

  pub fn is_unlocked(&self, tier: Tier) -> bool {
    self.unlocked.contains(&tier)
  }
}
