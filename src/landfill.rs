//! The landfill: sentences the learner keeps getting wrong, queued for review.
//!
//! An entry is only created when a per-sentence mistake counter crosses its
//! threshold. Two clean review passes in a row clear it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::taxonomy::ModifierCode;

/// Range mistakes on one sentence before it is landfilled.
pub const RANGE_MISTAKE_LIMIT: u32 = 3;
/// Type-code mistakes on one sentence before it is landfilled.
pub const CODE_MISTAKE_LIMIT: u32 = 2;
/// Consecutive clean passes that clear an entry.
pub const CLEAR_AFTER: u32 = 2;

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct LandfillEntry {
  pub last_wrong_code: Option<ModifierCode>,
  pub wrong_count: u32,
  pub consecutive_correct: u32,
  pub last_attempt: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewOutcome {
  NotTracked,
  Progress(u32),
  Cleared,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct Landfill {
  entries: HashMap<String, LandfillEntry>,
}

impl Landfill {
  pub fn new() -> Self {
    Self::default()
  }

  /// Upsert: count another wrong pass and restart the clean-pass streak.
  pub fn commit(&mut self, sentence_id: &str, code: Option<ModifierCode>, now: DateTime<Utc>) -> &LandfillEntry {
    let entry = self
      .entries
      .entry(sentence_id.to_string())
      .and_modify(|e| {
        e.wrong_count += 1;
        e.consecutive_correct = 0;
        e.last_wrong_code = code;
        e.last_attempt = now;
      })
      .or_insert_with(|| LandfillEntry {
        last_wrong_code: code,
        wrong_count: 1,
        consecutive_correct: 0,
        last_attempt: now,
      });
    info!(target: "landfill", %sentence_id, wrong_count = entry.wrong_count, code = ?code, "Sentence committed to landfill");
    entry
  }

  /// A clean pass through a tracked sentence. Clears it at `CLEAR_AFTER`.
  pub fn record_success(&mut self, sentence_id: &str, now: DateTime<Utc>) -> ReviewOutcome {
    let Some(entry) = self.entries.get_mut(sentence_id) else {
      return ReviewOutcome::NotTracked;
    };
    entry.consecutive_correct += 1;
    entry.last_attempt = now;
    if entry.consecutive_correct >= CLEAR_AFTER {
      self.entries.remove(sentence_id);
      info!(target: "landfill", %sentence_id, "Sentence cleared from landfill");
      ReviewOutcome::Cleared
    } else {
      debug!(target: "landfill", %sentence_id, streak = entry.consecutive_correct, "Landfill review progress");
      ReviewOutcome::Progress(entry.consecutive_correct)
    }
  }

  /// Any miss on a tracked sentence restarts its streak. Untracked ids are ignored.
  pub fn record_miss(&mut self, sentence_id: &str, now: DateTime<Utc>) {
    if let Some(entry) = self.entries.get_mut(sentence_id) {
      if entry.consecutive_correct > 0 {
        debug!(target: "landfill", %sentence_id, "Landfill streak reset");
      }
      entry.consecutive_correct = 0;
      entry.last_attempt = now;
    }
  }

  pub fn get(&self, sentence_id: &str) -> Option<&LandfillEntry> {
    self.entries.get(sentence_id)
  }

  pub fn contains(&self, sentence_id: &str) -> bool {
    self.entries.contains_key(sentence_id)
  }

  /// Tracked ids, oldest attempt first.
  pub fn ids(&self) -> Vec<String> {
    let mut v: Vec<(&String, &LandfillEntry)> = self.entries.iter().collect();
    v.sort_by(|a, b| a.1.last_attempt.cmp(&b.1.last_attempt).then_with(|| a.0.cmp(b.0)));
    v.into_iter().map(|(id, _)| id.clone()).collect()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
