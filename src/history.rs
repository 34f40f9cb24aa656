//! Append-only answer log. One record per user-facing answer attempt, in the order
//! the attempts happened. Records are never edited or removed.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::taxonomy::ModifierCode;

/// Which step the answer belonged to. Doubles as the mistake category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
  Noun,
  Range,
  Code,
  Verb,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryRecord {
  pub sentence_id: String,
  pub kind: AnswerKind,
  pub correct: bool,
  /// Type code of the modifier involved (range/code answers only).
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub modifier_code: Option<ModifierCode>,
  pub at: DateTime<Utc>,
}

impl HistoryRecord {
  /// Mistake category; `None` for correct answers.
  pub fn mistake(&self) -> Option<AnswerKind> {
    (!self.correct).then_some(self.kind)
  }
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct HistoryLog {
  records: Vec<HistoryRecord>,
}

impl HistoryLog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn append(&mut self, record: HistoryRecord) {
    self.records.push(record);
  }

  pub fn iter(&self) -> impl Iterator<Item = &HistoryRecord> {
    self.records.iter()
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }

  /// Records whose sentence id is in `ids`, oldest first.
  pub fn for_sentences<'a>(&'a self, ids: &'a HashSet<String>) -> impl Iterator<Item = &'a HistoryRecord> + 'a {
    self.records.iter().filter(move |r| ids.contains(&r.sentence_id))
  }
}
