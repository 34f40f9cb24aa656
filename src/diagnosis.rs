//! End-of-session diagnosis: accuracy, weakest modifier code, and what to practise next.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::history::{AnswerKind, HistoryLog};
use crate::taxonomy::ModifierCode;

/// Skill area the feedback points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Focus {
  Mastery,
  Spans,
  Types,
  Skeleton,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnosis {
  pub attempts: usize,
  pub corrects: usize,
  /// 0–100.
  pub accuracy: f64,
  pub weakest: Option<ModifierCode>,
  pub range_mistakes: usize,
  pub code_mistakes: usize,
  pub focus: Focus,
  pub feedback: String,
  pub offers: Vec<NextAction>,
}

/// What the learner can do after the report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NextAction {
  /// New batch from the same deck.
  Continue,
  /// New batch focused on one modifier type.
  RetryWeakness { code: ModifierCode },
  Exit,
}

/// Pure function of the history log and the session's sentence ids.
pub fn diagnose(history: &HistoryLog, session_ids: &HashSet<String>) -> Diagnosis {
  let mut attempts = 0usize;
  let mut corrects = 0usize;
  let mut range_mistakes = 0usize;
  let mut code_mistakes = 0usize;
  let mut other_mistakes = 0usize;
  // insertion order = first appearance; keeps tie-breaking deterministic
  let mut per_code: Vec<(ModifierCode, usize)> = Vec::new();

  for r in history.for_sentences(session_ids) {
    attempts += 1;
    let Some(kind) = r.mistake() else {
      corrects += 1;
      continue;
    };
    match kind {
      AnswerKind::Range => range_mistakes += 1,
      AnswerKind::Code => code_mistakes += 1,
      AnswerKind::Noun | AnswerKind::Verb => other_mistakes += 1,
    }
    if let Some(code) = r.modifier_code {
      match per_code.iter_mut().find(|(c, _)| *c == code) {
        Some((_, n)) => *n += 1,
        None => per_code.push((code, 1)),
      }
    }
  }

  let accuracy = if attempts == 0 { 0.0 } else { corrects as f64 / attempts as f64 * 100.0 };

  let mut weakest: Option<(ModifierCode, usize)> = None;
  for &(code, n) in &per_code {
    if weakest.map_or(true, |(_, best)| n > best) {
      weakest = Some((code, n));
    }
  }
  let weakest = weakest.map(|(c, _)| c);

  let (focus, feedback) = if range_mistakes > code_mistakes {
    (
      Focus::Spans,
      "Most slips were about where a modifier starts and ends. Practise spotting the first and last word of each span.".to_string(),
    )
  } else if code_mistakes > 0 {
    let detail = weakest
      .map(|c| format!(" {} gave you the most trouble.", c.label()))
      .unwrap_or_default();
    (
      Focus::Types,
      format!("You find the spans well, but naming the modifier type needs work.{detail}"),
    )
  } else if other_mistakes > 0 {
    (
      Focus::Skeleton,
      "Modifiers went well. Keep practising the sentence skeleton: head noun first, then its main verb.".to_string(),
    )
  } else {
    (Focus::Mastery, "Flawless session! Every sentence was swept clean.".to_string())
  };

  let mut offers = vec![NextAction::Continue];
  if let Some(code) = weakest {
    offers.push(NextAction::RetryWeakness { code });
  }
  offers.push(NextAction::Exit);

  Diagnosis { attempts, corrects, accuracy, weakest, range_mistakes, code_mistakes, focus, feedback, offers }
}
