//! Domain models: difficulty tiers, decks, modifier spans and the sentence itself.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::taxonomy::{ModifierCode, SubjectCode};

/// Difficulty tier of a sentence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
  Basic,
  Intermediate,
  Advanced,
}

impl Tier {
  /// Tier unlocked after doing well on this one.
  pub fn next(self) -> Option<Tier> {
    match self {
      Tier::Basic => Some(Tier::Intermediate),
      Tier::Intermediate => Some(Tier::Advanced),
      Tier::Advanced => None,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Tier::Basic => "basic",
      Tier::Intermediate => "intermediate",
      Tier::Advanced => "advanced",
    }
  }
}

/// What a session draws from: a regular tier, or the landfill pseudo-tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Deck {
  Tier(Tier),
  Landfill,
}

/// Where did we get the sentence from?
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SentenceSource {
  #[default]
  Seed,       // built-in pool
  LocalBank,  // from the TOML bank
  Generated,  // produced by the sentence generator
}

/// Contiguous, inclusive token range plus its type code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
  pub start: usize,
  pub end: usize,
  pub code: ModifierCode,
}

impl Modifier {
  pub fn contains(&self, idx: usize) -> bool {
    self.start <= idx && idx <= self.end
  }

  pub fn text(&self, tokens: &[String]) -> String {
    tokens
      .get(self.start..=self.end.min(tokens.len().saturating_sub(1)))
      .map(|ts| ts.join(" "))
      .unwrap_or_default()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SentenceError {
  #[error("sentence has no tokens")]
  NoTokens,
  #[error("head noun index {0} is out of bounds")]
  HeadNounOutOfBounds(usize),
  #[error("main verb index {0} is out of bounds")]
  MainVerbOutOfBounds(usize),
  #[error("head noun and main verb share index {0}")]
  HeadIsVerb(usize),
  #[error("modifier {index} has start {start} after end {end}")]
  InvertedModifier { index: usize, start: usize, end: usize },
  #[error("modifier {index} ends at {end}, past the last token")]
  ModifierOutOfBounds { index: usize, end: usize },
  #[error("modifier {index} covers the head noun or main verb")]
  ModifierCoversCore { index: usize },
  #[error("modifier {index} overlaps or precedes the previous modifier")]
  ModifiersUnordered { index: usize },
}

/// One exercise item. Immutable once fetched.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Sentence {
  pub id: String,
  pub tokens: Vec<String>,
  pub head_noun: usize,
  pub main_verb: usize,
  #[serde(default)]
  pub modifiers: Vec<Modifier>,
  pub subject_type: SubjectCode,
  #[serde(default)]
  pub translation: String,
  pub difficulty: Tier,
  #[serde(default)]
  pub source: SentenceSource,
}

impl Sentence {
  /// Check the structural invariants every sentence must satisfy before it is played.
  pub fn validate(&self) -> Result<(), SentenceError> {
    let len = self.tokens.len();
    if len == 0 {
      return Err(SentenceError::NoTokens);
    }
    if self.head_noun >= len {
      return Err(SentenceError::HeadNounOutOfBounds(self.head_noun));
    }
    if self.main_verb >= len {
      return Err(SentenceError::MainVerbOutOfBounds(self.main_verb));
    }
    if self.head_noun == self.main_verb {
      return Err(SentenceError::HeadIsVerb(self.head_noun));
    }

    let mut prev_end: Option<usize> = None;
    for (index, m) in self.modifiers.iter().enumerate() {
      if m.start > m.end {
        return Err(SentenceError::InvertedModifier { index, start: m.start, end: m.end });
      }
      if m.end >= len {
        return Err(SentenceError::ModifierOutOfBounds { index, end: m.end });
      }
      if m.contains(self.head_noun) || m.contains(self.main_verb) {
        return Err(SentenceError::ModifierCoversCore { index });
      }
      if let Some(p) = prev_end {
        if m.start <= p {
          return Err(SentenceError::ModifiersUnordered { index });
        }
      }
      prev_end = Some(m.end);
    }
    Ok(())
  }

  pub fn text(&self) -> String {
    self.tokens.join(" ")
  }

  pub fn modifier_text(&self, index: usize) -> String {
    self.modifiers
      .get(index)
      .map(|m| m.text(&self.tokens))
      .unwrap_or_default()
  }

  /// Index of the cleaned modifier whose span covers `token`, if any.
  pub fn cleaned_modifier_at(&self, token: usize, cleaned: &BTreeSet<usize>) -> Option<usize> {
    cleaned
      .iter()
      .copied()
      .find(|&i| self.modifiers.get(i).is_some_and(|m| m.contains(token)))
  }
}

#[cfg(test)]
pub(crate) mod fixtures {
  use super::*;

  pub fn toks(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_string).collect()
  }

  /// "Our new teacher , from the north , who plays chess , loved by everyone , teaches math ."
  /// head noun 2, modifiers [4,6] PREP, [8,10] REL, [12,14] ED, main verb 16.
  pub fn three_modifiers() -> Sentence {
    Sentence {
      id: "t-three".into(),
      tokens: toks("Our new teacher , from the north , who plays chess , loved by everyone , teaches math ."),
      head_noun: 2,
      main_verb: 16,
      modifiers: vec![
        Modifier { start: 4, end: 6, code: ModifierCode::Prep },
        Modifier { start: 8, end: 10, code: ModifierCode::Rel },
        Modifier { start: 12, end: 14, code: ModifierCode::Ed },
      ],
      subject_type: SubjectCode::Noun,
      translation: String::new(),
      difficulty: Tier::Intermediate,
      source: SentenceSource::Seed,
    }
  }

  /// "My sister , a nurse at the clinic , works nights ."
  /// head noun 1, appositive [3,7], main verb 9.
  pub fn one_modifier(id: &str) -> Sentence {
    Sentence {
      id: id.into(),
      tokens: toks("My sister , a nurse at the clinic , works nights ."),
      head_noun: 1,
      main_verb: 9,
      modifiers: vec![Modifier { start: 3, end: 7, code: ModifierCode::Appos }],
      subject_type: SubjectCode::Noun,
      translation: String::new(),
      difficulty: Tier::Basic,
      source: SentenceSource::Seed,
    }
  }

  pub fn no_modifiers(id: &str) -> Sentence {
    Sentence {
      id: id.into(),
      tokens: toks("Birds sing ."),
      head_noun: 0,
      main_verb: 1,
      modifiers: vec![],
      subject_type: SubjectCode::Noun,
      translation: String::new(),
      difficulty: Tier::Basic,
      source: SentenceSource::Seed,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::fixtures::*;
  use super::*;

  #[test]
  fn fixtures_are_valid() {
    three_modifiers().validate().unwrap();
    one_modifier("x").validate().unwrap();
    no_modifiers("y").validate().unwrap();
  }

  #[test]
  fn modifier_covering_head_noun_is_rejected() {
    let mut s = three_modifiers();
    s.modifiers[0].start = 2;
    assert_eq!(s.validate(), Err(SentenceError::ModifierCoversCore { index: 0 }));
  }

  #[test]
  fn out_of_bounds_and_overlap_are_rejected() {
    let mut s = three_modifiers();
    s.modifiers[2].end = 99;
    assert!(matches!(s.validate(), Err(SentenceError::ModifierOutOfBounds { index: 2, .. })));

    let mut s = three_modifiers();
    s.modifiers[1].start = 6;
    assert_eq!(s.validate(), Err(SentenceError::ModifiersUnordered { index: 1 }));

    let mut s = three_modifiers();
    s.main_verb = s.head_noun;
    assert_eq!(s.validate(), Err(SentenceError::HeadIsVerb(2)));
  }

  #[test]
  fn modifier_text_joins_span() {
    let s = three_modifiers();
    assert_eq!(s.modifier_text(1), "who plays chess");
    assert_eq!(s.modifier_text(7), "");
  }

  #[test]
  fn cleaned_lookup_only_sees_cleaned_modifiers() {
    let s = three_modifiers();
    let cleaned: BTreeSet<usize> = [1].into_iter().collect();
    assert_eq!(s.cleaned_modifier_at(9, &cleaned), Some(1));
    assert_eq!(s.cleaned_modifier_at(5, &cleaned), None);
  }
}
