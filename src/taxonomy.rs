//! Static reference data: modifier type codes and subject type codes.
//!
//! Codes travel on the wire as short upper-case strings (`"REL"`, `"ING"`, ...),
//! which is also what the generator is asked to emit.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Grammatical constituent that follows and qualifies the head noun.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModifierCode {
  #[serde(rename = "PREP")]
  Prep,
  #[serde(rename = "REL")]
  Rel,
  #[serde(rename = "ING")]
  Ing,
  #[serde(rename = "ED")]
  Ed,
  #[serde(rename = "TO")]
  To,
  #[serde(rename = "ADJ")]
  Adj,
  #[serde(rename = "APPOS")]
  Appos,
}

impl ModifierCode {
  pub const ALL: [ModifierCode; 7] = [
    ModifierCode::Prep,
    ModifierCode::Rel,
    ModifierCode::Ing,
    ModifierCode::Ed,
    ModifierCode::To,
    ModifierCode::Adj,
    ModifierCode::Appos,
  ];

  pub fn code(self) -> &'static str {
    match self {
      ModifierCode::Prep => "PREP",
      ModifierCode::Rel => "REL",
      ModifierCode::Ing => "ING",
      ModifierCode::Ed => "ED",
      ModifierCode::To => "TO",
      ModifierCode::Adj => "ADJ",
      ModifierCode::Appos => "APPOS",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      ModifierCode::Prep => "Prepositional phrase",
      ModifierCode::Rel => "Relative clause",
      ModifierCode::Ing => "Present participle phrase",
      ModifierCode::Ed => "Past participle phrase",
      ModifierCode::To => "To-infinitive phrase",
      ModifierCode::Adj => "Adjective phrase",
      ModifierCode::Appos => "Appositive",
    }
  }

  pub fn description(self) -> &'static str {
    match self {
      ModifierCode::Prep => "Starts with a preposition (in, on, with, of...) and ends with its object.",
      ModifierCode::Rel => "A clause introduced by who, which, that, whose or where, with its own verb.",
      ModifierCode::Ing => "An -ing verb form describing what the noun is doing.",
      ModifierCode::Ed => "A past participle describing what was done to the noun.",
      ModifierCode::To => "A to + verb phrase describing the noun's purpose or what is to be done.",
      ModifierCode::Adj => "An adjective with its complement placed after the noun.",
      ModifierCode::Appos => "A second noun phrase renaming the head noun, usually set off by commas.",
    }
  }

  pub fn example(self) -> &'static str {
    match self {
      ModifierCode::Prep => "the book [on the table]",
      ModifierCode::Rel => "the man [who lives next door]",
      ModifierCode::Ing => "the girl [playing the piano]",
      ModifierCode::Ed => "the letter [written in pencil]",
      ModifierCode::To => "a chance [to win the prize]",
      ModifierCode::Adj => "a basket [full of apples]",
      ModifierCode::Appos => "my brother, [a doctor],",
    }
  }
}

impl fmt::Display for ModifierCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.code())
  }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown taxonomy code: {0}")]
pub struct UnknownCode(pub String);

impl FromStr for ModifierCode {
  type Err = UnknownCode;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = s.trim();
    ModifierCode::ALL
      .into_iter()
      .find(|c| c.code().eq_ignore_ascii_case(wanted))
      .ok_or_else(|| UnknownCode(s.to_string()))
  }
}

/// Shape of the grammatical subject the head noun sits in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubjectCode {
  #[serde(rename = "NOUN")]
  Noun,
  #[serde(rename = "PRONOUN")]
  Pronoun,
  #[serde(rename = "GERUND")]
  Gerund,
  #[serde(rename = "TO_INF")]
  ToInf,
  #[serde(rename = "CLAUSE")]
  Clause,
}

impl SubjectCode {
  pub const ALL: [SubjectCode; 5] = [
    SubjectCode::Noun,
    SubjectCode::Pronoun,
    SubjectCode::Gerund,
    SubjectCode::ToInf,
    SubjectCode::Clause,
  ];

  pub fn code(self) -> &'static str {
    match self {
      SubjectCode::Noun => "NOUN",
      SubjectCode::Pronoun => "PRONOUN",
      SubjectCode::Gerund => "GERUND",
      SubjectCode::ToInf => "TO_INF",
      SubjectCode::Clause => "CLAUSE",
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      SubjectCode::Noun => "Noun phrase",
      SubjectCode::Pronoun => "Pronoun",
      SubjectCode::Gerund => "Gerund phrase",
      SubjectCode::ToInf => "To-infinitive phrase",
      SubjectCode::Clause => "Noun clause",
    }
  }

  pub fn description(self) -> &'static str {
    match self {
      SubjectCode::Noun => "A noun with its determiners and modifiers.",
      SubjectCode::Pronoun => "A pronoun standing in for a noun phrase.",
      SubjectCode::Gerund => "An -ing form acting as a noun.",
      SubjectCode::ToInf => "A to + verb phrase acting as a noun.",
      SubjectCode::Clause => "A that/what/whether clause acting as a noun.",
    }
  }

  pub fn example(self) -> &'static str {
    match self {
      SubjectCode::Noun => "[The old car] broke down.",
      SubjectCode::Pronoun => "[Everyone] agreed.",
      SubjectCode::Gerund => "[Reading novels] relaxes me.",
      SubjectCode::ToInf => "[To finish on time] was hard.",
      SubjectCode::Clause => "[What she said] surprised us.",
    }
  }
}

impl fmt::Display for SubjectCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.code())
  }
}

impl FromStr for SubjectCode {
  type Err = UnknownCode;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = s.trim();
    SubjectCode::ALL
      .into_iter()
      .find(|c| c.code().eq_ignore_ascii_case(wanted))
      .ok_or_else(|| UnknownCode(s.to_string()))
  }
}

/// One catalogue row, as served to the renderer.
#[derive(Debug, Clone, Serialize)]
pub struct TaxonomyItem {
  pub code: &'static str,
  pub label: &'static str,
  pub description: &'static str,
  pub example: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaxonomyOut {
  pub modifiers: Vec<TaxonomyItem>,
  pub subjects: Vec<TaxonomyItem>,
}

pub fn catalogue() -> TaxonomyOut {
  TaxonomyOut {
    modifiers: ModifierCode::ALL
      .into_iter()
      .map(|c| TaxonomyItem { code: c.code(), label: c.label(), description: c.description(), example: c.example() })
      .collect(),
    subjects: SubjectCode::ALL
      .into_iter()
      .map(|c| TaxonomyItem { code: c.code(), label: c.label(), description: c.description(), example: c.example() })
      .collect(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn codes_parse_case_insensitively_and_match_serde() {
    for c in ModifierCode::ALL {
      assert_eq!(c.code().to_lowercase().parse::<ModifierCode>().unwrap(), c);
      let json = serde_json::to_string(&c).unwrap();
      assert_eq!(json, format!("\"{}\"", c.code()));
    }
    for c in SubjectCode::ALL {
      assert_eq!(c.code().parse::<SubjectCode>().unwrap(), c);
      let json = serde_json::to_string(&c).unwrap();
      assert_eq!(json, format!("\"{}\"", c.code()));
    }
    assert!("NOPE".parse::<ModifierCode>().is_err());
  }

  #[test]
  fn catalogue_lists_everything() {
    let cat = catalogue();
    assert_eq!(cat.modifiers.len(), ModifierCode::ALL.len());
    assert_eq!(cat.subjects.len(), SubjectCode::ALL.len());
  }
}
