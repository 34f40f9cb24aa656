//! Loading agent configuration (prompts, game tuning, optional sentence bank) from TOML.
//!
//! See `AgentConfig`, `Prompts` and `GameSettings` for the expected schema.

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::Sentence;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub game: GameSettings,
  /// Extra static-pool sentences. Validated on load; invalid ones are skipped.
  #[serde(default)]
  pub sentences: Vec<Sentence>,
}

/// Tuning knobs for sessions and the step machine.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GameSettings {
  pub session_len: usize,
  /// Below this many landfilled pool sentences, a landfill deck is topped up by generation.
  pub landfill_min: usize,
  pub question_delay_ms: u64,
  /// Session accuracy (0–100) that unlocks the next tier.
  pub unlock_accuracy: f64,
}

impl Default for GameSettings {
  fn default() -> Self {
    Self { session_len: 10, landfill_min: 5, question_delay_ms: 1200, unlock_accuracy: 80.0 }
  }
}

/// Prompts used by the OpenAI client. Defaults are tuned for English syntax practice.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub sentences_system: String,
  pub sentences_user_template: String,
  pub focus_clause_template: String,
  pub hint_system: String,
  pub hint_user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      sentences_system: "You are an English grammar content generator for learners. Respond ONLY with strict JSON.".into(),
      sentences_user_template: concat!(
        "Generate {count} English sentences at difficulty '{difficulty}'. Each sentence has a subject whose head noun ",
        "is followed by one to three post-modifiers, then the main verb.{focus}\n",
        "Return JSON {\"sentences\": [{\"tokens\": [string], \"head_noun\": int, \"main_verb\": int, ",
        "\"modifiers\": [{\"start\": int, \"end\": int, \"code\": string}], \"subject_type\": string, \"translation\": string}]}.\n",
        "Tokens are words and punctuation marks in order; indices are 0-based; modifier ranges are inclusive, ",
        "left-to-right, non-overlapping and never include the head noun or main verb.\n",
        "Modifier codes: {modifier_codes}. Subject codes: {subject_codes}. Translation is Korean."
      )
      .into(),
      focus_clause_template: " Every sentence must contain at least one {code} modifier ({label}).".into(),
      hint_system: "You are a friendly English grammar coach. Keep hints under 25 words and do NOT name the correct answer.".into(),
      hint_user_template: concat!(
        "The learner is classifying the modifier \"{modifier_text}\". The correct type is {correct} ({correct_label}), ",
        "but they chose {wrong} ({wrong_label}). Give ONE short hint that points at the clue in the words."
      )
      .into(),
    }
  }
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_agent_config(&s) {
      Ok(cfg) => {
        info!(target: "syntax_sweep", %path, bank = cfg.sentences.len(), "Loaded agent config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "syntax_sweep", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "syntax_sweep", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

pub fn parse_agent_config(s: &str) -> Result<AgentConfig, toml::de::Error> {
  toml::from_str::<AgentConfig>(s)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{SentenceSource, Tier};

  #[test]
  fn empty_config_uses_defaults() {
    let cfg = parse_agent_config("").unwrap();
    assert_eq!(cfg.game.session_len, 10);
    assert_eq!(cfg.game.landfill_min, 5);
    assert!(cfg.sentences.is_empty());
    assert!(cfg.prompts.sentences_user_template.contains("{count}"));
  }

  #[test]
  fn partial_game_section_and_bank() {
    let cfg = parse_agent_config(
      r#"
      [game]
      session_len = 4

      [[sentences]]
      id = "bank-1"
      tokens = ["Dogs", "with", "spots", "bark", "."]
      head_noun = 0
      main_verb = 3
      modifiers = [{ start = 1, end = 2, code = "PREP" }]
      subject_type = "NOUN"
      difficulty = "basic"
      "#,
    )
    .unwrap();
    assert_eq!(cfg.game.session_len, 4);
    assert_eq!(cfg.game.question_delay_ms, 1200);
    let s = &cfg.sentences[0];
    assert_eq!(s.difficulty, Tier::Basic);
    assert_eq!(s.source, SentenceSource::Seed);
    s.validate().unwrap();
  }
}
