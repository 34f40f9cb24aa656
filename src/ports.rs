//! External collaborators as async ports: the sentence generator and the hint generator.
//!
//! Both are best-effort. Callers never see a port error as fatal: generation
//! failures fall back to the static pool and hint failures to a generic string.

use async_trait::async_trait;
use tracing::warn;

use crate::domain::{Sentence, Tier};
use crate::taxonomy::ModifierCode;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
  #[error("service disabled: {0}")]
  Disabled(&'static str),
  #[error("request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("HTTP {status}: {message}")]
  Status { status: u16, message: String },
  #[error("could not decode response: {0}")]
  Decode(String),
}

#[async_trait]
pub trait SentenceGenerator: Send + Sync {
  /// Up to `count` sentences of the given tier, optionally focused on one modifier type.
  /// An empty list is a valid failure signal.
  async fn generate(&self, tier: Tier, count: usize, focus: Option<ModifierCode>) -> Result<Vec<Sentence>, ServiceError>;
}

#[async_trait]
pub trait HintGenerator: Send + Sync {
  async fn hint(&self, modifier_text: &str, correct: ModifierCode, wrong: ModifierCode) -> Result<String, ServiceError>;
}

/// Used when no model is configured: generation yields nothing, hints are unavailable.
#[derive(Clone, Copy, Debug, Default)]
pub struct Offline;

#[async_trait]
impl SentenceGenerator for Offline {
  async fn generate(&self, _tier: Tier, _count: usize, _focus: Option<ModifierCode>) -> Result<Vec<Sentence>, ServiceError> {
    Err(ServiceError::Disabled("no sentence generator configured"))
  }
}

#[async_trait]
impl HintGenerator for Offline {
  async fn hint(&self, _modifier_text: &str, _correct: ModifierCode, _wrong: ModifierCode) -> Result<String, ServiceError> {
    Err(ServiceError::Disabled("no hint generator configured"))
  }
}

pub fn fallback_hint(wrong: ModifierCode) -> String {
  format!(
    "It isn't a {}. Look at the first word of the span and try again.",
    wrong.label().to_lowercase()
  )
}

/// Never fails: any error or empty reply becomes the generic retry message.
pub async fn hint_or_fallback(
  hints: &dyn HintGenerator,
  modifier_text: &str,
  correct: ModifierCode,
  wrong: ModifierCode,
) -> String {
  match hints.hint(modifier_text, correct, wrong).await {
    Ok(t) if !t.trim().is_empty() => t.trim().to_string(),
    Ok(_) => fallback_hint(wrong),
    Err(e) => {
      warn!(target: "game", error = %e, "Hint generation failed; using generic hint");
      fallback_hint(wrong)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  struct Fixed(&'static str);

  #[async_trait]
  impl HintGenerator for Fixed {
    async fn hint(&self, _t: &str, _c: ModifierCode, _w: ModifierCode) -> Result<String, ServiceError> {
      Ok(self.0.to_string())
    }
  }

  #[tokio::test]
  async fn failures_and_blanks_degrade_to_generic_hint() {
    let generic = fallback_hint(ModifierCode::Rel);
    assert_eq!(hint_or_fallback(&Offline, "x", ModifierCode::Ing, ModifierCode::Rel).await, generic);
    assert_eq!(hint_or_fallback(&Fixed("  "), "x", ModifierCode::Ing, ModifierCode::Rel).await, generic);
    assert_eq!(hint_or_fallback(&Fixed(" Look at -ing. "), "x", ModifierCode::Ing, ModifierCode::Rel).await, "Look at -ing.");
  }
}
