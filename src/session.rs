//! Session orchestration: the static pool, batch assembly and the sentence queue.

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::domain::{Deck, Sentence, SentenceSource, Tier};
use crate::ports::SentenceGenerator;
use crate::taxonomy::ModifierCode;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
  #[error("no session is active")]
  NoSession,
  #[error("no sentences available for this deck; please try again")]
  EmptyBatch,
  #[error("tier {0:?} is locked")]
  Locked(Tier),
  #[error("that follow-up is not offered")]
  NotOffered,
  #[error("the session has not been diagnosed yet")]
  NotDiagnosed,
}

/// Fallback sentences: built-in seeds plus the configured bank, indexed by id.
#[derive(Clone, Debug, Default)]
pub struct StaticPool {
  by_id: HashMap<String, Sentence>,
  order: Vec<String>,
}

impl StaticPool {
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert a validated sentence. Existing ids are kept; returns false if skipped.
  pub fn insert(&mut self, s: Sentence) -> bool {
    if let Err(e) = s.validate() {
      error!(target: "session", id = %s.id, error = %e, "Skipping invalid pool sentence");
      return false;
    }
    if self.by_id.contains_key(&s.id) {
      return false;
    }
    self.order.push(s.id.clone());
    self.by_id.insert(s.id.clone(), s);
    true
  }

  pub fn get(&self, id: &str) -> Option<&Sentence> {
    self.by_id.get(id)
  }

  pub fn len(&self) -> usize {
    self.order.len()
  }

  pub fn is_empty(&self) -> bool {
    self.order.is_empty()
  }

  pub fn tier(&self, tier: Tier) -> impl Iterator<Item = &Sentence> {
    self.order
      .iter()
      .filter_map(|id| self.by_id.get(id))
      .filter(move |s| s.difficulty == tier)
  }

  /// Shuffled pick for a tier; sentences with the focus code come first.
  pub fn pick(&self, tier: Tier, count: usize, focus: Option<ModifierCode>) -> Vec<Sentence> {
    let mut rng = rand::thread_rng();
    let (mut focused, mut rest): (Vec<Sentence>, Vec<Sentence>) = self
      .tier(tier)
      .cloned()
      .partition(|s| focus.is_some_and(|c| s.modifiers.iter().any(|m| m.code == c)));
    focused.shuffle(&mut rng);
    rest.shuffle(&mut rng);
    focused.extend(rest);
    focused.truncate(count);
    focused
  }

  /// Pool sentences currently in the landfill, in landfill order.
  pub fn landfilled(&self, ids: &[String]) -> Vec<Sentence> {
    ids.iter().filter_map(|id| self.by_id.get(id).cloned()).collect()
  }
}

/// Keep the first occurrence of each sentence id.
pub fn dedup_by_id(sentences: Vec<Sentence>) -> Vec<Sentence> {
  let mut seen = HashSet::new();
  sentences.into_iter().filter(|s| seen.insert(s.id.clone())).collect()
}

/// Inputs for one batch.
#[derive(Clone, Debug)]
pub struct BatchRequest {
  pub deck: Deck,
  pub focus: Option<ModifierCode>,
  pub len: usize,
  pub landfill_min: usize,
  /// Landfilled ids at request time, oldest first.
  pub landfill_ids: Vec<String>,
  /// Tier generated when a landfill deck needs topping up.
  pub top_up_tier: Tier,
}

/// Build the ordered sentence batch for a session. Never fails on generator
/// errors; returns `EmptyBatch` only if every source came up empty.
#[instrument(level = "info", skip(generator, pool, req), fields(deck = ?req.deck, focus = ?req.focus, len = req.len))]
pub async fn assemble_batch(
  generator: &dyn SentenceGenerator,
  pool: &StaticPool,
  req: &BatchRequest,
) -> Result<Vec<Sentence>, SessionError> {
  let batch = match req.deck {
    Deck::Tier(tier) => {
      let generated = generate_valid(generator, tier, req.len, req.focus).await;
      if generated.is_empty() {
        warn!(target: "session", ?tier, "Generation yielded nothing; using static pool");
        pool.pick(tier, req.len, req.focus)
      } else {
        generated
      }
    }
    Deck::Landfill => {
      let mut batch = pool.landfilled(&req.landfill_ids);
      if batch.len() < req.landfill_min {
        let missing = req.len.saturating_sub(batch.len());
        let tier = req.top_up_tier;
        info!(target: "session", cached = batch.len(), missing, "Topping up landfill deck via generation");
        batch.extend(generate_valid(generator, tier, missing, req.focus).await);
      }
      let mut batch = dedup_by_id(batch);
      batch.truncate(req.len);
      batch
    }
  };

  if batch.is_empty() {
    error!(target: "session", deck = ?req.deck, "No sentences from generator or pool");
    return Err(SessionError::EmptyBatch);
  }
  info!(target: "session", count = batch.len(), "Batch assembled");
  Ok(batch)
}

async fn generate_valid(
  generator: &dyn SentenceGenerator,
  tier: Tier,
  count: usize,
  focus: Option<ModifierCode>,
) -> Vec<Sentence> {
  if count == 0 {
    return Vec::new();
  }
  match generator.generate(tier, count, focus).await {
    Ok(items) => {
      let items: Vec<Sentence> = items
        .into_iter()
        .filter(|s| match s.validate() {
          Ok(()) => true,
          Err(e) => {
            warn!(target: "session", id = %s.id, error = %e, "Generator returned an invalid sentence");
            false
          }
        })
        .collect();
      let mut items = dedup_by_id(items);
      items.truncate(count);
      items
    }
    Err(e) => {
      warn!(target: "session", ?tier, error = %e, "Sentence generation failed");
      Vec::new()
    }
  }
}

/// A fixed queue of sentences and a cursor.
#[derive(Clone, Debug, Serialize)]
pub struct Session {
  pub id: String,
  pub deck: Deck,
  pub focus: Option<ModifierCode>,
  pub queue: Vec<Sentence>,
  pub cursor: usize,
}

impl Session {
  pub fn new(deck: Deck, focus: Option<ModifierCode>, queue: Vec<Sentence>) -> Self {
    Self { id: uuid::Uuid::new_v4().to_string(), deck, focus, queue, cursor: 0 }
  }

  pub fn current(&self) -> Option<&Sentence> {
    self.queue.get(self.cursor)
  }

  /// Move to the next sentence; `None` once the queue is exhausted.
  pub fn advance(&mut self) -> Option<&Sentence> {
    if self.cursor < self.queue.len() {
      self.cursor += 1;
    }
    self.queue.get(self.cursor)
  }

  pub fn sentence_ids(&self) -> HashSet<String> {
    self.queue.iter().map(|s| s.id.clone()).collect()
  }

  pub fn len(&self) -> usize {
    self.queue.len()
  }

  pub fn generated_count(&self) -> usize {
    self.queue.iter().filter(|s| s.source == SentenceSource::Generated).count()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::fixtures::*;
  use crate::ports::{Offline, ServiceError};
  use crate::seeds::seed_sentences;
  use async_trait::async_trait;

  struct Canned(Vec<Sentence>);

  #[async_trait]
  impl SentenceGenerator for Canned {
    async fn generate(&self, _t: Tier, count: usize, _f: Option<ModifierCode>) -> Result<Vec<Sentence>, ServiceError> {
      Ok(self.0.iter().take(count).cloned().collect())
    }
  }

  fn pool() -> StaticPool {
    let mut p = StaticPool::new();
    for s in seed_sentences() {
      p.insert(s);
    }
    p
  }

  fn req(deck: Deck, landfill_ids: Vec<String>) -> BatchRequest {
    BatchRequest { deck, focus: None, len: 10, landfill_min: 5, landfill_ids, top_up_tier: Tier::Basic }
  }

  /// Answers with one sentence tagged with the tier it was asked for.
  struct TierEcho;

  #[async_trait]
  impl SentenceGenerator for TierEcho {
    async fn generate(&self, tier: Tier, _count: usize, _f: Option<ModifierCode>) -> Result<Vec<Sentence>, ServiceError> {
      let mut s = one_modifier(&format!("echo-{}", tier.as_str()));
      s.difficulty = tier;
      Ok(vec![s])
    }
  }

  #[test]
  fn pool_rejects_invalid_and_duplicate() {
    let mut p = pool();
    let n = p.len();
    let mut bad = one_modifier("bad");
    bad.main_verb = 99;
    assert!(!p.insert(bad));
    assert!(!p.insert(seed_sentences().remove(0)));
    assert_eq!(p.len(), n);
  }

  #[test]
  fn pick_prefers_focus_code() {
    let p = pool();
    let picked = p.pick(Tier::Basic, 1, Some(ModifierCode::Adj));
    assert_eq!(picked.len(), 1);
    assert!(picked[0].modifiers.iter().any(|m| m.code == ModifierCode::Adj));
  }

  #[tokio::test]
  async fn generation_is_used_when_it_yields() {
    let gen = Canned(vec![one_modifier("g1"), one_modifier("g2"), one_modifier("g1")]);
    let batch = assemble_batch(&gen, &pool(), &req(Deck::Tier(Tier::Basic), vec![])).await.unwrap();
    let ids: Vec<_> = batch.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["g1", "g2"]);
  }

  #[tokio::test]
  async fn failed_generation_falls_back_to_pool() {
    let batch = assemble_batch(&Offline, &pool(), &req(Deck::Tier(Tier::Basic), vec![])).await.unwrap();
    assert!(!batch.is_empty());
    assert!(batch.iter().all(|s| s.difficulty == Tier::Basic));
  }

  #[tokio::test]
  async fn empty_everything_is_an_error() {
    let out = assemble_batch(&Offline, &StaticPool::new(), &req(Deck::Tier(Tier::Basic), vec![])).await;
    assert_eq!(out.unwrap_err(), SessionError::EmptyBatch);
  }

  #[tokio::test]
  async fn landfill_deck_tops_up_and_dedups() {
    let landfilled = vec!["seed-b1".to_string(), "seed-b2".to_string()];
    let mut dup = one_modifier("seed-b1");
    dup.translation = "generated twin".into();
    let gen = Canned(vec![dup, one_modifier("fresh")]);
    let batch = assemble_batch(&gen, &pool(), &req(Deck::Landfill, landfilled)).await.unwrap();
    let ids: Vec<_> = batch.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["seed-b1", "seed-b2", "fresh"]);
    assert!(batch[0].translation != "generated twin");
  }

  #[tokio::test]
  async fn landfill_top_up_uses_the_requested_tier() {
    let mut r = req(Deck::Landfill, vec!["seed-b1".to_string()]);
    r.top_up_tier = Tier::Advanced;
    let batch = assemble_batch(&TierEcho, &pool(), &r).await.unwrap();
    let ids: Vec<_> = batch.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["seed-b1", "echo-advanced"]);
    assert_eq!(batch[1].difficulty, Tier::Advanced);
  }

  #[tokio::test]
  async fn full_landfill_skips_generation() {
    let ids: Vec<String> = seed_sentences().into_iter().take(6).map(|s| s.id).collect();
    let gen = Canned(vec![one_modifier("never")]);
    let batch = assemble_batch(&gen, &pool(), &req(Deck::Landfill, ids)).await.unwrap();
    assert_eq!(batch.len(), 6);
    assert!(batch.iter().all(|s| s.id != "never"));
  }

  #[test]
  fn session_cursor_exhausts() {
    let mut s = Session::new(Deck::Tier(Tier::Basic), None, vec![one_modifier("a"), one_modifier("b")]);
    assert_eq!(s.current().map(|x| x.id.as_str()), Some("a"));
    assert_eq!(s.advance().map(|x| x.id.as_str()), Some("b"));
    assert!(s.advance().is_none());
    assert!(s.current().is_none());
    assert!(s.advance().is_none());
    assert_eq!(s.sentence_ids().len(), 2);
  }
}
