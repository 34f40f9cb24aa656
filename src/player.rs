//! The single logical controller for one learner: owns progress, the current
//! session and the current sentence's step state, and applies the effects the
//! step machine emits.
//!
//! Nothing here awaits. Slow work (batch generation, hints, the question timer)
//! is handed back to the caller as a `PendingBatch` or `Followup` and its result
//! comes back through `load_batch` / `question_elapsed` / `hint_arrived`, where
//! stale completions are dropped.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::GameSettings;
use crate::diagnosis::{diagnose, Diagnosis, NextAction};
use crate::domain::{Deck, Modifier, Sentence, Tier};
use crate::game::{transition, Cue, Effect, Event, Feedback, GameError, GameState, HintRequest, HintTicket, Step};
use crate::progress::UserProgress;
use crate::session::{BatchRequest, Session, SessionError};
use crate::taxonomy::ModifierCode;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlayError {
  #[error(transparent)]
  Game(#[from] GameError),
  #[error(transparent)]
  Session(#[from] SessionError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  Selecting,
  Loading,
  Playing,
  Diagnosed,
}

/// A batch the caller must assemble and hand back with `load_batch`.
#[derive(Clone, Debug)]
pub struct PendingBatch {
  pub ticket: u64,
  pub request: BatchRequest,
}

/// Asynchronous work requested by a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Followup {
  /// Call `question_elapsed(epoch)` after the question delay.
  AdvanceAfter { epoch: u64 },
  /// Resolve a hint and call `hint_arrived`.
  Hint(HintRequest),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Applied {
  /// False when a stale completion was discarded.
  pub changed: bool,
  pub followups: Vec<Followup>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdvanceOutcome {
  NextSentence { cursor: usize },
  Diagnosed,
}

#[derive(Clone, Copy, Debug)]
struct Loading {
  ticket: u64,
  deck: Deck,
  focus: Option<ModifierCode>,
}

pub struct Player {
  settings: GameSettings,
  progress: UserProgress,
  phase: Phase,
  session: Option<Session>,
  game: Option<GameState>,
  diagnosis: Option<Diagnosis>,
  /// Batch currently being assembled.
  loading: Option<Loading>,
  last_ticket: u64,
  /// Highest epoch handed out so far; new sentences continue from here.
  epoch: u64,
  cue: Option<Cue>,
  notice: Feedback,
}

impl Player {
  pub fn new(settings: GameSettings) -> Self {
    Self {
      settings,
      progress: UserProgress::new(),
      phase: Phase::Selecting,
      session: None,
      game: None,
      diagnosis: None,
      loading: None,
      last_ticket: 0,
      epoch: 0,
      cue: None,
      notice: Feedback { text: "Pick a tier to start sweeping sentences.".into(), is_error: false },
    }
  }

  pub fn progress(&self) -> &UserProgress {
    &self.progress
  }

  pub fn phase(&self) -> Phase {
    self.phase
  }

  pub fn session(&self) -> Option<&Session> {
    self.session.as_ref()
  }

  pub fn game(&self) -> Option<&GameState> {
    self.game.as_ref()
  }

  pub fn diagnosis(&self) -> Option<&Diagnosis> {
    self.diagnosis.as_ref()
  }

  /// Leave whatever is going on and ask for a new batch.
  pub fn begin_session(&mut self, deck: Deck, focus: Option<ModifierCode>) -> Result<PendingBatch, PlayError> {
    if let Deck::Tier(tier) = deck {
      if !self.progress.is_unlocked(tier) {
        return Err(SessionError::Locked(tier).into());
      }
    }
    self.drop_session();
    self.last_ticket += 1;
    self.loading = Some(Loading { ticket: self.last_ticket, deck, focus });
    self.phase = Phase::Loading;
    self.notice = Feedback { text: "Preparing sentences...".into(), is_error: false };
    info!(target: "session", ticket = self.last_ticket, ?deck, ?focus, "Session requested");
    Ok(PendingBatch {
      ticket: self.last_ticket,
      request: BatchRequest {
        deck,
        focus,
        len: self.settings.session_len,
        landfill_min: self.settings.landfill_min,
        landfill_ids: self.progress.landfill.ids(),
        top_up_tier: self.progress.highest_unlocked(),
      },
    })
  }

  /// Hand back an assembled batch. Returns Ok(false) if the ticket is stale.
  pub fn load_batch(&mut self, ticket: u64, batch: Result<Vec<Sentence>, SessionError>) -> Result<bool, PlayError> {
    let Some(loading) = self.loading.filter(|l| l.ticket == ticket) else {
      debug!(target: "session", ticket, "Discarding stale batch");
      return Ok(false);
    };
    self.loading = None;
    let queue = match batch {
      Ok(queue) if !queue.is_empty() => queue,
      Ok(_) => return Err(self.fail_loading(SessionError::EmptyBatch)),
      Err(e) => return Err(self.fail_loading(e)),
    };
    let session = Session::new(loading.deck, loading.focus, queue);
    info!(target: "session", id = %session.id, len = session.len(), generated = session.generated_count(), "Session started");
    self.session = Some(session);
    self.phase = Phase::Playing;
    self.start_current();
    Ok(true)
  }

  fn fail_loading(&mut self, err: SessionError) -> PlayError {
    warn!(target: "session", error = %err, "Session could not start");
    self.phase = Phase::Selecting;
    self.notice = Feedback { text: err.to_string(), is_error: true };
    err.into()
  }

  fn start_current(&mut self) {
    self.epoch += 1;
    let epoch = self.epoch;
    self.cue = None;
    self.game = self.session.as_ref().and_then(|s| s.current()).map(|sentence| {
      debug!(target: "game", id = %sentence.id, text = %sentence.text(), epoch, "Sentence loaded");
      GameState::start(sentence, epoch)
    });
  }

  fn drop_session(&mut self) {
    self.session = None;
    self.game = None;
    self.diagnosis = None;
    self.loading = None;
    self.cue = None;
    // anything issued for the old sentence must not match again
    self.epoch += 1;
  }

  pub fn tap(&mut self, index: usize) -> Result<Applied, PlayError> {
    self.apply(Event::TapToken(index))
  }

  pub fn choose_code(&mut self, code: ModifierCode) -> Result<Applied, PlayError> {
    self.apply(Event::ChooseCode(code))
  }

  pub fn question_elapsed(&mut self, epoch: u64) -> Result<Applied, PlayError> {
    self.apply(Event::QuestionElapsed { epoch })
  }

  pub fn hint_arrived(&mut self, ticket: HintTicket, text: String) -> Result<Applied, PlayError> {
    self.apply(Event::HintArrived { ticket, text })
  }

  fn apply(&mut self, event: Event) -> Result<Applied, PlayError> {
    let completion = matches!(event, Event::QuestionElapsed { .. } | Event::HintArrived { .. });
    let (Some(state), Some(sentence)) = (self.game.as_ref(), self.session.as_ref().and_then(|s| s.current())) else {
      if completion {
        debug!(target: "game", ?event, "Completion arrived with no sentence loaded; discarded");
        return Ok(Applied::default());
      }
      return Err(GameError::NoSentence.into());
    };

    let Some(t) = transition(state, sentence, &event)? else {
      debug!(target: "game", ?event, "Stale completion discarded");
      return Ok(Applied::default());
    };

    let sentence_id = sentence.id.clone();
    let reviewing = self.session.as_ref().is_some_and(|s| s.deck == Deck::Landfill);
    let now = Utc::now();
    let mut followups = Vec::new();
    self.cue = None;
    for effect in t.effects {
      match effect {
        Effect::Record { kind, correct, code } => {
          debug!(target: "game", %sentence_id, ?kind, correct, code = ?code, "Answer recorded");
          self.progress.record_answer(&sentence_id, kind, correct, code, now);
        }
        Effect::ResetCombo => self.progress.reset_combo(),
        Effect::CommitLandfill { code } => self.progress.commit_to_landfill(&sentence_id, code, now),
        Effect::LandfillMiss => self.progress.note_landfill_miss(&sentence_id, now),
        Effect::SentenceSolved { clean } => {
          let points = self.progress.complete_sentence(&sentence_id, clean && reviewing, now);
          info!(target: "game", %sentence_id, clean, reviewing, points, combo = self.progress.combo, "Sentence solved");
        }
        Effect::Cue(c) => self.cue = Some(c),
        Effect::ScheduleAdvance { epoch } => followups.push(Followup::AdvanceAfter { epoch }),
        Effect::RequestHint(req) => followups.push(Followup::Hint(req)),
      }
    }
    self.epoch = self.epoch.max(t.state.epoch);
    self.game = Some(t.state);
    Ok(Applied { changed: true, followups })
  }

  /// From RESULT: load the next sentence, or diagnose once the queue is exhausted.
  pub fn advance(&mut self) -> Result<AdvanceOutcome, PlayError> {
    if self.phase != Phase::Playing {
      return Err(SessionError::NoSession.into());
    }
    if !self.game.as_ref().is_some_and(GameState::is_finished) {
      return Err(GameError::NotFinished.into());
    }
    let session = self.session.as_mut().ok_or(SessionError::NoSession)?;
    if session.advance().is_some() {
      let cursor = session.cursor;
      self.start_current();
      return Ok(AdvanceOutcome::NextSentence { cursor });
    }

    let ids = session.sentence_ids();
    let deck = session.deck;
    let diag = diagnose(&self.progress.history, &ids);
    info!(target: "session", accuracy = diag.accuracy, attempts = diag.attempts, weakest = ?diag.weakest, "Session diagnosed");
    if let Deck::Tier(tier) = deck {
      self.maybe_unlock(tier, &diag);
    }
    self.game = None;
    self.cue = None;
    self.diagnosis = Some(diag);
    self.phase = Phase::Diagnosed;
    Ok(AdvanceOutcome::Diagnosed)
  }

  fn maybe_unlock(&mut self, tier: Tier, diag: &Diagnosis) {
    if diag.attempts == 0 || diag.accuracy < self.settings.unlock_accuracy {
      return;
    }
    if let Some(next) = tier.next() {
      if self.progress.unlock(next) {
        info!(target: "session", ?next, "Tier unlocked");
      }
    }
  }

  /// Act on one of the offers of the last diagnosis. `Ok(None)` after `Exit`.
  pub fn follow_up(&mut self, action: NextAction) -> Result<Option<PendingBatch>, PlayError> {
    let diag = self.diagnosis.as_ref().ok_or(SessionError::NotDiagnosed)?;
    if !diag.offers.contains(&action) {
      return Err(SessionError::NotOffered.into());
    }
    let deck = self.session.as_ref().map(|s| s.deck).ok_or(SessionError::NoSession)?;
    match action {
      NextAction::Continue => self.begin_session(deck, None).map(Some),
      NextAction::RetryWeakness { code } => self.begin_session(deck, Some(code)).map(Some),
      NextAction::Exit => {
        self.exit();
        Ok(None)
      }
    }
  }

  /// Back to the selection screen. In-flight completions become stale.
  pub fn exit(&mut self) {
    self.drop_session();
    self.phase = Phase::Selecting;
    self.notice = Feedback { text: "Pick a tier to start sweeping sentences.".into(), is_error: false };
  }

  pub fn complete_tutorial(&mut self) {
    self.progress.complete_tutorial();
  }

  /// Everything a renderer needs, and nothing it has to compute.
  pub fn view(&self) -> PlayerView {
    let sentence = self.session.as_ref().and_then(|s| s.current()).filter(|_| self.game.is_some());
    let game = self.game.as_ref();
    let cleaned = match (sentence, game) {
      (Some(s), Some(g)) => g
        .cleaned
        .iter()
        .filter_map(|&i| s.modifiers.get(i).copied())
        .collect(),
      _ => Vec::new(),
    };
    PlayerView {
      phase: self.phase,
      session: self.session.as_ref().map(|s| SessionView {
        id: s.id.clone(),
        deck: s.deck,
        focus: s.focus,
        cursor: s.cursor,
        total: s.len(),
      }),
      sentence: sentence.map(|s| SentenceView {
        id: s.id.clone(),
        tokens: s.tokens.clone(),
        translation: s.translation.clone(),
        difficulty: s.difficulty,
        modifier_count: s.modifiers.len(),
      }),
      step: game.map(|g| g.step),
      active_modifier: game
        .filter(|g| matches!(g.step, Step::ModifierRange | Step::ModifierType))
        .map(|g| g.active_modifier),
      cleaned,
      selection_start: game.and_then(|g| g.selection),
      feedback: game.map(|g| g.feedback.clone()).unwrap_or_else(|| self.notice.clone()),
      hint_pending: game.is_some_and(|g| g.hint_pending),
      cue: self.cue,
      experience: self.progress.experience,
      combo: self.progress.combo,
      landfill_size: self.progress.landfill.len(),
      unlocked: self.progress.unlocked.iter().copied().collect(),
      tutorial_done: self.progress.tutorial_done,
      diagnosis: self.diagnosis.clone(),
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
  pub id: String,
  pub deck: Deck,
  pub focus: Option<ModifierCode>,
  pub cursor: usize,
  pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SentenceView {
  pub id: String,
  pub tokens: Vec<String>,
  pub translation: String,
  pub difficulty: Tier,
  pub modifier_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerView {
  pub phase: Phase,
  pub session: Option<SessionView>,
  pub sentence: Option<SentenceView>,
  pub step: Option<Step>,
  pub active_modifier: Option<usize>,
  pub cleaned: Vec<Modifier>,
  pub selection_start: Option<usize>,
  pub feedback: Feedback,
  pub hint_pending: bool,
  pub cue: Option<Cue>,
  pub experience: u64,
  pub combo: u32,
  pub landfill_size: usize,
  pub unlocked: Vec<Tier>,
  pub tutorial_done: bool,
  pub diagnosis: Option<Diagnosis>,
}
