//! Step state machine for one sentence.
//!
//! HEAD_NOUN → QUESTION → (MODIFIER_RANGE ⇄ MODIFIER_TYPE)* → FIND_VERB → RESULT
//!
//! `transition` is pure: it takes the current state, the sentence and one event,
//! and returns the next state plus the effects the caller must apply (history
//! records, combo/landfill updates, timers, hint requests). Nothing in here
//! touches progress, clocks or the network.
//!
//! Every accepted event bumps `epoch`. Timer and hint completions carry the epoch
//! they were issued at; if it no longer matches, the completion is stale and
//! `transition` returns `Ok(None)`.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::domain::Sentence;
use crate::history::AnswerKind;
use crate::landfill::{CODE_MISTAKE_LIMIT, RANGE_MISTAKE_LIMIT};
use crate::taxonomy::ModifierCode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Step {
  HeadNoun,
  Question,
  ModifierRange,
  ModifierType,
  FindVerb,
  Result,
}

/// Audible cue tag; the renderer picks the sound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
  Success,
  Error,
  Progress,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Feedback {
  pub text: String,
  pub is_error: bool,
}

impl Feedback {
  fn info(text: impl Into<String>) -> Self {
    Self { text: text.into(), is_error: false }
  }

  fn error(text: impl Into<String>) -> Self {
    Self { text: text.into(), is_error: true }
  }
}

/// Identifies the attempt a hint was requested for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HintTicket {
  pub sentence_id: String,
  pub epoch: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HintRequest {
  pub ticket: HintTicket,
  pub modifier_text: String,
  pub correct: ModifierCode,
  pub wrong: ModifierCode,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
  TapToken(usize),
  ChooseCode(ModifierCode),
  QuestionElapsed { epoch: u64 },
  HintArrived { ticket: HintTicket, text: String },
}

impl Event {
  fn name(&self) -> &'static str {
    match self {
      Event::TapToken(_) => "tap",
      Event::ChooseCode(_) => "choose_code",
      Event::QuestionElapsed { .. } => "question_elapsed",
      Event::HintArrived { .. } => "hint_arrived",
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
  /// Append one history record.
  Record { kind: AnswerKind, correct: bool, code: Option<ModifierCode> },
  ResetCombo,
  /// A mistake counter crossed its threshold this pass.
  CommitLandfill { code: Option<ModifierCode> },
  /// Any miss; restarts the review streak if the sentence is landfilled.
  LandfillMiss,
  /// Main verb found. `clean` means the whole pass had no mistakes.
  SentenceSolved { clean: bool },
  Cue(Cue),
  /// Fire `Event::QuestionElapsed { epoch }` after the question delay.
  ScheduleAdvance { epoch: u64 },
  RequestHint(HintRequest),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
  #[error("'{event}' is not accepted during {step:?}")]
  NotAccepted { step: Step, event: &'static str },
  #[error("token {index} is out of range (sentence has {len} tokens)")]
  TokenOutOfRange { index: usize, len: usize },
  #[error("no sentence is loaded")]
  NoSentence,
  #[error("the sentence is not finished yet")]
  NotFinished,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
  pub sentence_id: String,
  pub step: Step,
  pub active_modifier: usize,
  pub cleaned: BTreeSet<usize>,
  /// First tap of a range selection, waiting for the second.
  pub selection: Option<usize>,
  pub range_mistakes: u32,
  pub code_mistakes: u32,
  /// Mistakes of any kind in this pass.
  pub pass_mistakes: u32,
  pub hint_pending: bool,
  pub feedback: Feedback,
  pub epoch: u64,
}

impl GameState {
  /// Fresh per-sentence state. `epoch` should continue from the previous sentence
  /// so completions issued for it can never match.
  pub fn start(sentence: &Sentence, epoch: u64) -> Self {
    Self {
      sentence_id: sentence.id.clone(),
      step: Step::HeadNoun,
      active_modifier: 0,
      cleaned: BTreeSet::new(),
      selection: None,
      range_mistakes: 0,
      code_mistakes: 0,
      pass_mistakes: 0,
      hint_pending: false,
      feedback: Feedback::info("Find the head noun: the core noun of the subject."),
      epoch,
    }
  }

  pub fn is_finished(&self) -> bool {
    self.step == Step::Result
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
  pub state: GameState,
  pub effects: Vec<Effect>,
}

/// Advance the machine by one event. `Ok(None)` means a stale completion was discarded.
pub fn transition(state: &GameState, sentence: &Sentence, event: &Event) -> Result<Option<Transition>, GameError> {
  match (state.step, event) {
    (Step::HeadNoun, Event::TapToken(idx)) => {
      check_token(sentence, *idx)?;
      Ok(Some(on_head_noun(state, sentence, *idx)))
    }
    (Step::Question, Event::QuestionElapsed { epoch }) if *epoch == state.epoch => {
      Ok(Some(on_question_elapsed(state, sentence)))
    }
    (Step::ModifierRange, Event::TapToken(idx)) => {
      check_token(sentence, *idx)?;
      Ok(Some(on_range_tap(state, sentence, *idx)))
    }
    (Step::ModifierType, Event::ChooseCode(code)) => Ok(Some(on_code(state, sentence, *code))),
    (Step::ModifierType, Event::HintArrived { ticket, text })
      if state.hint_pending && ticket.epoch == state.epoch && ticket.sentence_id == state.sentence_id =>
    {
      let mut next = state.clone();
      next.hint_pending = false;
      next.feedback = Feedback::error(text.clone());
      Ok(Some(Transition { state: next, effects: Vec::new() }))
    }
    (Step::FindVerb, Event::TapToken(idx)) => {
      check_token(sentence, *idx)?;
      Ok(Some(on_verb_tap(state, sentence, *idx)))
    }
    (_, Event::QuestionElapsed { .. }) | (_, Event::HintArrived { .. }) => Ok(None),
    (step, ev) => Err(GameError::NotAccepted { step, event: ev.name() }),
  }
}

fn check_token(sentence: &Sentence, idx: usize) -> Result<(), GameError> {
  if idx >= sentence.tokens.len() {
    return Err(GameError::TokenOutOfRange { index: idx, len: sentence.tokens.len() });
  }
  Ok(())
}

fn bumped(state: &GameState) -> GameState {
  let mut next = state.clone();
  next.epoch = state.epoch + 1;
  next
}

/// Shared bookkeeping for every wrong answer.
fn miss(next: &mut GameState, effects: &mut Vec<Effect>, kind: AnswerKind, code: Option<ModifierCode>) {
  next.pass_mistakes += 1;
  effects.push(Effect::Record { kind, correct: false, code });
  effects.push(Effect::ResetCombo);
  effects.push(Effect::LandfillMiss);
  effects.push(Effect::Cue(Cue::Error));
}

fn on_head_noun(state: &GameState, sentence: &Sentence, idx: usize) -> Transition {
  let mut next = bumped(state);
  let mut effects = Vec::new();
  if idx == sentence.head_noun {
    next.step = Step::Question;
    next.feedback = Feedback::info(format!(
      "Right! \"{}\" is the head noun. Which words are describing it?",
      sentence.tokens[idx]
    ));
    effects.push(Effect::Record { kind: AnswerKind::Noun, correct: true, code: None });
    effects.push(Effect::Cue(Cue::Success));
    effects.push(Effect::ScheduleAdvance { epoch: next.epoch });
  } else {
    miss(&mut next, &mut effects, AnswerKind::Noun, None);
    next.feedback = Feedback::error(format!(
      "\"{}\" is not the head noun. Look for the noun the whole subject is about.",
      sentence.tokens[idx]
    ));
  }
  Transition { state: next, effects }
}

fn on_question_elapsed(state: &GameState, sentence: &Sentence) -> Transition {
  let mut next = bumped(state);
  next.active_modifier = 0;
  next.selection = None;
  if sentence.modifiers.is_empty() {
    next.step = Step::FindVerb;
    next.feedback = Feedback::info("Nothing to clean here. Find the main verb.");
  } else {
    next.step = Step::ModifierRange;
    next.feedback = Feedback::info(range_prompt(sentence, 0));
  }
  Transition { state: next, effects: vec![Effect::Cue(Cue::Progress)] }
}

fn range_prompt(sentence: &Sentence, active: usize) -> String {
  format!(
    "Modifier {} of {}: tap its first and last word.",
    active + 1,
    sentence.modifiers.len()
  )
}

fn on_range_tap(state: &GameState, sentence: &Sentence, idx: usize) -> Transition {
  let mut next = bumped(state);
  let mut effects = Vec::new();

  if sentence.cleaned_modifier_at(idx, &state.cleaned).is_some() {
    next.feedback = Feedback::info("That part is already cleaned away.");
    return Transition { state: next, effects };
  }

  let Some(first) = state.selection else {
    next.selection = Some(idx);
    next.feedback = Feedback::info("Now tap the last word of the modifier.");
    return Transition { state: next, effects };
  };

  next.selection = None;
  let (lo, hi) = (first.min(idx), first.max(idx));
  let active = sentence.modifiers[state.active_modifier];

  if lo == active.start && hi == active.end {
    next.step = Step::ModifierType;
    next.feedback = Feedback::info(format!(
      "Good span! What kind of modifier is \"{}\"?",
      active.text(&sentence.tokens)
    ));
    effects.push(Effect::Record { kind: AnswerKind::Range, correct: true, code: Some(active.code) });
    effects.push(Effect::Cue(Cue::Success));
    return Transition { state: next, effects };
  }

  next.range_mistakes += 1;
  miss(&mut next, &mut effects, AnswerKind::Range, Some(active.code));
  let mut text = String::from("That's not the modifier's span. Check where it starts and where it ends.");
  // commit on the crossing only; further misses on the same counter don't re-commit
  if next.range_mistakes == RANGE_MISTAKE_LIMIT {
    effects.push(Effect::CommitLandfill { code: Some(active.code) });
    text.push_str(" This sentence goes to the landfill for review.");
  }
  next.feedback = Feedback::error(text);
  Transition { state: next, effects }
}

fn on_code(state: &GameState, sentence: &Sentence, code: ModifierCode) -> Transition {
  let mut next = bumped(state);
  let mut effects = Vec::new();
  let active_idx = state.active_modifier;
  let active = sentence.modifiers[active_idx];

  if code == active.code {
    next.cleaned.insert(active_idx);
    next.code_mistakes = 0;
    next.hint_pending = false;
    effects.push(Effect::Record { kind: AnswerKind::Code, correct: true, code: Some(active.code) });
    effects.push(Effect::Cue(Cue::Success));
    if active_idx + 1 < sentence.modifiers.len() {
      next.active_modifier = active_idx + 1;
      next.step = Step::ModifierRange;
      next.feedback = Feedback::info(format!(
        "Correct, {}! Swept away. {}",
        active.code.label().to_lowercase(),
        range_prompt(sentence, active_idx + 1)
      ));
    } else {
      next.step = Step::FindVerb;
      next.feedback = Feedback::info(format!(
        "All modifiers are cleaned. Now find the main verb that goes with \"{}\".",
        sentence.tokens[sentence.head_noun]
      ));
    }
    return Transition { state: next, effects };
  }

  next.code_mistakes += 1;
  miss(&mut next, &mut effects, AnswerKind::Code, Some(active.code));
  if next.code_mistakes == CODE_MISTAKE_LIMIT {
    effects.push(Effect::CommitLandfill { code: Some(active.code) });
  }
  next.hint_pending = true;
  next.feedback = Feedback::error("Not quite. Thinking of a hint...");
  effects.push(Effect::RequestHint(HintRequest {
    ticket: HintTicket { sentence_id: sentence.id.clone(), epoch: next.epoch },
    modifier_text: sentence.modifier_text(active_idx),
    correct: active.code,
    wrong: code,
  }));
  Transition { state: next, effects }
}

fn on_verb_tap(state: &GameState, sentence: &Sentence, idx: usize) -> Transition {
  let mut next = bumped(state);
  let mut effects = Vec::new();
  let token = &sentence.tokens[idx];

  if idx == sentence.main_verb {
    next.step = Step::Result;
    next.feedback = Feedback::info(format!("Great! \"{}\" is the main verb. Sentence clean!", token));
    effects.push(Effect::Record { kind: AnswerKind::Verb, correct: true, code: None });
    effects.push(Effect::SentenceSolved { clean: state.pass_mistakes == 0 });
    effects.push(Effect::Cue(Cue::Success));
    return Transition { state: next, effects };
  }

  miss(&mut next, &mut effects, AnswerKind::Verb, None);
  let head = &sentence.tokens[sentence.head_noun];
  let text = if sentence.cleaned_modifier_at(idx, &state.cleaned).is_some() {
    format!("\"{}\" sits inside a modifier you already cleaned. The main verb is outside the modifiers.", token)
  } else if idx == sentence.head_noun {
    format!("\"{}\" is the head noun. Find the verb that tells what it does.", token)
  } else {
    format!("\"{}\" is not the main verb. Which verb goes with \"{}\"?", token, head)
  };
  next.feedback = Feedback::error(text);
  Transition { state: next, effects }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::fixtures::*;

  fn step(state: &GameState, s: &Sentence, ev: Event) -> Transition {
    transition(state, s, &ev).expect("accepted").expect("not stale")
  }

  fn records(effects: &[Effect]) -> usize {
    effects.iter().filter(|e| matches!(e, Effect::Record { .. })).count()
  }

  fn at_range(s: &Sentence) -> GameState {
    let st = GameState::start(s, 0);
    let t = step(&st, s, Event::TapToken(s.head_noun));
    let epoch = t.state.epoch;
    step(&t.state, s, Event::QuestionElapsed { epoch }).state
  }

  fn at_type(s: &Sentence) -> GameState {
    let st = at_range(s);
    let m = s.modifiers[0];
    let t = step(&st, s, Event::TapToken(m.start));
    step(&t.state, s, Event::TapToken(m.end)).state
  }

  #[test]
  fn walkthrough_three_modifiers() {
    let s = three_modifiers();
    let st = GameState::start(&s, 0);

    let t = step(&st, &s, Event::TapToken(2));
    assert_eq!(t.state.step, Step::Question);
    assert!(t.effects.contains(&Effect::Record { kind: AnswerKind::Noun, correct: true, code: None }));
    let epoch = t.state.epoch;
    assert!(t.effects.contains(&Effect::ScheduleAdvance { epoch }));

    let t = step(&t.state, &s, Event::QuestionElapsed { epoch });
    assert_eq!(t.state.step, Step::ModifierRange);
    assert_eq!(t.state.active_modifier, 0);
    assert_eq!(records(&t.effects), 0);

    let t = step(&t.state, &s, Event::TapToken(4));
    assert_eq!(t.state.selection, Some(4));
    assert_eq!(records(&t.effects), 0);
    let t = step(&t.state, &s, Event::TapToken(6));
    assert_eq!(t.state.step, Step::ModifierType);

    let t = step(&t.state, &s, Event::ChooseCode(ModifierCode::Prep));
    assert_eq!(t.state.step, Step::ModifierRange);
    assert_eq!(t.state.active_modifier, 1);
    assert!(t.state.cleaned.contains(&0));

    let t = step(&t.state, &s, Event::TapToken(10));
    let t = step(&t.state, &s, Event::TapToken(8));
    let t = step(&t.state, &s, Event::ChooseCode(ModifierCode::Rel));
    let t = step(&t.state, &s, Event::TapToken(12));
    let t = step(&t.state, &s, Event::TapToken(14));
    let t = step(&t.state, &s, Event::ChooseCode(ModifierCode::Ed));
    assert_eq!(t.state.step, Step::FindVerb);

    let t = step(&t.state, &s, Event::TapToken(16));
    assert_eq!(t.state.step, Step::Result);
    assert!(t.effects.contains(&Effect::SentenceSolved { clean: true }));
    assert!(!t.effects.contains(&Effect::ResetCombo));
  }

  #[test]
  fn wrong_head_noun_stays_and_resets_combo() {
    let s = three_modifiers();
    let st = GameState::start(&s, 0);
    let t = step(&st, &s, Event::TapToken(0));
    assert_eq!(t.state.step, Step::HeadNoun);
    assert!(t.state.feedback.is_error);
    assert!(t.effects.contains(&Effect::ResetCombo));
    assert!(t.effects.contains(&Effect::Record { kind: AnswerKind::Noun, correct: false, code: None }));
    assert_eq!(records(&t.effects), 1);
  }

  #[test]
  fn three_range_misses_commit_exactly_once() {
    let s = three_modifiers();
    let mut st = at_range(&s);
    let mut commits = 0;
    for _ in 0..4 {
      st = step(&st, &s, Event::TapToken(4)).state;
      let t = step(&st, &s, Event::TapToken(5));
      commits += t.effects.iter().filter(|e| matches!(e, Effect::CommitLandfill { .. })).count();
      assert!(t.effects.contains(&Effect::Record { kind: AnswerKind::Range, correct: false, code: Some(ModifierCode::Prep) }));
      assert_eq!(t.state.selection, None);
      st = t.state;
    }
    assert_eq!(st.range_mistakes, 4);
    assert_eq!(commits, 1);
    assert_eq!(st.step, Step::ModifierRange);
  }

  #[test]
  fn commit_happens_on_third_range_miss_not_before() {
    let s = three_modifiers();
    let mut st = at_range(&s);
    for n in 1..=3 {
      st = step(&st, &s, Event::TapToken(3)).state;
      let t = step(&st, &s, Event::TapToken(6));
      let committed = t.effects.contains(&Effect::CommitLandfill { code: Some(ModifierCode::Prep) });
      assert_eq!(committed, n == 3);
      st = t.state;
    }
  }

  #[test]
  fn reversed_range_is_accepted() {
    let s = three_modifiers();
    let st = at_range(&s);
    let t = step(&st, &s, Event::TapToken(6));
    let t = step(&t.state, &s, Event::TapToken(4));
    assert_eq!(t.state.step, Step::ModifierType);
  }

  #[test]
  fn wrong_code_requests_hint_and_commits_on_second() {
    let s = three_modifiers();
    let st = at_type(&s);

    let t = step(&st, &s, Event::ChooseCode(ModifierCode::Rel));
    assert_eq!(t.state.step, Step::ModifierType);
    assert!(t.state.hint_pending);
    let req = t.effects.iter().find_map(|e| match e {
      Effect::RequestHint(r) => Some(r.clone()),
      _ => None,
    });
    let req = req.expect("hint requested");
    assert_eq!(req.modifier_text, "from the north");
    assert_eq!(req.correct, ModifierCode::Prep);
    assert_eq!(req.wrong, ModifierCode::Rel);
    assert!(!t.effects.iter().any(|e| matches!(e, Effect::CommitLandfill { .. })));

    let t2 = step(&t.state, &s, Event::ChooseCode(ModifierCode::Ing));
    assert!(t2.effects.contains(&Effect::CommitLandfill { code: Some(ModifierCode::Prep) }));
    assert_eq!(t2.state.code_mistakes, 2);

    // the first hint is now stale
    let stale = transition(&t2.state, &s, &Event::HintArrived { ticket: req.ticket, text: "old".into() }).unwrap();
    assert!(stale.is_none());
  }

  #[test]
  fn each_code_counter_crossing_commits_with_its_modifier() {
    let s = three_modifiers();
    let mut st = at_type(&s);
    let mut commits = Vec::new();
    let mut collect = |t: &Transition| {
      commits.extend(t.effects.iter().filter_map(|e| match e {
        Effect::CommitLandfill { code } => *code,
        _ => None,
      }));
    };

    for code in [ModifierCode::Rel, ModifierCode::Ing, ModifierCode::Adj] {
      let t = step(&st, &s, Event::ChooseCode(code));
      collect(&t);
      st = t.state;
    }
    st = step(&st, &s, Event::ChooseCode(ModifierCode::Prep)).state;
    st = step(&st, &s, Event::TapToken(8)).state;
    st = step(&st, &s, Event::TapToken(10)).state;
    assert_eq!(st.code_mistakes, 0);
    for code in [ModifierCode::Prep, ModifierCode::Ing] {
      let t = step(&st, &s, Event::ChooseCode(code));
      collect(&t);
      st = t.state;
    }
    assert_eq!(commits, vec![ModifierCode::Prep, ModifierCode::Rel]);
  }

  #[test]
  fn fresh_hint_replaces_feedback_without_recording() {
    let s = three_modifiers();
    let st = at_type(&s);
    let t = step(&st, &s, Event::ChooseCode(ModifierCode::Adj));
    let ticket = HintTicket { sentence_id: s.id.clone(), epoch: t.state.epoch };
    let h = step(&t.state, &s, Event::HintArrived { ticket, text: "It starts with a preposition.".into() });
    assert!(h.effects.is_empty());
    assert_eq!(h.state.feedback.text, "It starts with a preposition.");
    assert!(!h.state.hint_pending);
    assert_eq!(h.state.epoch, t.state.epoch);
  }

  #[test]
  fn correct_code_resets_code_counter() {
    let s = three_modifiers();
    let st = at_type(&s);
    let t = step(&st, &s, Event::ChooseCode(ModifierCode::Rel));
    let t = step(&t.state, &s, Event::ChooseCode(ModifierCode::Prep));
    assert_eq!(t.state.code_mistakes, 0);
    assert!(!t.state.hint_pending);
    assert_eq!(t.state.pass_mistakes, 1);
  }

  #[test]
  fn verb_miss_feedback_is_disambiguated() {
    let s = one_modifier("v");
    let st = at_type(&s);
    let st = step(&st, &s, Event::ChooseCode(ModifierCode::Appos)).state;
    assert_eq!(st.step, Step::FindVerb);

    let inside = step(&st, &s, Event::TapToken(4));
    assert!(inside.state.feedback.text.contains("already cleaned"));
    let head = step(&st, &s, Event::TapToken(1));
    assert!(head.state.feedback.text.contains("head noun"));
    let other = step(&st, &s, Event::TapToken(10));
    assert!(other.state.feedback.text.contains("not the main verb"));
    assert!(other.effects.contains(&Effect::ResetCombo));

    let done = step(&other.state, &s, Event::TapToken(9));
    assert!(done.effects.contains(&Effect::SentenceSolved { clean: false }));
  }

  #[test]
  fn stale_question_timer_is_ignored() {
    let s = three_modifiers();
    let st = GameState::start(&s, 0);
    let t = step(&st, &s, Event::TapToken(2));
    let out = transition(&t.state, &s, &Event::QuestionElapsed { epoch: t.state.epoch - 1 }).unwrap();
    assert!(out.is_none());
  }

  #[test]
  fn sentence_without_modifiers_goes_straight_to_verb() {
    let s = no_modifiers("n");
    let st = GameState::start(&s, 0);
    let t = step(&st, &s, Event::TapToken(0));
    let epoch = t.state.epoch;
    let t = step(&t.state, &s, Event::QuestionElapsed { epoch });
    assert_eq!(t.state.step, Step::FindVerb);
  }

  #[test]
  fn taps_on_cleaned_tokens_are_ignored_in_range_step() {
    let s = three_modifiers();
    let st = at_type(&s);
    let st = step(&st, &s, Event::ChooseCode(ModifierCode::Prep)).state;
    let t = step(&st, &s, Event::TapToken(5));
    assert!(t.effects.is_empty());
    assert_eq!(t.state.selection, None);
    assert_eq!(t.state.range_mistakes, 0);
  }

  #[test]
  fn invalid_inputs_are_rejected() {
    let s = three_modifiers();
    let st = GameState::start(&s, 0);
    assert!(matches!(
      transition(&st, &s, &Event::ChooseCode(ModifierCode::Rel)),
      Err(GameError::NotAccepted { step: Step::HeadNoun, .. })
    ));
    assert!(matches!(
      transition(&st, &s, &Event::TapToken(99)),
      Err(GameError::TokenOutOfRange { index: 99, .. })
    ));
    let q = step(&st, &s, Event::TapToken(2)).state;
    assert!(transition(&q, &s, &Event::TapToken(2)).is_err());
  }
}
