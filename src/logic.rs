//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Starting sessions and acting on diagnosis follow-ups
//!   - Forwarding taps and code choices to the player
//!   - Running the question timer and hint requests the player asks for, and
//!     pushing the resulting state to the socket that caused them
//!   - Read-only views (state, progress)

use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;
use tracing::{debug, instrument, warn};

use crate::diagnosis::NextAction;
use crate::domain::Deck;
use crate::player::{Applied, Followup, PlayError, PlayerView};
use crate::ports::hint_or_fallback;
use crate::protocol::{LandfillItemOut, ProgressOut, ServerWsMessage};
use crate::state::AppState;
use crate::taxonomy::ModifierCode;

/// Where background completions report a fresh state. HTTP callers pass `None` and poll.
pub type Notifier = mpsc::UnboundedSender<ServerWsMessage>;

#[instrument(level = "info", skip(state))]
pub async fn do_start_session(state: &Arc<AppState>, deck: Deck, focus: Option<ModifierCode>) -> Result<PlayerView, PlayError> {
  state.start_session(deck, focus).await?;
  Ok(do_view(state).await)
}

#[instrument(level = "info", skip(state, notify))]
pub async fn do_tap(state: &Arc<AppState>, index: usize, notify: Option<Notifier>) -> Result<PlayerView, PlayError> {
  let (applied, view) = {
    let mut p = state.player.lock().await;
    let applied = p.tap(index)?;
    (applied, p.view())
  };
  spawn_followups(state, applied.followups, notify);
  Ok(view)
}

#[instrument(level = "info", skip(state, notify))]
pub async fn do_choose_code(state: &Arc<AppState>, code: ModifierCode, notify: Option<Notifier>) -> Result<PlayerView, PlayError> {
  let (applied, view) = {
    let mut p = state.player.lock().await;
    let applied = p.choose_code(code)?;
    (applied, p.view())
  };
  spawn_followups(state, applied.followups, notify);
  Ok(view)
}

#[instrument(level = "info", skip(state))]
pub async fn do_advance(state: &Arc<AppState>) -> Result<PlayerView, PlayError> {
  let mut p = state.player.lock().await;
  let outcome = p.advance()?;
  debug!(target: "session", ?outcome, "Advanced");
  Ok(p.view())
}

#[instrument(level = "info", skip(state))]
pub async fn do_follow_up(state: &Arc<AppState>, action: NextAction) -> Result<PlayerView, PlayError> {
  state.follow_up(action).await?;
  Ok(do_view(state).await)
}

#[instrument(level = "info", skip(state))]
pub async fn do_exit(state: &Arc<AppState>) -> PlayerView {
  let mut p = state.player.lock().await;
  p.exit();
  p.view()
}

#[instrument(level = "info", skip(state))]
pub async fn do_complete_tutorial(state: &Arc<AppState>) -> PlayerView {
  let mut p = state.player.lock().await;
  p.complete_tutorial();
  p.view()
}

pub async fn do_view(state: &Arc<AppState>) -> PlayerView {
  state.player.lock().await.view()
}

pub async fn do_progress(state: &Arc<AppState>) -> ProgressOut {
  let p = state.player.lock().await;
  let progress = p.progress();
  let landfill = progress
    .landfill
    .ids()
    .into_iter()
    .filter_map(|id| {
      let entry = progress.landfill.get(&id)?.clone();
      Some(LandfillItemOut { sentence_id: id, entry })
    })
    .collect();
  ProgressOut {
    experience: progress.experience,
    combo: progress.combo,
    unlocked: progress.unlocked.iter().copied().collect(),
    tutorial_done: progress.tutorial_done,
    answers: progress.history.len(),
    landfill,
  }
}

/// Run the timer / hint work a transition asked for. Each completion goes back
/// through the player, which drops it if the learner has moved on.
pub fn spawn_followups(state: &Arc<AppState>, followups: Vec<Followup>, notify: Option<Notifier>) {
  for followup in followups {
    let state = state.clone();
    let notify = notify.clone();
    match followup {
      Followup::AdvanceAfter { epoch } => {
        let delay = Duration::from_millis(state.settings.question_delay_ms);
        tokio::spawn(async move {
          tokio::time::sleep(delay).await;
          let out = {
            let mut p = state.player.lock().await;
            p.question_elapsed(epoch).map(|a| (a, p.view()))
          };
          settle(&state, out, notify);
        });
      }
      Followup::Hint(req) => {
        tokio::spawn(async move {
          let text = hint_or_fallback(state.hints.as_ref(), &req.modifier_text, req.correct, req.wrong).await;
          let out = {
            let mut p = state.player.lock().await;
            p.hint_arrived(req.ticket, text).map(|a| (a, p.view()))
          };
          settle(&state, out, notify);
        });
      }
    }
  }
}

fn settle(state: &Arc<AppState>, out: Result<(Applied, PlayerView), PlayError>, notify: Option<Notifier>) {
  match out {
    Ok((applied, view)) => {
      if applied.changed {
        if let Some(tx) = &notify {
          // receiver gone means the socket closed; nothing to do
          let _ = tx.send(ServerWsMessage::State { view });
        }
      }
      spawn_followups(state, applied.followups, notify);
    }
    Err(e) => warn!(target: "game", error = %e, "Background completion rejected"),
  }
}
