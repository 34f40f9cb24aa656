//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic, with one JSON reply per request. Timer and hint
//! completions arrive on a side channel and are pushed as extra `state` messages.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tokio::sync::mpsc;
use tracing::{info, error, instrument, debug};

use crate::logic::*;
use crate::player::{PlayError, PlayerView};
use crate::protocol::{ClientWsMessage, ServerWsMessage};
use crate::state::AppState;
use crate::taxonomy::catalogue;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "syntax_sweep", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "syntax_sweep", "WebSocket connected");
  let (tx, mut rx) = mpsc::unbounded_channel::<ServerWsMessage>();

  loop {
    let reply_msg = tokio::select! {
      incoming = socket.recv() => match incoming {
        Some(Ok(Message::Text(txt))) => match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "syntax_sweep", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state, &tx).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        },
        Some(Ok(Message::Ping(payload))) => {
          let _ = socket.send(Message::Pong(payload)).await;
          continue;
        }
        Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
        Some(Ok(_)) => continue,
      },
      // tx is held by this loop, so the channel never closes while we run
      Some(pushed) = rx.recv() => pushed,
    };

    let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
      serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
    });

    if let Err(e) = socket.send(Message::Text(out)).await {
      error!(target: "syntax_sweep", error = %e, "WS send error");
      break;
    }
  }
  info!(target: "syntax_sweep", "WebSocket disconnected");
}

fn state_or_error(out: Result<PlayerView, PlayError>) -> ServerWsMessage {
  match out {
    Ok(view) => ServerWsMessage::State { view },
    Err(e) => ServerWsMessage::Error { message: e.to_string() },
  }
}

#[instrument(level = "info", skip(state, tx))]
async fn handle_client_ws(msg: ClientWsMessage, state: &Arc<AppState>, tx: &Notifier) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::StartSession { deck, focus } => {
      let out = do_start_session(state, deck, focus).await;
      info!(target: "session", ?deck, ok = out.is_ok(), "WS start_session handled");
      state_or_error(out)
    }

    ClientWsMessage::Tap { index } => state_or_error(do_tap(state, index, Some(tx.clone())).await),

    ClientWsMessage::ChooseCode { code } => state_or_error(do_choose_code(state, code, Some(tx.clone())).await),

    ClientWsMessage::Advance => state_or_error(do_advance(state).await),

    ClientWsMessage::FollowUp { action } => state_or_error(do_follow_up(state, action).await),

    ClientWsMessage::Exit => ServerWsMessage::State { view: do_exit(state).await },

    ClientWsMessage::CompleteTutorial => ServerWsMessage::State { view: do_complete_tutorial(state).await },

    ClientWsMessage::GetState => ServerWsMessage::State { view: do_view(state).await },

    ClientWsMessage::GetTaxonomy => ServerWsMessage::Taxonomy { taxonomy: catalogue() },
  }
}
