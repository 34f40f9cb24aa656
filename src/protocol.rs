//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::diagnosis::NextAction;
use crate::domain::{Deck, Tier};
use crate::landfill::LandfillEntry;
use crate::player::PlayerView;
use crate::taxonomy::{ModifierCode, TaxonomyOut};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartSession {
        deck: Deck,
        #[serde(default)]
        focus: Option<ModifierCode>,
    },
    Tap {
        index: usize,
    },
    ChooseCode {
        code: ModifierCode,
    },
    Advance,
    FollowUp {
        action: NextAction,
    },
    Exit,
    CompleteTutorial,
    GetState,
    GetTaxonomy,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    State {
        view: PlayerView,
    },
    Taxonomy {
        taxonomy: TaxonomyOut,
    },
    Error {
        message: String,
    },
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
pub struct SessionIn {
    pub deck: Deck,
    #[serde(default)]
    pub focus: Option<ModifierCode>,
}

#[derive(Debug, Deserialize)]
pub struct TapIn {
    pub index: usize,
}

#[derive(Debug, Deserialize)]
pub struct CodeIn {
    pub code: ModifierCode,
}

#[derive(Debug, Deserialize)]
pub struct FollowUpIn {
    pub action: NextAction,
}

/// Long-lived learner state, without the current sentence.
#[derive(Debug, Serialize)]
pub struct ProgressOut {
    pub experience: u64,
    pub combo: u32,
    pub unlocked: Vec<Tier>,
    pub tutorial_done: bool,
    pub answers: usize,
    /// Landfilled sentences, oldest attempt first.
    pub landfill: Vec<LandfillItemOut>,
}

#[derive(Debug, Serialize)]
pub struct LandfillItemOut {
    pub sentence_id: String,
    #[serde(flatten)]
    pub entry: LandfillEntry,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_parse() {
        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"start_session","deck":{"tier":"basic"}}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::StartSession { deck: Deck::Tier(Tier::Basic), focus: None }));

        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"start_session","deck":"landfill","focus":"REL"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::StartSession { deck: Deck::Landfill, focus: Some(ModifierCode::Rel) }));

        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"choose_code","code":"TO"}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::ChooseCode { code: ModifierCode::To }));

        let m: ClientWsMessage =
            serde_json::from_str(r#"{"type":"follow_up","action":{"kind":"retry_weakness","code":"ING"}}"#).unwrap();
        assert!(matches!(m, ClientWsMessage::FollowUp { action: NextAction::RetryWeakness { code: ModifierCode::Ing } }));
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(serde_json::from_str::<ClientWsMessage>(r#"{"type":"submit_answer"}"#).is_err());
    }

    #[test]
    fn server_error_shape() {
        let out = serde_json::to_value(ServerWsMessage::Error { message: "nope".into() }).unwrap();
        assert_eq!(out, serde_json::json!({ "type": "error", "message": "nope" }));
    }
}
