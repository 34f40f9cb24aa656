//! Minimal OpenAI client for our use-cases: sentence batches and classification hints.
//!
//! We only call chat.completions and request either plain text or a strict JSON object.
//! Calls are instrumented and log model names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::config::Prompts;
use crate::domain::{Modifier, Sentence, SentenceSource, Tier};
use crate::ports::{HintGenerator, SentenceGenerator, ServiceError};
use crate::taxonomy::{ModifierCode, SubjectCode};
use crate::util::{fill_template, trunc_for_log};

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub fast_model: String,
  pub strong_model: String,
  pub prompts: Prompts,
}

/// Loose shape of one generated item; codes are parsed and checked afterwards.
#[derive(Deserialize)]
struct GenSentence {
  tokens: Vec<String>,
  head_noun: usize,
  main_verb: usize,
  #[serde(default)]
  modifiers: Vec<GenModifier>,
  #[serde(default)]
  subject_type: Option<String>,
  #[serde(default)]
  translation: String,
}

#[derive(Deserialize)]
struct GenModifier {
  start: usize,
  end: usize,
  code: String,
}

#[derive(Deserialize)]
struct GenBatch {
  #[serde(default)]
  sentences: Vec<GenSentence>,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env(prompts: Prompts) -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok()?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let fast_model =
      std::env::var("OPENAI_FAST_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let strong_model =
      std::env::var("OPENAI_STRONG_MODEL").unwrap_or_else(|_| "gpt-4o".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, fast_model, strong_model, prompts })
  }

  async fn chat(
    &self,
    model: &str,
    system: &str,
    user: &str,
    temperature: f32,
    json: bool,
  ) -> Result<String, ServiceError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: model.to_string(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature,
      response_format: json.then(|| ResponseFormat { r#type: "json_object".into() }),
      max_tokens: None,
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "syntax-sweep-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      let message = extract_openai_error(&body).unwrap_or_else(|| trunc_for_log(&body, 300));
      return Err(ServiceError::Status { status, message });
    }

    let body: ChatCompletionResponse = res.json().await?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    Ok(body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default())
  }

  /// Plain-text chat completion. Used for hints.
  #[instrument(level = "info", skip(self, system, user), fields(model = %model))]
  async fn chat_plain(&self, model: &str, system: &str, user: &str, temperature: f32) -> Result<String, ServiceError> {
    let text = self.chat(model, system, user, temperature, false).await?;
    Ok(text.trim().to_string())
  }

  /// JSON-object chat completion. Generic over the target type T.
  #[instrument(level = "info", skip(self, system, user), fields(model = %model))]
  async fn chat_json<T: for<'a> Deserialize<'a>>(
    &self,
    model: &str,
    system: &str,
    user: &str,
    temperature: f32,
  ) -> Result<T, ServiceError> {
    let text = self.chat(model, system, user, temperature, true).await?;
    debug!(response_len = text.len(), "JSON completion received");
    serde_json::from_str::<T>(&text).map_err(|e| ServiceError::Decode(e.to_string()))
  }

  fn sentences_prompt(&self, tier: Tier, count: usize, focus: Option<ModifierCode>) -> String {
    let focus_clause = focus
      .map(|c| fill_template(&self.prompts.focus_clause_template, &[("code", c.code()), ("label", c.label())]))
      .unwrap_or_default();
    let modifier_codes = ModifierCode::ALL.iter().map(|c| c.code()).collect::<Vec<_>>().join(", ");
    let subject_codes = SubjectCode::ALL.iter().map(|c| c.code()).collect::<Vec<_>>().join(", ");
    let count = count.to_string();
    fill_template(
      &self.prompts.sentences_user_template,
      &[
        ("count", count.as_str()),
        ("difficulty", tier.as_str()),
        ("focus", focus_clause.as_str()),
        ("modifier_codes", modifier_codes.as_str()),
        ("subject_codes", subject_codes.as_str()),
      ],
    )
  }
}

/// Turn one generated item into a playable sentence, or explain why not.
fn into_sentence(g: GenSentence, tier: Tier) -> Result<Sentence, String> {
  let modifiers = g
    .modifiers
    .into_iter()
    .map(|m| {
      m.code
        .parse::<ModifierCode>()
        .map(|code| Modifier { start: m.start, end: m.end, code })
        .map_err(|e| e.to_string())
    })
    .collect::<Result<Vec<_>, _>>()?;
  let subject_type = g
    .subject_type
    .as_deref()
    .map(|s| s.parse::<SubjectCode>().unwrap_or(SubjectCode::Noun))
    .unwrap_or(SubjectCode::Noun);

  let s = Sentence {
    id: Uuid::new_v4().to_string(),
    tokens: g.tokens,
    head_noun: g.head_noun,
    main_verb: g.main_verb,
    modifiers,
    subject_type,
    translation: g.translation,
    difficulty: tier,
    source: SentenceSource::Generated,
  };
  s.validate().map_err(|e| e.to_string())?;
  Ok(s)
}

#[async_trait]
impl SentenceGenerator for OpenAI {
  #[instrument(level = "info", skip(self), fields(model = %self.strong_model))]
  async fn generate(&self, tier: Tier, count: usize, focus: Option<ModifierCode>) -> Result<Vec<Sentence>, ServiceError> {
    let user = self.sentences_prompt(tier, count, focus);
    let start = Instant::now();
    let result = self
      .chat_json::<GenBatch>(&self.strong_model, &self.prompts.sentences_system, &user, 0.9)
      .await;
    let elapsed = start.elapsed();

    let batch = match result {
      Ok(b) => {
        info!(?elapsed, items = b.sentences.len(), "Model response received successfully");
        b
      }
      Err(e) => {
        error!(?elapsed, error = %e, "Model call failed during sentence generation");
        return Err(e);
      }
    };

    let mut out = Vec::with_capacity(batch.sentences.len());
    for g in batch.sentences {
      let preview = trunc_for_log(&g.tokens.join(" "), 60);
      match into_sentence(g, tier) {
        Ok(s) => out.push(s),
        Err(reason) => warn!(target: "session", %preview, %reason, "Dropping invalid generated sentence"),
      }
    }
    out.truncate(count);
    Ok(out)
  }
}

#[async_trait]
impl HintGenerator for OpenAI {
  #[instrument(level = "info", skip(self, modifier_text), fields(text_len = modifier_text.len(), %correct, %wrong))]
  async fn hint(&self, modifier_text: &str, correct: ModifierCode, wrong: ModifierCode) -> Result<String, ServiceError> {
    let user = fill_template(
      &self.prompts.hint_user_template,
      &[
        ("modifier_text", modifier_text),
        ("correct", correct.code()),
        ("correct_label", correct.label()),
        ("wrong", wrong.code()),
        ("wrong_label", wrong.label()),
      ],
    );
    self.chat_plain(&self.fast_model, &self.prompts.hint_system, &user, 0.3).await
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}
