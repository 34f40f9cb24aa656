//! Application state: the learner's player, the static sentence pool, and the
//! generator ports.
//!
//! This module owns:
//!   - the single `Player` (progress, session, step state) behind a mutex
//!   - the static pool (built-in seeds + TOML bank + cached generated sentences)
//!   - the sentence and hint generators (OpenAI when configured, `Offline` otherwise)
//!   - game tuning from the `[game]` section
//!
//! Batches are assembled outside the player lock; the player's ticket check
//! drops a batch that arrives after the learner moved on.

use std::{collections::BTreeMap, sync::Arc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};

use crate::config::{load_agent_config_from_env, GameSettings};
use crate::diagnosis::NextAction;
use crate::domain::{Deck, Sentence, SentenceSource, Tier};
use crate::openai::OpenAI;
use crate::player::{PendingBatch, PlayError, Player};
use crate::ports::{HintGenerator, Offline, SentenceGenerator};
use crate::seeds::seed_sentences;
use crate::session::{assemble_batch, StaticPool};
use crate::taxonomy::ModifierCode;

#[derive(Clone)]
pub struct AppState {
    pub player: Arc<Mutex<Player>>,
    pub pool: Arc<RwLock<StaticPool>>,
    pub generator: Arc<dyn SentenceGenerator>,
    pub hints: Arc<dyn HintGenerator>,
    pub settings: GameSettings,
}

impl AppState {
    /// Build state from env: load config, seed the pool, init OpenAI.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_agent_config_from_env().unwrap_or_default();

        // Bank items first so they win over seeds with the same id.
        let mut pool = StaticPool::new();
        for mut s in cfg.sentences {
            s.source = SentenceSource::LocalBank;
            pool.insert(s);
        }
        for s in seed_sentences() {
            pool.insert(s);
        }
        log_inventory(&pool);

        let (generator, hints): (Arc<dyn SentenceGenerator>, Arc<dyn HintGenerator>) =
            match OpenAI::from_env(cfg.prompts) {
                Some(oa) => {
                    info!(target: "syntax_sweep", base_url = %oa.base_url, fast_model = %oa.fast_model, strong_model = %oa.strong_model, "OpenAI enabled.");
                    let oa = Arc::new(oa);
                    (oa.clone() as Arc<dyn SentenceGenerator>, oa as Arc<dyn HintGenerator>)
                }
                None => {
                    info!(target: "syntax_sweep", "OpenAI disabled (no OPENAI_API_KEY). Using the static pool and generic hints.");
                    (Arc::new(Offline) as Arc<dyn SentenceGenerator>, Arc::new(Offline) as Arc<dyn HintGenerator>)
                }
            };

        Self::with_ports(cfg.game, pool, generator, hints)
    }

    pub fn with_ports(
        settings: GameSettings,
        pool: StaticPool,
        generator: Arc<dyn SentenceGenerator>,
        hints: Arc<dyn HintGenerator>,
    ) -> Self {
        Self {
            player: Arc::new(Mutex::new(Player::new(settings.clone()))),
            pool: Arc::new(RwLock::new(pool)),
            generator,
            hints,
            settings,
        }
    }

    /// Start a session on `deck`. Returns once the batch is loaded (or rejected).
    #[instrument(level = "info", skip(self))]
    pub async fn start_session(&self, deck: Deck, focus: Option<ModifierCode>) -> Result<(), PlayError> {
        let pending = self.player.lock().await.begin_session(deck, focus)?;
        self.load(pending).await
    }

    /// Act on a diagnosis offer; continuing or retrying loads a new batch.
    #[instrument(level = "info", skip(self))]
    pub async fn follow_up(&self, action: NextAction) -> Result<(), PlayError> {
        let pending = self.player.lock().await.follow_up(action)?;
        match pending {
            Some(p) => self.load(p).await,
            None => Ok(()),
        }
    }

    async fn load(&self, pending: PendingBatch) -> Result<(), PlayError> {
        let batch = {
            let pool = self.pool.read().await;
            assemble_batch(self.generator.as_ref(), &pool, &pending.request).await
        };
        if let Ok(items) = &batch {
            self.cache_generated(items).await;
        }
        let loaded = self.player.lock().await.load_batch(pending.ticket, batch)?;
        if !loaded {
            debug!(target: "session", ticket = pending.ticket, "Batch arrived after the learner moved on");
        }
        Ok(())
    }

    /// Keep generated sentences so a later landfill deck can serve them again.
    #[instrument(level = "debug", skip(self, items), fields(count = items.len()))]
    async fn cache_generated(&self, items: &[Sentence]) {
        let mut pool = self.pool.write().await;
        let mut added = 0usize;
        for s in items.iter().filter(|s| s.source == SentenceSource::Generated) {
            if pool.insert(s.clone()) {
                added += 1;
            }
        }
        if added > 0 {
            debug!(target: "session", added, pool = pool.len(), "Cached generated sentences");
        }
    }
}

fn log_inventory(pool: &StaticPool) {
    // tier -> (bank, seed)
    let mut counts: BTreeMap<&'static str, (usize, usize)> = BTreeMap::new();
    for tier in [Tier::Basic, Tier::Intermediate, Tier::Advanced] {
        let entry = counts.entry(tier.as_str()).or_default();
        for s in pool.tier(tier) {
            match s.source {
                SentenceSource::LocalBank => entry.0 += 1,
                _ => entry.1 += 1,
            }
        }
    }
    for (tier, (bank, seed)) in counts {
        info!(target: "session", %tier, local_bank = bank, seed, "Startup sentence inventory");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::*;
    use crate::player::Phase;
    use crate::ports::ServiceError;
    use async_trait::async_trait;

    struct Canned(Vec<Sentence>);

    #[async_trait]
    impl SentenceGenerator for Canned {
        async fn generate(&self, _t: Tier, count: usize, _f: Option<ModifierCode>) -> Result<Vec<Sentence>, ServiceError> {
            Ok(self.0.iter().take(count).cloned().collect())
        }
    }

    fn seeded_pool() -> StaticPool {
        let mut p = StaticPool::new();
        for s in seed_sentences() {
            p.insert(s);
        }
        p
    }

    #[tokio::test]
    async fn offline_session_plays_from_the_pool() {
        let state = AppState::with_ports(GameSettings::default(), seeded_pool(), Arc::new(Offline), Arc::new(Offline));
        state.start_session(Deck::Tier(Tier::Basic), None).await.unwrap();
        let p = state.player.lock().await;
        assert_eq!(p.phase(), Phase::Playing);
        let s = p.session().unwrap();
        assert!(s.queue.iter().all(|x| x.difficulty == Tier::Basic));
        assert_eq!(s.generated_count(), 0);
    }

    #[tokio::test]
    async fn generated_sentences_are_cached_in_the_pool() {
        let mut g = one_modifier("gen-1");
        g.source = SentenceSource::Generated;
        let state = AppState::with_ports(GameSettings::default(), seeded_pool(), Arc::new(Canned(vec![g])), Arc::new(Offline));
        let before = state.pool.read().await.len();
        state.start_session(Deck::Tier(Tier::Basic), None).await.unwrap();
        let pool = state.pool.read().await;
        assert_eq!(pool.len(), before + 1);
        assert!(pool.get("gen-1").is_some());
    }

    #[tokio::test]
    async fn empty_sources_leave_the_player_selecting() {
        let state = AppState::with_ports(GameSettings::default(), StaticPool::new(), Arc::new(Offline), Arc::new(Offline));
        let err = state.start_session(Deck::Tier(Tier::Basic), None).await.unwrap_err();
        assert!(matches!(err, PlayError::Session(crate::session::SessionError::EmptyBatch)));
        let p = state.player.lock().await;
        assert_eq!(p.phase(), Phase::Selecting);
        assert!(p.view().feedback.is_error);
    }
}
