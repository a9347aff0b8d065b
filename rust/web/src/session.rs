use blackjack_engine::cards::Card;
use blackjack_engine::errors::GameError;
use blackjack_engine::round::{Phase, Round};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use thiserror::Error;
use warp::http::StatusCode;

use crate::errors::{ErrorSeverity, IntoErrorResponse};
use crate::score::{ScoreError, ScoreStore};

/// One card as exposed over the wire. The dealer's hole card is replaced by
/// the `?`/`?` placeholder while a round is in progress.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardView {
    pub rank: String,
    pub suit: String,
}

impl CardView {
    fn hidden() -> Self {
        Self {
            rank: "?".into(),
            suit: "?".into(),
        }
    }
}

impl From<Card> for CardView {
    fn from(card: Card) -> Self {
        Self {
            rank: card.rank.symbol().to_string(),
            suit: card.suit.symbol().to_string(),
        }
    }
}

/// Response body for every session operation.
///
/// `message` is empty while the round is in progress; once it is non-empty
/// the round is resolved and the dealer hand is fully revealed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub player_hand: Vec<CardView>,
    pub dealer_hand: Vec<CardView>,
    pub message: String,
    pub score: i64,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid action")]
    InvalidAction,
    #[error("failed to load score")]
    ScoreLoad(#[source] ScoreError),
    #[error("failed to persist score")]
    ScoreSave(#[source] ScoreError),
    #[error("game engine error: {0}")]
    Engine(GameError),
    #[error("session storage poisoned")]
    LockPoisoned,
}

impl IntoErrorResponse for SessionError {
    fn status_code(&self) -> StatusCode {
        match self {
            SessionError::InvalidAction => StatusCode::BAD_REQUEST,
            SessionError::ScoreLoad(_)
            | SessionError::ScoreSave(_)
            | SessionError::Engine(_)
            | SessionError::LockPoisoned => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            SessionError::InvalidAction => "invalid_action",
            SessionError::ScoreLoad(_) => "score_load_failed",
            SessionError::ScoreSave(_) => "persist_failed",
            SessionError::Engine(_) => "engine_error",
            SessionError::LockPoisoned => "session_storage_error",
        }
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            SessionError::InvalidAction => ErrorSeverity::Client,
            SessionError::ScoreLoad(_) | SessionError::ScoreSave(_) => ErrorSeverity::Server,
            SessionError::Engine(_) | SessionError::LockPoisoned => ErrorSeverity::Critical,
        }
    }
}

/// Per-address game state. The round never outlives the session; the score
/// does, via the score store.
struct PlayerSession {
    round: Round,
    score: i64,
    /// Set when a score write failed after the round already advanced. The
    /// pending write is retried before any further mutation is accepted.
    dirty: bool,
}

impl PlayerSession {
    fn new() -> Self {
        Self {
            round: Round::new(),
            score: 0,
            dirty: false,
        }
    }
}

/// Orchestrates rounds, scores, and persistence for all players.
///
/// Each address owns an isolated session behind its own mutex, so actions on
/// one address are serialized while unrelated addresses proceed in parallel.
/// The registry lock is only held long enough to find or insert a session.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, Arc<Mutex<PlayerSession>>>>,
    store: Arc<dyn ScoreStore>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.sessions.read().map(|s| s.len()).unwrap_or(0);
        f.debug_struct("SessionManager")
            .field("sessions", &count)
            .finish()
    }
}

impl SessionManager {
    pub fn new(store: Arc<dyn ScoreStore>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            store,
        }
    }

    /// Start or reset the round for `address` and load its persisted score.
    ///
    /// Deliberately unauthenticated, matching the read path contract: anyone
    /// can observe a score, only mutations are gated.
    pub fn start(&self, address: &str) -> Result<SessionView, SessionError> {
        let cell = self.session_for(address)?;
        let mut session = cell.lock().map_err(|_| SessionError::LockPoisoned)?;
        self.flush_pending(address, &mut session)?;

        let score = self
            .store
            .get_score(address)
            .map_err(SessionError::ScoreLoad)?
            .unwrap_or(0);
        session.score = score;

        tracing::info!(address = %address, score, "starting new round");
        let outcome = match session.round.deal() {
            Ok(outcome) => outcome,
            Err(err) => return Err(self.fatal(address, &mut session, err)),
        };
        if let Some(outcome) = outcome {
            // natural 21 on the deal resolves immediately
            session.score += outcome.score_delta();
            self.persist(address, &mut session)?;
        }
        Ok(view(&session))
    }

    /// Draw one card for the player. Resolving outcomes mutate and persist
    /// the score before the response is produced.
    pub fn hit(&self, address: &str) -> Result<SessionView, SessionError> {
        let cell = self.session_for(address)?;
        let mut session = cell.lock().map_err(|_| SessionError::LockPoisoned)?;
        self.flush_pending(address, &mut session)?;

        let outcome = match session.round.hit() {
            Ok(outcome) => outcome,
            Err(err) => return Err(self.map_action_error(address, &mut session, err)),
        };
        tracing::debug!(address = %address, outcome = ?outcome, "player hit");
        if let Some(outcome) = outcome {
            session.score += outcome.score_delta();
            self.persist(address, &mut session)?;
        }
        Ok(view(&session))
    }

    /// Run the dealer to completion and resolve the round.
    pub fn stand(&self, address: &str) -> Result<SessionView, SessionError> {
        let cell = self.session_for(address)?;
        let mut session = cell.lock().map_err(|_| SessionError::LockPoisoned)?;
        self.flush_pending(address, &mut session)?;

        let outcome = match session.round.stand() {
            Ok(outcome) => outcome,
            Err(err) => return Err(self.map_action_error(address, &mut session, err)),
        };
        tracing::debug!(address = %address, outcome = ?outcome, "player stood");
        session.score += outcome.score_delta();
        self.persist(address, &mut session)?;
        Ok(view(&session))
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.read().map(|s| s.len()).unwrap_or(0)
    }

    fn session_for(&self, address: &str) -> Result<Arc<Mutex<PlayerSession>>, SessionError> {
        let key = address.to_lowercase();
        {
            let sessions = self
                .sessions
                .read()
                .map_err(|_| SessionError::LockPoisoned)?;
            if let Some(cell) = sessions.get(&key) {
                return Ok(Arc::clone(cell));
            }
        }
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;
        Ok(Arc::clone(
            sessions
                .entry(key)
                .or_insert_with(|| Arc::new(Mutex::new(PlayerSession::new()))),
        ))
    }

    /// Write the score; on failure the session is dirty and the action is
    /// reported failed even though the round already advanced.
    fn persist(&self, address: &str, session: &mut PlayerSession) -> Result<(), SessionError> {
        match self.store.put_score(address, session.score) {
            Ok(()) => {
                session.dirty = false;
                Ok(())
            }
            Err(err) => {
                session.dirty = true;
                tracing::error!(
                    address = %address,
                    score = session.score,
                    error = %err,
                    "score write failed; session marked dirty"
                );
                Err(SessionError::ScoreSave(err))
            }
        }
    }

    fn flush_pending(
        &self,
        address: &str,
        session: &mut PlayerSession,
    ) -> Result<(), SessionError> {
        if session.dirty {
            tracing::warn!(address = %address, "retrying pending score write");
            self.persist(address, session)?;
        }
        Ok(())
    }

    fn map_action_error(
        &self,
        address: &str,
        session: &mut PlayerSession,
        err: GameError,
    ) -> SessionError {
        match err {
            GameError::NoRoundInProgress | GameError::RoundResolved => {
                SessionError::InvalidAction
            }
            GameError::DeckExhausted { .. } => self.fatal(address, session, err),
        }
    }

    /// A broken deck invariant is fatal for the round: force a reset so the
    /// next start deals from a clean 52-card deck.
    fn fatal(&self, address: &str, session: &mut PlayerSession, err: GameError) -> SessionError {
        tracing::error!(address = %address, error = %err, "deck invariant broken, resetting round");
        session.round.abort();
        SessionError::Engine(err)
    }
}

fn view(session: &PlayerSession) -> SessionView {
    let round = &session.round;
    let resolved = round.phase() == Phase::Resolved;

    let dealer_hand = if resolved {
        round.dealer_hand().iter().copied().map(CardView::from).collect()
    } else {
        match round.dealer_hand().first() {
            Some(&up_card) => vec![CardView::from(up_card), CardView::hidden()],
            None => Vec::new(),
        }
    };

    SessionView {
        player_hand: round.player_hand().iter().copied().map(CardView::from).collect(),
        dealer_hand,
        message: round
            .outcome()
            .map(|o| o.message().to_string())
            .unwrap_or_default(),
        score: session.score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::MemoryScoreStore;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FlakyScoreStore {
        inner: MemoryScoreStore,
        failing: AtomicBool,
    }

    impl FlakyScoreStore {
        fn new() -> Self {
            Self {
                inner: MemoryScoreStore::new(),
                failing: AtomicBool::new(false),
            }
        }

        fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }
    }

    impl ScoreStore for FlakyScoreStore {
        fn get_score(&self, address: &str) -> Result<Option<i64>, ScoreError> {
            self.inner.get_score(address)
        }

        fn put_score(&self, address: &str, score: i64) -> Result<(), ScoreError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(ScoreError::Unavailable("simulated outage".into()));
            }
            self.inner.put_score(address, score)
        }
    }

    fn manager() -> (SessionManager, Arc<MemoryScoreStore>) {
        let store = Arc::new(MemoryScoreStore::new());
        (SessionManager::new(Arc::clone(&store) as Arc<dyn ScoreStore>), store)
    }

    /// Start rounds until one does not resolve on the deal (a natural 21
    /// shows up in roughly 1 of 21 deals).
    fn start_in_progress(manager: &SessionManager, address: &str) -> SessionView {
        for _ in 0..100 {
            let state = manager.start(address).expect("start");
            if state.message.is_empty() {
                return state;
            }
        }
        panic!("100 consecutive naturals is not plausible");
    }

    #[test]
    fn start_deals_two_cards_and_masks_the_hole_card() {
        let (manager, _) = manager();
        let state = start_in_progress(&manager, "0xPlayer");
        assert_eq!(state.player_hand.len(), 2);
        assert_eq!(state.dealer_hand.len(), 2);
        assert_ne!(state.dealer_hand[0].rank, "?");
        assert_eq!(state.dealer_hand[1].rank, "?");
        assert_eq!(state.dealer_hand[1].suit, "?");
        assert_eq!(state.message, "");
        assert_eq!(state.score, 0);
    }

    #[test]
    fn stand_reveals_dealer_and_persists_score() {
        let (manager, store) = manager();
        start_in_progress(&manager, "0xPlayer");
        let state = manager.stand("0xPlayer").expect("stand");
        assert!(!state.message.is_empty());
        assert!(state.dealer_hand.iter().all(|c| c.rank != "?"));
        assert_eq!(store.get_score("0xplayer"), Ok(Some(state.score)));
    }

    #[test]
    fn actions_after_resolution_are_invalid() {
        let (manager, _) = manager();
        start_in_progress(&manager, "0xPlayer");
        manager.stand("0xPlayer").expect("stand");
        assert!(matches!(
            manager.hit("0xPlayer").unwrap_err(),
            SessionError::InvalidAction
        ));
        assert!(matches!(
            manager.stand("0xPlayer").unwrap_err(),
            SessionError::InvalidAction
        ));
        // start is the one action always allowed
        manager.start("0xPlayer").expect("restart");
    }

    #[test]
    fn actions_before_any_start_are_invalid() {
        let (manager, _) = manager();
        assert!(matches!(
            manager.hit("0xFresh").unwrap_err(),
            SessionError::InvalidAction
        ));
    }

    #[test]
    fn score_survives_across_rounds() {
        let (manager, store) = manager();
        start_in_progress(&manager, "0xPlayer");
        let resolved = manager.stand("0xPlayer").expect("stand");
        let restarted = start_in_progress(&manager, "0xPlayer");
        assert_eq!(restarted.score, resolved.score);
        assert_eq!(store.get_score("0xplayer"), Ok(Some(resolved.score)));
    }

    #[test]
    fn addresses_are_isolated() {
        let (manager, _) = manager();
        start_in_progress(&manager, "0xAlpha");
        start_in_progress(&manager, "0xBeta");
        manager.stand("0xAlpha").expect("stand alpha");
        // beta's round is untouched by alpha's resolution
        let beta = manager.hit("0xBeta");
        match beta {
            Ok(state) => assert_eq!(state.player_hand.len(), 3),
            Err(SessionError::InvalidAction) => panic!("beta round was affected by alpha"),
            Err(other) => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(manager.active_sessions(), 2);
    }

    #[test]
    fn address_keys_are_case_insensitive() {
        let (manager, _) = manager();
        start_in_progress(&manager, "0xAbCd");
        // same session, different casing: stand resolves the round started above
        let state = manager.stand("0xABCD").expect("stand");
        assert!(!state.message.is_empty());
    }

    #[test]
    fn failed_persist_marks_dirty_and_blocks_until_flushed() {
        let store = Arc::new(FlakyScoreStore::new());
        let manager = SessionManager::new(Arc::clone(&store) as Arc<dyn ScoreStore>);
        start_in_progress(&manager, "0xPlayer");

        store.set_failing(true);
        let err = manager.stand("0xPlayer").unwrap_err();
        assert!(matches!(err, SessionError::ScoreSave(_)));

        // still failing: the retry also fails and no new round starts
        let err = manager.start("0xPlayer").unwrap_err();
        assert!(matches!(err, SessionError::ScoreSave(_)));

        // once the store recovers, the pending write flushes and play resumes
        store.set_failing(false);
        let state = manager.start("0xPlayer").expect("start after recovery");
        assert_eq!(store.get_score("0xplayer"), Ok(Some(state.score)));
    }
}
