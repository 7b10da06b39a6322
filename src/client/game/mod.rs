//! # Game Session Controller
//!
//! Runs one quiz at a time through `Setup -> InProgress -> Feedback ->
//! (InProgress | Results)`.
//!
//! ## Grading
//!
//! Online, answers go to the remote checker. Offline, or whenever the remote
//! checker fails, the answer is compared case-insensitively with the cached
//! correct answer, rewarded from the tier table, and recorded in the offline
//! ledger. A connectivity change mid-quiz only switches the grading path of
//! later answers; index, score and streak carry on. An unreachable server
//! seen here marks the client offline right away.
//!
//! Answers are only accepted in `InProgress`, and `submit_answer` takes
//! `&mut self`, so a second submission for the same question cannot race
//! the first.

pub mod session;

pub use session::{
    AnswerFeedback, GamePhase, GameResults, GameSession, GameSettings, GradingPath,
    QuestionSource, NO_OFFLINE_EXPLANATION, OFFLINE_NOTICE,
};

use crate::client::api::ApiClient;
use crate::client::connectivity::ConnectivityState;
use crate::client::local_store::{SessionStore, StoreError};
use crate::client::offline::{LedgerError, OfflineLedger};
use crate::client::questions::QuestionCache;
use crate::shared::api_types::{ActivityReport, CheckAnswerRequest, CheckAnswerResponse};
use crate::shared::progression::{level_for_xp, LevelProgress};
use crate::shared::question::{Difficulty, Question};
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum GameError {
    #[error("No {difficulty} questions available for the selected criteria. Try a different difficulty or category.")]
    NoQuestions {
        difficulty: Difficulty,
        category: Option<String>,
    },

    #[error("cannot {action} during {phase}")]
    InvalidPhase {
        action: &'static str,
        phase: &'static str,
    },

    #[error("question {question_id} cannot be graded: server unreachable and no cached answer")]
    Ungradable { question_id: String },

    #[error("failed to record offline progress: {0}")]
    Ledger(#[from] LedgerError),

    #[error("local store error: {0}")]
    Store(#[from] StoreError),
}

/// Drives quiz sessions
#[derive(Debug)]
pub struct GameController {
    api: ApiClient,
    cache: Arc<QuestionCache>,
    ledger: OfflineLedger,
    sessions: SessionStore,
    connectivity: ConnectivityState,
    phase: GamePhase,
    session: Option<GameSession>,
}

impl GameController {
    pub fn new(
        api: ApiClient,
        cache: Arc<QuestionCache>,
        ledger: OfflineLedger,
        sessions: SessionStore,
        connectivity: ConnectivityState,
    ) -> Self {
        Self {
            api,
            cache,
            ledger,
            sessions,
            connectivity,
            phase: GamePhase::Setup,
            session: None,
        }
    }

    pub fn phase(&self) -> &GamePhase {
        &self.phase
    }

    pub fn session(&self) -> Option<&GameSession> {
        self.session.as_ref()
    }

    pub fn accepts_answers(&self) -> bool {
        matches!(self.phase, GamePhase::InProgress)
    }

    /// Back to setup, discarding any session
    pub fn reset(&mut self) {
        self.phase = GamePhase::Setup;
        self.session = None;
    }

    fn expect_phase(&self, action: &'static str, ok: bool) -> Result<(), GameError> {
        if ok {
            Ok(())
        } else {
            Err(GameError::InvalidPhase {
                action,
                phase: self.phase.name(),
            })
        }
    }

    /// Resolve questions and start a session
    pub async fn start_game(&mut self, settings: GameSettings) -> Result<&GameSession, GameError> {
        self.expect_phase("start a game", matches!(self.phase, GamePhase::Setup))?;

        let (questions, source) = self.resolve_questions(&settings).await;
        if questions.is_empty() {
            return Err(GameError::NoQuestions {
                difficulty: settings.difficulty,
                category: settings.category,
            });
        }

        info!(
            "Starting {} quiz with {} question(s) from {:?}",
            settings.difficulty,
            questions.len(),
            source
        );
        self.phase = GamePhase::InProgress;
        Ok(self
            .session
            .insert(GameSession::new(settings, questions, source)))
    }

    async fn resolve_questions(&self, settings: &GameSettings) -> (Vec<Question>, QuestionSource) {
        let category = settings.category.as_deref().filter(|c| !c.is_empty());

        if !self.connectivity.is_offline() {
            match self
                .api
                .fetch_questions(settings.difficulty, category, settings.question_count)
                .await
            {
                Ok(mut questions) => {
                    questions.truncate(settings.question_count);
                    return (questions, QuestionSource::Remote);
                }
                Err(e) => {
                    warn!("Question fetch failed, using cached questions: {}", e);
                    self.connectivity.report_failure(&e);
                }
            }
        }

        let questions = self
            .cache
            .get_questions(settings.difficulty, category, settings.question_count)
            .await;
        (questions, QuestionSource::LocalCache)
    }

    /// Grade the answer to the current question
    pub async fn submit_answer(&mut self, answer: &str) -> Result<AnswerFeedback, GameError> {
        self.expect_phase("submit an answer", self.accepts_answers())?;
        let question = match self.session.as_ref().and_then(GameSession::current_question) {
            Some(question) => question.clone(),
            None => {
                return Err(GameError::InvalidPhase {
                    action: "submit an answer",
                    phase: "no current question",
                })
            }
        };

        let feedback = if self.connectivity.is_offline() {
            self.grade_locally(&question, answer).await?
        } else {
            let token = self.sessions.token().await?;
            let request = CheckAnswerRequest {
                question_id: question.id.clone(),
                answer: answer.to_string(),
            };
            match self.api.check_answer(token.as_deref(), &request).await {
                Ok(response) => self.accept_remote(&question, answer, response).await?,
                Err(e) => {
                    warn!("Answer check failed, grading locally: {}", e);
                    self.connectivity.report_failure(&e);
                    self.grade_locally(&question, answer).await?
                }
            }
        };

        if let Some(session) = self.session.as_mut() {
            session.apply(&feedback);
        }
        self.phase = GamePhase::Feedback(feedback.clone());
        Ok(feedback)
    }

    async fn grade_locally(
        &self,
        question: &Question,
        answer: &str,
    ) -> Result<AnswerFeedback, GameError> {
        // Remote-sourced copies carry no answer; the cache may have one
        let cached;
        let gradable = if question.is_gradable_offline() {
            question
        } else {
            cached = self.cache.find(&question.id).await;
            cached.as_ref().filter(|q| q.is_gradable_offline()).ok_or_else(|| {
                GameError::Ungradable {
                    question_id: question.id.clone(),
                }
            })?
        };

        let is_correct = gradable.grade(answer).unwrap_or(false);
        let xp_gained = if is_correct {
            gradable.difficulty.xp_reward()
        } else {
            0
        };
        self.ledger.record(is_correct, xp_gained).await?;

        Ok(AnswerFeedback {
            question_id: question.id.clone(),
            submitted: answer.to_string(),
            is_correct,
            correct_answer: if is_correct {
                None
            } else {
                gradable.correct_answer.clone()
            },
            explanation: gradable
                .explanation
                .clone()
                .unwrap_or_else(|| NO_OFFLINE_EXPLANATION.to_string()),
            xp_gained,
            grading: GradingPath::Local,
            did_level_up: false,
        })
    }

    async fn accept_remote(
        &self,
        question: &Question,
        answer: &str,
        response: CheckAnswerResponse,
    ) -> Result<AnswerFeedback, GameError> {
        if let Some(mut account) = self.sessions.account().await? {
            match response.user_xp {
                Some(xp) => {
                    account.xp = xp;
                    account.level = response.user_level.unwrap_or_else(|| level_for_xp(xp));
                }
                None => {
                    account.xp += u64::from(response.xp_gained);
                    account.level = level_for_xp(account.xp);
                }
            }
            self.sessions.set_account(&account).await?;
        }

        Ok(AnswerFeedback {
            question_id: question.id.clone(),
            submitted: answer.to_string(),
            is_correct: response.is_correct,
            correct_answer: response.correct_answer,
            explanation: response.explanation.unwrap_or_default(),
            xp_gained: response.xp_gained,
            grading: GradingPath::Remote,
            did_level_up: response.did_level_up.unwrap_or(false),
        })
    }

    /// Move past the feedback; ends the session after the last question
    pub async fn next_question(&mut self) -> Result<&GamePhase, GameError> {
        self.expect_phase(
            "advance",
            matches!(self.phase, GamePhase::Feedback(_)),
        )?;

        let finished = match self.session.as_mut() {
            Some(session) => {
                session.current_index += 1;
                session.current_index >= session.total_questions()
            }
            None => true,
        };

        if finished {
            let results = self.finish().await?;
            self.phase = GamePhase::Results(results);
        } else {
            self.phase = GamePhase::InProgress;
        }
        Ok(&self.phase)
    }

    async fn finish(&mut self) -> Result<GameResults, GameError> {
        let session = match self.session.take() {
            Some(session) => session,
            None => {
                return Err(GameError::InvalidPhase {
                    action: "show results",
                    phase: "no session",
                })
            }
        };

        let pending = self.ledger.read().await?;
        let offline = self.connectivity.is_offline();
        let progress = self.sessions.account().await?.map(|account| {
            let unsynced = if pending.pending_sync { pending.xp } else { 0 };
            LevelProgress::from_xp(account.xp + unsynced)
        });

        let results = GameResults {
            difficulty: session.settings.difficulty,
            category: session.settings.category.clone(),
            score: session.score,
            total: session.total_questions() as u32,
            xp_gained: session.xp_gained,
            duration_secs: (Utc::now() - session.started_at).num_seconds(),
            progress,
            offline_notice: (offline || pending.pending_sync).then_some(OFFLINE_NOTICE),
        };

        if !offline {
            if let Some(token) = self.sessions.token().await? {
                self.report_activity(token, &session, &results);
            }
        }

        debug!("Quiz finished: {}/{}", results.score, results.total);
        Ok(results)
    }

    fn report_activity(&self, token: String, session: &GameSession, results: &GameResults) {
        let api = self.api.clone();
        let report = ActivityReport {
            kind: "quiz".to_string(),
            difficulty: results.difficulty,
            category: results.category.clone(),
            score: results.score,
            total: results.total,
            xp: results.xp_gained,
            duration_secs: results.duration_secs,
            offline: session.graded_locally,
            completed_at: Utc::now(),
        };

        tokio::spawn(async move {
            if let Err(e) = api.report_activity(&token, &report).await {
                warn!("Activity report failed: {}", e);
            }
        });
    }
}
