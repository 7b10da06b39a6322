//! Game session types

use crate::shared::progression::LevelProgress;
use crate::shared::question::{Difficulty, Question};
use chrono::{DateTime, Utc};

/// Shown with results when progress has not reached the server yet
pub const OFFLINE_NOTICE: &str =
    "Playing in offline mode. Progress will be synced when you reconnect.";

/// Substituted when a locally graded question has no explanation
pub const NO_OFFLINE_EXPLANATION: &str = "No explanation available in offline mode";

/// What the player asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    pub difficulty: Difficulty,
    /// `None` (or empty) means any category
    pub category: Option<String>,
    pub question_count: usize,
}

impl GameSettings {
    pub fn new(difficulty: Difficulty, question_count: usize) -> Self {
        Self {
            difficulty,
            category: None,
            question_count,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        let category = category.into();
        self.category = (!category.is_empty()).then_some(category);
        self
    }
}

/// Where the session's questions came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionSource {
    Remote,
    LocalCache,
}

/// How one answer was graded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradingPath {
    Remote,
    /// Graded against the cached answer and recorded in the ledger
    Local,
}

/// Result of grading one answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub question_id: String,
    pub submitted: String,
    pub is_correct: bool,
    /// Only present for wrong answers
    pub correct_answer: Option<String>,
    pub explanation: String,
    pub xp_gained: u32,
    pub grading: GradingPath,
    /// Reported by the server on the remote path
    pub did_level_up: bool,
}

/// One quiz attempt. Never persisted.
#[derive(Debug, Clone)]
pub struct GameSession {
    pub settings: GameSettings,
    pub questions: Vec<Question>,
    pub source: QuestionSource,
    pub current_index: usize,
    pub score: u32,
    pub streak: u32,
    pub xp_gained: u64,
    pub started_at: DateTime<Utc>,
    /// Whether any answer went down the local path
    pub graded_locally: bool,
}

impl GameSession {
    pub fn new(settings: GameSettings, questions: Vec<Question>, source: QuestionSource) -> Self {
        Self {
            settings,
            questions,
            source,
            current_index: 0,
            score: 0,
            streak: 0,
            xp_gained: 0,
            started_at: Utc::now(),
            graded_locally: false,
        }
    }

    /// Questions actually resolved, which may be fewer than requested
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }

    pub(crate) fn apply(&mut self, feedback: &AnswerFeedback) {
        if feedback.is_correct {
            self.score += 1;
            self.streak += 1;
            self.xp_gained += u64::from(feedback.xp_gained);
        } else {
            self.streak = 0;
        }
        if feedback.grading == GradingPath::Local {
            self.graded_locally = true;
        }
    }
}

/// Summary shown when a session ends
#[derive(Debug, Clone, PartialEq)]
pub struct GameResults {
    pub difficulty: Difficulty,
    pub category: Option<String>,
    pub score: u32,
    pub total: u32,
    pub xp_gained: u64,
    pub duration_secs: i64,
    /// Cumulative account progress; `None` when not logged in
    pub progress: Option<LevelProgress>,
    pub offline_notice: Option<&'static str>,
}

impl GameResults {
    pub fn is_anonymous(&self) -> bool {
        self.progress.is_none()
    }
}

/// Controller state machine
#[derive(Debug, Clone, PartialEq)]
pub enum GamePhase {
    Setup,
    InProgress,
    Feedback(AnswerFeedback),
    Results(GameResults),
}

impl GamePhase {
    pub fn name(&self) -> &'static str {
        match self {
            GamePhase::Setup => "setup",
            GamePhase::InProgress => "in-progress",
            GamePhase::Feedback(_) => "feedback",
            GamePhase::Results(_) => "results",
        }
    }
}
