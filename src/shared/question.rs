/**
 * Question Data Model
 *
 * Questions are immutable snapshots created by the remote server. The
 * public question endpoint strips `correctAnswer`; only the bundled default
 * set and the authenticated offline pack carry it, which is what makes a
 * question gradable without the server.
 */
use crate::shared::error::SharedError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Cached questions grouped by difficulty tier
pub type QuestionSnapshot = BTreeMap<Difficulty, Vec<Question>>;

/// Parse a snapshot from its JSON layout (tier name to questions)
pub fn parse_snapshot(json: &str) -> Result<QuestionSnapshot, SharedError> {
    Ok(serde_json::from_str(json)?)
}

/// One of the six fixed difficulty tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Easy,
    Medium,
    Hard,
    Elite,
    Master,
}

impl Difficulty {
    /// Every tier, easiest first
    pub const ALL: [Difficulty; 6] = [
        Difficulty::Beginner,
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Elite,
        Difficulty::Master,
    ];

    /// XP awarded for a correct answer in this tier
    pub fn xp_reward(self) -> u32 {
        match self {
            Difficulty::Beginner => 10,
            Difficulty::Easy => 25,
            Difficulty::Medium => 50,
            Difficulty::Hard => 100,
            Difficulty::Elite => 200,
            Difficulty::Master => 500,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "Beginner",
            Difficulty::Easy => "Easy",
            Difficulty::Medium => "Medium",
            Difficulty::Hard => "Hard",
            Difficulty::Elite => "Elite",
            Difficulty::Master => "Master",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Difficulty::ALL
            .into_iter()
            .find(|tier| tier.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SharedError::validation("difficulty", format!("unknown tier '{}'", s)))
    }
}

/// A trivia question
///
/// `correct_answer` is only present in locally cached copies; responses from
/// the public question endpoint never include it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Server identifier, `_id` on the wire
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub text: String,
    /// Answer options in display order
    pub answers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    pub difficulty: Difficulty,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl Question {
    /// Whether this copy can be graded without the server
    pub fn is_gradable_offline(&self) -> bool {
        self.correct_answer.is_some()
    }

    /// Grade an answer against the cached correct answer, ignoring case.
    ///
    /// Returns `None` when this copy carries no correct answer.
    pub fn grade(&self, answer: &str) -> Option<bool> {
        self.correct_answer
            .as_deref()
            .map(|correct| correct.to_lowercase() == answer.to_lowercase())
    }

    /// Copy of this question as the public endpoint would serve it
    pub fn without_answer(&self) -> Question {
        Question {
            correct_answer: None,
            ..self.clone()
        }
    }
}
