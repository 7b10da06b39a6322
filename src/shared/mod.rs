//! Shared Module
//!
//! This module contains types and data structures that are shared between
//! the quiz client and the caching edge. These types describe the wire
//! contract of the remote trivia server and the pieces of game logic that
//! must be computed identically everywhere (level progression, XP rewards).
//!
//! # Overview
//!
//! The shared module provides platform-agnostic types that can be used
//! in both client and edge code. All wire types are designed for
//! serialization and transmission over HTTP.

/// Question and difficulty tier types
pub mod question;

/// Level/XP progression shared by every display
pub mod progression;

/// Request/response shapes of the remote trivia API
pub mod api_types;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// SQLite pool helpers used by every local store
pub mod storage;

/// Re-export commonly used types for convenience
pub use question::{Difficulty, Question, QuestionSnapshot};
pub use progression::{level_for_xp, xp_for_level, LevelProgress, MAX_LEVEL};
pub use error::SharedError;
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
