//! Trivia Offline - Main Library
//!
//! Offline-resilient core of a trivia quiz client: questions keep coming,
//! answers keep getting graded, and progress keeps accumulating while the
//! server is unreachable, then gets reconciled with the player's account
//! once it is back.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared by the client and the edge
//!   - Questions and difficulty tiers, XP/level progression
//!   - Remote API request/response shapes
//!   - Configuration, SQLite helpers, error types
//!
//! - **`client`** - The quiz client
//!   - Local store (session, ledger, question snapshot)
//!   - Connectivity monitor and online-transition handling
//!   - Local question cache and the game session controller
//!
//! - **`edge`** - Local caching edge (only compiled with the `edge` feature)
//!   - Axum server between the client and the origin
//!   - Cache-first static assets, network-first API with offline fallbacks
//!
//! # Feature Flags
//!
//! - **`edge`** (default) - Builds the `edge` module and the `trivia-edge`
//!   binary (axum, tower, tower-http)
//!
//! # Usage
//!
//! ```rust,no_run
//! use trivia_offline::client::{config::Config, TriviaClient};
//! use trivia_offline::client::game::GameSettings;
//! use trivia_offline::shared::Difficulty;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = TriviaClient::open(Config::from_env()?).await?;
//! let _background = client.start_background();
//!
//! let mut game = client.game();
//! game.start_game(GameSettings::new(Difficulty::Hard, 10)).await?;
//! let feedback = game.submit_answer("Blisterwood weapons").await?;
//! println!("correct: {}", feedback.is_correct);
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! - Connectivity state is shared through `Arc<Mutex<>>` plus a
//!   `broadcast::Sender` for transition events
//! - The question cache sits behind a `tokio::sync::RwLock`
//! - The ledger is serialized through versioned compare-and-swap writes on
//!   the local store, which also covers several client processes sharing
//!   one store file

pub mod client;
pub mod shared;

#[cfg(feature = "edge")]
pub mod edge;
