//! Test suite for trivia_offline
//!
//! This module organizes all tests

pub mod common;
pub mod integration;
pub mod property;
