//! Property-based tests

pub mod ledger_proptest;
pub mod progression_proptest;
pub mod shuffle_proptest;
