//! Integration tests: components wired together against a fake origin

pub mod edge_proxy;
pub mod game_flow;
pub mod offline_sync;
