//! Orchestration of tool-calling turns

pub mod runner;

pub use runner::{Dispatched, dispatch, result_statement, run_turn};
