//! Application layer containing the answer-resolution orchestration.
//!
//! This module defines the `AnswerEngine`, the primary entry point for
//! loading the answer matrix and applying cell edits. Persistence calls are
//! awaited sequentially; cell saves are debounced per answer id through the
//! `SaveScheduler`.

pub mod debounce;
pub mod engine;
