//! Triggers and the analysis pipeline for rival-radar.
//!
//! This module turns chat events into analyses:
//! - Reaction and slash-command triggers
//! - The fetch / extract / gather / prompt / LLM pipeline
//! - Fallback intelligence gathering for unreadable sites

pub mod analysis;
pub mod command;
pub mod gather;
pub mod reaction;
