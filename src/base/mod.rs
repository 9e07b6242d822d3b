//! Core components, types, and utilities for rival-radar.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - Prompt templates and user-facing messages.
//! - Pure extraction heuristics (URLs, page text, company names).
//! - Immutable reference data.
//! - Common types and result handling.

pub mod config;
pub mod extract;
pub mod prompts;
pub mod reference;
pub mod types;
